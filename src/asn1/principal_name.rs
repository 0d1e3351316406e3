use super::constants::PrincipalNameType;
use super::kerberos_string::KerberosString;
use crate::error::KrbError;
use der::Sequence;
use std::fmt;
use std::str::FromStr;

/// ```text
///   PrincipalName   ::= SEQUENCE {
///           name-type       [0] Int32,
///           name-string     [1] SEQUENCE OF KerberosString
///   }
/// ````
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub struct PrincipalName {
    #[asn1(context_specific = "0")]
    // The name-type SHOULD be treated as a hint. Ignoring the name type, no two
    // names can be the same (i.e., at least one of the components, or the realm,
    // must be different).
    pub name_type: i32,
    #[asn1(context_specific = "1")]
    pub name_string: Vec<KerberosString>,
}

impl PrincipalName {
    pub fn new<S: AsRef<str>>(
        name_type: PrincipalNameType,
        components: &[S],
    ) -> Result<Self, KrbError> {
        let name_string = components
            .iter()
            .map(|c| KerberosString::from_str(c.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name_type: name_type.into(),
            name_string,
        })
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.name_string.iter().map(|c| c.as_str())
    }

    /// Two names match when they share at least one component. The name type and
    /// the realm take no part, which lets a ticket issued under one spelling of a
    /// service be checked against another.
    pub fn matches(&self, other: &PrincipalName) -> bool {
        self.components()
            .any(|ours| other.components().any(|theirs| ours == theirs))
    }
}

impl fmt::Display for PrincipalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v: Vec<&str> = self.components().collect();
        f.write_str(&v.join("/"))
    }
}

impl From<PrincipalName> for String {
    fn from(value: PrincipalName) -> Self {
        value.to_string()
    }
}

impl<T> TryFrom<(i32, T)> for PrincipalName
where
    T: AsRef<str>,
{
    type Error = KrbError;

    fn try_from((name_type, name_str): (i32, T)) -> Result<Self, Self::Error> {
        let name_string = name_str
            .as_ref()
            .split('/')
            .map(KerberosString::from_str)
            .collect::<Result<Vec<_>, _>>()?;

        if name_string.iter().any(|c| c.as_str().is_empty()) {
            return Err(KrbError::PrincipalNameInvalidComponents);
        }

        Ok(Self {
            name_type,
            name_string,
        })
    }
}
