use super::constants::AuthorizationDataType;
use crate::error::KrbError;
use der::asn1::OctetString;
use der::{Encode, Sequence};
use tracing::error;

/// ```text
/// AuthorizationData       ::= SEQUENCE OF SEQUENCE {
///        ad-type         [0] Int32,
///        ad-data         [1] OCTET STRING
///}
/// ````
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub struct AuthorizationDataEntry {
    #[asn1(context_specific = "0")]
    pub ad_type: i32,
    #[asn1(context_specific = "1")]
    pub ad_data: OctetString,
}

pub type AuthorizationData = Vec<AuthorizationDataEntry>;

/// ```text
/// AD-IF-RELEVANT          ::= AuthorizationData
/// ```
pub type AdIfRelevant = AuthorizationData;

/// ```text
/// KERB-AD-RESTRICTION-ENTRY ::= SEQUENCE {
///         restriction-type        [0] Int32,
///         restriction             [1] OCTET STRING -- LSAP_TOKEN_INFO_INTEGRITY
/// }
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub struct KerbAdRestrictionEntry {
    #[asn1(context_specific = "0")]
    pub restriction_type: i32,
    #[asn1(context_specific = "1")]
    pub restriction: OctetString,
}

/// ```text
/// AD-ETYPE-NEGOTIATION    ::= SEQUENCE OF Int32 -- EncryptionType
/// ```
pub type EtypeList = Vec<i32>;

impl AuthorizationDataEntry {
    pub fn new(ad_type: AuthorizationDataType, ad_data: Vec<u8>) -> Result<Self, KrbError> {
        let ad_data = OctetString::new(ad_data).map_err(|_| KrbError::DerEncodeOctetString)?;
        Ok(Self {
            ad_type: ad_type.into(),
            ad_data,
        })
    }

    /// Wrap the entries in a single AD-IF-RELEVANT container.
    pub fn if_relevant(entries: &AdIfRelevant) -> Result<Self, KrbError> {
        let ad_data = entries.to_der().map_err(|err| {
            error!(?err, "Unable to encode AD-IF-RELEVANT");
            KrbError::DerEncodeAuthorizationData
        })?;
        Self::new(AuthorizationDataType::AdIfRelevant, ad_data)
    }

    pub fn is_type(&self, ad_type: AuthorizationDataType) -> bool {
        self.ad_type == i32::from(ad_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use der::Decode;

    #[test]
    fn authorization_data_if_relevant_nesting() {
        let inner = vec![AuthorizationDataEntry::new(
            AuthorizationDataType::KerbLocal,
            vec![0xde, 0xad],
        )
        .expect("Invalid entry")];
        let outer = AuthorizationDataEntry::if_relevant(&inner).expect("Invalid entry");
        assert!(outer.is_type(AuthorizationDataType::AdIfRelevant));

        let ad: AuthorizationData = vec![outer];
        let bytes = ad.to_der().expect("Failed to encode");
        let back = AuthorizationData::from_der(&bytes).expect("Failed to decode");
        assert_eq!(back, ad);

        let nested =
            AdIfRelevant::from_der(back[0].ad_data.as_bytes()).expect("Failed to decode nested");
        assert_eq!(nested, inner);
    }

    #[test]
    fn authorization_data_empty_sequence() {
        let ad: AuthorizationData = Vec::new();
        let bytes = ad.to_der().expect("Failed to encode");
        assert_eq!(bytes, [0x30, 0x00]);
        assert!(AuthorizationData::from_der(&bytes)
            .expect("Failed to decode")
            .is_empty());
    }
}
