use crate::error::KrbError;
use der::asn1::OctetString;
use der::Sequence;
use std::fmt;

/// ```text
/// EncryptionKey   ::= SEQUENCE {
///         keytype         [0] Int32 -- actually encryption type --,
///         keyvalue        [1] OCTET STRING
/// }
/// ````
#[derive(Clone, Eq, PartialEq, Sequence)]
pub struct EncryptionKey {
    #[asn1(context_specific = "0")]
    pub key_type: i32,
    #[asn1(context_specific = "1")]
    pub key_value: OctetString,
}

impl EncryptionKey {
    pub fn new(key_type: i32, key_value: &[u8]) -> Result<Self, KrbError> {
        let key_value = OctetString::new(key_value).map_err(|_| KrbError::DerEncodeOctetString)?;
        Ok(Self {
            key_type,
            key_value,
        })
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("key_type", &self.key_type)
            .finish_non_exhaustive()
    }
}
