use crate::error::KrbError;
use der::asn1::OctetString;
use der::Sequence;

/// ```text
/// EncryptedData   ::= SEQUENCE {
///         etype   [0] Int32 -- EncryptionType --,
///         kvno    [1] UInt32 OPTIONAL,
///         cipher  [2] OCTET STRING -- ciphertext
/// }
/// ````
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub struct EncryptedData {
    #[asn1(context_specific = "0")]
    pub etype: i32,
    #[asn1(context_specific = "1", optional = "true")]
    pub kvno: Option<u32>,
    #[asn1(context_specific = "2")]
    pub cipher: OctetString,
}

impl EncryptedData {
    pub fn new(etype: i32, kvno: Option<u32>, cipher: Vec<u8>) -> Result<Self, KrbError> {
        let cipher = OctetString::new(cipher).map_err(|_| KrbError::DerEncodeOctetString)?;
        Ok(Self {
            etype,
            kvno,
            cipher,
        })
    }
}
