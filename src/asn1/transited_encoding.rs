use crate::error::KrbError;
use der::asn1::OctetString;
use der::Sequence;

/// ```text
/// TransitedEncoding       ::= SEQUENCE {
///        tr-type         [0] Int32 -- must be registered --,
///        contents        [1] OCTET STRING
///}
/// ````
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub struct TransitedEncoding {
    #[asn1(context_specific = "0")]
    pub tr_type: i32,
    #[asn1(context_specific = "1")]
    pub contents: OctetString,
}

/// DOMAIN-X500-COMPRESS, RFC 4120 section 3.3.3.2.
pub const TR_TYPE_DOMAIN_X500_COMPRESS: i32 = 1;

impl TransitedEncoding {
    /// A ticket that crossed no realm boundary.
    pub fn empty() -> Result<Self, KrbError> {
        let contents =
            OctetString::new(Vec::<u8>::new()).map_err(|_| KrbError::DerEncodeOctetString)?;
        Ok(Self {
            tr_type: TR_TYPE_DOMAIN_X500_COMPRESS,
            contents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use der::{Decode, Encode};

    #[test]
    fn transited_encoding_round_trip() {
        let empty = TransitedEncoding::empty().expect("Failed to build transited");
        let bytes = empty.to_der().expect("Failed to encode");
        assert_eq!(
            bytes,
            [0x30, 0x09, 0xa0, 0x03, 0x02, 0x01, 0x01, 0xa1, 0x02, 0x04, 0x00]
        );
        assert_eq!(
            TransitedEncoding::from_der(&bytes).expect("Failed to decode"),
            empty
        );

        let crossed = TransitedEncoding {
            tr_type: TR_TYPE_DOMAIN_X500_COMPRESS,
            contents: OctetString::new(b"EDU,MIT.,ATHENA.".to_vec()).expect("Invalid contents"),
        };
        let bytes = crossed.to_der().expect("Failed to encode");
        assert_eq!(
            TransitedEncoding::from_der(&bytes).expect("Failed to decode"),
            crossed
        );
    }
}
