use crate::error::KrbError;
use der::asn1::OctetString;
use der::Sequence;

/// ```text
/// Checksum        ::= SEQUENCE {
///         cksumtype       [0] Int32,
///         checksum        [1] OCTET STRING
/// }
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub struct Checksum {
    #[asn1(context_specific = "0")]
    pub checksum_type: i32,
    #[asn1(context_specific = "1")]
    pub checksum: OctetString,
}

impl Checksum {
    pub fn new(checksum_type: i32, checksum: Vec<u8>) -> Result<Self, KrbError> {
        let checksum = OctetString::new(checksum).map_err(|_| KrbError::DerEncodeOctetString)?;
        Ok(Self {
            checksum_type,
            checksum,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asn1::constants::ChecksumType;
    use der::{Decode, Encode};

    #[test]
    fn checksum_round_trip() {
        let cksum = Checksum::new(
            ChecksumType::HMAC_SHA1_96_AES256.into(),
            vec![0xc5; 12],
        )
        .expect("Invalid checksum");
        let bytes = cksum.to_der().expect("Failed to encode");
        assert_eq!(&bytes[..9], [0x30, 0x15, 0xa0, 0x03, 0x02, 0x01, 0x10, 0xa1, 0x0e]);
        assert_eq!(Checksum::from_der(&bytes).expect("Failed to decode"), cksum);
    }
}
