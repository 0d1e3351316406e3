use der::{DecodeValue, EncodeValue, FixedTag, Tag};
use std::fmt;

/// ```text
/// nonce           [7] UInt32
/// ```
///
/// RFC 4120 says UInt32 and MIT stays within u31, but heimdal writes the nonce as a
/// signed Int32. Both forms decode to the same 32 bits. Encoding is always the
/// unsigned form.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub struct Nonce(u32);

impl Nonce {
    pub const fn new(nonce: u32) -> Self {
        Self(nonce)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for Nonce {
    fn from(nonce: u32) -> Self {
        Self(nonce)
    }
}

impl PartialEq<u32> for Nonce {
    fn eq(&self, other: &u32) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FixedTag for Nonce {
    const TAG: Tag = Tag::Integer;
}

impl<'a> DecodeValue<'a> for Nonce {
    type Error = der::Error;

    fn decode_value<R: der::Reader<'a>>(reader: &mut R, header: der::Header) -> der::Result<Self> {
        let value = i64::decode_value(reader, header)?;
        if let Ok(nonce) = u32::try_from(value) {
            Ok(Self(nonce))
        } else if let Ok(nonce) = i32::try_from(value) {
            Ok(Self(nonce as u32))
        } else {
            Err(der::Error::from(Self::TAG.value_error()))
        }
    }
}

impl EncodeValue for Nonce {
    fn value_len(&self) -> der::Result<der::Length> {
        self.0.value_len()
    }

    fn encode_value(&self, encoder: &mut impl der::Writer) -> der::Result<()> {
        self.0.encode_value(encoder)
    }
}

#[cfg(test)]
mod tests {
    use super::Nonce;
    use der::{Decode, Encode};

    #[test]
    fn nonce_signed_and_unsigned_forms() {
        // RFC form of 2^31.
        let unsigned = [0x02, 0x05, 0x00, 0x80, 0x00, 0x00, 0x00];
        let nonce = Nonce::from_der(&unsigned).expect("Failed to decode");
        assert_eq!(nonce, 0x8000_0000);
        assert_eq!(nonce.to_der().expect("Failed to encode"), unsigned);

        // heimdal writes the same bits as a negative Int32.
        let signed = [0x02, 0x04, 0x80, 0x00, 0x00, 0x00];
        assert_eq!(Nonce::from_der(&signed).expect("Failed to decode"), nonce);

        let small = Nonce::new(779214421);
        let bytes = small.to_der().expect("Failed to encode");
        assert_eq!(bytes, [0x02, 0x04, 0x2e, 0x71, 0xde, 0x55]);
        assert_eq!(Nonce::from_der(&bytes).expect("Failed to decode"), small);

        // Wider than 32 bits either way.
        assert!(Nonce::from_der(&[0x02, 0x05, 0x01, 0x00, 0x00, 0x00, 0x00]).is_err());
        assert!(Nonce::from_der(&[0x02, 0x05, 0xff, 0x7f, 0xff, 0xff, 0xff]).is_err());
    }
}
