use crate::error::KrbError;
use der::{DecodeValue, EncodeValue, FixedTag, Tag};
use std::fmt;
use tracing::error;

pub const MICROSECONDS_MAX: u32 = 999_999;

/// ```text
/// Microseconds    ::= INTEGER (0..999999)
/// ```
///
/// Values outside the range fail to decode.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Microseconds(u32);

impl Microseconds {
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Microseconds {
    type Error = KrbError;

    fn try_from(usec: u32) -> Result<Self, Self::Error> {
        if usec > MICROSECONDS_MAX {
            error!(usec, "Microseconds out of range");
            return Err(KrbError::DerEncodeKerberosTime);
        }
        Ok(Self(usec))
    }
}

impl From<Microseconds> for u32 {
    fn from(usec: Microseconds) -> u32 {
        usec.0
    }
}

impl fmt::Display for Microseconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FixedTag for Microseconds {
    const TAG: Tag = Tag::Integer;
}

impl<'a> DecodeValue<'a> for Microseconds {
    type Error = der::Error;

    fn decode_value<R: der::Reader<'a>>(reader: &mut R, header: der::Header) -> der::Result<Self> {
        let usec = u32::decode_value(reader, header)?;
        if usec > MICROSECONDS_MAX {
            return Err(der::Error::from(Self::TAG.value_error()));
        }
        Ok(Self(usec))
    }
}

impl EncodeValue for Microseconds {
    fn value_len(&self) -> der::Result<der::Length> {
        self.0.value_len()
    }

    fn encode_value(&self, encoder: &mut impl der::Writer) -> der::Result<()> {
        self.0.encode_value(encoder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use der::{Decode, Encode};

    #[test]
    fn microseconds_range() {
        let usec = Microseconds::try_from(MICROSECONDS_MAX).expect("Invalid usec");
        let bytes = usec.to_der().expect("Failed to encode");
        assert_eq!(bytes, [0x02, 0x03, 0x0f, 0x42, 0x3f]);
        assert_eq!(Microseconds::from_der(&bytes).expect("Failed to decode"), usec);

        // 1_000_000
        assert!(Microseconds::from_der(&[0x02, 0x03, 0x0f, 0x42, 0x40]).is_err());
        assert!(Microseconds::try_from(1_000_000).is_err());
    }
}
