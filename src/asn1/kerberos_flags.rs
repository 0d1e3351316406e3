use bitmask_enum::bitmask;
use der::asn1::BitStringRef;
use der::{EncodeValue, Length, Result, Writer};

/// Width of every flag field on the wire.
const FLAG_BYTES: usize = 4;

/// Implements the KerberosFlags BIT STRING codec for a `#[bitmask(u32)]` type.
///
/// Flag `n` is bit `n` of the ASN.1 bit string, which is the most significant bit
/// first, so the value is bit-reversed between memory and the wire. All 32 bits are
/// kept, including ones this crate has no name for.
macro_rules! kerberos_flags_codec {
    ($flags:ident) => {
        impl $flags {
            pub fn from_bits(val: u32) -> Self {
                let mut flags = $flags::none();
                flags.bits = val;
                flags
            }
        }

        impl<'a> ::der::Decode<'a> for $flags {
            type Error = ::der::Error;

            fn decode<R: ::der::Reader<'a>>(decoder: &mut R) -> ::der::Result<Self> {
                $crate::asn1::kerberos_flags::decode_flag_bits(decoder).map($flags::from_bits)
            }
        }

        impl ::der::Tagged for $flags {
            fn tag(&self) -> ::der::Tag {
                ::der::Tag::BitString
            }
        }

        impl ::der::EncodeValue for $flags {
            fn value_len(&self) -> ::der::Result<::der::Length> {
                $crate::asn1::kerberos_flags::flag_bits_value_len()
            }

            fn encode_value(&self, encoder: &mut impl ::der::Writer) -> ::der::Result<()> {
                $crate::asn1::kerberos_flags::encode_flag_bits(self.bits(), encoder)
            }
        }
    };
}

pub(crate) use kerberos_flags_codec;

pub(crate) fn decode_flag_bits<'a, R: der::Reader<'a>>(decoder: &mut R) -> Result<u32> {
    let bs: BitStringRef<'a> = decoder.decode()?;
    let raw = bs.raw_bytes();

    // RFC 4120 5.2.8 says no fewer than 32 bits are sent, but some peers trim
    // trailing zero octets. Anything wider than 32 bits has no defined meaning.
    if raw.len() > FLAG_BYTES {
        return Err(der::Error::new(
            der::ErrorKind::Length {
                tag: der::Tag::BitString,
            },
            decoder.position(),
        ));
    }

    let mut buf = [0u8; FLAG_BYTES];
    buf[..raw.len()].copy_from_slice(raw);
    if let Some(last) = raw.len().checked_sub(1) {
        // Padding bits are not part of the value.
        buf[last] &= 0xffu8 << bs.unused_bits();
    }

    Ok(u32::from_be_bytes(buf).reverse_bits())
}

pub(crate) fn flag_bits_value_len() -> Result<Length> {
    let buf = [0u8; FLAG_BYTES];
    BitStringRef::from_bytes(&buf)?.value_len()
}

pub(crate) fn encode_flag_bits(bits: u32, encoder: &mut impl Writer) -> Result<()> {
    let buf = bits.reverse_bits().to_be_bytes();
    BitStringRef::from_bytes(&buf)?.encode_value(encoder)
}

/// ```text
/// KerberosFlags   ::= BIT STRING (SIZE (32..MAX))
///                     -- minimum number of bits shall be sent,
///                     -- but no fewer than 32
///
/// KDCOptions      ::= KerberosFlags
/// ````
// NOTE: Can't use der::Flagset because it strips all leading zeros and RFC4120
// section 5.8.2 says at least 32 bit must be sent.
#[bitmask(u32)]
pub enum KerberosFlags {
    Reserved = 1 << 0,
    Forwardable = 1 << 1,
    Forwarded = 1 << 2,
    Proxiable = 1 << 3,
    Proxy = 1 << 4,
    AllowPostdate = 1 << 5,
    Postdated = 1 << 6,
    Renewable = 1 << 8,
    OptHardwareAuth = 1 << 11,
    ConstrainedDelegation = 1 << 14,
    Canonicalize = 1 << 15,
    RequestAnonymous = 1 << 16,
    // -- 26 was unused in 1510
    DisableTransitedCheck = 1 << 26,
    RenewableOk = 1 << 27,
    EncTktInSkey = 1 << 28,
    Renew = 1 << 30,
    Validate = 1 << 31,
}

kerberos_flags_codec!(KerberosFlags);

#[cfg(test)]
mod tests {
    use super::KerberosFlags;
    use der::{Decode, Encode};

    #[test]
    fn kdc_options_heimdal_sample() {
        // forwardable, renewable, canonicalize, renewable-ok
        let bytes = [0x03, 0x05, 0x00, 0x40, 0x81, 0x00, 0x10];
        let flags = KerberosFlags::from_der(&bytes).expect("Failed to decode");
        assert_eq!(
            flags,
            KerberosFlags::Forwardable
                | KerberosFlags::Renewable
                | KerberosFlags::Canonicalize
                | KerberosFlags::RenewableOk
        );
        assert_eq!(flags.to_der().expect("Failed to encode"), bytes);
    }

    #[test]
    fn kdc_options_preserve_unnamed_bits() {
        // Bit 9 and bit 29 have no name here, they must survive a round trip.
        let bytes = [0x03, 0x05, 0x00, 0x00, 0x40, 0x00, 0x04];
        let flags = KerberosFlags::from_der(&bytes).expect("Failed to decode");
        assert_eq!(flags.bits(), (1 << 9) | (1 << 29));
        assert_eq!(flags.to_der().expect("Failed to encode"), bytes);
    }

    #[test]
    fn kdc_options_short_and_padded() {
        // Two octets, with the low 4 bits flagged unused and set to garbage.
        let bytes = [0x03, 0x03, 0x04, 0x40, 0x8f];
        let flags = KerberosFlags::from_der(&bytes).expect("Failed to decode");
        assert_eq!(flags, KerberosFlags::Forwardable | KerberosFlags::Renewable);

        // Always re-emitted as the full 32 bits.
        assert_eq!(
            flags.to_der().expect("Failed to encode"),
            [0x03, 0x05, 0x00, 0x40, 0x80, 0x00, 0x00]
        );

        let too_wide = [0x03, 0x06, 0x00, 0x40, 0x80, 0x00, 0x00, 0x00];
        assert!(KerberosFlags::from_der(&too_wide).is_err());
    }
}
