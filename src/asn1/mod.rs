//! RFC 4120 section 5 structures over the `der` codec.
//!
//! Each structure is declared once as a `Sequence` whose context tags mirror the ASN.1
//! module. Types that the protocol wraps in an `[APPLICATION n]` tag are declared with
//! [`application_tagged!`], and the CHOICE types (`KrbKdcReq`, `KrbKdcRep`,
//! `TaggedEncKdcRepPart`, `KrbMessage`) commit to a branch from the application tag alone.

use crate::error::{DecodeError, KrbError};
use der::{Decode, Encode, Length, Reader, Tag};
use tracing::error;

/// Declares `$outer ::= [APPLICATION $num] $inner`.
///
/// The outer type owns the inner SEQUENCE and derefs to it. The tag and length
/// checks come from der's blanket impls over `FixedTag` and `DecodeValue`.
macro_rules! application_tagged {
    ($(#[$meta:meta])* $outer:ident, $inner:ty, $num:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Eq, PartialEq)]
        pub struct $outer($inner);

        impl $outer {
            pub fn new(inner: $inner) -> Self {
                Self(inner)
            }

            pub fn into_inner(self) -> $inner {
                self.0
            }
        }

        impl ::der::FixedTag for $outer {
            const TAG: ::der::Tag = ::der::Tag::Application {
                constructed: true,
                number: ::der::TagNumber($num),
            };
        }

        impl<'a> ::der::DecodeValue<'a> for $outer {
            type Error = ::der::Error;

            fn decode_value<R: ::der::Reader<'a>>(
                reader: &mut R,
                _header: ::der::Header,
            ) -> ::der::Result<Self> {
                let inner: $inner = ::der::Decode::decode(reader)?;
                Ok(Self(inner))
            }
        }

        impl ::der::EncodeValue for $outer {
            fn value_len(&self) -> ::der::Result<::der::Length> {
                ::der::Encode::encoded_len(&self.0)
            }

            fn encode_value(&self, writer: &mut impl ::der::Writer) -> ::der::Result<()> {
                ::der::Encode::encode(&self.0, writer)
            }
        }

        impl ::std::ops::Deref for $outer {
            type Target = $inner;

            fn deref(&self) -> &$inner {
                &self.0
            }
        }

        impl AsRef<$inner> for $outer {
            fn as_ref(&self) -> &$inner {
                &self.0
            }
        }

        impl From<$inner> for $outer {
            fn from(inner: $inner) -> Self {
                Self(inner)
            }
        }
    };
}

pub mod constants;

pub mod ap_options;
pub mod ap_rep;
pub mod ap_req;
pub mod authenticator;
pub mod authorization_data;
pub mod checksum;
pub mod enc_ap_rep_part;
pub mod enc_kdc_rep_part;
pub mod enc_ticket_part;
pub mod encrypted_data;
pub mod encryption_key;
pub mod etype_info2;
pub mod host_address;
pub mod kdc_options;
pub mod kdc_rep;
pub mod kdc_req;
pub mod kdc_req_body;
pub mod kerberos_flags;
pub mod kerberos_string;
pub mod kerberos_time;
pub mod krb_cred;
pub mod krb_error;
pub mod krb_kdc_rep;
pub mod krb_kdc_req;
pub mod krb_priv;
pub mod krb_safe;
pub mod last_req;
pub mod microseconds;
pub mod nonce;
pub mod pa_data;
pub mod pa_enc_ts_enc;
pub mod principal_name;
pub mod realm;
pub mod ticket;
pub mod ticket_flags;
pub mod transited_encoding;

pub use der::asn1::{Any, Ia5String, OctetString};
pub use der::DateTime;

/// Decode a `T` from the reader and check it consumed exactly `len` bytes, the
/// length declared by the enclosing application tag.
pub(crate) fn decode_within<'a, T, R>(decoder: &mut R, len: Length) -> der::Result<T>
where
    T: Decode<'a, Error = der::Error>,
    R: Reader<'a>,
{
    decoder.read_nested(len, |reader| reader.decode())
}

pub(crate) const fn application_tag(number: u8) -> Tag {
    Tag::Application {
        constructed: true,
        number: der::TagNumber(number as u32),
    }
}

/// Encoded length of `inner` wrapped in `[APPLICATION number]`. Used by the CHOICE
/// types, whose branches share an inner type.
pub(crate) fn application_encoded_len<T: Encode>(number: u8, inner: &T) -> der::Result<Length> {
    let inner_len = inner.encoded_len()?;
    (application_tag(number).encoded_len()? + inner_len.encoded_len()?) + inner_len
}

pub(crate) fn encode_application<T: Encode>(
    number: u8,
    inner: &T,
    writer: &mut impl der::Writer,
) -> der::Result<()> {
    application_tag(number).encode(writer)?;
    inner.encoded_len()?.encode(writer)?;
    inner.encode(writer)
}

/// Canonical DER encoding of any protocol entity.
pub fn encode<T: Encode>(entity: &T) -> Result<Vec<u8>, KrbError> {
    entity.to_der().map_err(|err| {
        error!(?err, "Unable to encode protocol entity");
        KrbError::DerEncodeMessage
    })
}

/// Decode a protocol entity. The whole buffer must be consumed.
pub fn decode<'a, T>(bytes: &'a [u8]) -> Result<T, DecodeError>
where
    T: Decode<'a, Error = der::Error>,
{
    T::from_der(bytes).map_err(DecodeError::from)
}

/// As [`decode`], but first checks the leading tag is `expected` so the caller learns
/// about a misrouted buffer before any field is parsed.
pub fn decode_expecting<'a, T>(bytes: &'a [u8], expected: Tag) -> Result<T, DecodeError>
where
    T: Decode<'a, Error = der::Error>,
{
    let mut reader = der::SliceReader::new(bytes)?;
    let tag = Tag::decode(&mut reader)?;
    if tag != expected {
        error!(?tag, ?expected, "Unexpected leading tag");
        return Err(DecodeError::UnexpectedTag);
    }
    decode(bytes)
}
