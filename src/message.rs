//! Routing of inbound buffers by their outer application tag.

use crate::asn1::ap_rep::ApRep;
use crate::asn1::ap_req::ApReq;
use crate::asn1::kdc_rep::KdcRep;
use crate::asn1::kdc_req::KdcReq;
use crate::asn1::krb_cred::KrbCred;
use crate::asn1::krb_error::KrbErrorMessage;
use crate::asn1::krb_priv::KrbPriv;
use crate::asn1::krb_safe::KrbSafe;
use crate::asn1::{application_encoded_len, application_tag, decode_within, encode_application};
use crate::error::{DecodeError, UnknownTagError};
use der::{Decode, Encode, Reader, SliceReader, Tag, Tagged, Writer};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;
use tracing::{debug, trace};

/// The messages that travel on their own, identified by their APPLICATION tag number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum MessageType {
    AsReq = 10,
    AsRep = 11,
    TgsReq = 12,
    TgsRep = 13,
    ApReq = 14,
    ApRep = 15,
    KrbSafe = 20,
    KrbPriv = 21,
    KrbCred = 22,
    KrbError = 30,
}

impl MessageType {
    pub fn tag(self) -> Tag {
        application_tag(self.into())
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageType::AsReq => "AS-REQ",
            MessageType::AsRep => "AS-REP",
            MessageType::TgsReq => "TGS-REQ",
            MessageType::TgsRep => "TGS-REP",
            MessageType::ApReq => "AP-REQ",
            MessageType::ApRep => "AP-REP",
            MessageType::KrbSafe => "KRB-SAFE",
            MessageType::KrbPriv => "KRB-PRIV",
            MessageType::KrbCred => "KRB-CRED",
            MessageType::KrbError => "KRB-ERROR",
        };
        f.write_str(name)
    }
}

/// Map a tag to a message type. Only constructed APPLICATION tags qualify.
fn message_type_of(tag: Tag) -> Result<MessageType, UnknownTagError> {
    match tag {
        Tag::Application {
            constructed: true,
            number,
        } => u8::try_from(number.value())
            .ok()
            .and_then(|n| MessageType::try_from(n).ok())
            .ok_or(UnknownTagError::Unknown(tag)),
        _ => Err(UnknownTagError::Unknown(tag)),
    }
}

/// Identify the message in `bytes` from its outermost tag. The length and body are
/// not read, so a truncated or corrupt body still classifies.
pub fn classify(bytes: &[u8]) -> Result<MessageType, UnknownTagError> {
    if bytes.is_empty() {
        return Err(UnknownTagError::Empty);
    }
    let mut reader = SliceReader::new(bytes).map_err(|_| UnknownTagError::Unreadable)?;
    let tag = Tag::decode(&mut reader).map_err(|err| {
        debug!(?err, "Unable to read leading tag");
        UnknownTagError::Unreadable
    })?;
    let msg_type = message_type_of(tag);
    trace!(?tag, ?msg_type);
    msg_type
}

/// Any standalone protocol message, fully decoded.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum KrbMessage {
    AsReq(KdcReq),
    AsRep(KdcRep),
    TgsReq(KdcReq),
    TgsRep(KdcRep),
    ApReq(ApReq),
    ApRep(ApRep),
    KrbSafe(KrbSafe),
    KrbPriv(KrbPriv),
    KrbCred(KrbCred),
    KrbError(KrbErrorMessage),
}

impl KrbMessage {
    pub fn message_type(&self) -> MessageType {
        match self {
            KrbMessage::AsReq(_) => MessageType::AsReq,
            KrbMessage::AsRep(_) => MessageType::AsRep,
            KrbMessage::TgsReq(_) => MessageType::TgsReq,
            KrbMessage::TgsRep(_) => MessageType::TgsRep,
            KrbMessage::ApReq(_) => MessageType::ApReq,
            KrbMessage::ApRep(_) => MessageType::ApRep,
            KrbMessage::KrbSafe(_) => MessageType::KrbSafe,
            KrbMessage::KrbPriv(_) => MessageType::KrbPriv,
            KrbMessage::KrbCred(_) => MessageType::KrbCred,
            KrbMessage::KrbError(_) => MessageType::KrbError,
        }
    }

    /// Decode a whole buffer. Tags outside the message set are a decode failure
    /// here; use [`classify`] first to tell them apart.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        crate::asn1::decode(bytes)
    }
}

impl<'a> Decode<'a> for KrbMessage {
    type Error = der::Error;

    fn decode<R: Reader<'a>>(decoder: &mut R) -> der::Result<Self> {
        let tag: Tag = decoder.decode()?;
        let len: der::Length = decoder.decode()?;

        let msg_type = message_type_of(tag).map_err(|_| {
            der::Error::from(der::ErrorKind::TagUnexpected {
                expected: None,
                actual: tag,
            })
        })?;

        match msg_type {
            MessageType::AsReq => decode_within(decoder, len).map(KrbMessage::AsReq),
            MessageType::AsRep => decode_within(decoder, len).map(KrbMessage::AsRep),
            MessageType::TgsReq => decode_within(decoder, len).map(KrbMessage::TgsReq),
            MessageType::TgsRep => decode_within(decoder, len).map(KrbMessage::TgsRep),
            MessageType::ApReq => decode_within(decoder, len)
                .map(ApReq::new)
                .map(KrbMessage::ApReq),
            MessageType::ApRep => decode_within(decoder, len)
                .map(ApRep::new)
                .map(KrbMessage::ApRep),
            MessageType::KrbSafe => decode_within(decoder, len)
                .map(KrbSafe::new)
                .map(KrbMessage::KrbSafe),
            MessageType::KrbPriv => decode_within(decoder, len)
                .map(KrbPriv::new)
                .map(KrbMessage::KrbPriv),
            MessageType::KrbCred => decode_within(decoder, len)
                .map(KrbCred::new)
                .map(KrbMessage::KrbCred),
            MessageType::KrbError => decode_within(decoder, len)
                .map(KrbErrorMessage::new)
                .map(KrbMessage::KrbError),
        }
    }
}

impl Encode for KrbMessage {
    fn encoded_len(&self) -> der::Result<der::Length> {
        match self {
            KrbMessage::AsReq(req) | KrbMessage::TgsReq(req) => {
                application_encoded_len(self.message_type().into(), req)
            }
            KrbMessage::AsRep(rep) | KrbMessage::TgsRep(rep) => {
                application_encoded_len(self.message_type().into(), rep)
            }
            KrbMessage::ApReq(m) => m.encoded_len(),
            KrbMessage::ApRep(m) => m.encoded_len(),
            KrbMessage::KrbSafe(m) => m.encoded_len(),
            KrbMessage::KrbPriv(m) => m.encoded_len(),
            KrbMessage::KrbCred(m) => m.encoded_len(),
            KrbMessage::KrbError(m) => m.encoded_len(),
        }
    }

    fn encode(&self, writer: &mut impl Writer) -> der::Result<()> {
        match self {
            KrbMessage::AsReq(req) | KrbMessage::TgsReq(req) => {
                encode_application(self.message_type().into(), req, writer)
            }
            KrbMessage::AsRep(rep) | KrbMessage::TgsRep(rep) => {
                encode_application(self.message_type().into(), rep, writer)
            }
            KrbMessage::ApReq(m) => m.encode(writer),
            KrbMessage::ApRep(m) => m.encode(writer),
            KrbMessage::KrbSafe(m) => m.encode(writer),
            KrbMessage::KrbPriv(m) => m.encode(writer),
            KrbMessage::KrbCred(m) => m.encode(writer),
            KrbMessage::KrbError(m) => m.encode(writer),
        }
    }
}

impl Tagged for KrbMessage {
    fn tag(&self) -> Tag {
        self.message_type().tag()
    }
}
