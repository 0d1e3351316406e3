use crate::asn1::constants::KrbErrorCode;
use std::fmt;
use tracing::debug;

// =========================================================================================
// Errors in this module must stay free of secret or peer-controlled state. They can end up
// in a KRB-ERROR sent back to an unauthenticated peer, so the variant alone is the report.
//
// If you need to debug a failure, use the error!/debug! macros at the raise site to log
// the relevant context.
// =========================================================================================

/// Malformed, truncated or non-canonical input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    UnexpectedTag,
    TrailingData,
    BadLength,
    Truncated,
    NonCanonical,
    Malformed,
}

/// Decryption or integrity failure. Deliberately carries nothing: a wrong key, a wrong
/// key usage and a corrupted ciphertext are indistinguishable to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecryptError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    ExpiredTicket,
    NotYetValid,
    ClockSkewExceeded,
    ReplayDetected,
    SequenceMismatch,
    SubkeyMismatch,
    RestrictionTypeMismatch,
    RestrictionDepthExceeded,
    RenewTillExpired,
    TicketInvalid,
    ClientMismatch,
    ReplyTimestampMismatch,
    NonceMismatch,
    ChecksumMismatch,
}

/// The dispatcher saw a leading tag outside the protocol's message set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownTagError {
    Empty,
    Unreadable,
    Unknown(der::Tag),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KrbError {
    Decode(DecodeError),
    Decrypt(DecryptError),
    Validation(ValidationError),
    UnknownTag(UnknownTagError),

    DerEncodeKerberosString,
    DerEncodeKerberosTime,
    DerEncodeOctetString,
    DerEncodeEncTicketPart,
    DerEncodeAuthenticator,
    DerEncodeEncApRepPart,
    DerEncodeKdcReqBody,
    DerEncodeAuthorizationData,
    DerEncodeMessage,

    UnsupportedEncryption,
    UnsupportedChecksum,
    InvalidEncryptionKey,
    PlaintextEmpty,
    MissingServiceKey,
    PreauthRequired,

    InvalidMessageType,
    InvalidPvno,
    PrincipalNameInvalidComponents,

    ConfigParse,
    IoError,
    BinRWError,

    /// No really, do you have a time machine? How did you go back to before 1970?
    DoYouHaveATimeMachine,
}

impl KrbError {
    /// The code to report to a peer in a KRB-ERROR.
    pub fn error_code(&self) -> KrbErrorCode {
        match self {
            KrbError::Validation(v) => v.error_code(),
            KrbError::Decrypt(_) => KrbErrorCode::KRB_AP_ERR_BAD_INTEGRITY,
            KrbError::UnknownTag(_) | KrbError::InvalidMessageType => {
                KrbErrorCode::KRB_AP_ERR_MSG_TYPE
            }
            KrbError::InvalidPvno => KrbErrorCode::KRB_AP_ERR_BADVERSION,
            KrbError::MissingServiceKey => KrbErrorCode::KRB_AP_ERR_NOKEY,
            KrbError::PreauthRequired => KrbErrorCode::KDC_ERR_PREAUTH_REQUIRED,
            KrbError::UnsupportedEncryption => KrbErrorCode::KDC_ERR_ETYPE_NOSUPP,
            KrbError::UnsupportedChecksum => KrbErrorCode::KDC_ERR_SUMTYPE_NOSUPP,
            _ => KrbErrorCode::KRB_ERR_GENERIC,
        }
    }
}

impl ValidationError {
    pub fn error_code(&self) -> KrbErrorCode {
        match self {
            ValidationError::ExpiredTicket | ValidationError::RenewTillExpired => {
                KrbErrorCode::KRB_AP_ERR_TKT_EXPIRED
            }
            ValidationError::NotYetValid | ValidationError::TicketInvalid => {
                KrbErrorCode::KRB_AP_ERR_TKT_NYV
            }
            ValidationError::ClockSkewExceeded => KrbErrorCode::KRB_AP_ERR_SKEW,
            ValidationError::ReplayDetected => KrbErrorCode::KRB_AP_ERR_REPEAT,
            ValidationError::SequenceMismatch => KrbErrorCode::KRB_AP_ERR_BADSEQ,
            ValidationError::SubkeyMismatch | ValidationError::ReplyTimestampMismatch => {
                KrbErrorCode::KRB_AP_ERR_MUT_FAIL
            }
            ValidationError::ClientMismatch => KrbErrorCode::KRB_AP_ERR_BADMATCH,
            ValidationError::NonceMismatch | ValidationError::ChecksumMismatch => {
                KrbErrorCode::KRB_AP_ERR_MODIFIED
            }
            ValidationError::RestrictionTypeMismatch
            | ValidationError::RestrictionDepthExceeded => KrbErrorCode::KRB_ERR_GENERIC,
        }
    }
}

impl From<der::Error> for DecodeError {
    fn from(err: der::Error) -> Self {
        debug!(?err, "asn.1 decode failure");
        match err.kind() {
            der::ErrorKind::TagUnexpected { .. } | der::ErrorKind::TagUnknown { .. } => {
                DecodeError::UnexpectedTag
            }
            der::ErrorKind::TrailingData { .. } => DecodeError::TrailingData,
            der::ErrorKind::Length { .. } | der::ErrorKind::Overlength => DecodeError::BadLength,
            der::ErrorKind::Incomplete { .. } => DecodeError::Truncated,
            der::ErrorKind::Noncanonical { .. } => DecodeError::NonCanonical,
            _ => DecodeError::Malformed,
        }
    }
}

impl From<der::Error> for KrbError {
    fn from(err: der::Error) -> Self {
        KrbError::Decode(DecodeError::from(err))
    }
}

impl From<DecodeError> for KrbError {
    fn from(err: DecodeError) -> Self {
        KrbError::Decode(err)
    }
}

impl From<DecryptError> for KrbError {
    fn from(err: DecryptError) -> Self {
        KrbError::Decrypt(err)
    }
}

impl From<ValidationError> for KrbError {
    fn from(err: ValidationError) -> Self {
        KrbError::Validation(err)
    }
}

impl From<UnknownTagError> for KrbError {
    fn from(err: UnknownTagError) -> Self {
        KrbError::UnknownTag(err)
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            DecodeError::UnexpectedTag => "unexpected tag",
            DecodeError::TrailingData => "trailing data",
            DecodeError::BadLength => "bad length",
            DecodeError::Truncated => "truncated input",
            DecodeError::NonCanonical => "non-canonical encoding",
            DecodeError::Malformed => "malformed value",
        };
        f.write_str(msg)
    }
}

impl fmt::Display for DecryptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("decryption failed")
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ValidationError::ExpiredTicket => "ticket has expired",
            ValidationError::NotYetValid => "ticket is not yet valid",
            ValidationError::ClockSkewExceeded => "clock skew exceeded",
            ValidationError::ReplayDetected => "replay detected",
            ValidationError::SequenceMismatch => "sequence number mismatch",
            ValidationError::SubkeyMismatch => "subkey mismatch",
            ValidationError::RestrictionTypeMismatch => "restriction type mismatch",
            ValidationError::RestrictionDepthExceeded => "restriction nesting too deep",
            ValidationError::RenewTillExpired => "renewable lifetime has expired",
            ValidationError::TicketInvalid => "ticket is flagged invalid",
            ValidationError::ClientMismatch => "client does not match ticket",
            ValidationError::ReplyTimestampMismatch => "reply timestamp mismatch",
            ValidationError::NonceMismatch => "nonce mismatch",
            ValidationError::ChecksumMismatch => "checksum mismatch",
        };
        f.write_str(msg)
    }
}

impl fmt::Display for UnknownTagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnknownTagError::Empty => f.write_str("empty message"),
            UnknownTagError::Unreadable => f.write_str("unreadable leading tag"),
            UnknownTagError::Unknown(tag) => write!(f, "unknown message tag {tag}"),
        }
    }
}

impl fmt::Display for KrbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KrbError::Decode(e) => write!(f, "decode error: {e}"),
            KrbError::Decrypt(e) => e.fmt(f),
            KrbError::Validation(e) => write!(f, "validation error: {e}"),
            KrbError::UnknownTag(e) => e.fmt(f),
            other => write!(f, "{other:?}"),
        }
    }
}

impl std::error::Error for DecodeError {}
impl std::error::Error for DecryptError {}
impl std::error::Error for ValidationError {}
impl std::error::Error for UnknownTagError {}
impl std::error::Error for KrbError {}
