use super::constants::EncryptionType;
use super::kerberos_string::KerberosString;
use crate::constants::RFC_PKBDF2_SHA1_ITER;
use crate::crypto::{string_to_key_aes256, KerberosKey};
use crate::error::KrbError;
use der::asn1::OctetString;
use der::Sequence;
use tracing::{debug, error};

/// ```text
/// ETYPE-INFO2-ENTRY       ::= SEQUENCE {
///         etype           [0] Int32,
///         salt            [1] KerberosString OPTIONAL,
///         s2kparams       [2] OCTET STRING OPTIONAL
/// }
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub struct ETypeInfo2Entry {
    #[asn1(context_specific = "0")]
    pub etype: i32,
    #[asn1(context_specific = "1", optional = "true")]
    pub salt: Option<KerberosString>,
    #[asn1(context_specific = "2", optional = "true")]
    pub s2kparams: Option<OctetString>,
}

/// ```text
/// ETYPE-INFO2             ::= SEQUENCE SIZE (1..MAX) OF ETYPE-INFO2-ENTRY
/// ```
pub type ETypeInfo2 = Vec<ETypeInfo2Entry>;

impl ETypeInfo2Entry {
    /// PBKDF2 iteration count from s2kparams, a 4 byte big-endian integer for the
    /// AES types.
    pub fn iteration_count(&self) -> Result<u32, KrbError> {
        match &self.s2kparams {
            None => Ok(RFC_PKBDF2_SHA1_ITER),
            Some(params) => {
                let bytes: [u8; 4] = params.as_bytes().try_into().map_err(|_| {
                    debug!(len = params.as_bytes().len(), "Unexpected s2kparams length");
                    KrbError::InvalidEncryptionKey
                })?;
                Ok(u32::from_be_bytes(bytes))
            }
        }
    }

    /// Derive the client's long-term key with the parameters the KDC advertised.
    /// `default_salt` is used when the entry carries no salt.
    pub fn string_to_key(
        &self,
        passphrase: &[u8],
        default_salt: &str,
    ) -> Result<KerberosKey, KrbError> {
        if EncryptionType::try_from(self.etype).ok() != Some(EncryptionType::AES256_CTS_HMAC_SHA1_96) {
            error!(etype = self.etype, "No string-to-key for encryption type");
            return Err(KrbError::UnsupportedEncryption);
        }
        let salt = self
            .salt
            .as_ref()
            .map(KerberosString::as_str)
            .unwrap_or(default_salt);
        string_to_key_aes256(passphrase, salt.as_bytes(), self.iteration_count()?)
    }
}
