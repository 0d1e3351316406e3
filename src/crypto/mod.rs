//! Cipher and checksum capabilities, selected by encryption type.
//!
//! The rest of the crate only sees [`CryptoTransform`]. A [`CryptoProvider`] maps
//! encryption and checksum types to transforms; the default provider carries
//! AES256-CTS-HMAC-SHA1-96.

mod aes256_cts_hmac_sha1_96;
mod nfold;

pub use self::aes256_cts_hmac_sha1_96::{string_to_key_aes256, Aes256CtsHmacSha196};

use crate::asn1::constants::{ChecksumType, EncryptionType};
use crate::asn1::encryption_key::EncryptionKey;
use crate::error::{DecryptError, KrbError};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::error;

/// The RFC 4120 7.5.1 key usage numbers. The same key yields unrelated
/// derived keys for each usage, so a ciphertext only opens under the usage it was
/// sealed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyUsage(u32);

impl KeyUsage {
    /// AS-REQ PA-ENC-TIMESTAMP padata timestamp, encrypted with the client key.
    pub const PA_ENC_TIMESTAMP: KeyUsage = KeyUsage(1);
    /// AS-REP / TGS-REP ticket, encrypted with the service key.
    pub const TICKET: KeyUsage = KeyUsage(2);
    /// AS-REP encrypted part, encrypted with the client key.
    pub const AS_REP_ENC_PART: KeyUsage = KeyUsage(3);
    pub const TGS_REQ_AUTH_DATA_SESSION_KEY: KeyUsage = KeyUsage(4);
    pub const TGS_REQ_AUTH_DATA_SUBKEY: KeyUsage = KeyUsage(5);
    /// TGS-REQ PA-TGS-REQ authenticator checksum over the request body.
    pub const TGS_REQ_AUTHENTICATOR_CHECKSUM: KeyUsage = KeyUsage(6);
    pub const TGS_REQ_AUTHENTICATOR: KeyUsage = KeyUsage(7);
    pub const TGS_REP_ENC_PART_SESSION_KEY: KeyUsage = KeyUsage(8);
    pub const TGS_REP_ENC_PART_SUBKEY: KeyUsage = KeyUsage(9);
    pub const AP_REQ_AUTHENTICATOR_CHECKSUM: KeyUsage = KeyUsage(10);
    pub const AP_REQ_AUTHENTICATOR: KeyUsage = KeyUsage(11);
    pub const AP_REP_ENC_PART: KeyUsage = KeyUsage(12);
    pub const KRB_PRIV_ENC_PART: KeyUsage = KeyUsage(13);
    pub const KRB_CRED_ENC_PART: KeyUsage = KeyUsage(14);
    pub const KRB_SAFE_CHECKSUM: KeyUsage = KeyUsage(15);

    pub const fn new(usage: u32) -> Self {
        KeyUsage(usage)
    }

    pub const fn value(self) -> u32 {
        self.0
    }
}

impl From<u32> for KeyUsage {
    fn from(usage: u32) -> Self {
        KeyUsage(usage)
    }
}

impl fmt::Display for KeyUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw key material bound to its encryption type.
#[derive(Clone, PartialEq, Eq)]
pub struct KerberosKey {
    pub etype: EncryptionType,
    pub kvno: Option<u32>,
    bytes: Vec<u8>,
}

impl KerberosKey {
    pub fn new(etype: EncryptionType, kvno: Option<u32>, bytes: Vec<u8>) -> Self {
        Self { etype, kvno, bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_encryption_key(&self) -> Result<EncryptionKey, KrbError> {
        EncryptionKey::new(self.etype.into(), &self.bytes)
    }

    /// A key carried inside a protocol message (session key, subkey).
    pub fn from_encryption_key(key: &EncryptionKey) -> Result<Self, KrbError> {
        let etype = EncryptionType::try_from(key.key_type).map_err(|_| {
            error!(key_type = key.key_type, "Unknown encryption type for key");
            KrbError::UnsupportedEncryption
        })?;
        Ok(Self::new(etype, None, key.key_value.as_bytes().to_vec()))
    }
}

impl fmt::Debug for KerberosKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KerberosKey")
            .field("etype", &self.etype)
            .field("kvno", &self.kvno)
            .finish_non_exhaustive()
    }
}

/// Cipher and keyed checksum operations for one encryption type.
///
/// Implementations must not distinguish a wrong key, a wrong usage or a damaged
/// ciphertext in their `decrypt` failures.
pub trait CryptoTransform: Send + Sync {
    fn etype(&self) -> EncryptionType;

    /// The keyed checksum that accompanies this encryption type.
    fn checksum_type(&self) -> ChecksumType;

    fn key_size(&self) -> usize;

    fn encrypt(&self, key: &[u8], usage: KeyUsage, plaintext: &[u8]) -> Result<Vec<u8>, KrbError>;

    fn decrypt(
        &self,
        key: &[u8],
        usage: KeyUsage,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, DecryptError>;

    fn checksum(&self, key: &[u8], usage: KeyUsage, data: &[u8]) -> Result<Vec<u8>, KrbError>;

    /// Constant-time comparison of `checksum` against the expected value.
    fn verify_checksum(&self, key: &[u8], usage: KeyUsage, data: &[u8], checksum: &[u8]) -> bool;

    fn random_key(&self) -> KerberosKey;
}

/// The set of transforms available to the envelope and the validator.
#[derive(Clone)]
pub struct CryptoProvider {
    by_etype: BTreeMap<EncryptionType, Arc<dyn CryptoTransform>>,
}

impl Default for CryptoProvider {
    fn default() -> Self {
        let mut provider = CryptoProvider::empty();
        provider.register(Arc::new(Aes256CtsHmacSha196));
        provider
    }
}

impl CryptoProvider {
    pub fn empty() -> Self {
        Self {
            by_etype: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, transform: Arc<dyn CryptoTransform>) {
        self.by_etype.insert(transform.etype(), transform);
    }

    pub fn supported_etypes(&self) -> impl Iterator<Item = EncryptionType> + '_ {
        self.by_etype.keys().copied()
    }

    pub fn transform(&self, etype: EncryptionType) -> Result<&dyn CryptoTransform, KrbError> {
        self.by_etype
            .get(&etype)
            .map(|t| t.as_ref())
            .ok_or_else(|| {
                error!(?etype, "No transform registered for encryption type");
                KrbError::UnsupportedEncryption
            })
    }

    /// Look up a transform by the raw etype number carried in EncryptedData.
    pub fn transform_for(&self, etype: i32) -> Result<&dyn CryptoTransform, KrbError> {
        let etype = EncryptionType::try_from(etype).map_err(|_| {
            error!(etype, "Unknown encryption type");
            KrbError::UnsupportedEncryption
        })?;
        self.transform(etype)
    }

    /// Look up a transform by the raw checksum type carried in a Checksum.
    pub fn checksum_transform(&self, cksumtype: i32) -> Result<&dyn CryptoTransform, KrbError> {
        let cksumtype = ChecksumType::try_from(cksumtype).map_err(|_| {
            error!(cksumtype, "Unknown checksum type");
            KrbError::UnsupportedChecksum
        })?;
        self.by_etype
            .values()
            .find(|t| t.checksum_type() == cksumtype)
            .map(|t| t.as_ref())
            .ok_or_else(|| {
                error!(?cksumtype, "No transform registered for checksum type");
                KrbError::UnsupportedChecksum
            })
    }
}

impl fmt::Debug for CryptoProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.by_etype.keys()).finish()
    }
}
