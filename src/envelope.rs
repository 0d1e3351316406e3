//! Key-usage scoped encryption of protocol entities.
//!
//! The caller always names the usage. Nothing here infers it from the structure
//! being protected, so a ciphertext sealed under one usage will only open under
//! that same usage.

use crate::asn1::checksum::Checksum;
use crate::asn1::encrypted_data::EncryptedData;
use crate::crypto::{CryptoProvider, KerberosKey, KeyUsage};
use crate::error::{DecryptError, KrbError, ValidationError};
use der::{Decode, Encode};
use tracing::{debug, error, trace};

/// Encrypt `plaintext` under `key` and `usage`. The envelope records the key's
/// encryption type and version.
pub fn encrypt(
    plaintext: &[u8],
    key: &KerberosKey,
    usage: KeyUsage,
    provider: &CryptoProvider,
) -> Result<EncryptedData, KrbError> {
    let transform = provider.transform(key.etype)?;
    let cipher = transform.encrypt(key.as_bytes(), usage, plaintext)?;
    trace!(etype = ?key.etype, %usage, len = cipher.len(), "sealed envelope");
    EncryptedData::new(key.etype.into(), key.kvno, cipher)
}

/// Decrypt an envelope. Every failure, including an envelope whose encryption type
/// does not match the key, is the same [`DecryptError`].
pub fn decrypt(
    envelope: &EncryptedData,
    key: &KerberosKey,
    usage: KeyUsage,
    provider: &CryptoProvider,
) -> Result<Vec<u8>, DecryptError> {
    if envelope.etype != i32::from(key.etype) {
        debug!(
            envelope_etype = envelope.etype,
            key_etype = ?key.etype,
            "Envelope and key encryption types differ"
        );
        return Err(DecryptError);
    }
    let transform = provider.transform(key.etype).map_err(|_| DecryptError)?;
    transform.decrypt(key.as_bytes(), usage, envelope.cipher.as_bytes())
}

/// Encode `entity` and encrypt the result.
pub fn seal<T: Encode>(
    entity: &T,
    key: &KerberosKey,
    usage: KeyUsage,
    provider: &CryptoProvider,
) -> Result<EncryptedData, KrbError> {
    let plaintext = entity.to_der().map_err(|err| {
        error!(?err, "Unable to encode entity for encryption");
        KrbError::DerEncodeMessage
    })?;
    encrypt(&plaintext, key, usage, provider)
}

/// Decrypt an envelope and decode the plaintext as `T`. The plaintext must hold
/// exactly one `T`.
pub fn open<T>(
    envelope: &EncryptedData,
    key: &KerberosKey,
    usage: KeyUsage,
    provider: &CryptoProvider,
) -> Result<T, KrbError>
where
    T: for<'a> Decode<'a, Error = der::Error>,
{
    let plaintext = decrypt(envelope, key, usage, provider)?;
    T::from_der(&plaintext).map_err(KrbError::from)
}

/// Keyed checksum over `data`, of the checksum type paired with the key's
/// encryption type.
pub fn checksum(
    data: &[u8],
    key: &KerberosKey,
    usage: KeyUsage,
    provider: &CryptoProvider,
) -> Result<Checksum, KrbError> {
    let transform = provider.transform(key.etype)?;
    let value = transform.checksum(key.as_bytes(), usage, data)?;
    Checksum::new(transform.checksum_type().into(), value)
}

/// Verify a received checksum. The transform is chosen by the checksum's own type.
pub fn verify_checksum(
    cksum: &Checksum,
    data: &[u8],
    key: &KerberosKey,
    usage: KeyUsage,
    provider: &CryptoProvider,
) -> Result<(), KrbError> {
    let transform = provider.checksum_transform(cksum.checksum_type)?;
    if transform.etype() != key.etype {
        debug!(
            cksumtype = cksum.checksum_type,
            key_etype = ?key.etype,
            "Checksum type does not belong to the key"
        );
        return Err(ValidationError::ChecksumMismatch.into());
    }
    if transform.verify_checksum(key.as_bytes(), usage, data, cksum.checksum.as_bytes()) {
        Ok(())
    } else {
        debug!(%usage, "Checksum mismatch");
        Err(ValidationError::ChecksumMismatch.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asn1::constants::EncryptionType;
    use crate::asn1::pa_enc_ts_enc::PaEncTsEnc;
    use crate::crypto::string_to_key_aes256;
    use crate::constants::RFC_PKBDF2_SHA1_ITER;
    use std::time::{Duration, UNIX_EPOCH};

    fn client_key() -> KerberosKey {
        string_to_key_aes256(b"password", b"EXAMPLE.COMtestuser_preauth", RFC_PKBDF2_SHA1_ITER)
            .expect("Failed to derive key")
    }

    #[test]
    fn open_captured_pa_enc_timestamp() {
        let cipher = hex::decode("b736f4dba847718b9f634b7ac94d5d691663164d877a0d875b94f786222ae9dca8cf68a972cfe6b5bec1c29682ec3c507307e7c32eedc032")
            .expect("Failed to decode sample");
        let envelope = EncryptedData::new(18, None, cipher).expect("Invalid envelope");
        let provider = CryptoProvider::default();

        let ts: PaEncTsEnc = open(&envelope, &client_key(), KeyUsage::PA_ENC_TIMESTAMP, &provider)
            .expect("Failed to open");
        assert!(ts.to_system_time() > UNIX_EPOCH);

        assert_eq!(
            open::<PaEncTsEnc>(&envelope, &client_key(), KeyUsage::TICKET, &provider),
            Err(KrbError::Decrypt(DecryptError))
        );
    }

    #[test]
    fn seal_then_open_respects_usage() {
        let provider = CryptoProvider::default();
        let key = client_key();
        let ts = PaEncTsEnc::from_system_time(UNIX_EPOCH + Duration::from_secs(1_718_192_887))
            .expect("Invalid timestamp");

        let envelope =
            seal(&ts, &key, KeyUsage::PA_ENC_TIMESTAMP, &provider).expect("Failed to seal");
        assert_eq!(envelope.etype, 18);
        assert_eq!(envelope.kvno, None);

        let back: PaEncTsEnc = open(&envelope, &key, KeyUsage::PA_ENC_TIMESTAMP, &provider)
            .expect("Failed to open");
        assert_eq!(back, ts);

        // Identical key material, different usage.
        assert_eq!(
            decrypt(&envelope, &key, KeyUsage::AS_REP_ENC_PART, &provider),
            Err(DecryptError)
        );
    }

    #[test]
    fn decrypt_rejects_foreign_etype() {
        let provider = CryptoProvider::default();
        let key = client_key();
        let mut envelope =
            encrypt(b"payload", &key, KeyUsage::KRB_PRIV_ENC_PART, &provider).expect("Failed to encrypt");
        envelope.etype = EncryptionType::AES128_CTS_HMAC_SHA1_96.into();
        assert_eq!(
            decrypt(&envelope, &key, KeyUsage::KRB_PRIV_ENC_PART, &provider),
            Err(DecryptError)
        );

        let rc4 = KerberosKey::new(EncryptionType::RC4_HMAC, None, vec![0; 16]);
        assert_eq!(
            encrypt(b"payload", &rc4, KeyUsage::KRB_PRIV_ENC_PART, &provider),
            Err(KrbError::UnsupportedEncryption)
        );
    }

    #[test]
    fn checksum_round_trip() {
        let provider = CryptoProvider::default();
        let key = client_key();
        let data = b"KRB-SAFE body bytes";

        let cksum = checksum(data, &key, KeyUsage::KRB_SAFE_CHECKSUM, &provider)
            .expect("Failed to checksum");
        assert_eq!(cksum.checksum_type, 16);
        assert!(verify_checksum(&cksum, data, &key, KeyUsage::KRB_SAFE_CHECKSUM, &provider).is_ok());
        assert_eq!(
            verify_checksum(&cksum, b"other", &key, KeyUsage::KRB_SAFE_CHECKSUM, &provider),
            Err(KrbError::Validation(ValidationError::ChecksumMismatch))
        );
        assert_eq!(
            verify_checksum(
                &cksum,
                data,
                &key,
                KeyUsage::TGS_REQ_AUTHENTICATOR_CHECKSUM,
                &provider
            ),
            Err(KrbError::Validation(ValidationError::ChecksumMismatch))
        );
    }
}
