//! AES256-CTS-HMAC-SHA1-96, RFC 3962.

use super::nfold::nfold;
use super::{CryptoTransform, KerberosKey, KeyUsage};
use crate::asn1::constants::{ChecksumType, EncryptionType};
use crate::constants::{AES_256_KEY_LEN, AES_BLOCK_SIZE, SHA1_HMAC_LEN};
use crate::error::{DecryptError, KrbError};

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockDecryptMut, BlockEncrypt, BlockEncryptMut, KeyInit, KeyIvInit};
use aes::Aes256;
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use rand::Rng;
use sha1::Sha1;
use tracing::{debug, error};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

type Aes256Block = GenericArray<u8, <Aes256 as aes::cipher::BlockSizeUser>::BlockSize>;

type HmacSha1 = Hmac<Sha1>;

type Aes256Key = [u8; AES_256_KEY_LEN];

const IV_ZERO: [u8; AES_BLOCK_SIZE] = [0; AES_BLOCK_SIZE];

/// Well-known constant folded to derive the protocol key from the PBKDF2 output.
const KERBEROS_CONSTANT: &[u8] = b"kerberos";

// Trailing octet of a derivation constant, RFC 3961 section 5.3.
const DERIVE_KC: u8 = 0x99;
const DERIVE_KE: u8 = 0xAA;
const DERIVE_KI: u8 = 0x55;

#[derive(Debug, Clone, Copy, Default)]
pub struct Aes256CtsHmacSha196;

/// Given the users passphrase and the salt (usually the realm followed by the
/// client name components, or the salt from ETYPE-INFO2) derive the users base key.
/// RFC 3962 sets a default iteration count of 0x1000 (4096). That default is
/// INSECURE and callers should use the count the KDC advertises.
pub fn string_to_key_aes256(
    passphrase: &[u8],
    salt: &[u8],
    iter_count: u32,
) -> Result<KerberosKey, KrbError> {
    if passphrase.is_empty() {
        return Err(KrbError::PlaintextEmpty);
    }
    let mut buf = [0u8; AES_256_KEY_LEN];
    pbkdf2_hmac::<Sha1>(passphrase, salt, iter_count, &mut buf);

    let key = derive_key(&buf, KERBEROS_CONSTANT);
    Ok(KerberosKey::new(
        EncryptionType::AES256_CTS_HMAC_SHA1_96,
        None,
        key.to_vec(),
    ))
}

/// DK(base, constant): the folded constant is encrypted, then each output block is
/// encrypted again until there is enough material for a key.
fn derive_key(base: &Aes256Key, constant: &[u8]) -> Aes256Key {
    let folded = nfold(constant, AES_BLOCK_SIZE);
    let cipher = Aes256::new(base.into());

    let mut out = [0u8; AES_256_KEY_LEN];
    let (lower, upper) = out.split_at_mut(AES_BLOCK_SIZE);
    cipher.encrypt_block_b2b(
        Aes256Block::from_slice(&folded),
        Aes256Block::from_mut_slice(lower),
    );
    cipher.encrypt_block_b2b(
        Aes256Block::from_slice(lower),
        Aes256Block::from_mut_slice(upper),
    );
    out
}

fn usage_constant(usage: KeyUsage, kind: u8) -> [u8; 5] {
    let mut constant = [0u8; 5];
    constant[..4].copy_from_slice(&usage.value().to_be_bytes());
    constant[4] = kind;
    constant
}

fn derive_kc(base: &Aes256Key, usage: KeyUsage) -> Aes256Key {
    derive_key(base, &usage_constant(usage, DERIVE_KC))
}

fn derive_ki_ke(base: &Aes256Key, usage: KeyUsage) -> (Aes256Key, Aes256Key) {
    (
        derive_key(base, &usage_constant(usage, DERIVE_KI)),
        derive_key(base, &usage_constant(usage, DERIVE_KE)),
    )
}

fn hmac_sha1(key: &[u8]) -> Result<HmacSha1, KrbError> {
    <HmacSha1 as Mac>::new_from_slice(key).map_err(|_| {
        error!("Invalid hmac-sha1 key length");
        KrbError::InvalidEncryptionKey
    })
}

fn as_key(key: &[u8]) -> Option<&Aes256Key> {
    <&Aes256Key>::try_from(key).ok()
}

/// CBC with ciphertext stealing, the CS3 variant: the last two ciphertext blocks are
/// always swapped and the final one truncated to the plaintext length. `plaintext`
/// must be longer than one block, which the confounder guarantees.
fn encrypt_cts(key: &Aes256Key, plaintext: &[u8]) -> Vec<u8> {
    let mut cipher = Aes256CbcEnc::new(key.into(), &IV_ZERO.into());

    // d is the length of the final, possibly partial, plaintext block.
    let d = match plaintext.len() % AES_BLOCK_SIZE {
        0 => AES_BLOCK_SIZE,
        d => d,
    };
    let (head, p_n) = plaintext.split_at(plaintext.len() - d);

    let mut ciphertext = Vec::with_capacity(plaintext.len());
    let mut block = Aes256Block::default();
    for p in head.chunks(AES_BLOCK_SIZE) {
        block.copy_from_slice(p);
        cipher.encrypt_block_mut(&mut block);
        ciphertext.extend_from_slice(&block);
    }

    // block is now Cn-1. The last block is zero padded and chained as usual.
    let c_n1 = block;
    let mut last = Aes256Block::default();
    last[..d].copy_from_slice(p_n);
    cipher.encrypt_block_mut(&mut last);

    // Swap: Cn takes the place of Cn-1, and Cn-1 is truncated to d.
    let swap_at = ciphertext.len() - AES_BLOCK_SIZE;
    ciphertext.truncate(swap_at);
    ciphertext.extend_from_slice(&last);
    ciphertext.extend_from_slice(&c_n1[..d]);
    ciphertext
}

fn decrypt_cts(key: &Aes256Key, ciphertext: &[u8]) -> Result<Vec<u8>, DecryptError> {
    if ciphertext.len() <= AES_BLOCK_SIZE {
        debug!(len = ciphertext.len(), "Ciphertext too short for cts");
        return Err(DecryptError);
    }

    let d = match ciphertext.len() % AES_BLOCK_SIZE {
        0 => AES_BLOCK_SIZE,
        d => d,
    };
    // C1 .. Cn-2 || Cn || Cn-1*
    let (head, tail) = ciphertext.split_at(ciphertext.len() - d - AES_BLOCK_SIZE);
    let (c_n, c_n1_star) = tail.split_at(AES_BLOCK_SIZE);

    let mut cipher = Aes256CbcDec::new(key.into(), &IV_ZERO.into());
    let mut plaintext = Vec::with_capacity(ciphertext.len());
    let mut block = Aes256Block::default();
    for c in head.chunks(AES_BLOCK_SIZE) {
        block.copy_from_slice(c);
        cipher.decrypt_block_mut(&mut block);
        plaintext.extend_from_slice(&block);
    }

    // Decrypting Cn alone yields Pn xor Cn-1, and the tail of Cn-1 that was stolen.
    let raw = Aes256::new(key.into());
    let mut z = Aes256Block::default();
    raw.decrypt_block_b2b(Aes256Block::from_slice(c_n), &mut z);

    let p_n: Vec<u8> = z[..d]
        .iter()
        .zip(c_n1_star)
        .map(|(z, c)| z ^ c)
        .collect();

    // Rebuild Cn-1 and finish the CBC chain with it.
    let mut c_n1 = Aes256Block::default();
    c_n1[..d].copy_from_slice(c_n1_star);
    c_n1[d..].copy_from_slice(&z[d..]);
    cipher.decrypt_block_mut(&mut c_n1);

    plaintext.extend_from_slice(&c_n1);
    plaintext.extend_from_slice(&p_n);
    Ok(plaintext)
}

impl CryptoTransform for Aes256CtsHmacSha196 {
    fn etype(&self) -> EncryptionType {
        EncryptionType::AES256_CTS_HMAC_SHA1_96
    }

    fn checksum_type(&self) -> ChecksumType {
        ChecksumType::HMAC_SHA1_96_AES256
    }

    fn key_size(&self) -> usize {
        AES_256_KEY_LEN
    }

    fn encrypt(&self, key: &[u8], usage: KeyUsage, plaintext: &[u8]) -> Result<Vec<u8>, KrbError> {
        if plaintext.is_empty() {
            return Err(KrbError::PlaintextEmpty);
        }
        let key = as_key(key).ok_or(KrbError::InvalidEncryptionKey)?;
        let (ki, ke) = derive_ki_ke(key, usage);

        // A random confounder block leads the plaintext.
        let mut confounded = vec![0u8; AES_BLOCK_SIZE + plaintext.len()];
        rand::rng().fill(&mut confounded[..AES_BLOCK_SIZE]);
        confounded[AES_BLOCK_SIZE..].copy_from_slice(plaintext);

        let mut mac = hmac_sha1(&ki)?;
        mac.update(&confounded);
        let tag = mac.finalize().into_bytes();

        let mut ciphertext = encrypt_cts(&ke, &confounded);
        ciphertext.extend_from_slice(&tag[..SHA1_HMAC_LEN]);
        Ok(ciphertext)
    }

    fn decrypt(
        &self,
        key: &[u8],
        usage: KeyUsage,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, DecryptError> {
        let key = as_key(key).ok_or(DecryptError)?;
        let Some((ciphertext, msg_hmac)) = ciphertext.split_last_chunk::<SHA1_HMAC_LEN>() else {
            return Err(DecryptError);
        };

        let (ki, ke) = derive_ki_ke(key, usage);
        let mut plaintext = decrypt_cts(&ke, ciphertext)?;

        let mut mac = hmac_sha1(&ki).map_err(|_| DecryptError)?;
        mac.update(&plaintext);
        mac.verify_truncated_left(msg_hmac).map_err(|_| {
            debug!(%usage, "Integrity check failed");
            DecryptError
        })?;

        // Discard the confounder.
        Ok(plaintext.split_off(AES_BLOCK_SIZE))
    }

    fn checksum(&self, key: &[u8], usage: KeyUsage, data: &[u8]) -> Result<Vec<u8>, KrbError> {
        let key = as_key(key).ok_or(KrbError::InvalidEncryptionKey)?;
        let kc = derive_kc(key, usage);
        let mut mac = hmac_sha1(&kc)?;
        mac.update(data);
        let tag = mac.finalize().into_bytes();
        Ok(tag[..SHA1_HMAC_LEN].to_vec())
    }

    fn verify_checksum(&self, key: &[u8], usage: KeyUsage, data: &[u8], checksum: &[u8]) -> bool {
        if checksum.len() != SHA1_HMAC_LEN {
            return false;
        }
        let Some(key) = as_key(key) else {
            return false;
        };
        let kc = derive_kc(key, usage);
        let Ok(mut mac) = hmac_sha1(&kc) else {
            return false;
        };
        mac.update(data);
        mac.verify_truncated_left(checksum).is_ok()
    }

    fn random_key(&self) -> KerberosKey {
        let mut key = [0u8; AES_256_KEY_LEN];
        rand::rng().fill(&mut key);
        KerberosKey::new(self.etype(), None, key.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asn1::encrypted_data::EncryptedData;
    use crate::asn1::pa_enc_ts_enc::PaEncTsEnc;
    use crate::asn1::DateTime;
    use crate::constants::RFC_PKBDF2_SHA1_ITER;
    use assert_hex::assert_eq_hex;
    use der::Decode;

    fn base_key(passphrase: &str, salt: &str) -> Vec<u8> {
        string_to_key_aes256(passphrase.as_bytes(), salt.as_bytes(), RFC_PKBDF2_SHA1_ITER)
            .expect("Failed to derive key")
            .as_bytes()
            .to_vec()
    }

    #[test]
    fn test_string_to_key_kerbeiros() {
        assert_eq_hex!(
            base_key("Minnie1234", "KINGDOM.HEARTSmickey"),
            hex::decode("d3301f0f2539cc4026a569f8b7c36715c8daef109fa3d8b2e14616aacab549fd")
                .expect("Failed to decode vector")
        );
    }

    // https://www.rfc-editor.org/rfc/rfc3962#appendix-B
    #[test]
    fn test_string_to_key_rfc3962_vectors() {
        for (iter, expected) in [
            (
                1,
                "fe697b52bc0d3ce14432ba036a92e65bbb52280990a2fa27883998d72af30161",
            ),
            (
                1200,
                "55a6ac740ad17b4846941051e1e8b0a7548d93b0ab30a8bc3ff16280382b8c2a",
            ),
        ] {
            let key = string_to_key_aes256(b"password", b"ATHENA.MIT.EDUraeburn", iter)
                .expect("Failed to derive key");
            let expected = hex::decode(expected.replace(' ', "")).expect("Failed to decode vector");
            assert_eq_hex!(key.as_bytes(), expected.as_slice());
        }
    }

    #[test]
    fn test_aes256_cts_hmac_sha1_96_decrypt_vectors() {
        let samples = [
            (
                "admin",
                "admin1234",
                KeyUsage::PA_ENC_TIMESTAMP,
                "29737f3db6bcdfe9990fb2136d3efe6f2100e6c4ac75824299d8d3702f5a2e31c7a336747dfd734a1ea0165ebb27c0d7ce9b5aec7a",
                "336168777a74394d473957564575425643356a306f69367349",
            ),
            (
                "test",
                "test1234",
                KeyUsage::TICKET,
                "3d291c685489e7b75dabdc6e010ad0019db16481b12cb8bfa513619242761f990de2c027661c9833bcced3",
                "6c4a3366746677786a73523532324f",
            ),
        ];

        for (passphrase, salt, usage, ciphertext, plaintext) in samples {
            let key = base_key(passphrase, salt);
            let ciphertext = hex::decode(ciphertext).expect("Failed to decode sample");
            let expected = hex::decode(plaintext.replace(' ', "")).expect("Failed to decode sample");

            let data = Aes256CtsHmacSha196
                .decrypt(&key, usage, &ciphertext)
                .expect("Failed to decrypt");
            assert_eq_hex!(data, expected);

            // The same bytes under another usage do not open.
            let other = KeyUsage::new(usage.value() + 1);
            assert_eq!(
                Aes256CtsHmacSha196.decrypt(&key, other, &ciphertext),
                Err(DecryptError)
            );
        }
    }

    #[test]
    fn test_aes256_cts_hmac_sha1_96_reflexive() {
        let key = base_key("test", "test1234");
        // Half a block, exactly one block, block aligned and unaligned multiples.
        for len in [1usize, 8, 15, 16, 17, 32, 49, 64] {
            let input_data = vec![0xa5u8; len];
            let usage = KeyUsage::new(len as u32);
            let enc_data = Aes256CtsHmacSha196
                .encrypt(&key, usage, &input_data)
                .expect("Failed to encrypt");
            assert_eq!(enc_data.len(), AES_BLOCK_SIZE + len + SHA1_HMAC_LEN);
            let data = Aes256CtsHmacSha196
                .decrypt(&key, usage, &enc_data)
                .expect("Failed to decrypt");
            assert_eq!(data, input_data);
        }
    }

    #[test]
    fn test_aes256_cts_hmac_sha1_96_tamper() {
        let key = base_key("test", "test1234");
        let enc_data = Aes256CtsHmacSha196
            .encrypt(&key, KeyUsage::AP_REQ_AUTHENTICATOR, b"authenticator bytes")
            .expect("Failed to encrypt");

        for i in [0, AES_BLOCK_SIZE, enc_data.len() - 1] {
            let mut damaged = enc_data.clone();
            damaged[i] ^= 0x01;
            assert_eq!(
                Aes256CtsHmacSha196.decrypt(&key, KeyUsage::AP_REQ_AUTHENTICATOR, &damaged),
                Err(DecryptError)
            );
        }

        let wrong_key = base_key("test", "test12345");
        assert_eq!(
            Aes256CtsHmacSha196.decrypt(&wrong_key, KeyUsage::AP_REQ_AUTHENTICATOR, &enc_data),
            Err(DecryptError)
        );
        assert_eq!(
            Aes256CtsHmacSha196.decrypt(&key, KeyUsage::AP_REQ_AUTHENTICATOR, &enc_data[..20]),
            Err(DecryptError)
        );
        assert_eq!(
            Aes256CtsHmacSha196.encrypt(&key, KeyUsage::AP_REQ_AUTHENTICATOR, &[]),
            Err(KrbError::PlaintextEmpty)
        );
    }

    #[test]
    fn test_aes256_cts_hmac_sha1_pa_enc_timestamp_decrypt() {
        let blob = hex::decode("3041a003020112a23a0438a708af058781f75eb72d318ecae2f2830aa8ad4c659faeb477e29e131f923db70a33247ed25aa9d7dda218bcdbdf2203e2125fce1465265e")
            .expect("Failed to decode sample");
        let edata = EncryptedData::from_der(&blob).expect("Failed to decode");

        let key = base_key("Suse1234", "AFOREST.ADuser1");
        let data = Aes256CtsHmacSha196
            .decrypt(&key, KeyUsage::PA_ENC_TIMESTAMP, edata.cipher.as_bytes())
            .expect("Failed to decrypt");

        let pa_enc_ts_enc = PaEncTsEnc::from_der(&data).expect("Failed to decode");
        assert_eq!(
            pa_enc_ts_enc.patimestamp.to_date_time(),
            DateTime::new(2024, 6, 12, 11, 48, 7).expect("Invalid datetime")
        );
        assert_eq!(pa_enc_ts_enc.pausec.map(u32::from), Some(751259));
    }

    #[test]
    fn test_checksum_dk_hmac_sha1_96() {
        let input = hex::decode("3067a00703050000810000a20d1b0b4558414d504c452e434f4da3253023a003020103a11c301a1b04686f73741b127065707065722e6578616d706c652e636f6da511180f32303234313031303230333832335aa7060204769220c1a80b3009020112020113020114")
            .expect("Failed to decode sample");
        let base_key = hex::decode("3C4EEFA91060DC4000582C17885AA63A58CD5A57C5CD3E7601A0587E7E05F9D0")
            .expect("Failed to decode sample");
        let derived_key = hex::decode("14AD9322E8134937815FB995067F8C1859A8237C599E450F2BC1E99330C94232")
            .expect("Failed to decode sample");
        let checksum = hex::decode("351E56F9FA207CDCA62A0BDC").expect("Failed to decode sample");

        let base: &Aes256Key = as_key(&base_key).expect("Invalid key length");
        let kc = derive_kc(base, KeyUsage::TGS_REQ_AUTHENTICATOR_CHECKSUM);
        assert_eq_hex!(kc.as_slice(), derived_key.as_slice());

        let computed = Aes256CtsHmacSha196
            .checksum(&base_key, KeyUsage::TGS_REQ_AUTHENTICATOR_CHECKSUM, &input)
            .expect("Failed to checksum");
        assert_eq_hex!(computed, checksum);

        assert!(Aes256CtsHmacSha196.verify_checksum(
            &base_key,
            KeyUsage::TGS_REQ_AUTHENTICATOR_CHECKSUM,
            &input,
            &checksum
        ));
        assert!(!Aes256CtsHmacSha196.verify_checksum(
            &base_key,
            KeyUsage::KRB_SAFE_CHECKSUM,
            &input,
            &checksum
        ));
        // A truncated tag must not pass as a prefix match.
        assert!(!Aes256CtsHmacSha196.verify_checksum(
            &base_key,
            KeyUsage::TGS_REQ_AUTHENTICATOR_CHECKSUM,
            &input,
            &checksum[..4]
        ));
    }
}
