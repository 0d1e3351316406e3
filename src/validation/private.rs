//! KRB-PRIV, KRB-SAFE and KRB-CRED under an established session key.

use super::{check_msg_type, check_pvno, check_sequence};
use crate::asn1::checksum::Checksum;
use crate::asn1::constants::KrbMessageType;
use crate::asn1::host_address::HostAddress;
use crate::asn1::kerberos_time::{join_system_time, split_system_time, KerberosTime};
use crate::asn1::krb_cred::{EncKrbCredPart, EncKrbCredPartInner, KrbCred, KrbCredInner};
use crate::asn1::krb_priv::{EncKrbPrivPart, EncKrbPrivPartInner, KrbPriv, KrbPrivInner};
use crate::asn1::krb_safe::{KrbSafe, KrbSafeBody, KrbSafeInner};
use crate::asn1::microseconds::Microseconds;
use crate::asn1::ticket::Ticket;
use crate::asn1::OctetString;
use crate::crypto::{CryptoProvider, KerberosKey, KeyUsage};
use crate::envelope;
use crate::error::{DecodeError, KrbError, ValidationError};
use crate::time;
use std::time::{Duration, SystemTime};
use tracing::debug;

/// What the receiver expects of the next message in a session.
#[derive(Debug, Clone, Copy)]
pub struct SessionExpectations {
    /// Checked only when the message also carries a sequence number.
    pub seq_number: Option<u32>,
    pub now: SystemTime,
    pub skew: Duration,
}

fn check_timestamp(
    timestamp: Option<&KerberosTime>,
    usec: Option<Microseconds>,
    expect: &SessionExpectations,
) -> Result<(), ValidationError> {
    if let Some(timestamp) = timestamp {
        let sent = join_system_time(timestamp, usec.unwrap_or_default());
        if !time::within_skew(sent, expect.now, expect.skew) {
            debug!("Message timestamp is outside the clock skew");
            return Err(ValidationError::ClockSkewExceeded);
        }
    }
    Ok(())
}

fn split_optional(
    timestamp: Option<SystemTime>,
) -> Result<(Option<KerberosTime>, Option<Microseconds>), KrbError> {
    match timestamp {
        Some(t) => {
            let (ktime, usec) = split_system_time(t)?;
            Ok((Some(ktime), Some(usec)))
        }
        None => Ok((None, None)),
    }
}

fn user_data(data: &[u8]) -> Result<OctetString, KrbError> {
    OctetString::new(data).map_err(|_| KrbError::DerEncodeOctetString)
}

pub fn seal_krb_priv(
    data: &[u8],
    s_address: HostAddress,
    seq_number: Option<u32>,
    timestamp: Option<SystemTime>,
    key: &KerberosKey,
    provider: &CryptoProvider,
) -> Result<KrbPriv, KrbError> {
    let (timestamp, usec) = split_optional(timestamp)?;
    let part = EncKrbPrivPart::new(EncKrbPrivPartInner {
        user_data: user_data(data)?,
        timestamp,
        usec,
        seq_number,
        s_address,
        r_address: None,
    });
    let enc_part = envelope::seal(&part, key, KeyUsage::KRB_PRIV_ENC_PART, provider)?;
    Ok(KrbPriv::new(KrbPrivInner::new(enc_part)))
}

pub fn open_krb_priv(
    msg: &KrbPriv,
    key: &KerberosKey,
    expect: &SessionExpectations,
    provider: &CryptoProvider,
) -> Result<EncKrbPrivPartInner, KrbError> {
    check_pvno(msg.pvno)?;
    check_msg_type(msg.msg_type, KrbMessageType::KrbPriv)?;

    let part: EncKrbPrivPart =
        envelope::open(&msg.enc_part, key, KeyUsage::KRB_PRIV_ENC_PART, provider)?;
    let part = part.into_inner();

    check_timestamp(part.timestamp.as_ref(), part.usec, expect)?;
    check_sequence(part.seq_number, expect.seq_number)?;
    Ok(part)
}

/// Build a KRB-SAFE whose checksum covers the DER encoding of its body.
pub fn build_krb_safe(
    data: &[u8],
    s_address: HostAddress,
    seq_number: Option<u32>,
    timestamp: Option<SystemTime>,
    key: &KerberosKey,
    provider: &CryptoProvider,
) -> Result<KrbSafe, KrbError> {
    let (timestamp, usec) = split_optional(timestamp)?;
    let body = KrbSafeBody {
        user_data: user_data(data)?,
        timestamp,
        usec,
        seq_number,
        s_address,
        r_address: None,
    };
    let cksum: Checksum = envelope::checksum(
        &crate::asn1::encode(&body)?,
        key,
        KeyUsage::KRB_SAFE_CHECKSUM,
        provider,
    )?;
    Ok(KrbSafe::new(KrbSafeInner::new(body, cksum)))
}

pub fn verify_krb_safe(
    msg: &KrbSafe,
    key: &KerberosKey,
    expect: &SessionExpectations,
    provider: &CryptoProvider,
) -> Result<KrbSafeBody, KrbError> {
    check_pvno(msg.pvno)?;
    check_msg_type(msg.msg_type, KrbMessageType::KrbSafe)?;

    let body = crate::asn1::encode(&msg.safe_body)?;
    envelope::verify_checksum(&msg.cksum, &body, key, KeyUsage::KRB_SAFE_CHECKSUM, provider)?;

    let body = msg.safe_body.clone();
    check_timestamp(body.timestamp.as_ref(), body.usec, expect)?;
    check_sequence(body.seq_number, expect.seq_number)?;
    Ok(body)
}

pub fn seal_krb_cred(
    tickets: Vec<Ticket>,
    part: EncKrbCredPartInner,
    key: &KerberosKey,
    provider: &CryptoProvider,
) -> Result<KrbCred, KrbError> {
    let enc_part = envelope::seal(
        &EncKrbCredPart::new(part),
        key,
        KeyUsage::KRB_CRED_ENC_PART,
        provider,
    )?;
    Ok(KrbCred::new(KrbCredInner::new(tickets, enc_part)))
}

/// Open a KRB-CRED. The nonce is compared only when both sides have one.
pub fn open_krb_cred(
    msg: &KrbCred,
    key: &KerberosKey,
    nonce: Option<u32>,
    provider: &CryptoProvider,
) -> Result<EncKrbCredPartInner, KrbError> {
    check_pvno(msg.pvno)?;
    check_msg_type(msg.msg_type, KrbMessageType::KrbCred)?;

    let part: EncKrbCredPart =
        envelope::open(&msg.enc_part, key, KeyUsage::KRB_CRED_ENC_PART, provider)?;
    let part = part.into_inner();

    if let (Some(received), Some(expected)) = (part.nonce, nonce) {
        if received != expected {
            debug!(received, expected, "KRB-CRED nonce mismatch");
            return Err(ValidationError::NonceMismatch.into());
        }
    }
    if part.ticket_info.len() != msg.tickets.len() {
        debug!(
            infos = part.ticket_info.len(),
            tickets = msg.tickets.len(),
            "KRB-CRED ticket count differs from its credential info"
        );
        return Err(DecodeError::Malformed.into());
    }
    Ok(part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asn1::encrypted_data::EncryptedData;
    use crate::asn1::host_address::ADDR_TYPE_IPV4;
    use crate::asn1::krb_cred::KrbCredInfo;
    use crate::asn1::ticket::TicketInner;
    use crate::crypto::{Aes256CtsHmacSha196, CryptoTransform};
    use crate::validation::tests::{client_name, service_name, REALM};
    use std::time::UNIX_EPOCH;

    fn now() -> SystemTime {
        UNIX_EPOCH + Duration::from_micros(1_718_192_887_751_259)
    }

    fn addr() -> HostAddress {
        HostAddress {
            addr_type: ADDR_TYPE_IPV4,
            address: OctetString::new(vec![192, 0, 2, 10]).expect("Invalid address"),
        }
    }

    fn expect(seq_number: Option<u32>) -> SessionExpectations {
        SessionExpectations {
            seq_number,
            now: now(),
            skew: Duration::from_secs(300),
        }
    }

    #[test]
    fn krb_priv_sequence_and_time() {
        let provider = CryptoProvider::default();
        let key = Aes256CtsHmacSha196.random_key();

        let msg = seal_krb_priv(b"hello", addr(), Some(42), Some(now()), &key, &provider)
            .expect("Failed to seal KRB-PRIV");
        let bytes = crate::asn1::encode(&msg).expect("Failed to encode");
        assert_eq!(bytes[0], 0x75);

        let part = open_krb_priv(&msg, &key, &expect(Some(42)), &provider)
            .expect("Failed to open KRB-PRIV");
        assert_eq!(part.user_data.as_bytes(), b"hello");
        // No expectation, no check.
        assert!(open_krb_priv(&msg, &key, &expect(None), &provider).is_ok());
        assert_eq!(
            open_krb_priv(&msg, &key, &expect(Some(43)), &provider).err(),
            Some(KrbError::Validation(ValidationError::SequenceMismatch))
        );

        let stale = SessionExpectations {
            now: now() + Duration::from_secs(301),
            ..expect(Some(42))
        };
        assert_eq!(
            open_krb_priv(&msg, &key, &stale, &provider).err(),
            Some(KrbError::Validation(ValidationError::ClockSkewExceeded))
        );

        // KRB-PRIV is not opened with the KRB-CRED usage.
        let wrong = KrbPriv::new(KrbPrivInner::new(
            envelope::seal(
                &EncKrbPrivPart::new(part),
                &key,
                KeyUsage::KRB_CRED_ENC_PART,
                &provider,
            )
            .expect("Failed to seal"),
        ));
        assert!(matches!(
            open_krb_priv(&wrong, &key, &expect(None), &provider),
            Err(KrbError::Decrypt(_))
        ));
    }

    #[test]
    fn krb_safe_detects_tampering() {
        let provider = CryptoProvider::default();
        let key = Aes256CtsHmacSha196.random_key();

        let msg = build_krb_safe(b"payload", addr(), Some(1), None, &key, &provider)
            .expect("Failed to build KRB-SAFE");
        let body = verify_krb_safe(&msg, &key, &expect(Some(1)), &provider)
            .expect("Failed to verify KRB-SAFE");
        assert_eq!(body.user_data.as_bytes(), b"payload");

        let mut inner = msg.into_inner();
        inner.safe_body.user_data = OctetString::new(b"payloae".to_vec()).expect("Invalid data");
        let tampered = KrbSafe::new(inner);
        assert_eq!(
            verify_krb_safe(&tampered, &key, &expect(Some(1)), &provider).err(),
            Some(KrbError::Validation(ValidationError::ChecksumMismatch))
        );
    }

    #[test]
    fn krb_cred_nonce() {
        let provider = CryptoProvider::default();
        let key = Aes256CtsHmacSha196.random_key();
        let ticket = Ticket::new(TicketInner::new(
            REALM.parse().expect("Invalid realm"),
            service_name(),
            EncryptedData::new(18, Some(2), vec![0x11; 48])
                .expect("Invalid data"),
        ));
        let info = KrbCredInfo {
            key: Aes256CtsHmacSha196
                .random_key()
                .to_encryption_key()
                .expect("Invalid key"),
            prealm: Some(REALM.parse().expect("Invalid realm")),
            pname: Some(client_name()),
            flags: None,
            auth_time: None,
            start_time: None,
            end_time: None,
            renew_till: None,
            srealm: Some(REALM.parse().expect("Invalid realm")),
            sname: Some(service_name()),
            caddr: None,
        };
        let part = EncKrbCredPartInner {
            ticket_info: vec![info],
            nonce: Some(9),
            timestamp: None,
            usec: None,
            s_address: None,
            r_address: None,
        };

        let msg = seal_krb_cred(vec![ticket], part.clone(), &key, &provider)
            .expect("Failed to seal KRB-CRED");
        assert_eq!(
            open_krb_cred(&msg, &key, Some(9), &provider).expect("Failed to open KRB-CRED"),
            part
        );
        assert!(open_krb_cred(&msg, &key, None, &provider).is_ok());
        assert_eq!(
            open_krb_cred(&msg, &key, Some(10), &provider).err(),
            Some(KrbError::Validation(ValidationError::NonceMismatch))
        );
    }
}
