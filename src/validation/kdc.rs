//! Checks on the KDC exchanges: the client's view of AS-REP and TGS-REP, and the
//! KDC's view of PA-ENC-TIMESTAMP and the PA-TGS-REQ body checksum.

use super::{check_msg_type, check_pvno};
use crate::asn1::ap_req::ApReq;
use crate::asn1::authenticator::AuthenticatorInner;
use crate::asn1::constants::{KrbMessageType, PaDataType};
use crate::asn1::enc_kdc_rep_part::{EncKdcRepPart, TaggedEncKdcRepPart};
use crate::asn1::encrypted_data::EncryptedData;
use crate::asn1::kdc_rep::KdcRep;
use crate::asn1::kdc_req::KdcReq;
use crate::asn1::pa_enc_ts_enc::PaEncTsEnc;
use crate::crypto::{CryptoProvider, KerberosKey, KeyUsage};
use crate::envelope;
use crate::error::{KrbError, ValidationError};
use crate::time;
use std::time::{Duration, SystemTime};
use tracing::{debug, instrument};

fn open_kdc_rep(
    rep: &KdcRep,
    key: &KerberosKey,
    usage: KeyUsage,
    nonce: u32,
    provider: &CryptoProvider,
) -> Result<EncKdcRepPart, KrbError> {
    // Some KDCs tag the AS-REP body as EncTGSRepPart, so either tag is accepted.
    let part: TaggedEncKdcRepPart = envelope::open(&rep.enc_part, key, usage, provider)?;
    let part = part.into_enc_part();

    if part.nonce != nonce {
        debug!(
            received = part.nonce.get(),
            expected = nonce,
            "KDC reply nonce does not match the request"
        );
        return Err(ValidationError::NonceMismatch.into());
    }
    Ok(part)
}

/// Open an AS-REP with the client's long-term key and check it answers the request
/// carrying `nonce`.
#[instrument(level = "debug", skip_all)]
pub fn open_as_rep(
    rep: &KdcRep,
    client_key: &KerberosKey,
    nonce: u32,
    provider: &CryptoProvider,
) -> Result<EncKdcRepPart, KrbError> {
    check_pvno(rep.pvno)?;
    check_msg_type(rep.msg_type, KrbMessageType::KrbAsRep)?;
    open_kdc_rep(rep, client_key, KeyUsage::AS_REP_ENC_PART, nonce, provider)
}

/// Open a TGS-REP. When the TGS-REQ authenticator carried a subkey the reply is
/// sealed under it, otherwise under the TGT session key.
#[instrument(level = "debug", skip_all)]
pub fn open_tgs_rep(
    rep: &KdcRep,
    session_key: &KerberosKey,
    subkey: Option<&KerberosKey>,
    nonce: u32,
    provider: &CryptoProvider,
) -> Result<EncKdcRepPart, KrbError> {
    check_pvno(rep.pvno)?;
    check_msg_type(rep.msg_type, KrbMessageType::KrbTgsRep)?;
    match subkey {
        Some(subkey) => open_kdc_rep(
            rep,
            subkey,
            KeyUsage::TGS_REP_ENC_PART_SUBKEY,
            nonce,
            provider,
        ),
        None => open_kdc_rep(
            rep,
            session_key,
            KeyUsage::TGS_REP_ENC_PART_SESSION_KEY,
            nonce,
            provider,
        ),
    }
}

/// Decrypt the PA-ENC-TIMESTAMP of an AS-REQ and check the client's clock is within
/// `skew` of `now`. Returns the client's time.
#[instrument(level = "debug", skip_all)]
pub fn verify_pa_enc_timestamp(
    req: &KdcReq,
    client_key: &KerberosKey,
    now: SystemTime,
    skew: Duration,
    provider: &CryptoProvider,
) -> Result<SystemTime, KrbError> {
    check_pvno(req.pvno)?;
    check_msg_type(req.msg_type, KrbMessageType::KrbAsReq)?;

    let padata = req
        .find_padata(PaDataType::PaEncTimestamp)
        .ok_or(KrbError::PreauthRequired)?;
    let enc: EncryptedData = crate::asn1::decode(padata.padata_value.as_bytes())?;
    let ts: PaEncTsEnc = envelope::open(&enc, client_key, KeyUsage::PA_ENC_TIMESTAMP, provider)?;

    let client_time = ts.to_system_time();
    if !time::within_skew(client_time, now, skew) {
        debug!("Pre-authentication timestamp is outside the clock skew");
        return Err(ValidationError::ClockSkewExceeded.into());
    }
    Ok(client_time)
}

/// The AP-REQ a TGS-REQ carries in its PA-TGS-REQ padata.
pub fn tgs_req_ap_req(req: &KdcReq) -> Result<ApReq, KrbError> {
    check_pvno(req.pvno)?;
    check_msg_type(req.msg_type, KrbMessageType::KrbTgsReq)?;
    let padata = req.find_padata(PaDataType::PaTgsReq).ok_or_else(|| {
        debug!("TGS-REQ without PA-TGS-REQ");
        KrbError::PreauthRequired
    })?;
    crate::asn1::decode(padata.padata_value.as_bytes()).map_err(KrbError::from)
}

/// Check the authenticator of a TGS-REQ binds the request body it travelled with.
/// The checksum covers the body bytes exactly as received.
pub fn verify_tgs_req_checksum(
    req: &KdcReq,
    authenticator: &AuthenticatorInner,
    session_key: &KerberosKey,
    provider: &CryptoProvider,
) -> Result<(), KrbError> {
    let cksum = authenticator.cksum.as_ref().ok_or_else(|| {
        debug!("TGS-REQ authenticator has no checksum");
        ValidationError::ChecksumMismatch
    })?;
    let body = req.body_bytes()?;
    envelope::verify_checksum(
        cksum,
        &body,
        session_key,
        KeyUsage::TGS_REQ_AUTHENTICATOR_CHECKSUM,
        provider,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asn1::constants::EncryptionType;
    use crate::asn1::encryption_key::EncryptionKey;
    use crate::asn1::kdc_options::KdcOptions;
    use crate::asn1::kdc_req_body::KdcReqBody;
    use crate::asn1::kerberos_time::kerberos_time;
    use crate::asn1::nonce::Nonce;
    use crate::asn1::pa_data::PaData;
    use crate::asn1::ticket::{Ticket, TicketInner};
    use crate::asn1::ticket_flags::TicketFlags;
    use crate::constants::PVNO;
    use crate::crypto::{string_to_key_aes256, Aes256CtsHmacSha196, CryptoTransform};
    use crate::validation::tests::{auth_time, client_name, service_name, Fixture, REALM};
    use crate::validation::ApReqValidator;
    use std::time::{Duration, UNIX_EPOCH};

    const NONCE: u32 = 779214421;

    fn enc_part(key: &EncryptionKey) -> EncKdcRepPart {
        let t = auth_time();
        EncKdcRepPart {
            key: key.clone(),
            last_req: Vec::new(),
            nonce: Nonce::new(NONCE),
            key_expiration: None,
            flags: TicketFlags::Initial | TicketFlags::PreAuthent,
            auth_time: kerberos_time(t).expect("Invalid time"),
            start_time: None,
            end_time: kerberos_time(t + Duration::from_secs(36000)).expect("Invalid time"),
            renew_till: None,
            server_realm: REALM.parse().expect("Invalid realm"),
            server_name: service_name(),
            client_addresses: None,
            encrypted_pa_data: None,
        }
    }

    fn kdc_rep(msg_type: KrbMessageType, enc_part: EncryptedData) -> KdcRep {
        KdcRep {
            pvno: PVNO,
            msg_type: msg_type.into(),
            padata: None,
            crealm: REALM.parse().expect("Invalid realm"),
            cname: client_name(),
            ticket: Ticket::new(TicketInner::new(
                REALM.parse().expect("Invalid realm"),
                service_name(),
                EncryptedData::new(18, Some(1), vec![0xaa; 64]).expect("Invalid data"),
            )),
            enc_part,
        }
    }

    fn req_body() -> KdcReqBody {
        KdcReqBody {
            kdc_options: KdcOptions::Forwardable | KdcOptions::Renewable,
            cname: Some(client_name()),
            realm: REALM.parse().expect("Invalid realm"),
            sname: Some(service_name()),
            from: None,
            till: kerberos_time(auth_time() + Duration::from_secs(36000)).expect("Invalid time"),
            rtime: None,
            nonce: Nonce::new(NONCE),
            etype: vec![EncryptionType::AES256_CTS_HMAC_SHA1_96.into()],
            addresses: None,
            enc_authorization_data: None,
            additional_tickets: None,
        }
    }

    #[test]
    fn as_rep_nonce_and_tag() {
        let provider = CryptoProvider::default();
        let client_key = string_to_key_aes256(b"password", b"EXAMPLE.COMalice", 0x1000)
            .expect("Failed to derive key");
        let session = Aes256CtsHmacSha196
            .random_key()
            .to_encryption_key()
            .expect("Invalid key");
        let part = enc_part(&session);

        for tagged in [
            TaggedEncKdcRepPart::EncAsRepPart(part.clone()),
            TaggedEncKdcRepPart::EncTgsRepPart(part.clone()),
        ] {
            let sealed = envelope::seal(&tagged, &client_key, KeyUsage::AS_REP_ENC_PART, &provider)
                .expect("Failed to seal");
            let rep = kdc_rep(KrbMessageType::KrbAsRep, sealed);
            let opened =
                open_as_rep(&rep, &client_key, NONCE, &provider).expect("Failed to open AS-REP");
            assert_eq!(opened, part);

            assert_eq!(
                open_as_rep(&rep, &client_key, NONCE + 1, &provider).err(),
                Some(KrbError::Validation(ValidationError::NonceMismatch))
            );
        }

        // The TGS usage does not open an AS-REP.
        let sealed = envelope::seal(
            &TaggedEncKdcRepPart::EncAsRepPart(part),
            &client_key,
            KeyUsage::TGS_REP_ENC_PART_SESSION_KEY,
            &provider,
        )
        .expect("Failed to seal");
        let rep = kdc_rep(KrbMessageType::KrbAsRep, sealed);
        assert!(matches!(
            open_as_rep(&rep, &client_key, NONCE, &provider),
            Err(KrbError::Decrypt(_))
        ));
        let mut rep = rep;
        rep.msg_type = KrbMessageType::KrbTgsRep.into();
        assert_eq!(
            open_as_rep(&rep, &client_key, NONCE, &provider).err(),
            Some(KrbError::InvalidMessageType)
        );
    }

    #[test]
    fn tgs_rep_prefers_subkey() {
        let provider = CryptoProvider::default();
        let session_key = Aes256CtsHmacSha196.random_key();
        let subkey = Aes256CtsHmacSha196.random_key();
        let part = enc_part(&Aes256CtsHmacSha196
            .random_key()
            .to_encryption_key()
            .expect("Invalid key"));
        let tagged = TaggedEncKdcRepPart::EncTgsRepPart(part.clone());

        let sealed = envelope::seal(
            &tagged,
            &subkey,
            KeyUsage::TGS_REP_ENC_PART_SUBKEY,
            &provider,
        )
        .expect("Failed to seal");
        let rep = kdc_rep(KrbMessageType::KrbTgsRep, sealed);
        assert_eq!(
            open_tgs_rep(&rep, &session_key, Some(&subkey), NONCE, &provider)
                .expect("Failed to open TGS-REP"),
            part
        );
        assert!(open_tgs_rep(&rep, &session_key, None, NONCE, &provider).is_err());

        let sealed = envelope::seal(
            &tagged,
            &session_key,
            KeyUsage::TGS_REP_ENC_PART_SESSION_KEY,
            &provider,
        )
        .expect("Failed to seal");
        let rep = kdc_rep(KrbMessageType::KrbTgsRep, sealed);
        assert!(open_tgs_rep(&rep, &session_key, None, NONCE, &provider).is_ok());
    }

    #[test]
    fn pa_enc_timestamp_window() {
        let provider = CryptoProvider::default();
        let client_key = string_to_key_aes256(b"password", b"EXAMPLE.COMalice", 0x1000)
            .expect("Failed to derive key");
        let client_time = UNIX_EPOCH + Duration::from_micros(1_718_192_887_751_259);
        let skew = Duration::from_secs(300);

        let ts = PaEncTsEnc::from_system_time(client_time).expect("Invalid time");
        let enc = envelope::seal(&ts, &client_key, KeyUsage::PA_ENC_TIMESTAMP, &provider)
            .expect("Failed to seal");
        let padata = PaData::new(
            PaDataType::PaEncTimestamp,
            crate::asn1::encode(&enc).expect("Failed to encode"),
        )
        .expect("Invalid padata");
        let req = KdcReq::new(KrbMessageType::KrbAsReq, Some(vec![padata]), &req_body())
            .expect("Failed to build AS-REQ");

        assert_eq!(
            verify_pa_enc_timestamp(&req, &client_key, client_time + skew, skew, &provider),
            Ok(client_time)
        );
        assert_eq!(
            verify_pa_enc_timestamp(
                &req,
                &client_key,
                client_time + skew + Duration::from_secs(1),
                skew,
                &provider
            ),
            Err(KrbError::Validation(ValidationError::ClockSkewExceeded))
        );

        let other = string_to_key_aes256(b"wrong", b"EXAMPLE.COMalice", 0x1000)
            .expect("Failed to derive key");
        assert!(matches!(
            verify_pa_enc_timestamp(&req, &other, client_time, skew, &provider),
            Err(KrbError::Decrypt(_))
        ));

        let bare = KdcReq::new(KrbMessageType::KrbAsReq, None, &req_body())
            .expect("Failed to build AS-REQ");
        assert_eq!(
            verify_pa_enc_timestamp(&bare, &client_key, client_time, skew, &provider),
            Err(KrbError::PreauthRequired)
        );
    }

    #[test]
    fn tgs_req_authenticator_binds_body() {
        let fx = Fixture::new();
        let t = auth_time();
        let now = t + Duration::from_secs(600);
        let enc = fx.enc_ticket(t + Duration::from_secs(3600));
        let body = req_body();

        let body_bytes = crate::asn1::encode(&body).expect("Failed to encode body");
        let cksum = envelope::checksum(
            &body_bytes,
            &fx.session_key,
            KeyUsage::TGS_REQ_AUTHENTICATOR_CHECKSUM,
            &fx.provider,
        )
        .expect("Failed to checksum");
        let mut authenticator = fx.authenticator(now, None);
        authenticator.cksum = Some(cksum);

        let ap_req = fx.ap_req_with_usage(&enc, &authenticator, KeyUsage::TGS_REQ_AUTHENTICATOR);
        let padata = PaData::new(
            PaDataType::PaTgsReq,
            crate::asn1::encode(&ap_req).expect("Failed to encode"),
        )
        .expect("Invalid padata");
        let req = KdcReq::new(KrbMessageType::KrbTgsReq, Some(vec![padata.clone()]), &body)
            .expect("Failed to build TGS-REQ");

        let inner: ApReq = tgs_req_ap_req(&req).expect("Missing PA-TGS-REQ");
        assert_eq!(inner, ap_req);

        let validator: ApReqValidator = fx
            .validator(now)
            .with_authenticator_usage(KeyUsage::TGS_REQ_AUTHENTICATOR);
        let validated = validator.validate(&inner).expect("Failed to validate");
        verify_tgs_req_checksum(
            &req,
            &validated.authenticator,
            &validated.session_key,
            &fx.provider,
        )
        .expect("Checksum should verify");

        // Same authenticator in front of an altered body.
        let mut altered = body;
        altered.nonce = Nonce::new(NONCE + 1);
        let req = KdcReq::new(KrbMessageType::KrbTgsReq, Some(vec![padata]), &altered)
            .expect("Failed to build TGS-REQ");
        assert_eq!(
            verify_tgs_req_checksum(
                &req,
                &validated.authenticator,
                &validated.session_key,
                &fx.provider
            ),
            Err(KrbError::Validation(ValidationError::ChecksumMismatch))
        );
    }
}
