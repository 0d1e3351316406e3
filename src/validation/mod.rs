//! AP-REQ validation.
//!
//! [`ApReqValidator::validate`] runs the full acceptance sequence for one AP-REQ:
//! decrypt the ticket with the service key, decrypt the authenticator with the
//! ticket's session key, check the time window, bind the authenticator to the
//! ticket's client, consult the replay cache and only then expand authorization
//! data. Any failure ends the call. There is no partial acceptance.

mod kdc;
mod private;

pub use self::kdc::{
    open_as_rep, open_tgs_rep, tgs_req_ap_req, verify_pa_enc_timestamp, verify_tgs_req_checksum,
};
pub use self::private::{
    build_krb_safe, open_krb_cred, open_krb_priv, seal_krb_cred, seal_krb_priv, verify_krb_safe,
    SessionExpectations,
};

use crate::asn1::ap_options::ApOptions;
use crate::asn1::ap_rep::{ApRep, ApRepInner};
use crate::asn1::ap_req::ApReq;
use crate::asn1::authenticator::{Authenticator, AuthenticatorInner};
use crate::asn1::constants::{EncryptionType, KrbMessageType};
use crate::asn1::enc_ap_rep_part::{EncApRepPart, EncApRepPartInner};
use crate::asn1::enc_ticket_part::{EncTicketPart, EncTicketPartInner};
use crate::asn1::principal_name::PrincipalName;
use crate::asn1::realm::Realm;
use crate::asn1::ticket_flags::TicketFlags;
use crate::config::ValidatorConfig;
use crate::constants::{DEFAULT_CLOCK_SKEW, DEFAULT_MAX_RESTRICTION_DEPTH, PVNO};
use crate::crypto::{CryptoProvider, KerberosKey, KeyUsage};
use crate::envelope;
use crate::error::{DecryptError, KrbError, ValidationError};
use crate::keystore::KeyStore;
use crate::replay::{ReplayCache, ReplayKey};
use crate::restriction::{self, Restriction};
use crate::time::{self, Clock};
use bitmask_enum::bitmask;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, error, info, instrument, warn};

/// Which checks [`ApReqValidator`] performs. Decryption of the ticket and the
/// authenticator always happens.
#[bitmask(u32)]
pub enum ValidationActions {
    /// Authenticator cname and crealm match the ticket.
    ClientIdentity = 1 << 0,
    /// Authenticator ctime lies within the clock skew of now.
    AuthenticatorWindow = 1 << 1,
    StartTime = 1 << 2,
    EndTime = 1 << 3,
    RenewTill = 1 << 4,
    /// Reject tickets carrying the INVALID flag.
    TicketInvalid = 1 << 5,
    Replay = 1 << 6,
}

impl ValidationActions {
    pub fn all_checks() -> Self {
        ValidationActions::ClientIdentity
            | ValidationActions::AuthenticatorWindow
            | ValidationActions::StartTime
            | ValidationActions::EndTime
            | ValidationActions::RenewTill
            | ValidationActions::TicketInvalid
            | ValidationActions::Replay
    }
}

pub(crate) fn check_pvno(pvno: u8) -> Result<(), KrbError> {
    if pvno == PVNO {
        Ok(())
    } else {
        debug!(pvno, "Unsupported protocol version");
        Err(KrbError::InvalidPvno)
    }
}

pub(crate) fn check_msg_type(msg_type: u8, expected: KrbMessageType) -> Result<(), KrbError> {
    if msg_type == u8::from(expected) {
        Ok(())
    } else {
        debug!(msg_type, ?expected, "Unexpected message type");
        Err(KrbError::InvalidMessageType)
    }
}

pub(crate) fn check_sequence(
    received: Option<u32>,
    expected: Option<u32>,
) -> Result<(), ValidationError> {
    match (received, expected) {
        (Some(r), Some(e)) if r != e => {
            debug!(received = r, expected = e, "Sequence number mismatch");
            Err(ValidationError::SequenceMismatch)
        }
        _ => Ok(()),
    }
}

/// Check the ticket's validity window against `now`, each bound widened by `skew`.
pub fn check_ticket_times(
    ticket: &EncTicketPartInner,
    now: SystemTime,
    skew: Duration,
    actions: ValidationActions,
) -> Result<(), ValidationError> {
    if actions.contains(ValidationActions::StartTime)
        && ticket.effective_start_time() > time::later_by(now, skew)
    {
        debug!("Ticket start time is in the future");
        return Err(ValidationError::NotYetValid);
    }

    if actions.contains(ValidationActions::EndTime)
        && ticket.end_time() < time::earlier_by(now, skew)
    {
        debug!("Ticket has expired");
        return Err(ValidationError::ExpiredTicket);
    }

    if actions.contains(ValidationActions::RenewTill)
        && ticket.flags.contains(TicketFlags::Renewable)
    {
        if let Some(renew_till) = ticket.renew_till() {
            if renew_till < time::earlier_by(now, skew) {
                debug!("Ticket renewable lifetime has passed");
                return Err(ValidationError::RenewTillExpired);
            }
        }
    }

    Ok(())
}

/// The outcome of a successful AP-REQ validation.
#[derive(Debug, Clone)]
pub struct ValidatedApReq {
    pub ap_options: ApOptions,
    pub service_realm: Realm,
    pub service_name: PrincipalName,
    pub ticket: EncTicketPartInner,
    pub authenticator: AuthenticatorInner,
    pub session_key: KerberosKey,
    pub subkey: Option<KerberosKey>,
    /// Expanded from the ticket's authorization data.
    pub restrictions: Vec<Restriction>,
    /// Expanded from the authenticator's authorization data.
    pub authenticator_restrictions: Vec<Restriction>,
}

impl ValidatedApReq {
    pub fn client_name(&self) -> &PrincipalName {
        &self.ticket.cname
    }

    pub fn client_realm(&self) -> &Realm {
        &self.ticket.crealm
    }

    pub fn mutual_required(&self) -> bool {
        self.ap_options.contains(ApOptions::MutualRequired)
    }

    /// The key protecting the rest of this session: the authenticator's subkey when
    /// one was sent, otherwise the ticket session key.
    pub fn reply_key(&self) -> &KerberosKey {
        self.subkey.as_ref().unwrap_or(&self.session_key)
    }

    /// Build the AP-REP for mutual authentication. The client's ctime and cusec are
    /// echoed unchanged together with its sequence number.
    pub fn build_ap_rep(&self, provider: &CryptoProvider) -> Result<ApRep, KrbError> {
        let enc_part = EncApRepPart::new(EncApRepPartInner {
            ctime: self.authenticator.ctime,
            cusec: self.authenticator.cusec,
            subkey: None,
            seq_number: self.authenticator.seq_number,
        });
        let enc_part = envelope::seal(
            &enc_part,
            self.reply_key(),
            KeyUsage::AP_REP_ENC_PART,
            provider,
        )
        .map_err(|err| {
            error!(?err, "Unable to seal AP-REP");
            err
        })?;
        Ok(ApRep::new(ApRepInner::new(enc_part)))
    }
}

/// Client side check of an AP-REP against the authenticator that was sent.
///
/// The reply must be sealed under the authenticator's subkey when one was sent. A
/// reply sealed under the session key instead is a [`ValidationError::SubkeyMismatch`].
pub fn verify_ap_rep(
    ap_rep: &ApRep,
    authenticator: &AuthenticatorInner,
    session_key: &KerberosKey,
    provider: &CryptoProvider,
) -> Result<EncApRepPartInner, KrbError> {
    check_pvno(ap_rep.pvno)?;
    check_msg_type(ap_rep.msg_type, KrbMessageType::KrbApRep)?;

    let subkey = authenticator
        .subkey
        .as_ref()
        .map(KerberosKey::from_encryption_key)
        .transpose()?;

    let part: EncApRepPart = match &subkey {
        Some(subkey) => {
            match envelope::open(&ap_rep.enc_part, subkey, KeyUsage::AP_REP_ENC_PART, provider) {
                Ok(part) => part,
                Err(KrbError::Decrypt(_)) => {
                    let under_session = envelope::decrypt(
                        &ap_rep.enc_part,
                        session_key,
                        KeyUsage::AP_REP_ENC_PART,
                        provider,
                    );
                    return Err(match under_session {
                        Ok(_) => {
                            debug!("AP-REP sealed with the session key, not the subkey");
                            ValidationError::SubkeyMismatch.into()
                        }
                        Err(_) => DecryptError.into(),
                    });
                }
                Err(err) => return Err(err),
            }
        }
        None => envelope::open(
            &ap_rep.enc_part,
            session_key,
            KeyUsage::AP_REP_ENC_PART,
            provider,
        )?,
    };
    let part = part.into_inner();

    if part.ctime != authenticator.ctime || part.cusec != authenticator.cusec {
        debug!("AP-REP timestamp does not echo the authenticator");
        return Err(ValidationError::ReplyTimestampMismatch.into());
    }
    check_sequence(part.seq_number, authenticator.seq_number)?;

    Ok(part)
}

/// Accepts AP-REQs addressed to the services in its [`KeyStore`].
pub struct ApReqValidator {
    keystore: Arc<dyn KeyStore>,
    replay_cache: Arc<dyn ReplayCache>,
    clock: Arc<dyn Clock>,
    crypto: CryptoProvider,
    clock_skew: Duration,
    max_restriction_depth: usize,
    authenticator_usage: KeyUsage,
    actions: ValidationActions,
}

impl std::fmt::Debug for ApReqValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApReqValidator")
            .field("crypto", &self.crypto)
            .field("clock_skew", &self.clock_skew)
            .field("max_restriction_depth", &self.max_restriction_depth)
            .field("authenticator_usage", &self.authenticator_usage)
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}

impl ApReqValidator {
    pub fn new(
        keystore: Arc<dyn KeyStore>,
        replay_cache: Arc<dyn ReplayCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        ApReqValidator {
            keystore,
            replay_cache,
            clock,
            crypto: CryptoProvider::default(),
            clock_skew: DEFAULT_CLOCK_SKEW,
            max_restriction_depth: DEFAULT_MAX_RESTRICTION_DEPTH,
            authenticator_usage: KeyUsage::AP_REQ_AUTHENTICATOR,
            actions: ValidationActions::all_checks(),
        }
    }

    /// Build a validator with the keystore and replay cache the configuration
    /// describes.
    pub fn from_config(config: &ValidatorConfig, clock: Arc<dyn Clock>) -> Result<Self, KrbError> {
        let keystore = Arc::new(config.keystore()?);
        let replay_cache = Arc::new(config.replay_cache());
        Ok(ApReqValidator::new(keystore, replay_cache, clock)
            .with_clock_skew(config.clock_skew())
            .with_max_restriction_depth(config.max_restriction_depth)
            .with_authenticator_usage(config.authenticator_usage()))
    }

    pub fn with_clock_skew(mut self, clock_skew: Duration) -> Self {
        self.clock_skew = clock_skew;
        self
    }

    pub fn with_max_restriction_depth(mut self, depth: usize) -> Self {
        self.max_restriction_depth = depth;
        self
    }

    /// Usage the authenticator is sealed with, 11 for application exchanges or 7
    /// inside a TGS-REQ.
    pub fn with_authenticator_usage(mut self, usage: KeyUsage) -> Self {
        self.authenticator_usage = usage;
        self
    }

    pub fn with_actions(mut self, actions: ValidationActions) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_crypto(mut self, crypto: CryptoProvider) -> Self {
        self.crypto = crypto;
        self
    }

    pub fn crypto(&self) -> &CryptoProvider {
        &self.crypto
    }

    pub fn clock_skew(&self) -> Duration {
        self.clock_skew
    }

    pub fn validate_bytes(&self, bytes: &[u8]) -> Result<ValidatedApReq, KrbError> {
        let ap_req: ApReq = crate::asn1::decode(bytes)?;
        self.validate(&ap_req)
    }

    pub fn validate(&self, ap_req: &ApReq) -> Result<ValidatedApReq, KrbError> {
        self.validate_at(ap_req, self.clock.now())
    }

    #[instrument(level = "debug", skip_all)]
    pub fn validate_at(&self, ap_req: &ApReq, now: SystemTime) -> Result<ValidatedApReq, KrbError> {
        let result = self.run(ap_req, now);
        match &result {
            Ok(validated) => info!(
                client = %validated.client_name(),
                crealm = %validated.client_realm(),
                service = %validated.service_name,
                "AP-REQ accepted"
            ),
            Err(err) => warn!(%err, "AP-REQ rejected"),
        }
        result
    }

    fn run(&self, ap_req: &ApReq, now: SystemTime) -> Result<ValidatedApReq, KrbError> {
        check_pvno(ap_req.pvno)?;
        check_msg_type(ap_req.msg_type, KrbMessageType::KrbApReq)?;

        // Ticket, under the service's long-term key.
        let ticket = &ap_req.ticket;
        let etype = EncryptionType::try_from(ticket.enc_part.etype).map_err(|_| {
            debug!(etype = ticket.enc_part.etype, "Unknown ticket encryption type");
            KrbError::UnsupportedEncryption
        })?;
        let service_key = self
            .keystore
            .resolve(&ticket.sname, ticket.realm.as_str(), ticket.enc_part.kvno, etype)
            .ok_or(KrbError::MissingServiceKey)?;

        let enc_ticket: EncTicketPart =
            envelope::open(&ticket.enc_part, &service_key, KeyUsage::TICKET, &self.crypto)?;
        let enc_ticket = enc_ticket.into_inner();

        // Authenticator, under the session key the ticket carries.
        let session_key = KerberosKey::from_encryption_key(&enc_ticket.key)?;
        let authenticator: Authenticator = envelope::open(
            &ap_req.authenticator,
            &session_key,
            self.authenticator_usage,
            &self.crypto,
        )?;
        let authenticator = authenticator.into_inner();
        check_pvno(authenticator.authenticator_vno)?;

        // Time window.
        if self.actions.contains(ValidationActions::AuthenticatorWindow)
            && !time::within_skew(authenticator.client_time(), now, self.clock_skew)
        {
            debug!("Authenticator time is outside the clock skew");
            return Err(ValidationError::ClockSkewExceeded.into());
        }
        check_ticket_times(&enc_ticket, now, self.clock_skew, self.actions)?;

        if self.actions.contains(ValidationActions::TicketInvalid)
            && enc_ticket.flags.contains(TicketFlags::Invalid)
        {
            debug!("Ticket is flagged invalid");
            return Err(ValidationError::TicketInvalid.into());
        }

        if self.actions.contains(ValidationActions::ClientIdentity)
            && (authenticator.crealm != enc_ticket.crealm
                || !authenticator.cname.matches(&enc_ticket.cname))
        {
            debug!(
                ticket_client = %enc_ticket.cname,
                authenticator_client = %authenticator.cname,
                "Authenticator client does not match the ticket"
            );
            return Err(ValidationError::ClientMismatch.into());
        }

        if self.actions.contains(ValidationActions::Replay) {
            let ctime = authenticator.ctime.to_system_time();
            let key = ReplayKey::new(
                authenticator.crealm.as_str(),
                &authenticator.cname,
                ctime,
                authenticator.cusec,
            );
            let expires = time::later_by(authenticator.client_time(), self.clock_skew);
            self.replay_cache.check_and_insert(key, expires, now)?;
        }

        let subkey = authenticator
            .subkey
            .as_ref()
            .map(KerberosKey::from_encryption_key)
            .transpose()?;

        // Only now is the authorization data trusted enough to look at.
        let restrictions = match &enc_ticket.authorization_data {
            Some(ad) => restriction::expand(ad, self.max_restriction_depth)?,
            None => Vec::new(),
        };
        let authenticator_restrictions = match &authenticator.authorization_data {
            Some(ad) => restriction::expand(ad, self.max_restriction_depth)?,
            None => Vec::new(),
        };

        Ok(ValidatedApReq {
            ap_options: ap_req.ap_options,
            service_realm: ticket.realm.clone(),
            service_name: ticket.sname.clone(),
            ticket: enc_ticket,
            authenticator,
            session_key,
            subkey,
            restrictions,
            authenticator_restrictions,
        })
    }
}
