use super::authorization_data::AuthorizationData;
use super::checksum::Checksum;
use super::encryption_key::EncryptionKey;
use super::kerberos_time::{join_system_time, split_system_time, KerberosTime};
use super::microseconds::Microseconds;
use super::principal_name::PrincipalName;
use super::realm::Realm;
use crate::constants::PVNO;
use crate::error::KrbError;
use der::Sequence;
use std::time::SystemTime;

/// ```text
/// -- Unencrypted authenticator
/// Authenticator   ::= [APPLICATION 2] SEQUENCE  {
///         authenticator-vno       [0] INTEGER (5),
///         crealm                  [1] Realm,
///         cname                   [2] PrincipalName,
///         cksum                   [3] Checksum OPTIONAL,
///         cusec                   [4] Microseconds,
///         ctime                   [5] KerberosTime,
///         subkey                  [6] EncryptionKey OPTIONAL,
///         seq-number              [7] UInt32 OPTIONAL,
///         authorization-data      [8] AuthorizationData OPTIONAL
/// }
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub struct AuthenticatorInner {
    #[asn1(context_specific = "0")]
    pub authenticator_vno: u8,
    #[asn1(context_specific = "1")]
    pub crealm: Realm,
    #[asn1(context_specific = "2")]
    pub cname: PrincipalName,
    #[asn1(context_specific = "3", optional = "true")]
    // This field contains a checksum of the application data that
    // accompanies the KRB_AP_REQ, computed using a key usage value of 10
    // in normal application exchanges, or 6 when used in the TGS-REQ
    // PA-TGS-REQ AP-DATA field.
    pub cksum: Option<Checksum>,
    #[asn1(context_specific = "4")]
    pub cusec: Microseconds,
    #[asn1(context_specific = "5")]
    pub ctime: KerberosTime,
    #[asn1(context_specific = "6", optional = "true")]
    // The client's choice for an encryption key to be used to protect this
    // specific application session.
    pub subkey: Option<EncryptionKey>,
    #[asn1(context_specific = "7", optional = "true")]
    pub seq_number: Option<u32>,
    #[asn1(context_specific = "8", optional = "true")]
    pub authorization_data: Option<AuthorizationData>,
}

application_tagged!(Authenticator, AuthenticatorInner, 2);

impl AuthenticatorInner {
    pub fn new(
        client_name: PrincipalName,
        client_realm: Realm,
        client_time: SystemTime,
        checksum: Option<Checksum>,
        subkey: Option<EncryptionKey>,
        sequence_number: Option<u32>,
        authorization_data: Option<AuthorizationData>,
    ) -> Result<Self, KrbError> {
        let (ctime, cusec) = split_system_time(client_time)?;
        Ok(Self {
            authenticator_vno: PVNO,
            crealm: client_realm,
            cname: client_name,
            cksum: checksum,
            cusec,
            ctime,
            subkey,
            seq_number: sequence_number,
            authorization_data,
        })
    }

    pub fn client_time(&self) -> SystemTime {
        join_system_time(&self.ctime, self.cusec)
    }
}
