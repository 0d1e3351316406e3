use super::authorization_data::AuthorizationData;
use super::encryption_key::EncryptionKey;
use super::host_address::HostAddresses;
use super::kerberos_time::KerberosTime;
use super::principal_name::PrincipalName;
use super::realm::Realm;
use super::ticket_flags::TicketFlags;
use super::transited_encoding::TransitedEncoding;
use der::Sequence;
use std::time::SystemTime;

/// ```text
/// -- Encrypted part of ticket
/// EncTicketPart   ::= [APPLICATION 3] SEQUENCE {
///         flags                   [0] TicketFlags,
///         key                     [1] EncryptionKey,
///         crealm                  [2] Realm,
///         cname                   [3] PrincipalName,
///         transited               [4] TransitedEncoding,
///         authtime                [5] KerberosTime,
///         starttime               [6] KerberosTime OPTIONAL,
///         endtime                 [7] KerberosTime,
///         renew-till              [8] KerberosTime OPTIONAL,
///         caddr                   [9] HostAddresses OPTIONAL,
///         authorization-data      [10] AuthorizationData OPTIONAL
/// }
/// ````
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub struct EncTicketPartInner {
    #[asn1(context_specific = "0")]
    pub flags: TicketFlags,
    #[asn1(context_specific = "1")]
    pub key: EncryptionKey,
    #[asn1(context_specific = "2")]
    pub crealm: Realm,
    #[asn1(context_specific = "3")]
    pub cname: PrincipalName,
    #[asn1(context_specific = "4")]
    pub transited: TransitedEncoding,
    #[asn1(context_specific = "5")]
    pub auth_time: KerberosTime,
    #[asn1(context_specific = "6", optional = "true")]
    pub start_time: Option<KerberosTime>,
    #[asn1(context_specific = "7")]
    pub end_time: KerberosTime,
    #[asn1(context_specific = "8", optional = "true")]
    pub renew_till: Option<KerberosTime>,
    #[asn1(context_specific = "9", optional = "true")]
    pub client_addresses: Option<HostAddresses>,
    #[asn1(context_specific = "10", optional = "true")]
    pub authorization_data: Option<AuthorizationData>,
}

application_tagged!(EncTicketPart, EncTicketPartInner, 3);

impl EncTicketPartInner {
    /// If the starttime field is absent from the ticket, then the authtime field
    /// SHOULD be used in its place to determine the life of the ticket.
    pub fn effective_start_time(&self) -> SystemTime {
        self.start_time
            .as_ref()
            .unwrap_or(&self.auth_time)
            .to_system_time()
    }

    pub fn end_time(&self) -> SystemTime {
        self.end_time.to_system_time()
    }

    pub fn renew_till(&self) -> Option<SystemTime> {
        self.renew_till.as_ref().map(|t| t.to_system_time())
    }
}
