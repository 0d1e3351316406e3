use super::constants::KrbMessageType;
use super::encrypted_data::EncryptedData;
use super::encryption_key::EncryptionKey;
use super::host_address::{HostAddress, HostAddresses};
use super::kerberos_time::KerberosTime;
use super::microseconds::Microseconds;
use super::principal_name::PrincipalName;
use super::realm::Realm;
use super::ticket::Ticket;
use super::ticket_flags::TicketFlags;
use crate::constants::PVNO;
use der::Sequence;

/// ```text
/// KRB-CRED        ::= [APPLICATION 22] SEQUENCE {
///         pvno            [0] INTEGER (5),
///         msg-type        [1] INTEGER (22),
///         tickets         [2] SEQUENCE OF Ticket,
///         enc-part        [3] EncryptedData -- EncKrbCredPart
/// }
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub struct KrbCredInner {
    #[asn1(context_specific = "0")]
    pub pvno: u8,
    #[asn1(context_specific = "1")]
    pub msg_type: u8,
    #[asn1(context_specific = "2")]
    pub tickets: Vec<Ticket>,
    #[asn1(context_specific = "3")]
    pub enc_part: EncryptedData,
}

application_tagged!(KrbCred, KrbCredInner, 22);

impl KrbCredInner {
    pub fn new(tickets: Vec<Ticket>, enc_part: EncryptedData) -> Self {
        Self {
            pvno: PVNO,
            msg_type: KrbMessageType::KrbCred.into(),
            tickets,
            enc_part,
        }
    }
}

/// ```text
/// EncKrbCredPart  ::= [APPLICATION 29] SEQUENCE {
///         ticket-info     [0] SEQUENCE OF KrbCredInfo,
///         nonce           [1] UInt32 OPTIONAL,
///         timestamp       [2] KerberosTime OPTIONAL,
///         usec            [3] Microseconds OPTIONAL,
///         s-address       [4] HostAddress OPTIONAL,
///         r-address       [5] HostAddress OPTIONAL
/// }
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub struct EncKrbCredPartInner {
    #[asn1(context_specific = "0")]
    pub ticket_info: Vec<KrbCredInfo>,
    #[asn1(context_specific = "1", optional = "true")]
    pub nonce: Option<u32>,
    #[asn1(context_specific = "2", optional = "true")]
    pub timestamp: Option<KerberosTime>,
    #[asn1(context_specific = "3", optional = "true")]
    pub usec: Option<Microseconds>,
    #[asn1(context_specific = "4", optional = "true")]
    pub s_address: Option<HostAddress>,
    #[asn1(context_specific = "5", optional = "true")]
    pub r_address: Option<HostAddress>,
}

application_tagged!(EncKrbCredPart, EncKrbCredPartInner, 29);

/// ```text
/// KrbCredInfo     ::= SEQUENCE {
///         key             [0] EncryptionKey,
///         prealm          [1] Realm OPTIONAL,
///         pname           [2] PrincipalName OPTIONAL,
///         flags           [3] TicketFlags OPTIONAL,
///         authtime        [4] KerberosTime OPTIONAL,
///         starttime       [5] KerberosTime OPTIONAL,
///         endtime         [6] KerberosTime OPTIONAL,
///         renew-till      [7] KerberosTime OPTIONAL,
///         srealm          [8] Realm OPTIONAL,
///         sname           [9] PrincipalName OPTIONAL,
///         caddr           [10] HostAddresses OPTIONAL
/// }
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub struct KrbCredInfo {
    #[asn1(context_specific = "0")]
    pub key: EncryptionKey,
    #[asn1(context_specific = "1", optional = "true")]
    pub prealm: Option<Realm>,
    #[asn1(context_specific = "2", optional = "true")]
    pub pname: Option<PrincipalName>,
    #[asn1(context_specific = "3", optional = "true")]
    pub flags: Option<TicketFlags>,
    #[asn1(context_specific = "4", optional = "true")]
    pub auth_time: Option<KerberosTime>,
    #[asn1(context_specific = "5", optional = "true")]
    pub start_time: Option<KerberosTime>,
    #[asn1(context_specific = "6", optional = "true")]
    pub end_time: Option<KerberosTime>,
    #[asn1(context_specific = "7", optional = "true")]
    pub renew_till: Option<KerberosTime>,
    #[asn1(context_specific = "8", optional = "true")]
    pub srealm: Option<Realm>,
    #[asn1(context_specific = "9", optional = "true")]
    pub sname: Option<PrincipalName>,
    #[asn1(context_specific = "10", optional = "true")]
    pub caddr: Option<HostAddresses>,
}
