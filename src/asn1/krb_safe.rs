use super::checksum::Checksum;
use super::constants::KrbMessageType;
use super::host_address::HostAddress;
use super::kerberos_time::KerberosTime;
use super::microseconds::Microseconds;
use crate::constants::PVNO;
use der::asn1::OctetString;
use der::Sequence;

/// ```text
/// KRB-SAFE        ::= [APPLICATION 20] SEQUENCE {
///         pvno            [0] INTEGER (5),
///         msg-type        [1] INTEGER (20),
///         safe-body       [2] KRB-SAFE-BODY,
///         cksum           [3] Checksum
/// }
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub struct KrbSafeInner {
    #[asn1(context_specific = "0")]
    pub pvno: u8,
    #[asn1(context_specific = "1")]
    pub msg_type: u8,
    #[asn1(context_specific = "2")]
    pub safe_body: KrbSafeBody,
    // Keyed checksum over the DER of safe-body, key usage 15.
    #[asn1(context_specific = "3")]
    pub cksum: Checksum,
}

application_tagged!(KrbSafe, KrbSafeInner, 20);

/// ```text
/// KRB-SAFE-BODY   ::= SEQUENCE {
///         user-data       [0] OCTET STRING,
///         timestamp       [1] KerberosTime OPTIONAL,
///         usec            [2] Microseconds OPTIONAL,
///         seq-number      [3] UInt32 OPTIONAL,
///         s-address       [4] HostAddress,
///         r-address       [5] HostAddress OPTIONAL
/// }
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub struct KrbSafeBody {
    #[asn1(context_specific = "0")]
    pub user_data: OctetString,
    #[asn1(context_specific = "1", optional = "true")]
    pub timestamp: Option<KerberosTime>,
    #[asn1(context_specific = "2", optional = "true")]
    pub usec: Option<Microseconds>,
    #[asn1(context_specific = "3", optional = "true")]
    pub seq_number: Option<u32>,
    #[asn1(context_specific = "4")]
    pub s_address: HostAddress,
    #[asn1(context_specific = "5", optional = "true")]
    pub r_address: Option<HostAddress>,
}

impl KrbSafeInner {
    pub fn new(safe_body: KrbSafeBody, cksum: Checksum) -> Self {
        Self {
            pvno: PVNO,
            msg_type: KrbMessageType::KrbSafe.into(),
            safe_body,
            cksum,
        }
    }
}
