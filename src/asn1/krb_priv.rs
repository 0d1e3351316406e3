use super::constants::KrbMessageType;
use super::encrypted_data::EncryptedData;
use super::host_address::HostAddress;
use super::kerberos_time::KerberosTime;
use super::microseconds::Microseconds;
use crate::constants::PVNO;
use der::asn1::OctetString;
use der::Sequence;

/// ```text
/// KRB-PRIV        ::= [APPLICATION 21] SEQUENCE {
///         pvno            [0] INTEGER (5),
///         msg-type        [1] INTEGER (21),
///                         -- NOTE: there is no [2] tag
///         enc-part        [3] EncryptedData -- EncKrbPrivPart
/// }
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub struct KrbPrivInner {
    #[asn1(context_specific = "0")]
    pub pvno: u8,
    #[asn1(context_specific = "1")]
    pub msg_type: u8,
    #[asn1(context_specific = "3")]
    pub enc_part: EncryptedData,
}

application_tagged!(KrbPriv, KrbPrivInner, 21);

impl KrbPrivInner {
    pub fn new(enc_part: EncryptedData) -> Self {
        Self {
            pvno: PVNO,
            msg_type: KrbMessageType::KrbPriv.into(),
            enc_part,
        }
    }
}

/// ```text
/// EncKrbPrivPart  ::= [APPLICATION 28] SEQUENCE {
///         user-data       [0] OCTET STRING,
///         timestamp       [1] KerberosTime OPTIONAL,
///         usec            [2] Microseconds OPTIONAL,
///         seq-number      [3] UInt32 OPTIONAL,
///         s-address       [4] HostAddress -- sender's addr --,
///         r-address       [5] HostAddress OPTIONAL -- recip's addr
/// }
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub struct EncKrbPrivPartInner {
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

application_tagged!(EncKrbPrivPart, EncKrbPrivPartInner, 28);
