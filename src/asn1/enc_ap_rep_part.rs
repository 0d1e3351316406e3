use super::encryption_key::EncryptionKey;
use super::kerberos_time::{join_system_time, KerberosTime};
use super::microseconds::Microseconds;
use der::Sequence;
use std::time::SystemTime;

/// ```text
/// EncAPRepPart    ::= [APPLICATION 27] SEQUENCE {
///         ctime           [0] KerberosTime,
///         cusec           [1] Microseconds,
///         subkey          [2] EncryptionKey OPTIONAL,
///         seq-number      [3] UInt32 OPTIONAL
/// }
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub struct EncApRepPartInner {
    #[asn1(context_specific = "0")]
    pub ctime: KerberosTime,
    #[asn1(context_specific = "1")]
    pub cusec: Microseconds,
    #[asn1(context_specific = "2", optional = "true")]
    pub subkey: Option<EncryptionKey>,
    #[asn1(context_specific = "3", optional = "true")]
    pub seq_number: Option<u32>,
}

application_tagged!(EncApRepPart, EncApRepPartInner, 27);

impl EncApRepPartInner {
    pub fn client_time(&self) -> SystemTime {
        join_system_time(&self.ctime, self.cusec)
    }
}
