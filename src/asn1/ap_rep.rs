use super::constants::KrbMessageType;
use super::encrypted_data::EncryptedData;
use crate::constants::PVNO;
use der::Sequence;

/// ```text
/// AP-REP          ::= [APPLICATION 15] SEQUENCE {
///         pvno            [0] INTEGER (5),
///         msg-type        [1] INTEGER (15),
///         enc-part        [2] EncryptedData -- EncAPRepPart
/// }
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub struct ApRepInner {
    #[asn1(context_specific = "0")]
    pub pvno: u8,
    #[asn1(context_specific = "1")]
    pub msg_type: u8,
    #[asn1(context_specific = "2")]
    pub enc_part: EncryptedData,
}

application_tagged!(ApRep, ApRepInner, 15);

impl ApRepInner {
    pub fn new(enc_part: EncryptedData) -> Self {
        Self {
            pvno: PVNO,
            msg_type: KrbMessageType::KrbApRep.into(),
            enc_part,
        }
    }
}
