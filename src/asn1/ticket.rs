use super::encrypted_data::EncryptedData;
use super::principal_name::PrincipalName;
use super::realm::Realm;
use crate::constants::PVNO;
use der::Sequence;

/// ```text
/// Ticket          ::= [APPLICATION 1] SEQUENCE {
///         tkt-vno         [0] INTEGER (5),
///         realm           [1] Realm,
///         sname           [2] PrincipalName,
///         enc-part        [3] EncryptedData -- EncTicketPart
/// }
/// ````
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub struct TicketInner {
    #[asn1(context_specific = "0")]
    pub tkt_vno: u8,
    #[asn1(context_specific = "1")]
    pub realm: Realm,
    #[asn1(context_specific = "2")]
    pub sname: PrincipalName,
    #[asn1(context_specific = "3")]
    pub enc_part: EncryptedData,
}

application_tagged!(
    /// A ticket as it travels: the clear service identity and the sealed EncTicketPart.
    Ticket,
    TicketInner,
    1
);

impl TicketInner {
    pub fn new(realm: Realm, sname: PrincipalName, enc_part: EncryptedData) -> Self {
        Self {
            tkt_vno: PVNO,
            realm,
            sname,
            enc_part,
        }
    }
}
