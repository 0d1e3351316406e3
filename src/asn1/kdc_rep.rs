use super::encrypted_data::EncryptedData;
use super::pa_data::PaData;
use super::principal_name::PrincipalName;
use super::realm::Realm;
use super::ticket::Ticket;
use der::Sequence;

/// ```text
///   KDC-REP         ::= SEQUENCE {
///           pvno            [0] INTEGER (5),
///           msg-type        [1] INTEGER (11 -- AS -- | 13 -- TGS --),
///           padata          [2] SEQUENCE OF PA-DATA OPTIONAL
///                                   -- NOTE: not empty --,
///           crealm          [3] Realm,
///           cname           [4] PrincipalName,
///           ticket          [5] Ticket,
///           enc-part        [6] EncryptedData
///                                   -- EncASRepPart or EncTGSRepPart,
///                                   -- as appropriate
///   }
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub struct KdcRep {
    #[asn1(context_specific = "0")]
    pub pvno: u8,
    #[asn1(context_specific = "1")]
    pub msg_type: u8,
    #[asn1(context_specific = "2", optional = "true")]
    pub padata: Option<Vec<PaData>>,
    #[asn1(context_specific = "3")]
    pub crealm: Realm,
    #[asn1(context_specific = "4")]
    pub cname: PrincipalName,
    #[asn1(context_specific = "5")]
    pub ticket: Ticket,
    #[asn1(context_specific = "6")]
    pub enc_part: EncryptedData,
}
