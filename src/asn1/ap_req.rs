use super::ap_options::ApOptions;
use super::constants::KrbMessageType;
use super::encrypted_data::EncryptedData;
use super::ticket::Ticket;
use crate::constants::PVNO;
use der::Sequence;

/// ```text
/// AP-REQ          ::= [APPLICATION 14] SEQUENCE {
///            pvno            [0] INTEGER (5),
///            msg-type        [1] INTEGER (14),
///            ap-options      [2] APOptions,
///            ticket          [3] Ticket,
///            authenticator   [4] EncryptedData -- Authenticator
///    }
///```
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub struct ApReqInner {
    #[asn1(context_specific = "0")]
    pub pvno: u8,
    #[asn1(context_specific = "1")]
    pub msg_type: u8,
    #[asn1(context_specific = "2")]
    // The flags affect the way the request is processed.
    pub ap_options: ApOptions,
    #[asn1(context_specific = "3")]
    // This field is a ticket authenticating the client to the server.
    pub ticket: Ticket,
    #[asn1(context_specific = "4")]
    // This contains the encrypted authenticator, which includes the client's choice of a subkey.
    pub authenticator: EncryptedData,
}

application_tagged!(ApReq, ApReqInner, 14);

impl ApReqInner {
    pub fn new(ap_options: ApOptions, ticket: Ticket, authenticator: EncryptedData) -> Self {
        Self {
            pvno: PVNO,
            msg_type: KrbMessageType::KrbApReq.into(),
            ap_options,
            ticket,
            authenticator,
        }
    }
}
