use super::constants::{KrbMessageType, PaDataType};
use super::kdc_req_body::KdcReqBody;
use super::pa_data::PaData;
use crate::constants::PVNO;
use crate::error::{DecodeError, KrbError};
use der::asn1::Any;
use der::{Encode, Sequence};
use tracing::error;

/// ```text
/// KDC-REQ         ::= SEQUENCE {
///         -- NOTE: first tag is [1], not [0]
///         pvno            [1] INTEGER (5) ,
///         msg-type        [2] INTEGER (10 -- AS -- | 12 -- TGS --),
///         padata          [3] SEQUENCE OF PA-DATA OPTIONAL
///                             -- NOTE: not empty --,
///         req-body        [4] KDC-REQ-BODY
/// }
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub struct KdcReq {
    #[asn1(context_specific = "1")]
    pub pvno: u8,
    #[asn1(context_specific = "2")]
    pub msg_type: u8,
    #[asn1(context_specific = "3", optional = "true")]
    pub padata: Option<Vec<PaData>>,
    // Held as raw bytes, the TGS path checksums the body exactly as it was received.
    #[asn1(context_specific = "4")]
    pub req_body: Any,
}

impl KdcReq {
    pub fn new(
        msg_type: KrbMessageType,
        padata: Option<Vec<PaData>>,
        req_body: &KdcReqBody,
    ) -> Result<Self, KrbError> {
        let req_body = Any::encode_from(req_body).map_err(|err| {
            error!(?err, "Unable to encode kdc req body");
            KrbError::DerEncodeKdcReqBody
        })?;
        Ok(Self {
            pvno: PVNO,
            msg_type: msg_type.into(),
            padata,
            req_body,
        })
    }

    pub fn body(&self) -> Result<KdcReqBody, DecodeError> {
        self.req_body
            .decode_as::<KdcReqBody>()
            .map_err(DecodeError::from)
    }

    /// The DER bytes of the request body, the input to the PA-TGS-REQ checksum.
    pub fn body_bytes(&self) -> Result<Vec<u8>, KrbError> {
        self.req_body.to_der().map_err(|err| {
            error!(?err, "Unable to encode kdc req body");
            KrbError::DerEncodeKdcReqBody
        })
    }

    pub fn find_padata(&self, padata_type: PaDataType) -> Option<&PaData> {
        self.padata
            .as_ref()
            .and_then(|padata| padata.iter().find(|pa| pa.is_type(padata_type)))
    }
}
