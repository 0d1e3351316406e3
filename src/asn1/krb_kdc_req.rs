use super::application_tag;
use super::kdc_req::KdcReq;
use der::{Tag, Writer};

const AS_REQ: u8 = 10;
const TGS_REQ: u8 = 12;

/// ```text
/// AS-REQ          ::= [APPLICATION 10] KDC-REQ
/// TGS-REQ         ::= [APPLICATION 12] KDC-REQ
/// ```
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum KrbKdcReq {
    AsReq(KdcReq),
    TgsReq(KdcReq),
}

impl KrbKdcReq {
    pub fn kdc_req(&self) -> &KdcReq {
        match self {
            KrbKdcReq::AsReq(req) | KrbKdcReq::TgsReq(req) => req,
        }
    }
}

impl<'a> ::der::Decode<'a> for KrbKdcReq {
    type Error = der::Error;

    fn decode<R: der::Reader<'a>>(decoder: &mut R) -> der::Result<Self> {
        let tag: der::Tag = decoder.decode()?;
        let len: der::Length = decoder.decode()?;

        if tag == application_tag(AS_REQ) {
            super::decode_within(decoder, len).map(KrbKdcReq::AsReq)
        } else if tag == application_tag(TGS_REQ) {
            super::decode_within(decoder, len).map(KrbKdcReq::TgsReq)
        } else {
            Err(der::Error::from(der::ErrorKind::TagUnexpected {
                expected: None,
                actual: tag,
            }))
        }
    }
}

impl ::der::Encode for KrbKdcReq {
    fn encoded_len(&self) -> Result<der::Length, der::Error> {
        match self {
            KrbKdcReq::AsReq(asreq) => super::application_encoded_len(AS_REQ, asreq),
            KrbKdcReq::TgsReq(tgsreq) => super::application_encoded_len(TGS_REQ, tgsreq),
        }
    }

    fn encode(&self, writer: &mut impl Writer) -> der::Result<()> {
        match self {
            KrbKdcReq::AsReq(asreq) => super::encode_application(AS_REQ, asreq, writer),
            KrbKdcReq::TgsReq(tgsreq) => super::encode_application(TGS_REQ, tgsreq, writer),
        }
    }
}

impl ::der::Tagged for KrbKdcReq {
    fn tag(&self) -> Tag {
        match self {
            KrbKdcReq::AsReq(_) => application_tag(AS_REQ),
            KrbKdcReq::TgsReq(_) => application_tag(TGS_REQ),
        }
    }
}
