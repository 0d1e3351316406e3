use super::application_tag;
use super::encryption_key::EncryptionKey;
use super::host_address::HostAddresses;
use super::kerberos_time::KerberosTime;
use super::last_req::LastReq;
use super::nonce::Nonce;
use super::pa_data::MethodData;
use super::principal_name::PrincipalName;
use super::realm::Realm;
use super::ticket_flags::TicketFlags;
use der::{Sequence, Tag, Writer};

const ENC_AS_REP_PART: u8 = 25;
const ENC_TGS_REP_PART: u8 = 26;

/// ```text
/// EncKDCRepPart   ::= SEQUENCE {
///         key             [0] EncryptionKey,
///         last-req        [1] LastReq,
///         nonce           [2] UInt32,
///         key-expiration  [3] KerberosTime OPTIONAL,
///         flags           [4] TicketFlags,
///         authtime        [5] KerberosTime,
///         starttime       [6] KerberosTime OPTIONAL,
///         endtime         [7] KerberosTime,
///         renew-till      [8] KerberosTime OPTIONAL,
///         srealm          [9] Realm,
///         sname           [10] PrincipalName,
///         caddr           [11] HostAddresses OPTIONAL,
///         encrypted-pa-data [12] METHOD-DATA OPTIONAL -- RFC 6806
/// }
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub struct EncKdcRepPart {
    #[asn1(context_specific = "0")]
    pub key: EncryptionKey,
    #[asn1(context_specific = "1")]
    pub last_req: LastReq,
    #[asn1(context_specific = "2")]
    pub nonce: Nonce,
    #[asn1(context_specific = "3", optional = "true")]
    pub key_expiration: Option<KerberosTime>,
    #[asn1(context_specific = "4")]
    pub flags: TicketFlags,
    #[asn1(context_specific = "5")]
    pub auth_time: KerberosTime,
    #[asn1(context_specific = "6", optional = "true")]
    pub start_time: Option<KerberosTime>,
    #[asn1(context_specific = "7")]
    pub end_time: KerberosTime,
    #[asn1(context_specific = "8", optional = "true")]
    pub renew_till: Option<KerberosTime>,
    #[asn1(context_specific = "9")]
    pub server_realm: Realm,
    #[asn1(context_specific = "10")]
    pub server_name: PrincipalName,
    #[asn1(context_specific = "11", optional = "true")]
    pub client_addresses: Option<HostAddresses>,
    #[asn1(context_specific = "12", optional = "true")]
    pub encrypted_pa_data: Option<MethodData>,
}

/// ```text
///  EncASRepPart    ::= [APPLICATION 25] EncKDCRepPart
///  EncTGSRepPart   ::= [APPLICATION 26] EncKDCRepPart
/// ```
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum TaggedEncKdcRepPart {
    EncAsRepPart(EncKdcRepPart),
    EncTgsRepPart(EncKdcRepPart),
}

impl TaggedEncKdcRepPart {
    pub fn enc_part(&self) -> &EncKdcRepPart {
        match self {
            TaggedEncKdcRepPart::EncAsRepPart(part) | TaggedEncKdcRepPart::EncTgsRepPart(part) => {
                part
            }
        }
    }

    pub fn into_enc_part(self) -> EncKdcRepPart {
        match self {
            TaggedEncKdcRepPart::EncAsRepPart(part) | TaggedEncKdcRepPart::EncTgsRepPart(part) => {
                part
            }
        }
    }
}

impl<'a> ::der::Decode<'a> for TaggedEncKdcRepPart {
    type Error = der::Error;

    fn decode<R: der::Reader<'a>>(decoder: &mut R) -> der::Result<Self> {
        let tag: der::Tag = decoder.decode()?;
        let len: der::Length = decoder.decode()?;

        if tag == application_tag(ENC_AS_REP_PART) {
            super::decode_within(decoder, len).map(TaggedEncKdcRepPart::EncAsRepPart)
        } else if tag == application_tag(ENC_TGS_REP_PART) {
            super::decode_within(decoder, len).map(TaggedEncKdcRepPart::EncTgsRepPart)
        } else {
            Err(der::Error::from(der::ErrorKind::TagUnexpected {
                expected: None,
                actual: tag,
            }))
        }
    }
}

impl ::der::Encode for TaggedEncKdcRepPart {
    fn encoded_len(&self) -> Result<der::Length, der::Error> {
        match self {
            TaggedEncKdcRepPart::EncAsRepPart(part) => {
                super::application_encoded_len(ENC_AS_REP_PART, part)
            }
            TaggedEncKdcRepPart::EncTgsRepPart(part) => {
                super::application_encoded_len(ENC_TGS_REP_PART, part)
            }
        }
    }

    fn encode(&self, writer: &mut impl Writer) -> der::Result<()> {
        match self {
            TaggedEncKdcRepPart::EncAsRepPart(part) => {
                super::encode_application(ENC_AS_REP_PART, part, writer)
            }
            TaggedEncKdcRepPart::EncTgsRepPart(part) => {
                super::encode_application(ENC_TGS_REP_PART, part, writer)
            }
        }
    }
}

impl ::der::Tagged for TaggedEncKdcRepPart {
    fn tag(&self) -> Tag {
        match self {
            TaggedEncKdcRepPart::EncAsRepPart(_) => application_tag(ENC_AS_REP_PART),
            TaggedEncKdcRepPart::EncTgsRepPart(_) => application_tag(ENC_TGS_REP_PART),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asn1::kerberos_time::kerberos_time;
    use crate::asn1::last_req::LastReqItem;
    use der::{Decode, Encode};
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn enc_kdc_rep_part_branches() {
        let auth = UNIX_EPOCH + Duration::from_secs(1_718_192_887);
        let part = EncKdcRepPart {
            key: EncryptionKey::new(18, &[0x42; 32]).expect("Invalid key"),
            last_req: vec![LastReqItem {
                lr_type: 0,
                lr_value: kerberos_time(auth).expect("Invalid time"),
            }],
            nonce: Nonce::new(779214421),
            key_expiration: None,
            flags: TicketFlags::Initial | TicketFlags::PreAuthent | TicketFlags::Renewable,
            auth_time: kerberos_time(auth).expect("Invalid time"),
            start_time: Some(kerberos_time(auth).expect("Invalid time")),
            end_time: kerberos_time(auth + Duration::from_secs(36000)).expect("Invalid time"),
            renew_till: None,
            server_realm: "EXAMPLE.COM".parse().expect("Invalid realm"),
            server_name: (2, "krbtgt/EXAMPLE.COM").try_into().expect("Invalid name"),
            client_addresses: None,
            encrypted_pa_data: None,
        };

        let as_part = TaggedEncKdcRepPart::EncAsRepPart(part.clone());
        let tgs_part = TaggedEncKdcRepPart::EncTgsRepPart(part.clone());

        let as_bytes = as_part.to_der().expect("Failed to encode");
        let tgs_bytes = tgs_part.to_der().expect("Failed to encode");
        assert_eq!(as_bytes[0], 0x79);
        assert_eq!(tgs_bytes[0], 0x7a);
        // Only the tag differs.
        assert_eq!(as_bytes[1..], tgs_bytes[1..]);

        let back = TaggedEncKdcRepPart::from_der(&tgs_bytes).expect("Failed to decode");
        assert_eq!(back, tgs_part);
        assert_eq!(back.into_enc_part(), part);
    }
}
