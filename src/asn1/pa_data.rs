use super::constants::PaDataType;
use crate::error::KrbError;
use der::asn1::OctetString;
use der::Sequence;

/// ```text
/// PA-DATA         ::= SEQUENCE {
///         -- NOTE: first tag is [1], not [0]
///         padata-type     [1] Int32,
///         padata-value    [2] OCTET STRING -- might be encoded AP-REQ
/// }
/// ````
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub struct PaData {
    #[asn1(context_specific = "1")]
    pub padata_type: u32,
    #[asn1(context_specific = "2")]
    pub padata_value: OctetString,
}

impl PaData {
    pub fn new(padata_type: PaDataType, padata_value: Vec<u8>) -> Result<Self, KrbError> {
        let padata_value =
            OctetString::new(padata_value).map_err(|_| KrbError::DerEncodeOctetString)?;
        Ok(Self {
            padata_type: padata_type.into(),
            padata_value,
        })
    }

    pub fn is_type(&self, padata_type: PaDataType) -> bool {
        self.padata_type == u32::from(padata_type)
    }
}

/// ```text
/// METHOD-DATA     ::= SEQUENCE OF PA-DATA
/// ```
pub type MethodData = Vec<PaData>;

#[cfg(test)]
mod tests {
    use super::*;
    use der::{Decode, Encode};

    #[test]
    fn pa_data_round_trip() {
        let empty = PaData::new(PaDataType::PaEncTimestamp, Vec::new()).expect("Invalid padata");
        let bytes = empty.to_der().expect("Failed to encode");
        // The first tag is [1].
        assert_eq!(
            bytes,
            [0x30, 0x09, 0xa1, 0x03, 0x02, 0x01, 0x02, 0xa2, 0x02, 0x04, 0x00]
        );
        assert_eq!(PaData::from_der(&bytes).expect("Failed to decode"), empty);

        let method_data: MethodData = vec![
            empty,
            PaData::new(PaDataType::PaPacRequest, vec![0x30, 0x05, 0xa0, 0x03, 0x01, 0x01, 0xff])
                .expect("Invalid padata"),
        ];
        let bytes = method_data.to_der().expect("Failed to encode");
        let back = MethodData::from_der(&bytes).expect("Failed to decode");
        assert!(back[1].is_type(PaDataType::PaPacRequest));
        assert_eq!(back, method_data);
    }
}
