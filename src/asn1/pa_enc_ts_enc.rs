use super::kerberos_time::{join_system_time, split_system_time, KerberosTime};
use super::microseconds::Microseconds;
use crate::error::KrbError;
use der::Sequence;
use std::time::SystemTime;

/// ```text
/// PA-ENC-TS-ENC           ::= SEQUENCE {
///           patimestamp     [0] KerberosTime -- client's time --,
///           pausec          [1] Microseconds OPTIONAL
/// }
/// ````
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub struct PaEncTsEnc {
    #[asn1(context_specific = "0")]
    pub patimestamp: KerberosTime,
    #[asn1(context_specific = "1", optional = "true")]
    pub pausec: Option<Microseconds>,
}

impl PaEncTsEnc {
    pub fn from_system_time(time: SystemTime) -> Result<Self, KrbError> {
        let (patimestamp, pausec) = split_system_time(time)?;
        Ok(Self {
            patimestamp,
            pausec: Some(pausec),
        })
    }

    pub fn to_system_time(&self) -> SystemTime {
        join_system_time(&self.patimestamp, self.pausec.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use der::{Decode, Encode};
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn pa_enc_ts_enc_round_trip() {
        let t = UNIX_EPOCH + Duration::from_micros(1_718_192_887_751_259);
        let ts = PaEncTsEnc::from_system_time(t).expect("Invalid time");
        let bytes = ts.to_der().expect("Failed to encode");
        assert_eq!(
            bytes,
            hex::decode("301aa011180f32303234303631323131343830375aa10502030b769b")
                .expect("Failed to decode sample")
        );
        let back = PaEncTsEnc::from_der(&bytes).expect("Failed to decode");
        assert_eq!(back, ts);
        assert_eq!(back.to_system_time(), t);

        // Without pausec the time is whole seconds.
        let whole = PaEncTsEnc {
            pausec: None,
            ..ts
        };
        let bytes = whole.to_der().expect("Failed to encode");
        assert_eq!(bytes[1], 0x13);
        let back = PaEncTsEnc::from_der(&bytes).expect("Failed to decode");
        assert_eq!(back, whole);
        assert_eq!(back.to_system_time(), UNIX_EPOCH + Duration::from_secs(1_718_192_887));
    }
}
