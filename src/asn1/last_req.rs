use super::kerberos_time::KerberosTime;
use der::Sequence;

/// ```text
/// LastReq         ::=     SEQUENCE OF SEQUENCE {
///         lr-type         [0] Int32,
///         lr-value        [1] KerberosTime
/// }
/// ````
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub struct LastReqItem {
    #[asn1(context_specific = "0")]
    pub lr_type: i32,
    #[asn1(context_specific = "1")]
    pub lr_value: KerberosTime,
}

pub type LastReq = Vec<LastReqItem>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asn1::kerberos_time::kerberos_time;
    use der::{Decode, Encode};
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn last_req_round_trip() {
        let last_req: LastReq = vec![LastReqItem {
            lr_type: 0,
            lr_value: kerberos_time(UNIX_EPOCH + Duration::from_secs(1_718_192_887))
                .expect("Invalid time"),
        }];
        let bytes = last_req.to_der().expect("Failed to encode");
        assert_eq!(
            bytes,
            hex::decode("301a3018a003020100a111180f32303234303631323131343830375a")
                .expect("Failed to decode sample")
        );
        assert_eq!(LastReq::from_der(&bytes).expect("Failed to decode"), last_req);

        let empty: LastReq = Vec::new();
        let bytes = empty.to_der().expect("Failed to encode");
        assert_eq!(bytes, [0x30, 0x00]);
        assert!(LastReq::from_der(&bytes).expect("Failed to decode").is_empty());
    }
}
