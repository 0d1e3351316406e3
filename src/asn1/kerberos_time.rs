use super::microseconds::Microseconds;
use crate::error::KrbError;
use der::asn1::GeneralizedTime;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::error;

/// ```text
/// KerberosTime    ::= GeneralizedTime -- with no fractional seconds
/// ```
pub type KerberosTime = GeneralizedTime;

/// Split a system time into the whole-second KerberosTime and the microseconds that
/// travel beside it (ctime/cusec, stime/susec, patimestamp/pausec).
pub fn split_system_time(time: SystemTime) -> Result<(KerberosTime, Microseconds), KrbError> {
    let since_epoch = time
        .duration_since(UNIX_EPOCH)
        .map_err(|_| KrbError::DoYouHaveATimeMachine)?;
    let usec = Microseconds::try_from(since_epoch.subsec_micros())?;
    let secs = Duration::from_secs(since_epoch.as_secs());
    let ktime = KerberosTime::from_unix_duration(secs).map_err(|err| {
        error!(?err, "Unable to represent time as KerberosTime");
        KrbError::DerEncodeKerberosTime
    })?;
    Ok((ktime, usec))
}

/// Inverse of [`split_system_time`].
pub fn join_system_time(time: &KerberosTime, usec: Microseconds) -> SystemTime {
    time.to_system_time() + Duration::from_micros(u64::from(usec.get()))
}

pub fn kerberos_time(time: SystemTime) -> Result<KerberosTime, KrbError> {
    split_system_time(time).map(|(ktime, _)| ktime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use der::{DateTime, Decode, Encode};

    #[test]
    fn kerberos_time_has_no_fraction() {
        let t = UNIX_EPOCH + Duration::from_micros(1_718_192_887_751_259);
        let (ktime, usec) = split_system_time(t).expect("Failed to split time");
        assert_eq!(usec.get(), 751_259);
        assert_eq!(
            ktime.to_date_time(),
            DateTime::new(2024, 6, 12, 11, 48, 7).expect("Invalid datetime")
        );
        assert_eq!(join_system_time(&ktime, usec), t);

        let bytes = ktime.to_der().expect("Failed to encode");
        assert_eq!(bytes, b"\x18\x0f20240612114807Z");
        assert_eq!(
            KerberosTime::from_der(&bytes).expect("Failed to decode"),
            ktime
        );
    }

    #[test]
    fn kerberos_time_before_epoch() {
        let t = UNIX_EPOCH - Duration::from_secs(1);
        assert_eq!(split_system_time(t), Err(KrbError::DoYouHaveATimeMachine));
    }
}
