use super::kerberos_flags::kerberos_flags_codec;
use bitmask_enum::bitmask;

/// ```text
/// APOptions       ::= KerberosFlags
///         -- reserved(0),
///         -- use-session-key(1),
///         -- mutual-required(2)
/// ````
#[bitmask(u32)]
pub enum ApFlags {
    Reserved = 1 << 0,
    // Indicates that the ticket the client is presenting to a server is encrypted in
    // the session key from the server's TGT.
    UseSessionKey = 1 << 1,
    // Tells the server that the client requires mutual authentication, and that it
    // must respond with a KRB_AP_REP message.
    MutualRequired = 1 << 2,
}

kerberos_flags_codec!(ApFlags);

pub type ApOptions = ApFlags;

#[cfg(test)]
mod tests {
    use super::ApOptions;
    use der::{Decode, Encode};

    #[test]
    fn ap_options_mutual_required() {
        let opts = ApOptions::MutualRequired;
        let bytes = opts.to_der().expect("Failed to encode");
        assert_eq!(bytes, [0x03, 0x05, 0x00, 0x20, 0x00, 0x00, 0x00]);
        let back = ApOptions::from_der(&bytes).expect("Failed to decode");
        assert!(back.contains(ApOptions::MutualRequired));
        assert!(!back.contains(ApOptions::UseSessionKey));
    }
}
