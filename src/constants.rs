use std::time::Duration;

pub const PVNO: u8 = 5;

pub const AES_256_KEY_LEN: usize = 32;
pub const AES_BLOCK_SIZE: usize = 16;
/// HMAC-SHA1 truncated to 96 bits.
pub const SHA1_HMAC_LEN: usize = 12;

/// RFC 3962 default iteration count for the AES string-to-key.
pub const RFC_PKBDF2_SHA1_ITER: u32 = 0x1000;

pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(300);
pub const DEFAULT_MAX_RESTRICTION_DEPTH: usize = 5;
pub const DEFAULT_REPLAY_PURGE_INTERVAL: usize = 64;
