use num_enum::{IntoPrimitive, TryFromPrimitive};

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, TryFromPrimitive, IntoPrimitive)]
#[repr(i32)]
pub enum EncryptionType {
    DES_CBC_CRC = 1,
    DES_CBC_MD4 = 2,
    DES_CBC_MD5 = 3,
    DES3_CBC_MD5 = 5,
    DES3_CBC_SHA1 = 7,
    DES3_CBC_SHA1_KD = 16,
    AES128_CTS_HMAC_SHA1_96 = 17,
    AES256_CTS_HMAC_SHA1_96 = 18,
    AES128_CTS_HMAC_SHA256_128 = 19,
    AES256_CTS_HMAC_SHA384_192 = 20,
    RC4_HMAC = 23,
    RC4_HMAC_EXP = 24,
    CAMELLIA128_CTS_CMAC = 25,
    CAMELLIA256_CTS_CMAC = 26,
}

/// Keyed checksum algorithms, RFC 3961 section 8 and RFC 3962.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(i32)]
pub enum ChecksumType {
    CRC32 = 1,
    RSA_MD5 = 7,
    HMAC_SHA1_DES3_KD = 12,
    HMAC_SHA1_96_AES128 = 15,
    HMAC_SHA1_96_AES256 = 16,
    HMAC_SHA256_128_AES128 = 19,
    HMAC_SHA384_192_AES256 = 20,
    HMAC_MD5 = -138,
}
