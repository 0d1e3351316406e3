use num_enum::{IntoPrimitive, TryFromPrimitive};

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(i32)]
pub enum PrincipalNameType {
    NT_UNKNOWN = 0,
    NT_PRINCIPAL = 1,
    NT_SRV_INST = 2,
    NT_SRV_HST = 3,
    NT_SRV_XHST = 4,
    NT_UID = 5,
    NT_X500_PRINCIPAL = 6,
    NT_SMTP_NAME = 7,
    NT_ENTERPRISE = 10,
    NT_WELLKNOWN = 11,
    NT_SRV_HST_DOMAIN = 12,
    NT_MS_PRINCIPAL = -128,
    NT_MS_PRINCIPAL_AND_ID = -129,
    NT_ENT_PRINCIPAL_AND_ID = -130,
}
