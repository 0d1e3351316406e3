use num_enum::{IntoPrimitive, TryFromPrimitive};

#[derive(Debug, TryFromPrimitive, IntoPrimitive, PartialEq, Eq, Clone, Copy)]
#[repr(i32)]
pub enum AuthorizationDataType {
    AdIfRelevant = 1,
    AdIntendedForServer = 2,
    AdIntendedForApplicationClass = 3,
    AdKdcIssued = 4,
    AdAndOr = 5,
    AdMandatoryTicketExtensions = 6,
    AdInTicketExtensions = 7,
    AdMandatoryForKdc = 8,
    OsfDce = 64,
    Sesame = 65,
    AdOsfDcePkiCertId = 66,
    AdWin2kPac = 128,
    AdETypeNegotiation = 129,
    // MS-KILE 2.2.6
    KerbAuthDataTokenRestrictions = 141,
    KerbLocal = 142,
    KerbApOptions = 143,
    KerbServiceTarget = 144,
}
