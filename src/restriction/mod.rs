//! Authorization data expansion.
//!
//! [`expand`] turns the raw AuthorizationData of a validated ticket or authenticator
//! into [`Restriction`] values. AD-IF-RELEVANT containers are unwrapped recursively
//! up to a depth cap. Entries of a type this crate does not know are kept as
//! [`Restriction::Unrecognized`] so the caller still sees them.

pub mod pac;

use self::pac::Pac;
use crate::asn1::authorization_data::{
    AdIfRelevant, AuthorizationData, AuthorizationDataEntry, EtypeList, KerbAdRestrictionEntry,
};
use crate::asn1::constants::AuthorizationDataType;
use crate::error::{DecodeError, KrbError, ValidationError};
use binrw::io::Cursor;
use binrw::BinRead;
use der::Decode;
use tracing::{debug, trace};

/// KERB-AD-RESTRICTION-ENTRY restriction-type carrying LSAP_TOKEN_INFO_INTEGRITY.
const LSAP_TOKEN_INFO_INTEGRITY: i32 = 0;

/// MS-KILE 2.2.8 KERB-AP-OPTIONS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KerbApOptions(pub u32);

impl KerbApOptions {
    pub const CHANNEL_BINDING_SUPPORTED: u32 = 0x4000;

    pub fn channel_binding_supported(&self) -> bool {
        self.0 & Self::CHANNEL_BINDING_SUPPORTED != 0
    }
}

/// MS-KILE 2.2.7 LSAP_TOKEN_INFO_INTEGRITY
#[derive(BinRead, Debug, Clone, PartialEq, Eq)]
#[br(little)]
pub struct TokenIntegrity {
    pub flags: u32,
    pub token_il: u32,
    pub machine_id: [u8; 32],
}

impl TokenIntegrity {
    pub const FULL_TOKEN: u32 = 0x0000_0000;
    pub const UAC_RESTRICTED: u32 = 0x0000_0001;

    pub fn is_restricted(&self) -> bool {
        self.flags & Self::UAC_RESTRICTED != 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRestriction {
    pub restriction_type: i32,
    pub integrity: TokenIntegrity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restriction {
    IfRelevant(Vec<Restriction>),
    Pac(Pac),
    ETypeNegotiation(EtypeList),
    KerbApOptions(KerbApOptions),
    KerbLocal(Vec<u8>),
    KerbServiceTarget(String),
    TokenRestriction(TokenRestriction),
    Unrecognized { ad_type: i32, data: Vec<u8> },
}

impl Restriction {
    /// The ad-type this restriction was decoded from.
    pub fn ad_type(&self) -> i32 {
        let ad_type = match self {
            Restriction::IfRelevant(_) => AuthorizationDataType::AdIfRelevant,
            Restriction::Pac(_) => AuthorizationDataType::AdWin2kPac,
            Restriction::ETypeNegotiation(_) => AuthorizationDataType::AdETypeNegotiation,
            Restriction::KerbApOptions(_) => AuthorizationDataType::KerbApOptions,
            Restriction::KerbLocal(_) => AuthorizationDataType::KerbLocal,
            Restriction::KerbServiceTarget(_) => AuthorizationDataType::KerbServiceTarget,
            Restriction::TokenRestriction(_) => {
                AuthorizationDataType::KerbAuthDataTokenRestrictions
            }
            Restriction::Unrecognized { ad_type, .. } => return *ad_type,
        };
        ad_type.into()
    }
}

/// Reject an entry handed to the wrong constructor.
fn expect_type(
    entry: &AuthorizationDataEntry,
    expected: AuthorizationDataType,
) -> Result<(), ValidationError> {
    if entry.is_type(expected) {
        Ok(())
    } else {
        debug!(ad_type = entry.ad_type, ?expected, "Authorization data type mismatch");
        Err(ValidationError::RestrictionTypeMismatch)
    }
}

impl KerbApOptions {
    pub fn from_entry(entry: &AuthorizationDataEntry) -> Result<Self, KrbError> {
        expect_type(entry, AuthorizationDataType::KerbApOptions)?;
        let bytes: [u8; 4] = entry
            .ad_data
            .as_bytes()
            .try_into()
            .map_err(|_| DecodeError::BadLength)?;
        Ok(KerbApOptions(u32::from_le_bytes(bytes)))
    }
}

impl TokenRestriction {
    pub fn from_entry(entry: &AuthorizationDataEntry) -> Result<Self, KrbError> {
        expect_type(entry, AuthorizationDataType::KerbAuthDataTokenRestrictions)?;
        let restriction = KerbAdRestrictionEntry::from_der(entry.ad_data.as_bytes())?;
        if restriction.restriction_type != LSAP_TOKEN_INFO_INTEGRITY {
            debug!(
                restriction_type = restriction.restriction_type,
                "Unknown token restriction type"
            );
            return Err(ValidationError::RestrictionTypeMismatch.into());
        }
        let integrity = TokenIntegrity::read(&mut Cursor::new(restriction.restriction.as_bytes()))
            .map_err(|err| {
                debug!(?err, "Unable to parse token integrity");
                KrbError::BinRWError
            })?;
        Ok(TokenRestriction {
            restriction_type: restriction.restriction_type,
            integrity,
        })
    }
}

fn decode_service_target(entry: &AuthorizationDataEntry) -> Result<String, KrbError> {
    expect_type(entry, AuthorizationDataType::KerbServiceTarget)?;
    let bytes = entry.ad_data.as_bytes();
    if bytes.len() % 2 != 0 {
        return Err(DecodeError::BadLength.into());
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    String::from_utf16(&units).map_err(|_| DecodeError::Malformed.into())
}

fn decode_etype_negotiation(entry: &AuthorizationDataEntry) -> Result<EtypeList, KrbError> {
    expect_type(entry, AuthorizationDataType::AdETypeNegotiation)?;
    EtypeList::from_der(entry.ad_data.as_bytes()).map_err(KrbError::from)
}

fn decode_pac(entry: &AuthorizationDataEntry) -> Result<Pac, KrbError> {
    expect_type(entry, AuthorizationDataType::AdWin2kPac)?;
    Pac::parse(entry.ad_data.as_bytes())
}

fn decode_kerb_local(entry: &AuthorizationDataEntry) -> Result<Vec<u8>, KrbError> {
    expect_type(entry, AuthorizationDataType::KerbLocal)?;
    Ok(entry.ad_data.as_bytes().to_vec())
}

fn decode_if_relevant(
    entry: &AuthorizationDataEntry,
    depth: usize,
    max_depth: usize,
) -> Result<Vec<Restriction>, KrbError> {
    expect_type(entry, AuthorizationDataType::AdIfRelevant)?;
    if depth >= max_depth {
        debug!(depth, max_depth, "AD-IF-RELEVANT nested too deeply");
        return Err(ValidationError::RestrictionDepthExceeded.into());
    }
    let nested = AdIfRelevant::from_der(entry.ad_data.as_bytes())?;
    expand_at(&nested, depth + 1, max_depth)
}

fn expand_entry(
    entry: &AuthorizationDataEntry,
    depth: usize,
    max_depth: usize,
) -> Result<Restriction, KrbError> {
    let Ok(ad_type) = AuthorizationDataType::try_from(entry.ad_type) else {
        trace!(ad_type = entry.ad_type, "unrecognized authorization data");
        return Ok(Restriction::Unrecognized {
            ad_type: entry.ad_type,
            data: entry.ad_data.as_bytes().to_vec(),
        });
    };

    match ad_type {
        AuthorizationDataType::AdIfRelevant => {
            decode_if_relevant(entry, depth, max_depth).map(Restriction::IfRelevant)
        }
        AuthorizationDataType::AdWin2kPac => decode_pac(entry).map(Restriction::Pac),
        AuthorizationDataType::AdETypeNegotiation => {
            decode_etype_negotiation(entry).map(Restriction::ETypeNegotiation)
        }
        AuthorizationDataType::KerbApOptions => {
            KerbApOptions::from_entry(entry).map(Restriction::KerbApOptions)
        }
        AuthorizationDataType::KerbLocal => decode_kerb_local(entry).map(Restriction::KerbLocal),
        AuthorizationDataType::KerbServiceTarget => {
            decode_service_target(entry).map(Restriction::KerbServiceTarget)
        }
        AuthorizationDataType::KerbAuthDataTokenRestrictions => {
            TokenRestriction::from_entry(entry).map(Restriction::TokenRestriction)
        }
        // Registered, but without a typed form here.
        _ => Ok(Restriction::Unrecognized {
            ad_type: entry.ad_type,
            data: entry.ad_data.as_bytes().to_vec(),
        }),
    }
}

fn expand_at(
    ad: &AuthorizationData,
    depth: usize,
    max_depth: usize,
) -> Result<Vec<Restriction>, KrbError> {
    ad.iter()
        .map(|entry| expand_entry(entry, depth, max_depth))
        .collect()
}

/// Expand every entry of `ad`. At most `max_depth` AD-IF-RELEVANT containers may be
/// nested inside one another.
pub fn expand(ad: &AuthorizationData, max_depth: usize) -> Result<Vec<Restriction>, KrbError> {
    expand_at(ad, 0, max_depth)
}

/// Every non-container restriction, depth first, in encounter order.
pub fn leaves(restrictions: &[Restriction]) -> Vec<&Restriction> {
    let mut out = Vec::new();
    for r in restrictions {
        match r {
            Restriction::IfRelevant(nested) => out.extend(leaves(nested)),
            other => out.push(other),
        }
    }
    out
}
