//! MS-PAC header reader.
//!
//! The PACTYPE header and its PAC_INFO_BUFFER table are parsed and every buffer is
//! sliced out with bounds checks. Buffer bodies stay opaque, except client info and
//! the two signatures which are small fixed layouts.

use crate::error::{DecodeError, KrbError};
use binrw::helpers::until_eof;
use binrw::io::Cursor;
use binrw::BinRead;
use num_enum::{FromPrimitive, IntoPrimitive};
use tracing::debug;

/// PACTYPE cBuffers and Version.
const PAC_PREAMBLE_LEN: usize = 8;
/// Size of one PAC_INFO_BUFFER.
const PAC_INFO_BUFFER_LEN: usize = 16;

/// MS-PAC 2.4 ulType
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, IntoPrimitive)]
#[repr(u32)]
pub enum PacBufferType {
    LogonInfo = 1,
    CredentialsInfo = 2,
    ServerChecksum = 6,
    PrivsvrChecksum = 7,
    ClientInfo = 10,
    DelegationInfo = 11,
    UpnDnsInfo = 12,
    ClientClaimsInfo = 13,
    DeviceInfo = 14,
    DeviceClaimsInfo = 15,
    TicketChecksum = 16,
    Attributes = 17,
    Requestor = 18,
    FullChecksum = 19,
    #[num_enum(catch_all)]
    Other(u32),
}

#[derive(BinRead, Debug)]
#[br(little)]
struct PacPreamble {
    c_buffers: u32,
    version: u32,
}

#[derive(BinRead, Debug, Clone, Copy)]
#[br(little)]
struct PacInfoBuffer {
    ul_type: u32,
    cb_buffer_size: u32,
    offset: u64,
}

#[derive(BinRead, Debug)]
#[br(little)]
struct RawClientInfo {
    client_id: u64,
    name_length: u16,
    #[br(count = name_length / 2)]
    name: Vec<u16>,
}

#[derive(BinRead, Debug)]
#[br(little)]
struct RawSignature {
    signature_type: i32,
    #[br(parse_with = until_eof)]
    rest: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacBuffer {
    pub buffer_type: PacBufferType,
    pub data: Vec<u8>,
}

/// PAC_CLIENT_INFO
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacClientInfo {
    /// FILETIME of the ticket's auth time.
    pub client_id: u64,
    pub name: String,
}

/// PAC_SIGNATURE_DATA
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacSignature {
    pub signature_type: i32,
    pub signature: Vec<u8>,
    pub rodc_identifier: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pac {
    buffers: Vec<PacBuffer>,
}

fn binrw_err(err: binrw::Error) -> KrbError {
    debug!(?err, "Unable to parse PAC structure");
    KrbError::BinRWError
}

impl Pac {
    pub fn parse(bytes: &[u8]) -> Result<Self, KrbError> {
        let mut cursor = Cursor::new(bytes);
        let preamble = PacPreamble::read(&mut cursor).map_err(binrw_err)?;

        if preamble.version != 0 {
            debug!(version = preamble.version, "Unsupported PAC version");
            return Err(DecodeError::Malformed.into());
        }

        // The table must fit before any allocation is sized from it.
        let table_len = (preamble.c_buffers as usize)
            .checked_mul(PAC_INFO_BUFFER_LEN)
            .and_then(|l| l.checked_add(PAC_PREAMBLE_LEN))
            .ok_or(DecodeError::BadLength)?;
        if table_len > bytes.len() {
            debug!(c_buffers = preamble.c_buffers, "PAC buffer table overruns data");
            return Err(DecodeError::BadLength.into());
        }

        let mut buffers = Vec::with_capacity(preamble.c_buffers as usize);
        for _ in 0..preamble.c_buffers {
            let info = PacInfoBuffer::read(&mut cursor).map_err(binrw_err)?;
            let start = usize::try_from(info.offset).map_err(|_| DecodeError::BadLength)?;
            let end = start
                .checked_add(info.cb_buffer_size as usize)
                .ok_or(DecodeError::BadLength)?;
            let data = bytes.get(start..end).ok_or_else(|| {
                debug!(ul_type = info.ul_type, start, end, "PAC buffer out of range");
                DecodeError::BadLength
            })?;
            buffers.push(PacBuffer {
                buffer_type: PacBufferType::from(info.ul_type),
                data: data.to_vec(),
            });
        }

        Ok(Pac { buffers })
    }

    pub fn buffers(&self) -> &[PacBuffer] {
        &self.buffers
    }

    pub fn buffer(&self, buffer_type: PacBufferType) -> Option<&PacBuffer> {
        self.buffers.iter().find(|b| b.buffer_type == buffer_type)
    }

    pub fn client_info(&self) -> Result<Option<PacClientInfo>, KrbError> {
        let Some(buffer) = self.buffer(PacBufferType::ClientInfo) else {
            return Ok(None);
        };
        let raw = RawClientInfo::read(&mut Cursor::new(&buffer.data)).map_err(binrw_err)?;
        let name = String::from_utf16(&raw.name).map_err(|_| DecodeError::Malformed)?;
        Ok(Some(PacClientInfo {
            client_id: raw.client_id,
            name,
        }))
    }

    pub fn server_signature(&self) -> Result<Option<PacSignature>, KrbError> {
        self.signature(PacBufferType::ServerChecksum)
    }

    pub fn kdc_signature(&self) -> Result<Option<PacSignature>, KrbError> {
        self.signature(PacBufferType::PrivsvrChecksum)
    }

    fn signature(&self, buffer_type: PacBufferType) -> Result<Option<PacSignature>, KrbError> {
        let Some(buffer) = self.buffer(buffer_type) else {
            return Ok(None);
        };
        let raw = RawSignature::read(&mut Cursor::new(&buffer.data)).map_err(binrw_err)?;

        let sig_len = match raw.signature_type {
            // HMAC_MD5
            -138 => 16,
            // HMAC_SHA1_96_AES128 / AES256
            15 | 16 => 12,
            _ => raw.rest.len(),
        };
        if raw.rest.len() < sig_len {
            return Err(DecodeError::Truncated.into());
        }
        let (signature, trailer) = raw.rest.split_at(sig_len);
        let rodc_identifier = match trailer {
            [a, b] => Some(u16::from_le_bytes([*a, *b])),
            _ => None,
        };
        Ok(Some(PacSignature {
            signature_type: raw.signature_type,
            signature: signature.to_vec(),
            rodc_identifier,
        }))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    const CLIENT_INFO: [u8; 18] = [
        0, 73, 217, 14, 101, 106, 198, 1, 8, 0, 108, 0, 122, 0, 104, 0, 117, 0,
    ];
    const SERVER_CHECKSUM: [u8; 20] = [
        118, 255, 255, 255, 65, 237, 206, 154, 52, 129, 93, 58, 239, 123, 201, 136, 116, 128, 93,
        37,
    ];

    /// Two buffers, client info at 40 and the server checksum on the next 8 byte
    /// boundary.
    pub(crate) fn sample_pac() -> Vec<u8> {
        let mut pac = Vec::new();
        pac.extend_from_slice(&2u32.to_le_bytes());
        pac.extend_from_slice(&0u32.to_le_bytes());
        for (ul_type, size, offset) in [(10u32, 18u32, 40u64), (6, 20, 64)] {
            pac.extend_from_slice(&ul_type.to_le_bytes());
            pac.extend_from_slice(&size.to_le_bytes());
            pac.extend_from_slice(&offset.to_le_bytes());
        }
        pac.extend_from_slice(&CLIENT_INFO);
        pac.resize(64, 0);
        pac.extend_from_slice(&SERVER_CHECKSUM);
        pac
    }

    #[test]
    fn pac_header_and_buffers() {
        let pac = Pac::parse(&sample_pac()).expect("Failed to parse PAC");
        assert_eq!(pac.buffers().len(), 2);
        assert_eq!(pac.buffers()[0].buffer_type, PacBufferType::ClientInfo);
        assert_eq!(pac.buffers()[1].buffer_type, PacBufferType::ServerChecksum);

        let info = pac
            .client_info()
            .expect("Failed to parse client info")
            .expect("Missing client info");
        assert_eq!(info.name, "lzhu");
        assert_eq!(info.client_id, 0x01c6_6a65_0ed9_4900);

        let sig = pac
            .server_signature()
            .expect("Failed to parse signature")
            .expect("Missing signature");
        assert_eq!(sig.signature_type, -138);
        assert_eq!(sig.signature, &SERVER_CHECKSUM[4..]);
        assert_eq!(sig.rodc_identifier, None);

        assert_eq!(pac.kdc_signature().expect("Failed to parse"), None);
    }

    #[test]
    fn pac_rejects_bad_bounds() {
        let mut pac = sample_pac();
        // Server checksum offset pushed past the end.
        pac[32] = 0x50;
        assert_eq!(
            Pac::parse(&pac),
            Err(KrbError::Decode(DecodeError::BadLength))
        );

        // A buffer count that cannot fit in the data.
        let mut pac = sample_pac();
        pac[0..4].copy_from_slice(&u32::MAX.to_le_bytes());
        assert_eq!(
            Pac::parse(&pac),
            Err(KrbError::Decode(DecodeError::BadLength))
        );

        let mut pac = sample_pac();
        pac[4] = 1;
        assert_eq!(
            Pac::parse(&pac),
            Err(KrbError::Decode(DecodeError::Malformed))
        );

        assert_eq!(Pac::parse(&[0x01, 0x00]), Err(KrbError::BinRWError));
    }

    #[test]
    fn unknown_buffer_types_are_kept() {
        assert_eq!(PacBufferType::from(99), PacBufferType::Other(99));
        assert_eq!(u32::from(PacBufferType::Other(99)), 99);
        assert_eq!(u32::from(PacBufferType::UpnDnsInfo), 12);
    }
}
