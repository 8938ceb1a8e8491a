//! Single-file snapshot of a poem and its chain
//!
//! File format:
//! ```text
//! [HEADER: 64 bytes]
//!   - magic: 8 bytes ("POEMSNAP")
//!   - version: 4 bytes (u32 LE)
//!   - flags: 4 bytes (reserved, 0)
//!   - payload_len: 8 bytes (u64 LE)
//!   - checksum: 32 bytes (BLAKE3 of the payload)
//!   - reserved: 8 bytes
//!
//! [PAYLOAD: payload_len bytes]
//!   - zstd-compressed bincode of `Snapshot`
//! ```

use crate::chain::Chain;
use crate::poem::Poem;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

pub const SNAPSHOT_MAGIC: &[u8; 8] = b"POEMSNAP";
pub const SNAPSHOT_VERSION: u32 = 1;

const HEADER_SIZE: usize = 64;
const ZSTD_LEVEL: i32 = 3;

/// Everything needed to resume a poem between runs
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub poem: Poem,
    pub chain: Chain,
}

impl Snapshot {
    pub fn new(poem: Poem, chain: Chain) -> Self {
        Snapshot { poem, chain }
    }

    /// Encode header and payload
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let encoded = bincode::serialize(self)?;
        frame(&encoded)
    }

    /// Decode and verify bytes written by [`Snapshot::to_bytes`]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::InvalidFile(format!(
                "File too short for header: {} bytes",
                data.len()
            )));
        }
        let (header, rest) = data.split_at(HEADER_SIZE);

        if &header[0..8] != SNAPSHOT_MAGIC {
            return Err(Error::InvalidFile("Invalid magic bytes".into()));
        }

        let version = u32::from_le_bytes(le_array(&header[8..12]));
        if version != SNAPSHOT_VERSION {
            return Err(Error::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                found: version,
            });
        }

        let payload_len = u64::from_le_bytes(le_array(&header[16..24]));
        if payload_len != rest.len() as u64 {
            return Err(Error::Corruption(format!(
                "Payload length {} does not match header ({})",
                rest.len(),
                payload_len
            )));
        }

        let expected: [u8; 32] = le_array(&header[24..56]);
        if blake3::hash(rest).as_bytes() != &expected {
            return Err(Error::Corruption("Checksum mismatch".into()));
        }

        let decoded = zstd::decode_all(rest)?;
        // types re-check their invariants while decoding
        bincode::deserialize(&decoded)
            .map_err(|e| Error::Corruption(format!("Invalid snapshot state: {}", e)))
    }

    /// Write to `path`, replacing any existing file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        let tmp = path.with_extension("tmp");
        {
            let mut file = File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), bytes = bytes.len(), "Snapshot saved");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut data = Vec::new();
        File::open(path)?.read_to_end(&mut data)?;
        let snapshot = Self::from_bytes(&data)?;
        debug!(path = %path.display(), bytes = data.len(), "Snapshot loaded");
        Ok(snapshot)
    }
}

/// Compress an encoded snapshot and prepend the header
fn frame(encoded: &[u8]) -> Result<Vec<u8>> {
    let payload = zstd::encode_all(encoded, ZSTD_LEVEL)?;
    let checksum = blake3::hash(&payload);

    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(SNAPSHOT_MAGIC);
    out.extend_from_slice(&SNAPSHOT_VERSION.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    out.extend_from_slice(checksum.as_bytes());
    out.resize(HEADER_SIZE, 0);
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Copy a header field of known width
fn le_array<const N: usize>(slice: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    out
}
