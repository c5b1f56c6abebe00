//! KLAC binary transport for precompiled automata.
//!
//! Layout (little-endian):
//!
//! | offset | size | field |
//! |--------|------|-------|
//! | 0      | 4    | magic `KLAC` |
//! | 4      | 1    | version |
//! | 5      | 3    | reserved |
//! | 8      | 4    | payload length |
//! | 12     | 4    | CRC32 of payload |
//! | 16     | ..   | bincode payload (node arena, outputs, char count) |

use std::fs::{self, File};
use std::path::Path;

use memmap2::Mmap;
use tracing::debug;

use super::{Automaton, AutomatonError};

const MAGIC: &[u8; 4] = b"KLAC";
const VERSION: u8 = 1;
const HEADER_SIZE: usize = 16;

impl Automaton {
    pub fn to_bytes(&self) -> Result<Vec<u8>, AutomatonError> {
        let payload = bincode::serialize(self).map_err(AutomatonError::Serialize)?;
        let payload_len: u32 = payload
            .len()
            .try_into()
            .map_err(|_| AutomatonError::Corrupt("payload exceeds u32::MAX".to_string()))?;
        let crc = crc32fast::hash(&payload);

        let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
        buf.extend_from_slice(MAGIC);
        buf.push(VERSION);
        buf.extend_from_slice(&[0u8; 3]); // reserved
        buf.extend_from_slice(&payload_len.to_le_bytes());
        buf.extend_from_slice(&crc.to_le_bytes());
        buf.extend_from_slice(&payload);
        Ok(buf)
    }

    /// Decode and validate, verifying the payload checksum.
    pub fn from_bytes(data: &[u8]) -> Result<Self, AutomatonError> {
        Self::from_bytes_with(data, true)
    }

    pub fn from_bytes_with(data: &[u8], verify_checksum: bool) -> Result<Self, AutomatonError> {
        if data.len() < 5 {
            return Err(AutomatonError::InvalidHeader);
        }
        if &data[..4] != MAGIC {
            return Err(AutomatonError::InvalidMagic);
        }
        if data[4] != VERSION {
            return Err(AutomatonError::UnsupportedVersion(data[4]));
        }
        if data.len() < HEADER_SIZE {
            return Err(AutomatonError::InvalidHeader);
        }

        let payload_len = read_u32(data, 8) as usize;
        let expected_crc = read_u32(data, 12);
        let payload = data
            .get(HEADER_SIZE..HEADER_SIZE + payload_len)
            .ok_or(AutomatonError::InvalidHeader)?;

        if verify_checksum {
            let actual = crc32fast::hash(payload);
            if actual != expected_crc {
                return Err(AutomatonError::ChecksumMismatch {
                    expected: expected_crc,
                    actual,
                });
            }
        }

        let automaton: Automaton =
            bincode::deserialize(payload).map_err(AutomatonError::Deserialize)?;
        automaton.validate()?;
        debug!(
            node_count = automaton.nodes.len(),
            pattern_count = automaton.outputs.len(),
            "decoded automaton"
        );
        Ok(automaton)
    }

    /// Open a KLAC file. The file is memory-mapped for the duration of decoding only.
    pub fn open(path: &Path) -> Result<Self, AutomatonError> {
        Self::open_with(path, true)
    }

    pub fn open_with(path: &Path, verify_checksum: bool) -> Result<Self, AutomatonError> {
        let file = File::open(path)?;
        // SAFETY: The file is opened read-only and the mapping is dropped before
        // this function returns; the decoded automaton owns all of its data.
        let mmap = unsafe { Mmap::map(&file)? };
        Self::from_bytes_with(&mmap, verify_checksum)
    }

    /// Atomic write: write to .tmp then rename.
    pub fn save(&self, path: &Path) -> Result<(), AutomatonError> {
        let bytes = self.to_bytes()?;
        let tmp = path.with_extension("tmp");
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&data[offset..offset + 4]);
    u32::from_le_bytes(word)
}
