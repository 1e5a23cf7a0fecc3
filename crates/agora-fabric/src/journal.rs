use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{FabricError, FabricResult};
use crate::unit::PropagationUnit;

/// File name of the journal inside an agent's data directory.
pub const JOURNAL_FILE: &str = "agent.journal";

/// Flush strategy for journal appends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` after every append.
    EveryWrite,
    /// Flush to the OS page cache only.
    #[default]
    OsDefault,
}

#[derive(Clone, Debug, Default)]
pub struct JournalConfig {
    pub sync_mode: SyncMode,
}

/// Length + CRC header.
const HEADER_SIZE: usize = 8;

struct JournalWriter {
    writer: BufWriter<File>,
    offset: u64,
}

/// Crash-recoverable log of the units a replica has applied.
///
/// On-disk format, repeated:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized PropagationUnit)]
/// ```
///
/// Recovery reads front to back. Entries that fail the CRC check are skipped;
/// a torn tail ends recovery.
pub struct Journal {
    path: PathBuf,
    writer: Mutex<JournalWriter>,
    config: JournalConfig,
}

impl Journal {
    /// Open (or create) the journal inside `dir`.
    pub fn open_in(dir: &Path, config: JournalConfig) -> FabricResult<Self> {
        Self::open(&dir.join(JOURNAL_FILE), config)
    }

    /// Open (or create) a journal file.
    ///
    /// A torn tail left by a crash is cut off here, so new entries land
    /// directly after the last intact one.
    pub fn open(path: &Path, config: JournalConfig) -> FabricResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        let mut data = Vec::new();
        BufReader::new(&file).read_to_end(&mut data)?;
        let (_, intact) = scan(&data);
        if (intact as u64) < data.len() as u64 {
            warn!(
                path = %path.display(),
                file_len = data.len(),
                intact,
                "truncating torn journal tail"
            );
            file.set_len(intact as u64)?;
            file.sync_all()?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(JournalWriter {
                writer: BufWriter::new(file),
                offset: intact as u64,
            }),
            config,
        })
    }

    /// Append one unit. Returns the byte offset of the entry.
    pub fn append(&self, unit: &PropagationUnit) -> FabricResult<u64> {
        let payload =
            bincode::serialize(unit).map_err(|e| FabricError::Serialization(e.to_string()))?;
        let length = payload.len() as u32;
        let crc = crc32fast::hash(&payload);

        let mut w = self.writer.lock().expect("journal mutex poisoned");
        let entry_offset = w.offset;

        w.writer.write_all(&length.to_le_bytes())?;
        w.writer.write_all(&crc.to_le_bytes())?;
        w.writer.write_all(&payload)?;
        w.writer.flush()?;
        if self.config.sync_mode == SyncMode::EveryWrite {
            w.writer.get_ref().sync_all()?;
        }
        w.offset += (HEADER_SIZE + payload.len()) as u64;

        debug!(offset = entry_offset, kind = unit.kind(), unit = %unit.id(), "journal append");
        Ok(entry_offset)
    }

    /// Read back every intact unit, in append order.
    pub fn recover(&self) -> FabricResult<Vec<PropagationUnit>> {
        let mut data = Vec::new();
        BufReader::new(File::open(&self.path)?).read_to_end(&mut data)?;
        let (units, _) = scan(&data);
        debug!(recovered = units.len(), path = %self.path.display(), "journal recovery complete");
        Ok(units)
    }

    /// Current write offset (bytes).
    pub fn offset(&self) -> u64 {
        self.writer.lock().expect("journal mutex poisoned").offset
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Decode entries front to back. Returns the intact units and the length of
/// the prefix that ends at the last complete entry.
fn scan(data: &[u8]) -> (Vec<PropagationUnit>, usize) {
    let mut units = Vec::new();
    let mut offset = 0usize;
    while offset + HEADER_SIZE <= data.len() {
        let header = &data[offset..offset + HEADER_SIZE];
        let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        let start = offset + HEADER_SIZE;
        if length == 0 || start + length > data.len() {
            warn!(offset, length, file_len = data.len(), "torn journal tail; stopping recovery");
            return (units, offset);
        }
        let payload = &data[start..start + length];
        offset = start + length;

        let actual_crc = crc32fast::hash(payload);
        if actual_crc != expected_crc {
            warn!(
                offset = start - HEADER_SIZE,
                expected = expected_crc,
                actual = actual_crc,
                "CRC mismatch; skipping journal entry"
            );
            continue;
        }
        match bincode::deserialize::<PropagationUnit>(payload) {
            Ok(unit) => units.push(unit),
            Err(e) => warn!(offset = start - HEADER_SIZE, error = %e, "undecodable journal entry; skipping"),
        }
    }
    if offset < data.len() {
        warn!(offset, file_len = data.len(), "partial journal header; stopping recovery");
    }
    (units, offset)
}

impl std::fmt::Debug for Journal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Journal")
            .field("path", &self.path)
            .field("offset", &self.offset())
            .finish()
    }
}
