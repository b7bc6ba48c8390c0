use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use cropchain_types::TxId;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::{StateError, StateResult};
use crate::world::PendingCommit;

/// One committed write as persisted in the journal.
///
/// On-disk frame:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized JournalRecord)]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalRecord {
    pub seq: u64,
    pub tx_id: TxId,
    /// Commit time: whole seconds since the UNIX epoch.
    pub timestamp_secs: i64,
    /// Commit time: nanoseconds past `timestamp_secs`.
    pub timestamp_nanos: u32,
    pub key: String,
    pub value: Vec<u8>,
    pub is_delete: bool,
}

impl JournalRecord {
    pub(crate) fn from_commit(commit: &PendingCommit) -> Self {
        Self {
            seq: commit.seq,
            tx_id: commit.tx_id,
            timestamp_secs: commit.timestamp.timestamp(),
            timestamp_nanos: commit.timestamp.timestamp_subsec_nanos(),
            key: commit.key.clone(),
            value: commit.value.clone(),
            is_delete: commit.is_delete,
        }
    }

    /// Commit time, if the stored seconds and nanoseconds are representable.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.timestamp_secs, self.timestamp_nanos)
            .single()
    }

    pub(crate) fn into_commit(self) -> PendingCommit {
        PendingCommit {
            seq: self.seq,
            tx_id: self.tx_id,
            timestamp: self.timestamp().unwrap_or_default(),
            key: self.key,
            value: self.value,
            is_delete: self.is_delete,
        }
    }
}

/// Flush/sync strategy for the journal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JournalSync {
    /// `fsync` after every commit (safest, highest latency).
    #[default]
    EveryWrite,
    /// Leave frames in the OS page cache.
    OsDefault,
}

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

/// Byte sink the journal appends frames to.
pub(crate) trait Segment: Write + Send {
    fn sync(&mut self) -> io::Result<()>;
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl Segment for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Append-only commit journal.
///
/// Frames are written in commit order. Recovery reads the file front to
/// back: a frame cut short at the end of the file is a torn write and is
/// truncated away; a checksum or decode failure anywhere else is corruption
/// and aborts the open.
///
/// A failed append is rolled back to the previous end of the journal. If
/// the rollback itself fails the journal refuses further appends until it
/// is reopened.
pub struct Journal {
    path: PathBuf,
    segment: Box<dyn Segment>,
    offset: u64,
    sync: JournalSync,
    failed: bool,
}

impl Journal {
    /// Open (or create) the journal at `path` and recover its records.
    pub fn open(path: &Path, sync: JournalSync) -> StateResult<(Self, Vec<JournalRecord>)> {
        Self::open_with(path, sync, |file| Box::new(file) as Box<dyn Segment>)
    }

    pub(crate) fn open_with(
        path: &Path,
        sync: JournalSync,
        wrap: impl FnOnce(File) -> Box<dyn Segment>,
    ) -> StateResult<(Self, Vec<JournalRecord>)> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        let file_len = file.metadata()?.len();
        let (records, valid_len) = recover(&file, file_len)?;
        if valid_len < file_len {
            warn!(
                path = %path.display(),
                valid_len,
                file_len,
                "torn journal tail; truncating"
            );
            file.set_len(valid_len)?;
        }

        debug!(path = %path.display(), recovered = records.len(), "journal opened");
        Ok((
            Self {
                path: path.to_path_buf(),
                segment: wrap(file),
                offset: valid_len,
                sync,
                failed: false,
            },
            records,
        ))
    }

    /// Append one record. Returns the byte offset of its frame.
    ///
    /// On error nothing of the frame remains in the journal.
    pub fn append(&mut self, record: &JournalRecord) -> StateResult<u64> {
        if self.failed {
            return Err(StateError::Unavailable(format!(
                "journal {} failed a rollback; reopen to recover",
                self.path.display()
            )));
        }

        let payload =
            bincode::serialize(record).map_err(|e| StateError::Serialization(e.to_string()))?;
        let length = u32::try_from(payload.len())
            .map_err(|_| StateError::Serialization("journal record too large".into()))?;
        let crc = crc32fast::hash(&payload);

        let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
        frame.extend_from_slice(&length.to_le_bytes());
        frame.extend_from_slice(&crc.to_le_bytes());
        frame.extend_from_slice(&payload);

        let entry_offset = self.offset;
        if let Err(e) = self.write_frame(&frame) {
            self.roll_back(record.seq);
            return Err(e.into());
        }

        self.offset += frame.len() as u64;
        debug!(offset = entry_offset, seq = record.seq, len = payload.len(), "journal append");
        Ok(entry_offset)
    }

    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.segment.write_all(frame)?;
        self.segment.flush()?;
        if self.sync == JournalSync::EveryWrite {
            self.segment.sync()?;
        }
        Ok(())
    }

    fn roll_back(&mut self, seq: u64) {
        match self.segment.truncate(self.offset) {
            Ok(()) => warn!(offset = self.offset, seq, "journal append failed; rolled back"),
            Err(e) => {
                error!(offset = self.offset, seq, error = %e, "journal rollback failed");
                self.failed = true;
            }
        }
    }

    /// Current end-of-journal offset.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read every complete frame. Returns the records and the length of the
/// valid prefix of the file.
fn recover(file: &File, file_len: u64) -> StateResult<(Vec<JournalRecord>, u64)> {
    let mut reader = BufReader::new(file);
    let mut records: Vec<JournalRecord> = Vec::new();
    let mut offset: u64 = 0;

    while offset < file_len {
        if offset + HEADER_SIZE as u64 > file_len {
            break;
        }

        let mut header = [0u8; HEADER_SIZE];
        match reader.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }

        let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        if length == 0 || offset + HEADER_SIZE as u64 + u64::from(length) > file_len {
            break;
        }

        let mut payload = vec![0u8; length as usize];
        match reader.read_exact(&mut payload) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }

        let actual_crc = crc32fast::hash(&payload);
        if actual_crc != expected_crc {
            return Err(StateError::CorruptJournal {
                offset,
                reason: format!(
                    "CRC mismatch: expected {expected_crc:#010x}, got {actual_crc:#010x}"
                ),
            });
        }

        let record: JournalRecord =
            bincode::deserialize(&payload).map_err(|e| StateError::CorruptJournal {
                offset,
                reason: e.to_string(),
            })?;

        let expected_seq = records.last().map_or(1, |r| r.seq + 1);
        if record.seq != expected_seq {
            return Err(StateError::CorruptJournal {
                offset,
                reason: format!("expected seq {expected_seq}, found {}", record.seq),
            });
        }

        if record.timestamp().is_none() {
            return Err(StateError::CorruptJournal {
                offset,
                reason: format!(
                    "timestamp {}.{:09} out of range",
                    record.timestamp_secs, record.timestamp_nanos
                ),
            });
        }

        records.push(record);
        offset += HEADER_SIZE as u64 + u64::from(length);
    }

    Ok((records, offset))
}
