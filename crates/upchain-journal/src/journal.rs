use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use upchain_ledger::Block;

use crate::error::{JournalError, Result};

/// Flush/sync strategy for the journal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` after every block.
    EveryWrite,
    /// Flush to the OS and let it decide when to write back.
    #[default]
    OsDefault,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    pub sync_mode: SyncMode,
}

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: u64 = 8;

struct JournalWriter {
    writer: BufWriter<File>,
    /// Current end of the journal file.
    offset: u64,
    /// Set when a failed append could not be undone.
    broken: bool,
}

/// Append-only file of blocks.
///
/// On-disk format, repeated once per block:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized Block)]
/// ```
///
/// Entries whose checksum does not match are skipped on recovery. Bytes after
/// the last complete entry are cut off when the journal is opened, but only
/// if no intact entry can be found among them; otherwise opening fails with
/// [`JournalError::Corrupt`] and the file is left untouched.
pub struct BlockJournal {
    path: PathBuf,
    writer: Mutex<JournalWriter>,
    config: JournalConfig,
}

impl BlockJournal {
    /// Open (or create) the journal file at `path`.
    pub fn open(path: &Path, config: JournalConfig) -> Result<Self> {
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
        let (_, valid_len) = scan(path, file_len)?;
        if valid_len < file_len {
            check_tail(path, valid_len, file_len)?;
            warn!(
                path = %path.display(),
                valid_len,
                file_len,
                "discarding incomplete journal tail"
            );
            file.set_len(valid_len)?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(JournalWriter {
                writer: BufWriter::new(file),
                offset: valid_len,
                broken: false,
            }),
            config,
        })
    }

    /// Append one block. Returns the byte offset of its entry.
    ///
    /// If the write fails, whatever part of the entry reached the file is
    /// removed again before the error is returned.
    pub fn append(&self, block: &Block) -> Result<u64> {
        let payload = bincode::serialize(block).map_err(|e| JournalError::Serialization(e.to_string()))?;
        let length = u32::try_from(payload.len()).map_err(|_| JournalError::EntryTooLarge(payload.len()))?;
        let crc = crc32fast::hash(&payload);

        let mut w = self.lock();
        let entry_offset = w.offset;
        if w.broken {
            return Err(JournalError::Unwritable(entry_offset));
        }

        if let Err(e) = write_entry(&mut w.writer, length, crc, &payload, self.config.sync_mode) {
            warn!(offset = entry_offset, index = block.index, error = %e, "journal append failed; rolling back");
            if let Err(rollback) = self.rollback(&mut w) {
                warn!(offset = entry_offset, error = %rollback, "journal rollback failed; refusing further appends");
                w.broken = true;
            }
            return Err(e.into());
        }

        w.offset += HEADER_SIZE + u64::from(length);

        debug!(offset = entry_offset, index = block.index, len = payload.len(), "journal append");
        Ok(entry_offset)
    }

    /// Read back every intact block, in file order.
    pub fn recover(&self) -> Result<Vec<Block>> {
        let _guard = self.lock();
        let file_len = fs::metadata(&self.path)?.len();
        let (blocks, _) = scan(&self.path, file_len)?;
        debug!(recovered = blocks.len(), "journal recovery complete");
        Ok(blocks)
    }

    /// Read the blocks of a journal file without opening it for writing.
    ///
    /// Unlike [`open`](Self::open) this never creates the file or trims a
    /// torn tail. It fails the same way when intact entries sit behind a
    /// damaged one.
    pub fn read_blocks(path: &Path) -> Result<Vec<Block>> {
        let file_len = fs::metadata(path)?.len();
        let (blocks, valid_len) = scan(path, file_len)?;
        if valid_len < file_len {
            check_tail(path, valid_len, file_len)?;
        }
        Ok(blocks)
    }

    /// Current end of the journal in bytes.
    pub fn offset(&self) -> u64 {
        self.lock().offset
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &JournalConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, JournalWriter> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Forget anything a failed append left behind and cut the file back to
    /// the end of the last complete entry.
    fn rollback(&self, w: &mut JournalWriter) -> io::Result<()> {
        let file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        let stale = std::mem::replace(&mut w.writer, BufWriter::new(file));
        // Unflushed bytes must not be written when the old writer drops.
        let _ = stale.into_parts();
        w.writer.get_ref().set_len(w.offset)?;
        Ok(())
    }
}

fn write_entry(writer: &mut BufWriter<File>, length: u32, crc: u32, payload: &[u8], sync_mode: SyncMode) -> io::Result<()> {
    writer.write_all(&length.to_le_bytes())?;
    writer.write_all(&crc.to_le_bytes())?;
    writer.write_all(payload)?;
    writer.flush()?;
    if sync_mode == SyncMode::EveryWrite {
        writer.get_ref().sync_all()?;
    }
    Ok(())
}

/// Walk the journal front to back. Returns the decoded blocks and the length
/// of the prefix made of complete entries.
fn scan(path: &Path, file_len: u64) -> Result<(Vec<Block>, u64)> {
    let mut file = BufReader::new(File::open(path)?);
    let mut blocks = Vec::new();
    let mut offset: u64 = 0;

    while offset + HEADER_SIZE <= file_len {
        file.seek(SeekFrom::Start(offset))?;

        let mut header = [0u8; HEADER_SIZE as usize];
        match file.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }

        let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        if length == 0 || offset + HEADER_SIZE + u64::from(length) > file_len {
            warn!(offset, length, file_len, "invalid journal entry length; stopping recovery");
            break;
        }

        let mut payload = vec![0u8; length as usize];
        match file.read_exact(&mut payload) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                warn!(offset, "truncated journal entry; stopping recovery");
                break;
            }
            Err(e) => return Err(e.into()),
        }

        let actual_crc = crc32fast::hash(&payload);
        if actual_crc != expected_crc {
            warn!(offset, expected = expected_crc, actual = actual_crc, "CRC mismatch; skipping entry");
        } else {
            match bincode::deserialize::<Block>(&payload) {
                Ok(block) => blocks.push(block),
                Err(e) => warn!(offset, error = %e, "undecodable journal entry; skipping"),
            }
        }

        offset += HEADER_SIZE + u64::from(length);
    }

    Ok((blocks, offset))
}

/// Fail with [`JournalError::Corrupt`] if an intact entry starts anywhere
/// after the entry at `from`, where the scan stopped.
fn check_tail(path: &Path, from: u64, file_len: u64) -> Result<()> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(from))?;
    let mut tail = Vec::with_capacity(usize::try_from(file_len - from).unwrap_or_default());
    file.read_to_end(&mut tail)?;

    match (1..tail.len()).find(|&start| decode_entry(&tail[start..]).is_some()) {
        Some(start) => {
            warn!(
                path = %path.display(),
                damaged_at = from,
                intact_at = from + start as u64,
                "damaged journal entry is followed by intact ones"
            );
            Err(JournalError::Corrupt {
                path: path.display().to_string(),
                offset: from,
            })
        }
        None => Ok(()),
    }
}

/// The block at the front of `bytes`, if a complete entry with a matching
/// checksum starts there.
fn decode_entry(bytes: &[u8]) -> Option<Block> {
    let header = bytes.get(..HEADER_SIZE as usize)?;
    let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
    let crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if length == 0 {
        return None;
    }
    let payload = bytes.get(HEADER_SIZE as usize..(HEADER_SIZE as usize).checked_add(length)?)?;
    if crc32fast::hash(payload) != crc {
        return None;
    }
    bincode::deserialize(payload).ok()
}
