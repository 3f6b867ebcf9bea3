//! Fixed-size status record.
//!
//! A test child hands its [`Status`] to the parent as exactly one record of
//! [`STATUS_RECORD_LEN`] bytes written to a fresh pipe; the parent reads
//! exactly one record back.
//!
//! ```text
//! offset  size  field
//!      0     4  magic "FKST"
//!      4     1  flags (bit 0: failed, bit 1: invalid present)
//!      5     2  assertion length, big endian
//!      7  1024  assertion bytes, zero padded
//!   1031     2  invalid length, big endian
//!   1033  1024  invalid bytes, zero padded
//! ```

use std::io::{self, Read, Write};

use static_assertions::const_assert;

use crate::status::Status;
use crate::utils::text::truncate_utf8;

/// Record magic.
pub const MAGIC: [u8; 4] = *b"FKST";
/// Maximum encoded length of each text field, in bytes.
pub const MAX_TEXT_LEN: usize = 1024;

const FLAGS_OFFSET: usize = MAGIC.len();
const ASSERTION_OFFSET: usize = FLAGS_OFFSET + 1;
const INVALID_OFFSET: usize = ASSERTION_OFFSET + TEXT_SLOT_LEN;
const TEXT_SLOT_LEN: usize = 2 + MAX_TEXT_LEN;

/// Size of one encoded status record.
pub const STATUS_RECORD_LEN: usize = INVALID_OFFSET + TEXT_SLOT_LEN;

const FLAG_FAILED: u8 = 0b01;
const FLAG_INVALID: u8 = 0b10;

// One record fits a single page-sized pipe buffer, so the child's only
// write never blocks on a fresh pipe.
const_assert!(STATUS_RECORD_LEN <= 4096);

/// Status record decoding errors.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("status record truncated: child exited without sending a full record")]
    Truncated,

    #[error("status record has bad magic {0:02x?}")]
    BadMagic([u8; 4]),

    #[error("status record {field} length {len} exceeds {max}", max = MAX_TEXT_LEN)]
    TextTooLong { field: &'static str, len: usize },

    #[error("status record {field} is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },

    #[error("status record I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Encode a status into one record. Text longer than [`MAX_TEXT_LEN`] is
/// truncated at a character boundary.
pub fn encode(status: &Status) -> [u8; STATUS_RECORD_LEN] {
    let mut record = [0u8; STATUS_RECORD_LEN];
    record[..FLAGS_OFFSET].copy_from_slice(&MAGIC);

    let mut flags = 0;
    if status.failed {
        flags |= FLAG_FAILED;
    }
    if status.invalid.is_some() {
        flags |= FLAG_INVALID;
    }
    record[FLAGS_OFFSET] = flags;

    put_text(&mut record[ASSERTION_OFFSET..INVALID_OFFSET], &status.assertion);
    put_text(
        &mut record[INVALID_OFFSET..],
        status.invalid.as_deref().unwrap_or_default(),
    );
    record
}

/// Decode one record.
pub fn decode(record: &[u8; STATUS_RECORD_LEN]) -> Result<Status, WireError> {
    let mut magic = [0u8; 4];
    magic.copy_from_slice(&record[..FLAGS_OFFSET]);
    if magic != MAGIC {
        return Err(WireError::BadMagic(magic));
    }

    let flags = record[FLAGS_OFFSET];
    let assertion = take_text(&record[ASSERTION_OFFSET..INVALID_OFFSET], "assertion")?;
    let invalid = take_text(&record[INVALID_OFFSET..], "invalid")?;

    Ok(Status {
        assertion,
        failed: flags & FLAG_FAILED != 0,
        invalid: (flags & FLAG_INVALID != 0).then_some(invalid),
    })
}

/// Write one encoded record.
pub fn write_record<W: Write>(writer: &mut W, status: &Status) -> io::Result<()> {
    writer.write_all(&encode(status))?;
    writer.flush()
}

/// Read and decode exactly one record.
///
/// On a non-blocking reader, running out of buffered bytes counts as a
/// truncated record.
pub fn read_record<R: Read>(reader: &mut R) -> Result<Status, WireError> {
    let mut record = [0u8; STATUS_RECORD_LEN];
    reader.read_exact(&mut record).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof | io::ErrorKind::WouldBlock => WireError::Truncated,
        _ => WireError::Io(e),
    })?;
    decode(&record)
}

fn put_text(slot: &mut [u8], text: &str) {
    let text = truncate_utf8(text, MAX_TEXT_LEN);
    let len = text.len() as u16;
    slot[..2].copy_from_slice(&len.to_be_bytes());
    slot[2..2 + text.len()].copy_from_slice(text.as_bytes());
}

fn take_text(slot: &[u8], field: &'static str) -> Result<String, WireError> {
    let len = u16::from_be_bytes([slot[0], slot[1]]) as usize;
    if len > MAX_TEXT_LEN {
        return Err(WireError::TextTooLong { field, len });
    }
    String::from_utf8(slot[2..2 + len].to_vec()).map_err(|_| WireError::InvalidUtf8 { field })
}
