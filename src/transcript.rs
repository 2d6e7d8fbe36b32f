use crate::error::{OfficeError, Result};
use crate::models::Event;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{self, LineWriter, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

// ============================================================================
// Transcript - numbered, append-only event log
// ============================================================================
//
// Every logged event gets the next sequence number and becomes one line
// `<seq>: <message>`. Callers are serialized by one mutex, so lines never
// interleave and sequence numbers follow the order in which callers got in.
// The lock is never held across an await; a line write is one short
// blocking call.
//
// ============================================================================

pub const DEFAULT_TRANSCRIPT_PATH: &str = "post_office.out";

/// One numbered transcript line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub seq: u64,
    pub event: Event,
}

impl fmt::Display for TranscriptEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.seq, self.event)
    }
}

struct TranscriptInner {
    next_seq: u64,
    sink: Box<dyn Write + Send>,
    retained: Option<Vec<TranscriptEntry>>,
}

pub struct Transcript {
    inner: Mutex<TranscriptInner>,
}

impl Transcript {
    /// Truncate (or create) `path` and log into it
    pub fn to_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| OfficeError::TranscriptOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::to_writer(LineWriter::new(file)))
    }

    pub fn to_writer(writer: impl Write + Send + 'static) -> Self {
        Self::build(Box::new(writer), None)
    }

    /// Keep entries in memory only; read them back with [`Transcript::entries`]
    pub fn in_memory() -> Self {
        Self::build(Box::new(io::sink()), Some(Vec::new()))
    }

    fn build(sink: Box<dyn Write + Send>, retained: Option<Vec<TranscriptEntry>>) -> Self {
        Self {
            inner: Mutex::new(TranscriptInner {
                next_seq: 1,
                sink,
                retained,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TranscriptInner> {
        // A panic mid-write leaves at most a partial line; keep logging
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one event and return its sequence number
    pub async fn log(&self, event: Event) -> Result<u64> {
        let mut inner = self.lock();
        let entry = TranscriptEntry {
            seq: inner.next_seq,
            event,
        };

        writeln!(inner.sink, "{}", entry)
            .and_then(|_| inner.sink.flush())
            .map_err(|source| OfficeError::TranscriptWrite {
                seq: entry.seq,
                source,
            })?;

        if let Some(retained) = inner.retained.as_mut() {
            retained.push(entry);
        }
        inner.next_seq += 1;

        tracing::trace!(seq = entry.seq, event = %entry.event, "transcript line");
        Ok(entry.seq)
    }

    /// Number of lines written so far
    pub async fn len(&self) -> u64 {
        self.lock().next_seq - 1
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Retained entries; empty unless built with [`Transcript::in_memory`]
    pub async fn entries(&self) -> Vec<TranscriptEntry> {
        self.lock().retained.clone().unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================
