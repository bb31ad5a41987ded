use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SightLogError;

/// Records held in memory before an automatic flush.
pub const DEFAULT_BUFFER_SIZE: usize = 256;

/// One recognition outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SightRecord {
    pub timestamp: DateTime<Utc>,

    /// Identity name, or `unknown`.
    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_id: Option<usize>,

    /// Exact Euclidean distance to the accepted gallery entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
}

impl SightRecord {
    /// Creates a record stamped with the current UTC time.
    pub fn new(label: impl Into<String>, index_id: Option<usize>, distance: Option<f32>) -> Self {
        Self::at(Utc::now(), label, index_id, distance)
    }

    pub fn at(
        timestamp: DateTime<Utc>,
        label: impl Into<String>,
        index_id: Option<usize>,
        distance: Option<f32>,
    ) -> Self {
        Self {
            timestamp,
            label: label.into(),
            index_id,
            distance,
        }
    }
}

/// Append-only sighting log backed by a JSONL file.
///
/// [`SightLog::append`] only buffers. Records reach the file on
/// [`SightLog::flush`], or automatically once the buffer holds
/// `buffer_size` records. Existing file content is never rewritten.
///
/// Buffered records are discarded if the log is dropped without a flush.
pub struct SightLog {
    path: PathBuf,
    buffer_size: usize,
    pending: Mutex<Vec<SightRecord>>,
}

impl SightLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_buffer_size(path, DEFAULT_BUFFER_SIZE)
    }

    /// A `buffer_size` of 0 or 1 writes through on every append.
    pub fn with_buffer_size(path: impl Into<PathBuf>, buffer_size: usize) -> Self {
        Self {
            path: path.into(),
            buffer_size: buffer_size.max(1),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Number of buffered records not yet written.
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Buffers a record, flushing if the buffer is full.
    pub fn append(&self, record: SightRecord) -> Result<(), SightLogError> {
        let mut pending = self.pending.lock();
        pending.push(record);
        if pending.len() >= self.buffer_size {
            self.write_out(&mut pending)?;
        }
        Ok(())
    }

    /// Buffers several records, flushing whenever the buffer fills.
    pub fn extend<I>(&self, records: I) -> Result<(), SightLogError>
    where
        I: IntoIterator<Item = SightRecord>,
    {
        let mut pending = self.pending.lock();
        for r in records {
            pending.push(r);
            if pending.len() >= self.buffer_size {
                self.write_out(&mut pending)?;
            }
        }
        Ok(())
    }

    /// Writes all buffered records and returns how many were written.
    pub fn flush(&self) -> Result<usize, SightLogError> {
        let mut pending = self.pending.lock();
        self.write_out(&mut pending)
    }

    /// Reads every record in a log file.
    pub fn read(path: &Path) -> Result<Vec<SightRecord>, SightLogError> {
        let reader = BufReader::new(File::open(path)?);
        let mut out = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let rec = serde_json::from_str(&line).map_err(|e| SightLogError::Malformed {
                line: i + 1,
                reason: e.to_string(),
            })?;
            out.push(rec);
        }
        Ok(out)
    }

    // The whole batch is serialized before touching the file so a
    // serialization failure leaves both the file and the buffer intact.
    fn write_out(&self, pending: &mut Vec<SightRecord>) -> Result<usize, SightLogError> {
        if pending.is_empty() {
            return Ok(0);
        }

        let mut buf = Vec::with_capacity(pending.len() * 96);
        for r in pending.iter() {
            serde_json::to_writer(&mut buf, r)?;
            buf.push(b'\n');
        }

        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        f.write_all(&buf)?;
        f.flush()?;

        let n = pending.len();
        pending.clear();
        debug!("sightlog: flushed {} records to {}", n, self.path.display());
        Ok(n)
    }
}

impl Drop for SightLog {
    fn drop(&mut self) {
        let n = self.pending.get_mut().len();
        if n > 0 {
            warn!(
                "sightlog: dropping {} unflushed records for {}",
                n,
                self.path.display()
            );
        }
    }
}

impl std::fmt::Debug for SightLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SightLog")
            .field("path", &self.path)
            .field("buffer_size", &self.buffer_size)
            .field("pending", &self.pending())
            .finish()
    }
}
