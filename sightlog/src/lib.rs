//! Append-only sighting log.
//!
//! Recognition outcomes are buffered in memory and appended to a JSONL file
//! when the caller flushes, or when the buffer fills. The matching engine
//! never writes here on its own.
//!
//! ```no_run
//! use faceid_sightlog::{SightLog, SightRecord};
//!
//! let log = SightLog::new("sightings.jsonl");
//! log.append(SightRecord::new("alice", Some(0), Some(0.12)))?;
//! log.append(SightRecord::new("unknown", None, None))?;
//! log.flush()?;
//! # Ok::<(), faceid_sightlog::SightLogError>(())
//! ```

mod error;
mod log;

pub use error::SightLogError;
pub use log::{DEFAULT_BUFFER_SIZE, SightLog, SightRecord};
