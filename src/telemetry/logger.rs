//! # Stats Logger
//!
//! Appends protocol statistics snapshots as JSON Lines to rotating files.
//!
//! Files are named `vesc_stats_<YYYYmmdd_HHMMSS>_<seq>.jsonl` so that
//! lexical order is creation order.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::ProtocolStats;
use crate::config::TelemetryConfig;
use crate::error::Result;

const FILE_PREFIX: &str = "vesc_stats_";
const FILE_SUFFIX: &str = ".jsonl";

/// One JSONL line
#[derive(Debug, Clone, Serialize)]
pub struct StatsRecord {
    /// Snapshot time
    pub timestamp: DateTime<Utc>,
    /// Current setpoint at snapshot time, in milliamps
    pub current_setpoint_ma: i32,
    /// Counters, flattened into the record
    #[serde(flatten)]
    pub stats: ProtocolStats,
}

impl StatsRecord {
    /// Record stamped with the current time
    pub fn now(stats: ProtocolStats, current_setpoint_ma: i32) -> Self {
        Self {
            timestamp: Utc::now(),
            current_setpoint_ma,
            stats,
        }
    }
}

/// Rotating JSONL writer
#[derive(Debug)]
pub struct StatsLogger {
    dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    records_in_file: usize,
    file_seq: u64,
}

impl StatsLogger {
    /// Create the log directory if needed
    ///
    /// No file is opened until the first record is written.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        let dir = PathBuf::from(&config.log_dir);
        fs::create_dir_all(&dir)?;
        info!("Logging protocol stats to {}", dir.display());

        Ok(Self {
            dir,
            max_records_per_file: config.max_records_per_file.max(1),
            max_files_to_keep: config.max_files_to_keep.max(1),
            writer: None,
            records_in_file: 0,
            file_seq: 0,
        })
    }

    /// Append one record, rotating first if the current file is full
    ///
    /// # Errors
    ///
    /// Returns error on serialization or file I/O failure
    pub fn log(&mut self, record: &StatsRecord) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        if let Some(writer) = self.writer.as_mut() {
            serde_json::to_writer(&mut *writer, record)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
            self.records_in_file += 1;
        }

        Ok(())
    }

    /// Directory holding the log files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Start a new file and delete the oldest ones beyond the retention limit
    fn rotate(&mut self) -> Result<()> {
        if let Some(mut old) = self.writer.take() {
            old.flush()?;
        }

        let name = format!(
            "{}{}_{:04}{}",
            FILE_PREFIX,
            Utc::now().format("%Y%m%d_%H%M%S"),
            self.file_seq,
            FILE_SUFFIX
        );
        self.file_seq += 1;

        let path = self.dir.join(name);
        debug!("Opening stats log {}", path.display());
        self.writer = Some(BufWriter::new(File::create(&path)?));
        self.records_in_file = 0;

        self.prune()
    }

    fn prune(&self) -> Result<()> {
        let mut files = log_files(&self.dir)?;
        if files.len() <= self.max_files_to_keep {
            return Ok(());
        }

        let excess = files.len() - self.max_files_to_keep;
        for path in files.drain(..excess) {
            debug!("Removing old stats log {}", path.display());
            fs::remove_file(path)?;
        }

        Ok(())
    }
}

/// Stats log files in `dir`, oldest first
fn log_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(FILE_PREFIX) && n.ends_with(FILE_SUFFIX));
        if is_log {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
