//! Append-only submission log
//!
//! - One JSON record per line
//! - Written straight to the file and fsynced; a failed append leaves no
//!   bytes behind for a later append to flush
//! - Records are never rewritten

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::errors::{PersistenceError, PersistenceResult};
use crate::form::SubmissionRecord;

pub const SUBMISSIONS_FILE_NAME: &str = "submissions.jsonl";

/// Submission log trait
pub trait SubmissionLog: Send + Sync {
    /// Append a record. The record is durable once this returns.
    fn append(&self, record: &SubmissionRecord) -> PersistenceResult<()>;

    /// All records in append order
    fn records(&self) -> PersistenceResult<Vec<SubmissionRecord>>;
}

/// File-based submission log
pub struct FileSubmissionLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSubmissionLog {
    /// Open or create a log file
    pub fn open(path: impl AsRef<Path>) -> PersistenceResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| PersistenceError::io(&path, e))?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Append one line and fsync. On failure the file is cut back to its
/// previous length so a half-written line cannot surface later.
fn append_line(file: &mut File, line: &str) -> io::Result<()> {
    let len = file.metadata()?.len();
    let mut bytes = Vec::with_capacity(line.len() + 1);
    bytes.extend_from_slice(line.as_bytes());
    bytes.push(b'\n');

    let result = file.write_all(&bytes).and_then(|_| file.sync_all());
    if result.is_err() {
        let _ = file.set_len(len);
    }
    result
}

impl SubmissionLog for FileSubmissionLog {
    fn append(&self, record: &SubmissionRecord) -> PersistenceResult<()> {
        let line = serde_json::to_string(record)?;
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        append_line(&mut file, &line).map_err(|e| PersistenceError::io(&self.path, e))
    }

    fn records(&self) -> PersistenceResult<Vec<SubmissionRecord>> {
        // Hold the file lock so a concurrent append is not read half-written.
        let _file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        let file = File::open(&self.path).map_err(|e| PersistenceError::io(&self.path, e))?;

        let mut records = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| PersistenceError::io(&self.path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|e| {
                PersistenceError::corrupt(&self.path, format!("line {}: {}", index + 1, e))
            })?;
            records.push(record);
        }
        Ok(records)
    }
}

/// In-memory submission log (for testing and ephemeral runs)
#[derive(Debug, Default)]
pub struct MemorySubmissionLog {
    records: Mutex<Vec<SubmissionRecord>>,
}

impl MemorySubmissionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SubmissionLog for MemorySubmissionLog {
    fn append(&self, record: &SubmissionRecord) -> PersistenceResult<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    fn records(&self) -> PersistenceResult<Vec<SubmissionRecord>> {
        Ok(self.records.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::Variant;
    use crate::form::{FormSubmission, FormValues};
    use tempfile::TempDir;

    fn record(name: &str) -> SubmissionRecord {
        let mut values = FormValues::new();
        values.insert("full_name".into(), name.into());
        SubmissionRecord::new(FormSubmission::new(Variant::A, values))
    }

    #[test]
    fn test_file_log_appends_in_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(SUBMISSIONS_FILE_NAME);
        let log = FileSubmissionLog::open(&path).unwrap();

        log.append(&record("Ann")).unwrap();
        log.append(&record("Bob")).unwrap();

        let names: Vec<_> = log
            .records()
            .unwrap()
            .into_iter()
            .map(|r| r.values["full_name"].clone())
            .collect();
        assert_eq!(names, vec!["Ann", "Bob"]);
    }

    #[test]
    fn test_file_log_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(SUBMISSIONS_FILE_NAME);
        let first = record("Ann");
        {
            let log = FileSubmissionLog::open(&path).unwrap();
            log.append(&first).unwrap();
        }
        let log = FileSubmissionLog::open(&path).unwrap();
        assert_eq!(log.records().unwrap(), vec![first]);
    }

    #[test]
    fn test_file_log_reports_corrupt_line() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(SUBMISSIONS_FILE_NAME);
        std::fs::write(&path, "garbage\n").unwrap();

        let log = FileSubmissionLog::open(&path).unwrap();
        let err = log.records().unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_memory_log() {
        let log = MemorySubmissionLog::new();
        assert!(log.is_empty());
        log.append(&record("Ann")).unwrap();
        assert_eq!(log.len(), 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_append_is_not_replayed() {
        // Every write to /dev/full fails with ENOSPC.
        let log = FileSubmissionLog::open("/dev/full").unwrap();
        assert!(log.append(&record("Ann")).is_err());
        assert!(log.append(&record("Bob")).is_err());
    }

    #[test]
    fn test_append_after_reopen_keeps_whole_lines() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(SUBMISSIONS_FILE_NAME);
        {
            let log = FileSubmissionLog::open(&path).unwrap();
            log.append(&record("Ann")).unwrap();
        }
        let log = FileSubmissionLog::open(&path).unwrap();
        log.append(&record("Bob")).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.ends_with('\n'));
        assert_eq!(log.records().unwrap().len(), 2);
    }
}
