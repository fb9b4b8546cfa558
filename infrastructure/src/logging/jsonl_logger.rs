//! JSONL file writer for delegation events.
//!
//! Each [`DelegationEvent`] becomes one JSON line carrying a `type`, a
//! `timestamp` and the event payload. The file is opened in append mode so
//! one log can span many invocations.

use relay_application::ports::delegation_logger::{DelegationEvent, DelegationLogger};
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Append-only JSONL delegation log.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every record and on `Drop`.
pub struct JsonlDelegationLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlDelegationLogger {
    /// Open (or create) the log at `path`, creating parent directories.
    ///
    /// Returns `None` if the file cannot be opened; delegation then runs
    /// without a structured log.
    pub fn open(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(dir = %parent.display(), error = %e, "Could not create delegation log directory");
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not open delegation log");
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(event: DelegationEvent) -> Value {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let mut record = Map::new();
        record.insert("type".to_string(), Value::from(event.event_type));
        record.insert("timestamp".to_string(), Value::from(timestamp));
        match event.payload {
            Value::Object(fields) => {
                for (key, value) in fields {
                    record.entry(key).or_insert(value);
                }
            }
            Value::Null => {}
            other => {
                record.insert("data".to_string(), other);
            }
        }
        Value::Object(record)
    }
}

impl DelegationLogger for JsonlDelegationLogger {
    fn log(&self, event: DelegationEvent) {
        let Ok(line) = serde_json::to_string(&Self::record(event)) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlDelegationLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
