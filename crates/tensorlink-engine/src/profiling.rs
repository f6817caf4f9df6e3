//! Per-session profiling collaborator.
//!
//! Records one event per executed node and serializes the run history as a
//! chrome-trace style JSON artifact on disk, which the boundary exposes as
//! an opaque string. Timestamps are microseconds relative to session start;
//! the session start itself is recorded as wall-clock nanoseconds.

use crate::error::{EngineError, Result};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// A single profiling event.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileEvent {
    /// Event name (node label).
    pub name: String,
    /// Event category (operator name).
    pub cat: String,
    /// Trace phase; always a complete event.
    pub ph: char,
    /// Microseconds since session start.
    pub ts: u64,
    /// Duration in microseconds.
    pub dur: u64,
    /// Process id.
    pub pid: u32,
}

/// Profiling configuration for one session.
#[derive(Debug, Clone)]
pub struct ProfileConfig {
    /// Whether events are recorded at all.
    pub enabled: bool,
    /// Artifact file name prefix.
    pub prefix: String,
    /// Directory the artifact is written into.
    pub dir: PathBuf,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix: "tensorlink".to_string(),
            dir: std::env::temp_dir(),
        }
    }
}

/// Event recorder scoped to one session.
#[derive(Debug)]
pub struct Profiler {
    config: ProfileConfig,
    start: Instant,
    start_time_ns: i64,
    events: Mutex<Vec<ProfileEvent>>,
    artifact: Mutex<Option<PathBuf>>,
}

impl Profiler {
    /// Create a profiler; the session start timestamp is taken now.
    pub fn new(config: ProfileConfig) -> Self {
        let start_time_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as i64)
            .unwrap_or(0);
        Self {
            config,
            start: Instant::now(),
            start_time_ns,
            events: Mutex::new(Vec::new()),
            artifact: Mutex::new(None),
        }
    }

    /// Create a profiler that records nothing.
    pub fn disabled() -> Self {
        Self::new(ProfileConfig {
            enabled: false,
            ..ProfileConfig::default()
        })
    }

    /// Whether events are being recorded.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Session start as wall-clock nanoseconds since the epoch.
    pub fn start_time_ns(&self) -> i64 {
        self.start_time_ns
    }

    /// Number of recorded events.
    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Record one event.
    pub fn record(&self, name: &str, category: &str, started: Instant, duration: Duration) {
        if !self.config.enabled {
            return;
        }
        let ts = started
            .checked_duration_since(self.start)
            .unwrap_or_default()
            .as_micros() as u64;
        self.events.lock().unwrap().push(ProfileEvent {
            name: name.to_string(),
            cat: category.to_string(),
            ph: 'X',
            ts,
            dur: duration.as_micros() as u64,
            pid: process::id(),
        });
    }

    /// Serialize the recorded events to the artifact file and return its
    /// path. Overwrites any previous artifact for this session.
    pub fn flush(&self) -> Result<PathBuf> {
        if !self.config.enabled {
            return Err(EngineError::Profiling(
                "profiling is disabled for this session".into(),
            ));
        }
        let path = self
            .config
            .dir
            .join(format!("{}_{}.json", self.config.prefix, self.start_time_ns));
        let events = self.events.lock().unwrap();
        let json = serde_json::to_string_pretty(&*events)
            .map_err(|e| EngineError::Profiling(e.to_string()))?;
        fs::write(&path, json)?;
        debug!(path = %path.display(), events = events.len(), "wrote profiling artifact");
        *self.artifact.lock().unwrap() = Some(path.clone());
        Ok(path)
    }

    /// Read the artifact back as a string, flushing first if it was never
    /// written.
    pub fn read(&self) -> Result<String> {
        let existing = self.artifact.lock().unwrap().clone();
        let path = match existing {
            Some(path) => path,
            None => self.flush()?,
        };
        Ok(fs::read_to_string(&path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_profiler_records_nothing() {
        let profiler = Profiler::disabled();
        profiler.record("n", "Identity", Instant::now(), Duration::from_micros(5));
        assert_eq!(profiler.event_count(), 0);
        assert!(profiler.flush().is_err());
    }

    #[test]
    fn events_round_trip_through_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let profiler = Profiler::new(ProfileConfig {
            enabled: true,
            prefix: "test".into(),
            dir: dir.path().to_path_buf(),
        });
        profiler.record("node_0", "Identity", Instant::now(), Duration::from_micros(3));
        let text = profiler.read().unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0]["name"], "node_0");
        assert_eq!(parsed[0]["cat"], "Identity");
    }

    #[test]
    fn start_time_is_stable() {
        let profiler = Profiler::new(ProfileConfig::default());
        let first = profiler.start_time_ns();
        assert!(first > 0);
        assert_eq!(profiler.start_time_ns(), first);
    }
}
