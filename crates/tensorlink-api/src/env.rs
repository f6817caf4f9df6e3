//! The process-wide runtime environment.
//!
//! Exactly one environment exists per process. Creation is serialized
//! behind a one-time barrier, so concurrent first uses from multiple
//! threads still construct it once; there is no way to construct a second.

use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};
use tensorlink_core::logging::{init_logging, LoggingConfig};
use tracing::info;

static ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

/// Process-wide state shared by every context: one-time logging setup and
/// the profiling epoch.
#[derive(Debug)]
pub struct Environment {
    created_at_ns: i64,
}

impl Environment {
    /// The process environment, created on first use.
    pub fn global() -> &'static Environment {
        ENVIRONMENT.get_or_init(Environment::bootstrap)
    }

    fn bootstrap() -> Self {
        // A host application may have installed its own subscriber; ours
        // only wins if nothing is registered yet.
        init_logging(LoggingConfig::default());
        let created_at_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as i64)
            .unwrap_or(0);
        info!(created_at_ns, "tensorlink environment initialized");
        Self { created_at_ns }
    }

    /// Wall-clock nanoseconds at environment creation.
    pub fn created_at_ns(&self) -> i64 {
        self.created_at_ns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_environment_is_a_singleton() {
        let first = Environment::global() as *const Environment;
        let second = Environment::global() as *const Environment;
        assert_eq!(first, second);
        assert!(Environment::global().created_at_ns() > 0);
    }
}
