//! Runtime parameters
//!
//! Parameters set by other parts of the robot at runtime (as opposed to the
//! static TOML configuration). The only one the node reads is the chassis
//! heading polarity.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::error::NodeError;

/// Read access to runtime parameters
pub trait ParameterSource: Send + Sync {
    /// Current value of `path`, or `None` if it is not set
    fn get(&self, path: &str) -> Option<f64>;
}

/// In-process parameter map
#[derive(Debug, Clone, Default)]
pub struct StaticParameters {
    values: Arc<Mutex<HashMap<String, f64>>>,
}

impl StaticParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, path: impl Into<String>, value: f64) {
        self.values.lock().insert(path.into(), value);
    }

    pub fn remove(&self, path: &str) -> Option<f64> {
        self.values.lock().remove(path)
    }
}

impl ParameterSource for StaticParameters {
    fn get(&self, path: &str) -> Option<f64> {
        self.values.lock().get(path).copied()
    }
}

/// Retry policy for [`wait_for_parameter`]
#[derive(Debug, Clone, Copy)]
pub struct ParameterWait {
    pub timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for ParameterWait {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_secs(1),
        }
    }
}

/// Block until `path` is available
///
/// Polls `source`, doubling the delay between attempts up to
/// `max_backoff`. Fails with [`NodeError::ParameterTimeout`] once
/// `timeout` has elapsed without a value.
pub fn wait_for_parameter(
    source: &dyn ParameterSource,
    path: &str,
    wait: ParameterWait,
) -> Result<f64, NodeError> {
    let start = Instant::now();
    let mut backoff = wait.initial_backoff;
    let mut attempt = 1u32;

    loop {
        if let Some(value) = source.get(path) {
            log::info!("Parameter {} = {} (attempt {})", path, value, attempt);
            return Ok(value);
        }

        let waited = start.elapsed();
        if waited >= wait.timeout {
            return Err(NodeError::ParameterTimeout {
                path: path.to_string(),
                waited,
            });
        }

        log::info!("Waiting for parameter {} (attempt {}, retry in {:?})", path, attempt, backoff);
        thread::sleep(backoff.min(wait.timeout - waited));

        backoff = (backoff * 2).min(wait.max_backoff);
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_wait() -> ParameterWait {
        ParameterWait {
            timeout: Duration::from_millis(200),
            initial_backoff: Duration::from_millis(5),
            max_backoff: Duration::from_millis(20),
        }
    }

    #[test]
    fn test_available_parameter_returns_immediately() {
        let params = StaticParameters::new();
        params.set("/rosi/forward_side", -1.0);

        let value = wait_for_parameter(&params, "/rosi/forward_side", quick_wait()).unwrap();

        assert_eq!(value, -1.0);
    }

    #[test]
    fn test_missing_parameter_times_out() {
        let params = StaticParameters::new();

        let result = wait_for_parameter(&params, "/rosi/forward_side", quick_wait());

        match result {
            Err(NodeError::ParameterTimeout { path, waited }) => {
                assert_eq!(path, "/rosi/forward_side");
                assert!(waited >= Duration::from_millis(200));
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_parameter_set_while_waiting() {
        let params = StaticParameters::new();
        let writer = {
            let params = params.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(30));
                params.set("/rosi/forward_side", 1.0);
            })
        };

        let wait = ParameterWait {
            timeout: Duration::from_secs(5),
            ..quick_wait()
        };
        let value = wait_for_parameter(&params, "/rosi/forward_side", wait).unwrap();

        assert_eq!(value, 1.0);
        writer.join().unwrap();
    }
}
