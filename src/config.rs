use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Office Configuration
// ============================================================================
//
// The five run parameters plus the PRNG seed. Values are validated once,
// before any actor exists; everything downstream trusts them.
//
// ============================================================================

/// Upper bound for the customer's pre-arrival wait (ms)
pub const MAX_CUSTOMER_WAIT_MS: u64 = 10_000;
/// Upper bound for a worker's break (ms)
pub const MAX_WORKER_BREAK_MS: u64 = 100;
/// Upper bound for the office opening window (ms)
pub const MAX_OFFICE_OPEN_MS: u64 = 10_000;
/// Upper bound for both the customer's explanation and the worker's service (ms)
pub const MAX_SERVICE_TIME_MS: u64 = 10;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid argument {name}: {value} is outside 0..={max}")]
    OutOfRange {
        name: &'static str,
        value: i64,
        max: i64,
    },

    #[error("customers ({0}) cannot be served without at least one worker")]
    NoWorkers(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficeConfig {
    /// Number of customers (NZ)
    pub customers: u32,
    /// Number of workers (NU)
    pub workers: u32,
    /// Max pre-arrival wait in ms (TZ)
    pub customer_max_wait_ms: u64,
    /// Max break in ms (TU)
    pub worker_max_break_ms: u64,
    /// Opening window in ms (F)
    pub office_open_ms: u64,
    /// Root seed every actor's PRNG is derived from
    pub seed: u64,
}

impl OfficeConfig {
    /// Validate raw parameters. The seed is drawn at random; use
    /// [`OfficeConfig::with_seed`] for reproducible runs.
    pub fn new(
        customers: i64,
        workers: i64,
        customer_max_wait_ms: i64,
        worker_max_break_ms: i64,
        office_open_ms: i64,
    ) -> Result<Self, ConfigError> {
        let customers = check_range("NZ", customers, i64::from(u32::MAX))?;
        let workers = check_range("NU", workers, i64::from(u32::MAX))?;
        let customer_max_wait_ms = check_range("TZ", customer_max_wait_ms, MAX_CUSTOMER_WAIT_MS as i64)?;
        let worker_max_break_ms = check_range("TU", worker_max_break_ms, MAX_WORKER_BREAK_MS as i64)?;
        let office_open_ms = check_range("F", office_open_ms, MAX_OFFICE_OPEN_MS as i64)?;

        // Bounded by u32::MAX above
        let customers = customers as u32;
        let workers = workers as u32;

        if customers > 0 && workers == 0 {
            return Err(ConfigError::NoWorkers(customers));
        }

        Ok(Self {
            customers,
            workers,
            customer_max_wait_ms,
            worker_max_break_ms,
            office_open_ms,
            seed: rand::random(),
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn customer_max_wait(&self) -> Duration {
        Duration::from_millis(self.customer_max_wait_ms)
    }

    pub fn worker_max_break(&self) -> Duration {
        Duration::from_millis(self.worker_max_break_ms)
    }

    pub fn office_open(&self) -> Duration {
        Duration::from_millis(self.office_open_ms)
    }

    /// Time the office stays open: at least half the window, at most all of it
    pub fn close_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let half = self.office_open_ms / 2;
        Duration::from_millis(half + rng.gen_range(0..=half))
    }
}

fn check_range(name: &'static str, value: i64, max: i64) -> Result<u64, ConfigError> {
    if (0..=max).contains(&value) {
        Ok(value as u64)
    } else {
        Err(ConfigError::OutOfRange { name, value, max })
    }
}

/// Uniform delay in `[0, max]` at millisecond granularity
pub fn random_delay<R: Rng + ?Sized>(rng: &mut R, max: Duration) -> Duration {
    let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
    Duration::from_millis(rng.gen_range(0..=max_ms))
}

// ============================================================================
// Unit Tests
// ============================================================================
