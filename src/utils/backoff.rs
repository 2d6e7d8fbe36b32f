use std::time::Duration;

// ============================================================================
// Exponential Backoff
// ============================================================================
//
// Paces a worker that keeps losing the pickup race: a queue looked non-empty
// under the closing guard but was drained before the queue guard was taken.
// The first retry only yields; later retries sleep with exponential growth.
//
// ============================================================================

#[derive(Clone, Debug)]
pub struct BackoffConfig {
    /// Delay after the first yield-only retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            multiplier: 2.0,
        }
    }
}

#[derive(Debug)]
pub struct Backoff {
    config: BackoffConfig,
    attempt: u32,
    delay: Duration,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        let delay = config.initial_delay;
        Self {
            config,
            attempt: 0,
            delay,
        }
    }

    /// Consecutive retries since the last reset
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Delay for the next retry; `Duration::ZERO` means yield only
    pub fn next_delay(&mut self) -> Duration {
        self.attempt += 1;
        if self.attempt == 1 {
            return Duration::ZERO;
        }

        let current = self.delay;
        let next = Duration::from_secs_f64(current.as_secs_f64() * self.config.multiplier);
        self.delay = next.min(self.config.max_delay);
        current.min(self.config.max_delay)
    }

    /// Wait out the next retry delay
    pub async fn wait(&mut self) {
        let delay = self.next_delay();

        tracing::trace!(
            attempt = self.attempt,
            delay_ms = delay.as_millis() as u64,
            "Backing off before retry"
        );

        if delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(delay).await;
        }
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
        self.delay = self.config.initial_delay;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(BackoffConfig::default())
    }
}
