use std::time::Duration;

/// Simulated round-trip delay applied to every store operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Latency {
    delay: Duration,
}

impl Latency {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Resolves to `value` once the configured delay has elapsed.
    pub async fn settle<T>(&self, value: T) -> T {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        value
    }
}
