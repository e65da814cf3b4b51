//! Registry configuration

/// Subscriber registry configuration options
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Per-subscriber channel capacity. A subscriber that falls this many
    /// messages behind is dropped rather than allowed to backpressure the
    /// producer.
    pub channel_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
        }
    }
}

impl RegistryConfig {
    /// Set the per-subscriber channel capacity (floor of 1).
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }
}
