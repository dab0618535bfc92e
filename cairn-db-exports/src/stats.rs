use serde::Serialize;

/// Snapshot of the connection pool counters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PoolStats {
    /// connections currently open, pooled or in use
    pub current: usize,
    /// configured cap, 0 when unlimited
    pub max: usize,
    /// highest `current` ever observed
    pub peak: usize,
    /// `current / max` in percent, 0 when unlimited
    pub utilization: f64,
}

impl PoolStats {
    /// Build the snapshot from raw counters
    pub fn new(current: usize, max: usize, peak: usize) -> Self {
        let utilization = if max > 0 {
            current as f64 / max as f64 * 100.0
        } else {
            0.0
        };
        PoolStats {
            current,
            max,
            peak,
            utilization,
        }
    }
}
