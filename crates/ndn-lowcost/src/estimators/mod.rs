//! Per-face link quality estimators

pub mod delay;
pub mod loss;
pub mod throughput;

pub use delay::RttEstimator;
pub use loss::{RefreshTimer, TimeWindowLossEstimator};
pub use throughput::BandwidthEstimator;

/// Loss estimation capability
///
/// Names identify individual requests; the estimator decides when an
/// unanswered request counts as lost.
pub trait LossEstimator: Send + std::fmt::Debug {
    /// Record a sent request
    fn add_sent(&mut self, name: &str);

    /// Forget a sent request (tainted or cancelled); no-op if unknown
    fn remove_sent(&mut self, name: &str);

    /// Record a satisfied request
    fn add_satisfied(&mut self, name: &str);

    /// Bring internal state up to date
    fn refresh(&mut self);

    /// Loss as a fraction in [0, 1]
    fn loss_percentage(&mut self) -> f64;

    /// Sent requests whose outcome is still unknown
    fn outstanding(&self) -> usize;
}
