/// Monitoring engine module - tracks reachability of the configured endpoints
///
/// This module is responsible for:
/// - Holding the ordered endpoint state
/// - Probing endpoints (ICMP or TCP)
/// - Detecting and logging reachability transitions
/// - Pacing probe cycles
pub mod checker;
pub mod detector;
pub mod scheduler;
pub mod types;

pub use checker::Prober;
pub use detector::TransitionDetector;
pub use scheduler::Ticker;
pub use types::{Endpoint, EndpointStore, Transition};
