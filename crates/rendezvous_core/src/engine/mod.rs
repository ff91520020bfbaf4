//! Convergence engine: heading selection, great-circle motion and the
//! scheduler that ties them together.

pub mod angles;
pub mod config;
pub mod events;
pub mod geodesic;
pub mod scheduler;
pub mod selector;
pub mod speed;

pub use angles::{angular_difference, normalize_deg, opposite};
pub use config::{MotionConfig, SchedulerConfig, SelectionConfig};
pub use events::{EventQueue, SchedulerEvent, EVENT_QUEUE_CAPACITY};
pub use geodesic::{convergence_point, GeodesicPath};
pub use scheduler::{ConvergenceScheduler, Phase, Positions, SchedulerStatus, Velocities};
pub use selector::{
    roulette_select, sanitize_quantization, QuantizationRange, QuantizedAzimuthSelector,
    WeightedCandidate,
};
pub use speed::SpeedProfile;
