//! # rendezvous_core - Deterministic Sphere Rendezvous Scheduler
//!
//! Two tokens travel great circles on the unit sphere, meet at a shared
//! pole, pause, and leave again along quantized headings drawn from a seeded
//! random stream.
//!
//! ## Features
//! - 100% deterministic (same seed = same sequence of headings)
//! - Forward-cone heading selection with peer opposition excluded
//! - Wall-clock pause at the pole, independent of frame rate
//! - JSON API for hosts that drive the scheduler from outside Rust

// Struct initialization pattern used intentionally
#![allow(clippy::field_reassign_with_default)]

pub mod api;
pub mod engine;
pub mod error;

pub use api::{handle_request_json, scheduler_from_config_json, HostRequest, HostResponse};
pub use engine::config::{MotionConfig, SchedulerConfig, SelectionConfig};
pub use engine::events::SchedulerEvent;
pub use engine::scheduler::{ConvergenceScheduler, Positions, SchedulerStatus};
pub use engine::selector::QuantizedAzimuthSelector;
pub use error::{RendezvousError, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SCHEMA_VERSION: u8 = 1;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn drive(seed: u64, ticks: u64) -> String {
        let mut scheduler = ConvergenceScheduler::new(SchedulerConfig::default().with_seed(seed));
        scheduler.start();
        let mut events = Vec::new();
        for i in 0..ticks {
            scheduler.tick(i * 16);
            events.extend(scheduler.drain_events());
        }
        serde_json::to_string(&events).unwrap()
    }

    #[test]
    fn test_determinism() {
        assert_eq!(drive(999, 4000), drive(999, 4000), "Same seed should produce same events");
    }

    #[test]
    fn test_seed_changes_headings() {
        // Different seeds diverge once enough direction changes have happened
        assert_ne!(drive(1, 6000), drive(2, 6000));
    }

    #[test]
    fn test_json_session() {
        let mut scheduler = scheduler_from_config_json(r#"{"seed": 7}"#).unwrap();
        for request in [
            json!({"schema_version": 1, "type": "Start"}),
            json!({"schema_version": 1, "type": "Tick", "now_ms": 0}),
            json!({"schema_version": 1, "type": "Tick", "now_ms": 16}),
        ] {
            let out = handle_request_json(&mut scheduler, &request.to_string()).unwrap();
            let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
            assert_eq!(parsed["success"], true);
        }
        assert_eq!(scheduler.status().frame, 2);
    }
}
