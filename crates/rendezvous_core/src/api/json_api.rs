// Host JSON API
//
// One request in, one response out. Hosts that cannot link Rust types talk to
// the scheduler through this surface.
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::engine::config::SchedulerConfig;
use crate::engine::events::SchedulerEvent;
use crate::engine::scheduler::{ConvergenceScheduler, SchedulerStatus};
use crate::error::{RendezvousError, Result};
use crate::SCHEMA_VERSION;

/// Request envelope sent by the host
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostRequest {
    pub schema_version: u8,
    #[serde(flatten)]
    pub command: HostCommand,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum HostCommand {
    /// Runtime tuning; omitted fields are left unchanged
    Configure {
        #[serde(default)]
        quantization: Option<f64>,
        #[serde(default)]
        pause_duration_ms: Option<i64>,
        #[serde(default)]
        angular_speed: Option<f64>,
        #[serde(default)]
        force_even: Option<bool>,
        #[serde(default)]
        allow_opposition_when_coarse: Option<bool>,
        #[serde(default)]
        seed: Option<u64>,
    },

    /// Advance one frame at wall-clock `now_ms`
    Tick { now_ms: u64 },

    Start,
    Stop,
    Reset,
    GetStatus,
    GetPositions,
    DrainEvents,
}

/// Response envelope sent back to the host
#[derive(Debug, Clone, Serialize)]
pub struct HostResponse {
    pub schema_version: u8,
    pub success: bool,
    pub response: Option<HostResponseBody>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum HostResponseBody {
    Ack,

    Configured { quantization: u32, pause_duration_ms: u64, angular_speed: f64 },

    Status { status: SchedulerStatus },

    Positions {
        primary: Vector3<f64>,
        secondary: Vector3<f64>,
        frozen: bool,
        freeze_progress: f64,
    },

    Events { events: Vec<SchedulerEvent> },
}

impl HostResponse {
    fn ok(body: HostResponseBody) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            success: true,
            response: Some(body),
            error_message: None,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            success: false,
            response: None,
            error_message: Some(message),
        }
    }
}

/// Build a scheduler from a (possibly partial) `SchedulerConfig` document.
pub fn scheduler_from_config_json(config_json: &str) -> Result<ConvergenceScheduler> {
    let config: SchedulerConfig = serde_json::from_str(config_json)?;
    Ok(ConvergenceScheduler::new(config))
}

/// Apply one host request to `scheduler` and serialize the response.
///
/// Malformed JSON and schema mismatches are returned as errors. Requests the
/// scheduler cannot honour (ticking a halted scheduler) come back as a
/// response with `success: false`.
pub fn handle_request_json(
    scheduler: &mut ConvergenceScheduler,
    request_json: &str,
) -> Result<String> {
    let request: HostRequest = serde_json::from_str(request_json)?;
    if request.schema_version != SCHEMA_VERSION {
        return Err(RendezvousError::SchemaMismatch {
            found: request.schema_version,
            expected: SCHEMA_VERSION,
        });
    }

    let response = dispatch(scheduler, request.command);
    Ok(serde_json::to_string(&response)?)
}

fn dispatch(scheduler: &mut ConvergenceScheduler, command: HostCommand) -> HostResponse {
    match command {
        HostCommand::Configure {
            quantization,
            pause_duration_ms,
            angular_speed,
            force_even,
            allow_opposition_when_coarse,
            seed,
        } => {
            if force_even.is_some() || allow_opposition_when_coarse.is_some() {
                let current = scheduler.config().selection;
                scheduler.set_policy(
                    force_even.unwrap_or(current.force_even),
                    allow_opposition_when_coarse.unwrap_or(current.allow_opposition_when_coarse),
                );
            }
            if let Some(q) = quantization {
                scheduler.set_quantization(q);
            }
            if let Some(pause) = pause_duration_ms {
                scheduler.set_pause_duration_ms(pause);
            }
            if let Some(speed) = angular_speed {
                scheduler.set_angular_speed(speed);
            }
            if let Some(seed) = seed {
                scheduler.reseed(seed);
            }

            let config = scheduler.config();
            HostResponse::ok(HostResponseBody::Configured {
                quantization: config.selection.quantization,
                pause_duration_ms: config.motion.pause_duration_ms,
                angular_speed: config.motion.angular_speed,
            })
        }

        HostCommand::Tick { now_ms } => {
            scheduler.tick(now_ms);
            if let Some(reason) = scheduler.status().halt_reason {
                return HostResponse::failed(reason);
            }
            positions_body(scheduler)
        }

        HostCommand::Start => {
            scheduler.start();
            match scheduler.status().halt_reason {
                Some(reason) => HostResponse::failed(format!("cannot start: {}", reason)),
                None => HostResponse::ok(HostResponseBody::Ack),
            }
        }

        HostCommand::Stop => {
            scheduler.stop();
            HostResponse::ok(HostResponseBody::Ack)
        }

        HostCommand::Reset => {
            scheduler.reset();
            HostResponse::ok(HostResponseBody::Ack)
        }

        HostCommand::GetStatus => {
            HostResponse::ok(HostResponseBody::Status { status: scheduler.status() })
        }

        HostCommand::GetPositions => positions_body(scheduler),

        HostCommand::DrainEvents => {
            HostResponse::ok(HostResponseBody::Events { events: scheduler.drain_events() })
        }
    }
}

fn positions_body(scheduler: &ConvergenceScheduler) -> HostResponse {
    let positions = scheduler.positions();
    HostResponse::ok(HostResponseBody::Positions {
        primary: positions.primary,
        secondary: positions.secondary,
        frozen: scheduler.is_frozen(),
        freeze_progress: scheduler.freeze_progress(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn send(scheduler: &mut ConvergenceScheduler, request: Value) -> Value {
        let out = handle_request_json(scheduler, &request.to_string()).unwrap();
        serde_json::from_str(&out).unwrap()
    }

    #[test]
    fn test_status_roundtrip() {
        let mut scheduler = ConvergenceScheduler::default();
        let parsed = send(&mut scheduler, json!({"schema_version": 1, "type": "GetStatus"}));

        assert_eq!(parsed["schema_version"], 1);
        assert_eq!(parsed["success"], true);
        assert_eq!(parsed["response"]["type"], "Status");
        assert_eq!(parsed["response"]["status"]["quantization"], 8);
        assert_eq!(parsed["response"]["status"]["running"], false);
    }

    #[test]
    fn test_configure_clamps_and_reports() {
        let mut scheduler = ConvergenceScheduler::default();
        let parsed = send(
            &mut scheduler,
            json!({
                "schema_version": 1,
                "type": "Configure",
                "quantization": 7.9,
                "pause_duration_ms": -10,
                "force_even": true
            }),
        );

        assert_eq!(parsed["success"], true);
        assert_eq!(parsed["response"]["type"], "Configured");
        assert_eq!(parsed["response"]["quantization"], 8);
        assert_eq!(parsed["response"]["pause_duration_ms"], 0);
        assert!(scheduler.config().selection.force_even);
    }

    #[test]
    fn test_start_tick_positions() {
        let mut scheduler = ConvergenceScheduler::default();
        send(&mut scheduler, json!({"schema_version": 1, "type": "Start"}));
        let parsed =
            send(&mut scheduler, json!({"schema_version": 1, "type": "Tick", "now_ms": 16}));

        assert_eq!(parsed["response"]["type"], "Positions");
        let primary = parsed["response"]["primary"].as_array().unwrap();
        assert_eq!(primary.len(), 3);
        assert_eq!(parsed["response"]["frozen"], false);

        let events = send(&mut scheduler, json!({"schema_version": 1, "type": "DrainEvents"}));
        assert_eq!(events["response"]["events"][0]["type"], "Started");
    }

    #[test]
    fn test_schema_mismatch_is_error() {
        let mut scheduler = ConvergenceScheduler::default();
        let result = handle_request_json(
            &mut scheduler,
            &json!({"schema_version": 2, "type": "GetStatus"}).to_string(),
        );
        assert!(matches!(
            result,
            Err(RendezvousError::SchemaMismatch { found: 2, expected: 1 })
        ));
    }

    #[test]
    fn test_unknown_command_is_json_error() {
        let mut scheduler = ConvergenceScheduler::default();
        let result = handle_request_json(
            &mut scheduler,
            &json!({"schema_version": 1, "type": "Explode"}).to_string(),
        );
        assert!(matches!(result, Err(RendezvousError::Json(_))));
    }

    #[test]
    fn test_scheduler_from_partial_config() {
        let scheduler =
            scheduler_from_config_json(r#"{"selection": {"quantization": 1}, "seed": 5}"#).unwrap();
        assert_eq!(scheduler.config().selection.quantization, 2);
        assert_eq!(scheduler.config().seed, 5);
        assert_eq!(scheduler.config().motion.pause_duration_ms, 800);
    }
}
