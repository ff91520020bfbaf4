use thiserror::Error;

#[derive(Error, Debug)]
pub enum RendezvousError {
    #[error(
        "No selectable azimuth: previous={previous}, peer={peer:?}, quantization={quantization}"
    )]
    DegenerateSelection { previous: f64, peer: Option<f64>, quantization: u32 },

    #[error("Scheduler halted: {reason}")]
    SchedulerHalt { reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Schema version mismatch: found {found}, expected {expected}")]
    SchemaMismatch { found: u8, expected: u8 },
}

impl RendezvousError {
    /// Whether the caller can keep going after this error without a reset.
    pub fn is_recoverable(&self) -> bool {
        match self {
            RendezvousError::DegenerateSelection { .. } => true,
            RendezvousError::Json(_) => true,
            RendezvousError::SchemaMismatch { .. } => true,
            RendezvousError::SchedulerHalt { .. } => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, RendezvousError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_halt_is_not_recoverable() {
        let err = RendezvousError::SchedulerHalt { reason: "non-finite azimuth".to_string() };
        assert!(!err.is_recoverable());
        assert_eq!(err.to_string(), "Scheduler halted: non-finite azimuth");
    }

    #[test]
    fn test_degenerate_selection_message() {
        let err = RendezvousError::DegenerateSelection {
            previous: 0.0,
            peer: Some(180.0),
            quantization: 3,
        };
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("quantization=3"));
    }
}
