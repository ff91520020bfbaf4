//! Heading selection policy

use serde::{Deserialize, Serialize};

use crate::engine::selector::{sanitize_quantization, DEFAULT_QUANTIZATION};

/// Quantization and opposition policy for the azimuth selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Number of compass steps (default: 8)
    pub quantization: u32,
    /// Round odd quantizations up to the next even value (default: false)
    pub force_even: bool,
    /// Keep the heading opposite the peer when excluding it would leave
    /// nothing to choose from (default: true)
    pub allow_opposition_when_coarse: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            quantization: DEFAULT_QUANTIZATION,
            force_even: false,
            allow_opposition_when_coarse: true,
        }
    }
}

impl SelectionConfig {
    pub fn sanitize(&mut self) {
        self.quantization = sanitize_quantization(self.quantization as f64, self.force_even);
    }
}
