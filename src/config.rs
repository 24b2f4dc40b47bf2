//! Bridge configuration loaded from JSON.
//!
//! Every field has a default, so an empty object (`{}`) is a valid configuration:
//!
//! ```json
//! {
//!     "gpu":      { "backend": "vulkan", "power_preference": "high" },
//!     "settings": { "exposure": 1.5, "gamma": 2.2 },
//!     "log_filter": "volume_bridge=debug"
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{bridge::RenderSettings, error::Result};

/// Which wgpu backends are considered when requesting an adapter.
/// - `WGPU_BACKEND` environment variable takes precedence over this choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum_macros::Display, strum_macros::EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BackendChoice {
    #[default]
    Primary,
    Secondary,
    Vulkan,
    Metal,
    Dx12,
    Gl,
    All,
}

impl BackendChoice {
    pub fn backends(self) -> wgpu::Backends {
        match self {
            BackendChoice::Primary   => wgpu::Backends::PRIMARY,
            BackendChoice::Secondary => wgpu::Backends::SECONDARY,
            BackendChoice::Vulkan    => wgpu::Backends::VULKAN,
            BackendChoice::Metal     => wgpu::Backends::METAL,
            BackendChoice::Dx12      => wgpu::Backends::DX12,
            BackendChoice::Gl        => wgpu::Backends::GL,
            BackendChoice::All       => wgpu::Backends::all(),
        }
    }
}

/// Adapter power preference.
/// - `WGPU_POWER_PREF` environment variable takes precedence over this choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum_macros::Display, strum_macros::EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PowerChoice {
    #[default]
    Default,
    Low,
    High,
}

impl PowerChoice {
    pub fn power_preference(self) -> wgpu::PowerPreference {
        match self {
            PowerChoice::Default => wgpu::PowerPreference::default(),
            PowerChoice::Low     => wgpu::PowerPreference::LowPower,
            PowerChoice::High    => wgpu::PowerPreference::HighPerformance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpuConfig {
    pub backend:                BackendChoice,
    pub power_preference:       PowerChoice,
    pub force_fallback_adapter: bool,
    /// Label of the logical device, visible in GPU debuggers.
    pub label:                  String,
}

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            backend:                BackendChoice::default(),
            power_preference:       PowerChoice::default(),
            force_fallback_adapter: false,
            label:                  "volume-bridge device".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub gpu:        GpuConfig,
    /// Renderer-wide settings the bridge starts with.
    pub settings:   RenderSettings,
    /// `env_logger` filter, `RUST_LOG` is used when absent.
    pub log_filter: Option<String>,
}

impl BridgeConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[profiler::function]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
