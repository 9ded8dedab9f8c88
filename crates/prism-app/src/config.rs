// SPDX-License-Identifier: CEPL-1.0
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use prism_platform::WindowSpec;
use prism_render::{DeviceRequirements, PresenterOptions, SuboptimalPolicy, ValidationMode};
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct WindowCfg {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowCfg {
    fn default() -> Self {
        WindowCfg {
            width: 1280,
            height: 720,
            title: "prism".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct DeviceCfg {
    /// Appended to the per-platform extension list.
    pub extra_extensions: Vec<String>,
    /// Treat geometry shaders and buffer device address as hard requirements.
    pub require_preferred_features: bool,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq)]
#[serde(default)]
pub struct SwapchainCfg {
    pub suboptimal: SuboptimalPolicy,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppCfg {
    pub window: WindowCfg,
    pub device: DeviceCfg,
    pub swapchain: SwapchainCfg,
}

impl AppCfg {
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Missing or malformed files fall back to defaults.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => match Self::parse(&text) {
                Ok(cfg) => {
                    info!("config loaded from {}", path.display());
                    cfg
                }
                Err(e) => {
                    warn!("config {} is malformed, using defaults: {e}", path.display());
                    AppCfg::default()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("no config at {}, using defaults", path.display());
                AppCfg::default()
            }
            Err(e) => {
                warn!("cannot read config {}, using defaults: {e}", path.display());
                AppCfg::default()
            }
        }
    }

    pub fn requirements(&self) -> DeviceRequirements {
        let req = DeviceRequirements::default()
            .with_extra_extensions(self.device.extra_extensions.iter().cloned());
        if self.device.require_preferred_features {
            req.promote_preferred()
        } else {
            req
        }
    }

    pub fn presenter_options(&self, validation: ValidationMode) -> PresenterOptions {
        PresenterOptions {
            app_name: self.window.title.clone(),
            requirements: self.requirements(),
            suboptimal: self.swapchain.suboptimal,
            validation,
        }
    }

    pub fn window_spec(&self) -> WindowSpec {
        WindowSpec {
            title: self.window.title.clone(),
            width: self.window.width,
            height: self.window.height,
        }
    }
}
