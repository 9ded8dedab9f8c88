// SPDX-License-Identifier: CEPL-1.0
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PresentError>;

/// Everything that can end a presentation session.
///
/// None of these are retried inside the crate; the message names the stage
/// that failed so the host can surface it before exiting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresentError {
    #[error("device selection: no accelerator satisfies the device requirements")]
    NoSuitableDevice,

    #[error("logical device creation failed: {0}")]
    DeviceCreationFailed(String),

    #[error("swapchain extent: invalid framebuffer size {width}x{height}")]
    InvalidWindowSize { width: i32, height: i32 },

    #[error("surface probe: no surface formats or present modes reported")]
    NoSurfaceSupport,

    #[error("swapchain creation failed: {0}")]
    SwapchainCreationFailed(String),

    #[error("capability probe failed: {0}")]
    Probe(String),

    #[error("instance bootstrap failed: {0}")]
    Instance(String),

    #[error("swapchain manager already destroyed")]
    Destroyed,
}

impl PresentError {
    /// Short stage tag for log fields.
    pub fn stage(&self) -> &'static str {
        match self {
            PresentError::NoSuitableDevice => "select",
            PresentError::DeviceCreationFailed(_) => "device",
            PresentError::InvalidWindowSize { .. }
            | PresentError::NoSurfaceSupport
            | PresentError::SwapchainCreationFailed(_)
            | PresentError::Destroyed => "swapchain",
            PresentError::Probe(_) => "probe",
            PresentError::Instance(_) => "instance",
        }
    }

    pub(crate) fn probe(err: anyhow::Error) -> Self {
        PresentError::Probe(format!("{err:#}"))
    }
}
