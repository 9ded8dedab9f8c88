// SPDX-License-Identifier: CEPL-1.0
//! Backend-neutral presentation bootstrap.
//!
//! Picks an accelerator, plans the logical device and drives the swapchain
//! lifecycle through small trait seams (`CapabilityProbe`, `DeviceFactory`,
//! `SwapchainBackend`) so the decisions can be exercised without a GPU.

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

pub mod caps;
pub mod device;
pub mod error;
pub mod presentation;
pub mod probe;
pub mod queue;
pub mod requirements;
pub mod select;
pub mod swapchain;

#[cfg(test)]
mod testing;

pub use caps::{
    ColorSpace, DeviceFeatures, Extent2D, PixelFormat, PresentMode, QueueCapabilities,
    QueueFamilyProps, SurfaceCapabilities, SurfaceFormat, SurfaceTransforms,
};
pub use device::{build_logical_device, DeviceFactory, DeviceRequest, QueueRequest};
pub use error::{PresentError, Result};
pub use presentation::Presentation;
pub use probe::CapabilityProbe;
pub use queue::{find_queue_families, QueueFamilies, QueueFamilyAssignment};
pub use requirements::{DeviceRequirements, Platform, PlatformRequirements};
pub use select::{select_accelerator, Rejection, SelectedAccelerator};
pub use swapchain::{
    ChainInfo, LifecycleState, PresentationStatus, RecreateTrigger, SharingMode,
    SuboptimalPolicy, SwapchainBackend, SwapchainConfig, SwapchainManager,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderSize {
    pub width: u32,
    pub height: u32,
}

impl RenderSize {
    pub fn is_zero(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Current framebuffer size in pixels, as reported by the windowing layer.
///
/// Signed so a misbehaving platform can report non-positive sizes; those are
/// rejected when the swapchain extent is chosen.
pub trait FramebufferSource {
    fn framebuffer_size(&self) -> (i32, i32);
}

impl FramebufferSource for (i32, i32) {
    fn framebuffer_size(&self) -> (i32, i32) {
        *self
    }
}

impl FramebufferSource for RenderSize {
    fn framebuffer_size(&self) -> (i32, i32) {
        let clamp = |v: u32| i32::try_from(v).unwrap_or(i32::MAX);
        (clamp(self.width), clamp(self.height))
    }
}

/// Whether the instance loads the validation layer and debug messenger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ValidationMode {
    /// Debug builds only, and only when the layer is installed.
    #[default]
    Auto,
    /// Required: a missing layer fails the bootstrap.
    On,
    Off,
}

impl ValidationMode {
    /// Whether validation should be attempted in this build.
    pub fn requested(self) -> bool {
        match self {
            ValidationMode::Auto => cfg!(debug_assertions),
            ValidationMode::On => true,
            ValidationMode::Off => false,
        }
    }
}

/// Knobs a presenter is built with. Fixed for the presenter's lifetime.
#[derive(Clone, Debug)]
pub struct PresenterOptions {
    pub app_name: String,
    pub requirements: DeviceRequirements,
    pub suboptimal: SuboptimalPolicy,
    pub validation: ValidationMode,
}

impl Default for PresenterOptions {
    fn default() -> Self {
        Self {
            app_name: "prism".into(),
            requirements: DeviceRequirements::default(),
            suboptimal: SuboptimalPolicy::default(),
            validation: ValidationMode::Auto,
        }
    }
}

/// A window's complete presentation stack: instance, surface, device, swapchain.
pub trait Presenter {
    fn new(
        window: &dyn HasWindowHandle,
        display: &dyn HasDisplayHandle,
        framebuffer: &dyn FramebufferSource,
        options: &PresenterOptions,
    ) -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Rebuilds the swapchain for the new framebuffer size. A zero-sized
    /// framebuffer pauses presentation until a usable size arrives.
    fn resize(&mut self, framebuffer: &dyn FramebufferSource) -> Result<()>;

    /// Feeds back a present result; returns whether the chain was rebuilt.
    fn handle_status(
        &mut self,
        status: PresentationStatus,
        framebuffer: &dyn FramebufferSource,
    ) -> Result<bool>;

    fn chain_info(&self) -> Option<ChainInfo>;
}
