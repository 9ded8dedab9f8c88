// SPDX-License-Identifier: CEPL-1.0
use anyhow::{anyhow, Context, Result};
use ash::vk;
use prism_render::{
    build_logical_device, select_accelerator, ChainInfo, FramebufferSource, Presentation,
    PresentationStatus, Presenter, PresenterOptions, SelectedAccelerator,
};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::info;

use crate::device::{LogicalDevice, VkDeviceFactory};
use crate::instance::{version_string, VkInstance, VkSurface};
use crate::probe::VkProbe;
use crate::swapchain::{VkChain, VkSwapchainBackend};

/// Everything one window needs to present, owned in one place.
///
/// Field order is teardown order: swapchain, device, surface, instance.
pub struct VkSession {
    presentation: Presentation<VkSwapchainBackend>,
    device: LogicalDevice,
    selected: SelectedAccelerator<vk::PhysicalDevice>,
    surface: VkSurface,
    instance: VkInstance,
}

// STRICT ORDER:
// 1) Instance (WSI extensions + optional validation)
// 2) Surface FROM THIS INSTANCE
// 3) Select a physical device AGAINST THIS SURFACE
// 4) Logical device with exactly what selection validated
// 5) First swapchain
unsafe fn build_session(
    window: &dyn HasWindowHandle,
    display: &dyn HasDisplayHandle,
    framebuffer: &dyn FramebufferSource,
    options: &PresenterOptions,
) -> Result<VkSession> {
    let dh = display
        .display_handle()
        .map_err(|e| anyhow!("{e}"))?
        .as_raw();
    let wh = window.window_handle().map_err(|e| anyhow!("{e}"))?.as_raw();

    let instance = VkInstance::new(dh, &options.app_name, options.validation)
        .context("instance bootstrap")?;
    let surface = VkSurface::new(&instance, dh, wh).context("surface creation")?;

    let selected = {
        let probe = VkProbe::new(instance.handle(), surface.shared());
        let accelerators = probe.accelerators()?;
        info!("vk: {} accelerator(s) enumerated", accelerators.len());
        select_accelerator(&probe, &accelerators, &options.requirements)
            .context("device selection")?
    };

    let props = instance
        .handle()
        .get_physical_device_properties(selected.handle);
    info!(
        "vk: using `{}` (API {}, driver {:#x})",
        selected.name,
        version_string(props.api_version),
        props.driver_version
    );

    let device = build_logical_device(
        &VkDeviceFactory::new(instance.handle()),
        &selected,
        &options.requirements,
    )
    .context("logical device")?;

    let backend = VkSwapchainBackend::new(&instance, &surface, &device, selected.handle);
    let presentation =
        Presentation::start(backend, selected.families, options.suboptimal, framebuffer)
            .context("initial swapchain")?;

    Ok(VkSession {
        presentation,
        device,
        selected,
        surface,
        instance,
    })
}

impl VkSession {
    pub fn instance(&self) -> &VkInstance {
        &self.instance
    }

    pub fn surface(&self) -> vk::SurfaceKHR {
        self.surface.handle()
    }

    pub fn device(&self) -> &LogicalDevice {
        &self.device
    }

    pub fn accelerator(&self) -> &SelectedAccelerator<vk::PhysicalDevice> {
        &self.selected
    }

    pub fn graphics_queue(&self) -> Option<vk::Queue> {
        self.device.queue(self.selected.families.graphics)
    }

    pub fn present_queue(&self) -> Option<vk::Queue> {
        self.device.queue(self.selected.families.present)
    }

    /// The live chain, if any. Never outlives the next resize.
    pub fn chain(&self) -> Option<&VkChain> {
        self.presentation.chain()
    }

    pub fn swapchain_loader(&self) -> &ash::khr::swapchain::Device {
        self.presentation.manager().backend().loader()
    }

    pub fn is_paused(&self) -> bool {
        self.presentation.is_paused()
    }
}

impl Presenter for VkSession {
    fn new(
        window: &dyn HasWindowHandle,
        display: &dyn HasDisplayHandle,
        framebuffer: &dyn FramebufferSource,
        options: &PresenterOptions,
    ) -> Result<Self> {
        unsafe { build_session(window, display, framebuffer, options) }
    }

    fn resize(&mut self, framebuffer: &dyn FramebufferSource) -> prism_render::Result<()> {
        self.presentation.resize(framebuffer)
    }

    fn handle_status(
        &mut self,
        status: PresentationStatus,
        framebuffer: &dyn FramebufferSource,
    ) -> prism_render::Result<bool> {
        self.presentation.handle_status(status, framebuffer)
    }

    fn chain_info(&self) -> Option<ChainInfo> {
        self.presentation.info()
    }
}

impl Drop for VkSession {
    fn drop(&mut self) {
        // the chain goes first; the remaining fields then drop in declaration order
        self.presentation.shutdown();
    }
}
