// SPDX-License-Identifier: CEPL-1.0
//! Swapchain negotiation and lifecycle.
//!
//! `SwapchainManager` is the only owner of the live chain. A chain is never
//! mutated: recreation destroys the old one (and its image views) before the
//! replacement is built from a fresh surface probe.

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::caps::{
    Extent2D, PresentMode, SurfaceCapabilities, SurfaceFormat, SurfaceTransforms,
};
use crate::error::{PresentError, Result};
use crate::probe::non_empty;
use crate::queue::QueueFamilies;
use crate::FramebufferSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SharingMode {
    Exclusive,
    /// Images are shared between exactly these two families.
    Concurrent([u32; 2]),
}

impl SharingMode {
    pub fn family_indices(&self) -> &[u32] {
        match self {
            SharingMode::Exclusive => &[],
            SharingMode::Concurrent(families) => families,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositeAlpha {
    Opaque,
}

/// Resolved parameters for one chain. Rebuilt on every (re)creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapchainConfig {
    pub extent: Extent2D,
    pub surface_format: SurfaceFormat,
    pub present_mode: PresentMode,
    pub image_count: u32,
    pub sharing: SharingMode,
    pub pre_transform: SurfaceTransforms,
    pub composite_alpha: CompositeAlpha,
    pub clipped: bool,
}

/// What the rendering side may know about the live chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainInfo {
    pub extent: Extent2D,
    pub surface_format: SurfaceFormat,
    pub present_mode: PresentMode,
    pub image_count: u32,
    pub sharing: SharingMode,
    pub generation: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresentationStatus {
    Success,
    /// Still presentable; recreation is optional.
    Suboptimal,
    /// The chain is dead; recreate before presenting again.
    OutOfDate,
}

/// What to do with a `Suboptimal` result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuboptimalPolicy {
    Eager,
    #[default]
    Lazy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecreateTrigger {
    Resized,
    Presented(PresentationStatus),
}

impl RecreateTrigger {
    pub fn requires_recreate(self, policy: SuboptimalPolicy) -> bool {
        match self {
            RecreateTrigger::Resized => true,
            RecreateTrigger::Presented(PresentationStatus::OutOfDate) => true,
            RecreateTrigger::Presented(PresentationStatus::Suboptimal) => {
                policy == SuboptimalPolicy::Eager
            }
            RecreateTrigger::Presented(PresentationStatus::Success) => false,
        }
    }
}

pub fn choose_extent(
    caps: &SurfaceCapabilities,
    framebuffer: &dyn FramebufferSource,
) -> Result<Extent2D> {
    if caps.has_defined_extent() {
        return Ok(caps.current_extent);
    }

    let (width, height) = framebuffer.framebuffer_size();
    if width <= 0 || height <= 0 {
        return Err(PresentError::InvalidWindowSize { width, height });
    }

    let clamp = |v: u32, lo: u32, hi: u32| v.min(hi).max(lo);
    Ok(Extent2D {
        width: clamp(
            width as u32,
            caps.min_image_extent.width,
            caps.max_image_extent.width,
        ),
        height: clamp(
            height as u32,
            caps.min_image_extent.height,
            caps.max_image_extent.height,
        ),
    })
}

/// BGRA8 sRGB when offered, else whatever the surface lists first.
pub fn choose_surface_format(formats: &[SurfaceFormat]) -> Result<SurfaceFormat> {
    formats
        .iter()
        .copied()
        .find(|f| *f == SurfaceFormat::PREFERRED)
        .or_else(|| formats.first().copied())
        .ok_or(PresentError::NoSurfaceSupport)
}

pub fn choose_present_mode(modes: &[PresentMode]) -> PresentMode {
    if modes.contains(&PresentMode::Mailbox) {
        PresentMode::Mailbox
    } else {
        PresentMode::Fifo
    }
}

pub fn choose_image_count(caps: &SurfaceCapabilities) -> u32 {
    let want = caps.min_image_count.saturating_add(1);
    if caps.max_image_count == 0 {
        want
    } else {
        want.min(caps.max_image_count)
    }
}

pub fn choose_sharing(families: QueueFamilies) -> SharingMode {
    if families.is_shared() {
        SharingMode::Exclusive
    } else {
        SharingMode::Concurrent([families.graphics, families.present])
    }
}

pub fn resolve_config(
    caps: &SurfaceCapabilities,
    formats: &[SurfaceFormat],
    modes: &[PresentMode],
    families: QueueFamilies,
    framebuffer: &dyn FramebufferSource,
) -> Result<SwapchainConfig> {
    Ok(SwapchainConfig {
        extent: choose_extent(caps, framebuffer)?,
        surface_format: choose_surface_format(formats)?,
        present_mode: choose_present_mode(modes),
        image_count: choose_image_count(caps),
        sharing: choose_sharing(families),
        pre_transform: caps.current_transform,
        composite_alpha: CompositeAlpha::Opaque,
        clipped: true,
    })
}

/// Surface queries and chain construction for one surface on one device.
pub trait SwapchainBackend {
    /// The live chain together with every per-image view it owns.
    type Chain;

    fn surface_capabilities(&self) -> anyhow::Result<SurfaceCapabilities>;
    fn surface_formats(&self) -> anyhow::Result<Vec<SurfaceFormat>>;
    fn present_modes(&self) -> anyhow::Result<Vec<PresentMode>>;

    fn create_chain(&mut self, config: &SwapchainConfig) -> anyhow::Result<Self::Chain>;

    /// Must release the chain's views before the chain itself.
    fn destroy_chain(&mut self, chain: Self::Chain);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Live,
    Destroyed,
}

enum ChainState<C> {
    Uninitialized,
    Live { chain: C, config: SwapchainConfig },
    Destroyed,
}

pub struct SwapchainManager<B: SwapchainBackend> {
    backend: B,
    state: ChainState<B::Chain>,
    generation: u64,
}

impl<B: SwapchainBackend> SwapchainManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: ChainState::Uninitialized,
            generation: 0,
        }
    }

    pub fn state(&self) -> LifecycleState {
        match self.state {
            ChainState::Uninitialized => LifecycleState::Uninitialized,
            ChainState::Live { .. } => LifecycleState::Live,
            ChainState::Destroyed => LifecycleState::Destroyed,
        }
    }

    pub fn chain(&self) -> Option<&B::Chain> {
        match &self.state {
            ChainState::Live { chain, .. } => Some(chain),
            _ => None,
        }
    }

    pub fn config(&self) -> Option<&SwapchainConfig> {
        match &self.state {
            ChainState::Live { config, .. } => Some(config),
            _ => None,
        }
    }

    pub fn info(&self) -> Option<ChainInfo> {
        self.config().map(|c| ChainInfo {
            extent: c.extent,
            surface_format: c.surface_format,
            present_mode: c.present_mode,
            image_count: c.image_count,
            sharing: c.sharing,
            generation: self.generation,
        })
    }

    /// Number of chains built so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Builds the first chain. On a live manager this is a full recreate.
    pub fn create(
        &mut self,
        families: QueueFamilies,
        framebuffer: &dyn FramebufferSource,
    ) -> Result<()> {
        match self.state {
            ChainState::Destroyed => Err(PresentError::Destroyed),
            ChainState::Live { .. } => {
                warn!("swapchain create on a live chain; recreating instead");
                self.recreate(families, framebuffer)
            }
            ChainState::Uninitialized => self.build(families, framebuffer),
        }
    }

    /// Tears the live chain down, then builds a new one from a fresh probe.
    ///
    /// If the rebuild fails the manager is left Uninitialized.
    pub fn recreate(
        &mut self,
        families: QueueFamilies,
        framebuffer: &dyn FramebufferSource,
    ) -> Result<()> {
        if let ChainState::Destroyed = self.state {
            return Err(PresentError::Destroyed);
        }
        self.teardown();
        self.build(families, framebuffer)
    }

    /// Destroys the live chain for good. Safe to call any number of times.
    pub fn cleanup(&mut self) {
        match self.state {
            ChainState::Live { .. } => {
                self.teardown();
                self.state = ChainState::Destroyed;
                info!("swapchain destroyed");
            }
            ChainState::Uninitialized => {
                warn!("swapchain cleanup with no live chain; nothing to destroy");
            }
            ChainState::Destroyed => {
                warn!("swapchain cleanup on an already destroyed manager; ignoring");
            }
        }
    }

    fn teardown(&mut self) {
        if let ChainState::Live { chain, config } =
            std::mem::replace(&mut self.state, ChainState::Uninitialized)
        {
            debug!(
                "destroying swapchain #{} ({}x{})",
                self.generation, config.extent.width, config.extent.height
            );
            self.backend.destroy_chain(chain);
        }
    }

    fn build(&mut self, families: QueueFamilies, framebuffer: &dyn FramebufferSource) -> Result<()> {
        let caps = self
            .backend
            .surface_capabilities()
            .map_err(PresentError::probe)?;
        let formats = non_empty(self.backend.surface_formats())?;
        let modes = non_empty(self.backend.present_modes())?;

        let config = resolve_config(&caps, &formats, &modes, families, framebuffer)?;

        let chain = self
            .backend
            .create_chain(&config)
            .map_err(|e| PresentError::SwapchainCreationFailed(format!("{e:#}")))?;

        self.generation += 1;
        info!(
            "swapchain #{} ready: {}x{} {:?}/{:?} {:?} images={} sharing={:?}",
            self.generation,
            config.extent.width,
            config.extent.height,
            config.surface_format.format,
            config.surface_format.color_space,
            config.present_mode,
            config.image_count,
            config.sharing
        );
        self.state = ChainState::Live { chain, config };
        Ok(())
    }
}

impl<B: SwapchainBackend> Drop for SwapchainManager<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}
