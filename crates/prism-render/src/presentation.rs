// SPDX-License-Identifier: CEPL-1.0
//! Pause and recreate gating around a `SwapchainManager`.

use tracing::info;

use crate::error::Result;
use crate::queue::QueueFamilies;
use crate::swapchain::{
    ChainInfo, LifecycleState, PresentationStatus, RecreateTrigger, SuboptimalPolicy,
    SwapchainBackend, SwapchainManager,
};
use crate::FramebufferSource;

fn is_zero(framebuffer: &dyn FramebufferSource) -> bool {
    let (w, h) = framebuffer.framebuffer_size();
    w == 0 || h == 0
}

/// One window's swapchain plus the rules for when it gets rebuilt.
///
/// A 0x0 framebuffer pauses: no chain is built and present results are
/// ignored until a non-zero resize arrives.
pub struct Presentation<B: SwapchainBackend> {
    manager: SwapchainManager<B>,
    families: QueueFamilies,
    suboptimal: SuboptimalPolicy,
    paused: bool,
}

impl<B: SwapchainBackend> Presentation<B> {
    /// Builds the first chain, or starts paused when the framebuffer is 0x0.
    pub fn start(
        backend: B,
        families: QueueFamilies,
        suboptimal: SuboptimalPolicy,
        framebuffer: &dyn FramebufferSource,
    ) -> Result<Self> {
        let mut manager = SwapchainManager::new(backend);
        let paused = is_zero(framebuffer);
        if paused {
            info!("framebuffer is 0x0 at startup → paused=true");
        } else {
            manager.create(families, framebuffer)?;
        }
        Ok(Self {
            manager,
            families,
            suboptimal,
            paused,
        })
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn manager(&self) -> &SwapchainManager<B> {
        &self.manager
    }

    pub fn chain(&self) -> Option<&B::Chain> {
        self.manager.chain()
    }

    pub fn info(&self) -> Option<ChainInfo> {
        self.manager.info()
    }

    pub fn resize(&mut self, framebuffer: &dyn FramebufferSource) -> Result<()> {
        if is_zero(framebuffer) {
            if !self.paused {
                info!("resize to 0x0 → paused=true");
            }
            self.paused = true;
            return Ok(());
        }

        if self.paused {
            let (w, h) = framebuffer.framebuffer_size();
            info!("resize to {w}x{h} → paused=false");
        }
        self.paused = false;

        if RecreateTrigger::Resized.requires_recreate(self.suboptimal) {
            self.manager.recreate(self.families, framebuffer)?;
        }
        Ok(())
    }

    /// Returns whether the chain was rebuilt.
    pub fn handle_status(
        &mut self,
        status: PresentationStatus,
        framebuffer: &dyn FramebufferSource,
    ) -> Result<bool> {
        if self.paused || !RecreateTrigger::Presented(status).requires_recreate(self.suboptimal) {
            return Ok(false);
        }
        info!("present reported {status:?}; recreating swapchain");
        self.manager.recreate(self.families, framebuffer)?;
        Ok(true)
    }

    /// Destroys a live chain; no-op (and no warning) otherwise.
    pub fn shutdown(&mut self) {
        if self.manager.state() == LifecycleState::Live {
            self.manager.cleanup();
        }
    }
}
