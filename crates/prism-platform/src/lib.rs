// SPDX-License-Identifier: CEPL-1.0
//! winit window host.

use anyhow::{anyhow, Result};
use prism_render::{FramebufferSource, RenderSize};
use tracing::{info, warn};
pub use winit;
use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::raw_window_handle::{HasDisplayHandle, RawDisplayHandle};
use winit::window::{Window, WindowAttributes};

/// Smallest window the host accepts without complaint.
pub const MIN_WINDOW_SIZE: (u32, u32) = (150, 100);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowSpec {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            title: "prism".into(),
            width: 1280,
            height: 720,
        }
    }
}

impl WindowSpec {
    /// Requested size with each dimension raised to the minimum.
    pub fn clamped_size(&self) -> (u32, u32) {
        (
            self.width.max(MIN_WINDOW_SIZE.0),
            self.height.max(MIN_WINDOW_SIZE.1),
        )
    }

    fn attributes(&self) -> WindowAttributes {
        let (w, h) = self.clamped_size();
        Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(PhysicalSize::new(w, h))
            .with_min_inner_size(PhysicalSize::new(MIN_WINDOW_SIZE.0, MIN_WINDOW_SIZE.1))
    }
}

/// Owns the window and answers framebuffer-size queries for the presenter.
pub struct WindowHost {
    window: Window,
}

impl WindowHost {
    pub fn open(event_loop: &ActiveEventLoop, spec: &WindowSpec) -> Result<Self> {
        if spec.width < MIN_WINDOW_SIZE.0 || spec.height < MIN_WINDOW_SIZE.1 {
            warn!(
                "window {}x{} is below the {}x{} minimum; clamping",
                spec.width, spec.height, MIN_WINDOW_SIZE.0, MIN_WINDOW_SIZE.1
            );
        }
        let window = event_loop
            .create_window(spec.attributes())
            .map_err(|e| anyhow!("create_window: {e}"))?;
        let host = Self { window };
        let size = host.render_size();
        info!(
            "window `{}` open on {} ({}x{})",
            spec.title,
            host.platform_name(),
            size.width,
            size.height
        );
        Ok(host)
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn render_size(&self) -> RenderSize {
        let size = self.window.inner_size();
        RenderSize {
            width: size.width,
            height: size.height,
        }
    }

    /// Windowing system behind the display handle, for diagnostics.
    pub fn platform_name(&self) -> &'static str {
        match self.window.display_handle().map(|h| h.as_raw()) {
            Ok(raw) => display_name(raw),
            Err(_) => "unavailable",
        }
    }
}

impl FramebufferSource for WindowHost {
    fn framebuffer_size(&self) -> (i32, i32) {
        self.render_size().framebuffer_size()
    }
}

pub fn display_name(raw: RawDisplayHandle) -> &'static str {
    match raw {
        RawDisplayHandle::Windows(_) => "win32",
        RawDisplayHandle::AppKit(_) => "appkit",
        RawDisplayHandle::UiKit(_) => "uikit",
        RawDisplayHandle::Wayland(_) => "wayland",
        RawDisplayHandle::Xlib(_) => "xlib",
        RawDisplayHandle::Xcb(_) => "xcb",
        RawDisplayHandle::Android(_) => "android",
        _ => "other",
    }
}
