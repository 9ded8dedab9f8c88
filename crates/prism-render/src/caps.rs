// SPDX-License-Identifier: CEPL-1.0
//! Capability sets reported by an accelerator and its surface.
//!
//! These mirror what a graphics API exposes without committing to its raw
//! enumeration values; backends translate at the boundary.

use bitflags::bitflags;

/// Width reported in `current_extent` when the surface lets the swapchain pick its size.
pub const UNDEFINED_EXTENT: u32 = u32::MAX;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

impl Extent2D {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

bitflags! {
    /// Operation categories a queue family supports.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct QueueCapabilities: u32 {
        const GRAPHICS = 1 << 0;
        const COMPUTE = 1 << 1;
        const TRANSFER = 1 << 2;
        const SPARSE_BINDING = 1 << 3;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueFamilyProps {
    pub capabilities: QueueCapabilities,
    pub queue_count: u32,
}

bitflags! {
    /// Optional hardware features the session cares about.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DeviceFeatures: u32 {
        const SAMPLER_ANISOTROPY = 1 << 0;
        const FILL_MODE_NON_SOLID = 1 << 1;
        const GEOMETRY_SHADER = 1 << 2;
        const BUFFER_DEVICE_ADDRESS = 1 << 3;
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SurfaceTransforms: u32 {
        const IDENTITY = 1 << 0;
        const ROTATE_90 = 1 << 1;
        const ROTATE_180 = 1 << 2;
        const ROTATE_270 = 1 << 3;
        const HORIZONTAL_MIRROR = 1 << 4;
        const HORIZONTAL_MIRROR_ROTATE_90 = 1 << 5;
        const HORIZONTAL_MIRROR_ROTATE_180 = 1 << 6;
        const HORIZONTAL_MIRROR_ROTATE_270 = 1 << 7;
        const INHERIT = 1 << 8;
    }
}

/// Pixel layout of a presentable image. `Other` carries the backend's raw value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Bgra8Srgb,
    Bgra8Unorm,
    Rgba8Srgb,
    Rgba8Unorm,
    A2Bgr10Unorm,
    Rgba16Float,
    Other(i32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    SrgbNonLinear,
    DisplayP3NonLinear,
    ExtendedSrgbLinear,
    Hdr10St2084,
    Other(i32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceFormat {
    pub format: PixelFormat,
    pub color_space: ColorSpace,
}

impl SurfaceFormat {
    /// 8-bit BGRA sRGB in the standard non-linear sRGB color space.
    pub const PREFERRED: SurfaceFormat = SurfaceFormat {
        format: PixelFormat::Bgra8Srgb,
        color_space: ColorSpace::SrgbNonLinear,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PresentMode {
    Immediate,
    /// Latest image wins, no tearing.
    Mailbox,
    /// Strict queue, always supported.
    Fifo,
    FifoRelaxed,
    Other(i32),
}

/// One probe's view of the surface. Stale as soon as the window changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceCapabilities {
    pub min_image_count: u32,
    /// Zero means no upper bound.
    pub max_image_count: u32,
    pub current_extent: Extent2D,
    pub min_image_extent: Extent2D,
    pub max_image_extent: Extent2D,
    pub supported_transforms: SurfaceTransforms,
    pub current_transform: SurfaceTransforms,
}

impl SurfaceCapabilities {
    /// False when the surface reports the "pick your own size" sentinel.
    pub fn has_defined_extent(&self) -> bool {
        self.current_extent.width != UNDEFINED_EXTENT
    }
}
