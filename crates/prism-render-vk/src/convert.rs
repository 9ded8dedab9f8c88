// SPDX-License-Identifier: CEPL-1.0
//! Translation between raw Vulkan values and the backend-neutral model.

use ash::prelude::VkResult;
use ash::vk;
use prism_render::{
    ColorSpace, DeviceFeatures, Extent2D, PixelFormat, PresentMode, PresentationStatus,
    QueueCapabilities, SharingMode, SurfaceCapabilities, SurfaceFormat, SurfaceTransforms,
};

pub fn queue_capabilities(flags: vk::QueueFlags) -> QueueCapabilities {
    let mut caps = QueueCapabilities::empty();
    caps.set(QueueCapabilities::GRAPHICS, flags.contains(vk::QueueFlags::GRAPHICS));
    caps.set(QueueCapabilities::COMPUTE, flags.contains(vk::QueueFlags::COMPUTE));
    caps.set(QueueCapabilities::TRANSFER, flags.contains(vk::QueueFlags::TRANSFER));
    caps.set(
        QueueCapabilities::SPARSE_BINDING,
        flags.contains(vk::QueueFlags::SPARSE_BINDING),
    );
    caps
}

pub fn pixel_format(f: vk::Format) -> PixelFormat {
    match f {
        vk::Format::B8G8R8A8_SRGB => PixelFormat::Bgra8Srgb,
        vk::Format::B8G8R8A8_UNORM => PixelFormat::Bgra8Unorm,
        vk::Format::R8G8B8A8_SRGB => PixelFormat::Rgba8Srgb,
        vk::Format::R8G8B8A8_UNORM => PixelFormat::Rgba8Unorm,
        vk::Format::A2B10G10R10_UNORM_PACK32 => PixelFormat::A2Bgr10Unorm,
        vk::Format::R16G16B16A16_SFLOAT => PixelFormat::Rgba16Float,
        other => PixelFormat::Other(other.as_raw()),
    }
}

pub fn vk_format(f: PixelFormat) -> vk::Format {
    match f {
        PixelFormat::Bgra8Srgb => vk::Format::B8G8R8A8_SRGB,
        PixelFormat::Bgra8Unorm => vk::Format::B8G8R8A8_UNORM,
        PixelFormat::Rgba8Srgb => vk::Format::R8G8B8A8_SRGB,
        PixelFormat::Rgba8Unorm => vk::Format::R8G8B8A8_UNORM,
        PixelFormat::A2Bgr10Unorm => vk::Format::A2B10G10R10_UNORM_PACK32,
        PixelFormat::Rgba16Float => vk::Format::R16G16B16A16_SFLOAT,
        PixelFormat::Other(raw) => vk::Format::from_raw(raw),
    }
}

pub fn color_space(cs: vk::ColorSpaceKHR) -> ColorSpace {
    match cs {
        vk::ColorSpaceKHR::SRGB_NONLINEAR => ColorSpace::SrgbNonLinear,
        vk::ColorSpaceKHR::DISPLAY_P3_NONLINEAR_EXT => ColorSpace::DisplayP3NonLinear,
        vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT => ColorSpace::ExtendedSrgbLinear,
        vk::ColorSpaceKHR::HDR10_ST2084_EXT => ColorSpace::Hdr10St2084,
        other => ColorSpace::Other(other.as_raw()),
    }
}

pub fn vk_color_space(cs: ColorSpace) -> vk::ColorSpaceKHR {
    match cs {
        ColorSpace::SrgbNonLinear => vk::ColorSpaceKHR::SRGB_NONLINEAR,
        ColorSpace::DisplayP3NonLinear => vk::ColorSpaceKHR::DISPLAY_P3_NONLINEAR_EXT,
        ColorSpace::ExtendedSrgbLinear => vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT,
        ColorSpace::Hdr10St2084 => vk::ColorSpaceKHR::HDR10_ST2084_EXT,
        ColorSpace::Other(raw) => vk::ColorSpaceKHR::from_raw(raw),
    }
}

pub fn surface_format(f: vk::SurfaceFormatKHR) -> SurfaceFormat {
    SurfaceFormat {
        format: pixel_format(f.format),
        color_space: color_space(f.color_space),
    }
}

pub fn present_mode(m: vk::PresentModeKHR) -> PresentMode {
    match m {
        vk::PresentModeKHR::IMMEDIATE => PresentMode::Immediate,
        vk::PresentModeKHR::MAILBOX => PresentMode::Mailbox,
        vk::PresentModeKHR::FIFO => PresentMode::Fifo,
        vk::PresentModeKHR::FIFO_RELAXED => PresentMode::FifoRelaxed,
        other => PresentMode::Other(other.as_raw()),
    }
}

pub fn vk_present_mode(m: PresentMode) -> vk::PresentModeKHR {
    match m {
        PresentMode::Immediate => vk::PresentModeKHR::IMMEDIATE,
        PresentMode::Mailbox => vk::PresentModeKHR::MAILBOX,
        PresentMode::Fifo => vk::PresentModeKHR::FIFO,
        PresentMode::FifoRelaxed => vk::PresentModeKHR::FIFO_RELAXED,
        PresentMode::Other(raw) => vk::PresentModeKHR::from_raw(raw),
    }
}

// SurfaceTransforms uses the same bit positions as VkSurfaceTransformFlagBitsKHR.
pub fn transforms(t: vk::SurfaceTransformFlagsKHR) -> SurfaceTransforms {
    SurfaceTransforms::from_bits_truncate(t.as_raw())
}

pub fn vk_transform(t: SurfaceTransforms) -> vk::SurfaceTransformFlagsKHR {
    vk::SurfaceTransformFlagsKHR::from_raw(t.bits())
}

pub fn extent(e: vk::Extent2D) -> Extent2D {
    Extent2D::new(e.width, e.height)
}

pub fn vk_extent(e: Extent2D) -> vk::Extent2D {
    vk::Extent2D {
        width: e.width,
        height: e.height,
    }
}

pub fn surface_capabilities(caps: &vk::SurfaceCapabilitiesKHR) -> SurfaceCapabilities {
    SurfaceCapabilities {
        min_image_count: caps.min_image_count,
        max_image_count: caps.max_image_count,
        current_extent: extent(caps.current_extent),
        min_image_extent: extent(caps.min_image_extent),
        max_image_extent: extent(caps.max_image_extent),
        supported_transforms: transforms(caps.supported_transforms),
        current_transform: transforms(caps.current_transform),
    }
}

pub fn device_features(
    core: &vk::PhysicalDeviceFeatures,
    v12: &vk::PhysicalDeviceVulkan12Features,
) -> DeviceFeatures {
    let mut f = DeviceFeatures::empty();
    f.set(DeviceFeatures::SAMPLER_ANISOTROPY, core.sampler_anisotropy == vk::TRUE);
    f.set(DeviceFeatures::FILL_MODE_NON_SOLID, core.fill_mode_non_solid == vk::TRUE);
    f.set(DeviceFeatures::GEOMETRY_SHADER, core.geometry_shader == vk::TRUE);
    f.set(
        DeviceFeatures::BUFFER_DEVICE_ADDRESS,
        v12.buffer_device_address == vk::TRUE,
    );
    f
}

fn bool32(on: bool) -> vk::Bool32 {
    if on {
        vk::TRUE
    } else {
        vk::FALSE
    }
}

/// Core 1.0 feature struct with exactly `features` switched on.
pub fn vk_core_features(features: DeviceFeatures) -> vk::PhysicalDeviceFeatures {
    vk::PhysicalDeviceFeatures {
        sampler_anisotropy: bool32(features.contains(DeviceFeatures::SAMPLER_ANISOTROPY)),
        fill_mode_non_solid: bool32(features.contains(DeviceFeatures::FILL_MODE_NON_SOLID)),
        geometry_shader: bool32(features.contains(DeviceFeatures::GEOMETRY_SHADER)),
        ..Default::default()
    }
}

pub fn vk_sharing(sharing: SharingMode) -> vk::SharingMode {
    match sharing {
        SharingMode::Exclusive => vk::SharingMode::EXCLUSIVE,
        SharingMode::Concurrent(_) => vk::SharingMode::CONCURRENT,
    }
}

/// Splits a present (or acquire) result into a status and real errors.
///
/// `Ok(true)` is the suboptimal flag; `ERROR_OUT_OF_DATE_KHR` becomes
/// `OutOfDate`. Anything else stays an error.
pub fn classify_present(result: VkResult<bool>) -> Result<PresentationStatus, vk::Result> {
    match result {
        Ok(false) => Ok(PresentationStatus::Success),
        Ok(true) => Ok(PresentationStatus::Suboptimal),
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentationStatus::OutOfDate),
        Err(e) => Err(e),
    }
}
