// SPDX-License-Identifier: CEPL-1.0
use std::collections::BTreeSet;
use std::ffi::CStr;

use anyhow::{Context, Result};
use ash::vk;
use prism_render::{
    CapabilityProbe, DeviceFeatures, PresentMode, QueueFamilyProps, SurfaceCapabilities,
    SurfaceFormat,
};

use crate::convert;
use crate::instance::SurfaceRef;

impl SurfaceRef {
    pub(crate) fn capabilities(&self, phys: vk::PhysicalDevice) -> Result<SurfaceCapabilities> {
        let caps = unsafe {
            self.loader
                .get_physical_device_surface_capabilities(phys, self.handle)
        }
        .context("get_physical_device_surface_capabilities")?;
        Ok(convert::surface_capabilities(&caps))
    }

    pub(crate) fn formats(&self, phys: vk::PhysicalDevice) -> Result<Vec<SurfaceFormat>> {
        let formats = unsafe {
            self.loader
                .get_physical_device_surface_formats(phys, self.handle)
        }
        .context("get_physical_device_surface_formats")?;
        Ok(formats.into_iter().map(convert::surface_format).collect())
    }

    pub(crate) fn present_modes(&self, phys: vk::PhysicalDevice) -> Result<Vec<PresentMode>> {
        let modes = unsafe {
            self.loader
                .get_physical_device_surface_present_modes(phys, self.handle)
        }
        .context("get_physical_device_surface_present_modes")?;
        Ok(modes.into_iter().map(convert::present_mode).collect())
    }
}

/// Answers capability queries for physical devices against one surface.
pub struct VkProbe<'a> {
    instance: &'a ash::Instance,
    surface: &'a SurfaceRef,
}

impl<'a> VkProbe<'a> {
    pub fn new(instance: &'a ash::Instance, surface: &'a SurfaceRef) -> Self {
        Self { instance, surface }
    }

    /// Physical devices in driver enumeration order.
    pub fn accelerators(&self) -> Result<Vec<vk::PhysicalDevice>> {
        unsafe { self.instance.enumerate_physical_devices() }.context("enumerate_physical_devices")
    }
}

impl CapabilityProbe for VkProbe<'_> {
    type Accelerator = vk::PhysicalDevice;

    fn accelerator_name(&self, phys: vk::PhysicalDevice) -> String {
        let props = unsafe { self.instance.get_physical_device_properties(phys) };
        unsafe { CStr::from_ptr(props.device_name.as_ptr()) }
            .to_string_lossy()
            .into_owned()
    }

    fn api_version(&self, phys: vk::PhysicalDevice) -> Result<u32> {
        Ok(unsafe { self.instance.get_physical_device_properties(phys) }.api_version)
    }

    fn queue_families(&self, phys: vk::PhysicalDevice) -> Result<Vec<QueueFamilyProps>> {
        let props = unsafe {
            self.instance
                .get_physical_device_queue_family_properties(phys)
        };
        Ok(props
            .iter()
            .map(|q| QueueFamilyProps {
                capabilities: convert::queue_capabilities(q.queue_flags),
                queue_count: q.queue_count,
            })
            .collect())
    }

    fn supports_present(&self, phys: vk::PhysicalDevice, family: u32) -> Result<bool> {
        unsafe {
            self.surface
                .loader
                .get_physical_device_surface_support(phys, family, self.surface.handle)
        }
        .with_context(|| format!("get_physical_device_surface_support(family {family})"))
    }

    fn query_surface_formats(&self, phys: vk::PhysicalDevice) -> Result<Vec<SurfaceFormat>> {
        self.surface.formats(phys)
    }

    fn query_present_modes(&self, phys: vk::PhysicalDevice) -> Result<Vec<PresentMode>> {
        self.surface.present_modes(phys)
    }

    fn device_extensions(&self, phys: vk::PhysicalDevice) -> Result<BTreeSet<String>> {
        let props = unsafe { self.instance.enumerate_device_extension_properties(phys) }
            .context("enumerate_device_extension_properties")?;
        Ok(props
            .iter()
            .map(|e| {
                unsafe { CStr::from_ptr(e.extension_name.as_ptr()) }
                    .to_string_lossy()
                    .into_owned()
            })
            .collect())
    }

    fn features(&self, phys: vk::PhysicalDevice) -> Result<DeviceFeatures> {
        let mut feats12 = vk::PhysicalDeviceVulkan12Features {
            s_type: vk::StructureType::PHYSICAL_DEVICE_VULKAN_1_2_FEATURES,
            ..Default::default()
        };
        let mut feats2 = vk::PhysicalDeviceFeatures2 {
            s_type: vk::StructureType::PHYSICAL_DEVICE_FEATURES_2,
            p_next: (&mut feats12) as *mut _ as *mut _,
            ..Default::default()
        };
        unsafe {
            self.instance
                .get_physical_device_features2(phys, &mut feats2)
        };
        Ok(convert::device_features(&feats2.features, &feats12))
    }

    fn surface_capabilities(&self, phys: vk::PhysicalDevice) -> Result<SurfaceCapabilities> {
        self.surface.capabilities(phys)
    }
}
