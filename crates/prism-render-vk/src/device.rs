// SPDX-License-Identifier: CEPL-1.0
use std::ffi::{c_char, CString};

use anyhow::{Context, Result};
use ash::vk;
use prism_render::{DeviceFactory, DeviceFeatures, DeviceRequest};
use tracing::debug;

use crate::convert;

/// The logical device and one queue per requested family.
pub struct LogicalDevice {
    pub(crate) device: ash::Device,
    queues: Vec<(u32, vk::Queue)>,
}

impl LogicalDevice {
    pub fn handle(&self) -> &ash::Device {
        &self.device
    }

    pub fn queue(&self, family: u32) -> Option<vk::Queue> {
        self.queues
            .iter()
            .find(|(f, _)| *f == family)
            .map(|(_, q)| *q)
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();
            self.device.destroy_device(None);
        }
    }
}

pub struct VkDeviceFactory<'a> {
    instance: &'a ash::Instance,
}

impl<'a> VkDeviceFactory<'a> {
    pub fn new(instance: &'a ash::Instance) -> Self {
        Self { instance }
    }
}

impl DeviceFactory for VkDeviceFactory<'_> {
    type Accelerator = vk::PhysicalDevice;
    type Device = LogicalDevice;

    fn create_device(&self, phys: vk::PhysicalDevice, request: &DeviceRequest) -> Result<LogicalDevice> {
        // STRICT ORDER (feature pNext chain): feats12 -> feats2 -> DeviceCreateInfo.
        // p_enabled_features must stay null once Features2 is chained.
        let priorities: Vec<[f32; 1]> = request.queues.iter().map(|q| [q.priority]).collect();
        let queue_infos: Vec<vk::DeviceQueueCreateInfo> = request
            .queues
            .iter()
            .zip(&priorities)
            .map(|(q, prio)| vk::DeviceQueueCreateInfo {
                s_type: vk::StructureType::DEVICE_QUEUE_CREATE_INFO,
                queue_family_index: q.family,
                queue_count: 1,
                p_queue_priorities: prio.as_ptr(),
                ..Default::default()
            })
            .collect();

        let ext_names = request
            .extensions
            .iter()
            .map(|e| CString::new(e.as_str()))
            .collect::<Result<Vec<_>, _>>()
            .context("device extension name contains NUL")?;
        let ext_ptrs: Vec<*const c_char> = ext_names.iter().map(|e| e.as_ptr()).collect();

        let mut feats12 = vk::PhysicalDeviceVulkan12Features {
            s_type: vk::StructureType::PHYSICAL_DEVICE_VULKAN_1_2_FEATURES,
            buffer_device_address: if request
                .features
                .contains(DeviceFeatures::BUFFER_DEVICE_ADDRESS)
            {
                vk::TRUE
            } else {
                vk::FALSE
            },
            ..Default::default()
        };
        let feats2 = vk::PhysicalDeviceFeatures2 {
            s_type: vk::StructureType::PHYSICAL_DEVICE_FEATURES_2,
            p_next: (&mut feats12) as *mut _ as *mut _,
            features: convert::vk_core_features(request.features),
            ..Default::default()
        };

        let dinfo = vk::DeviceCreateInfo {
            s_type: vk::StructureType::DEVICE_CREATE_INFO,
            p_next: (&feats2) as *const _ as *const _,
            queue_create_info_count: queue_infos.len() as u32,
            p_queue_create_infos: queue_infos.as_ptr(),
            enabled_extension_count: ext_ptrs.len() as u32,
            pp_enabled_extension_names: ext_ptrs.as_ptr(),
            ..Default::default()
        };

        let device = unsafe { self.instance.create_device(phys, &dinfo, None) }.context("create_device")?;

        let queues = request
            .queues
            .iter()
            .map(|q| (q.family, unsafe { device.get_device_queue(q.family, 0) }))
            .collect::<Vec<_>>();
        debug!("vk: device queues {:?}", queues.iter().map(|(f, _)| f).collect::<Vec<_>>());

        Ok(LogicalDevice { device, queues })
    }
}
