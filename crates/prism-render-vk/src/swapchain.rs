// SPDX-License-Identifier: CEPL-1.0
use anyhow::{Context, Result};
use ash::khr::swapchain;
use ash::vk;
use prism_render::{PresentMode, SurfaceCapabilities, SurfaceFormat, SwapchainBackend, SwapchainConfig};
use tracing::debug;

use crate::convert;
use crate::device::LogicalDevice;
use crate::instance::{SurfaceRef, VkInstance, VkSurface};

/// A live swapchain with one color view per image.
pub struct VkChain {
    pub handle: vk::SwapchainKHR,
    pub images: Vec<vk::Image>,
    pub views: Vec<vk::ImageView>,
    pub format: vk::Format,
    pub extent: vk::Extent2D,
}

/// Builds and destroys chains for one surface on one device.
///
/// Holds cloned loaders only; the owning session keeps the device and surface
/// alive until the manager around this backend is gone.
pub struct VkSwapchainBackend {
    device: ash::Device,
    loader: swapchain::Device,
    surface: SurfaceRef,
    phys: vk::PhysicalDevice,
}

impl VkSwapchainBackend {
    pub fn new(
        instance: &VkInstance,
        surface: &VkSurface,
        device: &LogicalDevice,
        phys: vk::PhysicalDevice,
    ) -> Self {
        Self {
            device: device.device.clone(),
            loader: swapchain::Device::new(&instance.instance, &device.device),
            surface: surface.shared().clone(),
            phys,
        }
    }

    pub fn loader(&self) -> &swapchain::Device {
        &self.loader
    }

    unsafe fn create_views(&self, images: &[vk::Image], format: vk::Format) -> Result<Vec<vk::ImageView>> {
        let mut views = Vec::with_capacity(images.len());
        for &image in images {
            let iv_info = vk::ImageViewCreateInfo {
                s_type: vk::StructureType::IMAGE_VIEW_CREATE_INFO,
                image,
                view_type: vk::ImageViewType::TYPE_2D,
                format,
                subresource_range: vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                },
                ..Default::default()
            };
            match self.device.create_image_view(&iv_info, None) {
                Ok(v) => views.push(v),
                Err(e) => {
                    for v in views {
                        self.device.destroy_image_view(v, None);
                    }
                    return Err(e).context("create_image_view");
                }
            }
        }
        Ok(views)
    }
}

impl SwapchainBackend for VkSwapchainBackend {
    type Chain = VkChain;

    fn surface_capabilities(&self) -> Result<SurfaceCapabilities> {
        self.surface.capabilities(self.phys)
    }

    fn surface_formats(&self) -> Result<Vec<SurfaceFormat>> {
        self.surface.formats(self.phys)
    }

    fn present_modes(&self) -> Result<Vec<PresentMode>> {
        self.surface.present_modes(self.phys)
    }

    fn create_chain(&mut self, cfg: &SwapchainConfig) -> Result<VkChain> {
        let format = convert::vk_format(cfg.surface_format.format);
        let extent = convert::vk_extent(cfg.extent);
        let families = cfg.sharing.family_indices();

        let swap_info = vk::SwapchainCreateInfoKHR {
            s_type: vk::StructureType::SWAPCHAIN_CREATE_INFO_KHR,
            surface: self.surface.handle,
            min_image_count: cfg.image_count,
            image_format: format,
            image_color_space: convert::vk_color_space(cfg.surface_format.color_space),
            image_extent: extent,
            image_array_layers: 1,
            image_usage: vk::ImageUsageFlags::COLOR_ATTACHMENT,
            image_sharing_mode: convert::vk_sharing(cfg.sharing),
            queue_family_index_count: families.len() as u32,
            p_queue_family_indices: if families.is_empty() {
                std::ptr::null()
            } else {
                families.as_ptr()
            },
            pre_transform: convert::vk_transform(cfg.pre_transform),
            composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
            present_mode: convert::vk_present_mode(cfg.present_mode),
            clipped: if cfg.clipped { vk::TRUE } else { vk::FALSE },
            // the previous chain is always destroyed first
            old_swapchain: vk::SwapchainKHR::null(),
            ..Default::default()
        };

        unsafe {
            let handle = self
                .loader
                .create_swapchain(&swap_info, None)
                .context("create_swapchain")?;
            let images = match self.loader.get_swapchain_images(handle) {
                Ok(images) => images,
                Err(e) => {
                    self.loader.destroy_swapchain(handle, None);
                    return Err(e).context("get_swapchain_images");
                }
            };
            let views = match self.create_views(&images, format) {
                Ok(views) => views,
                Err(e) => {
                    self.loader.destroy_swapchain(handle, None);
                    return Err(e);
                }
            };
            debug!("vk: swapchain {:?} with {} images", handle, images.len());

            Ok(VkChain {
                handle,
                images,
                views,
                format,
                extent,
            })
        }
    }

    fn destroy_chain(&mut self, chain: VkChain) {
        // STRICT ORDER: idle, views, then the swapchain they came from.
        unsafe {
            self.device.device_wait_idle().ok();
            for &iv in &chain.views {
                self.device.destroy_image_view(iv, None);
            }
            self.loader.destroy_swapchain(chain.handle, None);
        }
    }
}
