// SPDX-License-Identifier: CEPL-1.0
//! Vulkan (ash) implementation of the presentation bootstrap.

pub mod convert;
pub mod device;
pub mod instance;
pub mod probe;
pub mod session;
pub mod swapchain;

pub use convert::classify_present;
pub use device::{LogicalDevice, VkDeviceFactory};
pub use instance::{VkInstance, VkSurface};
pub use probe::VkProbe;
pub use session::VkSession;
pub use swapchain::{VkChain, VkSwapchainBackend};
