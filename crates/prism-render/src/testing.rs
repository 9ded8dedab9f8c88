// SPDX-License-Identifier: CEPL-1.0
//! In-memory accelerators and surfaces for unit tests (no GPU required).

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;

use anyhow::anyhow;

use crate::caps::{
    DeviceFeatures, Extent2D, PresentMode, QueueCapabilities, QueueFamilyProps,
    SurfaceCapabilities, SurfaceFormat, SurfaceTransforms,
};
use crate::device::{DeviceFactory, DeviceRequest};
use crate::probe::CapabilityProbe;
use crate::requirements::{api_version, SWAPCHAIN_EXTENSION};
use crate::swapchain::{SwapchainBackend, SwapchainConfig};

pub fn caps_with_extent(width: u32, height: u32) -> SurfaceCapabilities {
    SurfaceCapabilities {
        min_image_count: 2,
        max_image_count: 8,
        current_extent: Extent2D::new(width, height),
        min_image_extent: Extent2D::new(1, 1),
        max_image_extent: Extent2D::new(4096, 4096),
        supported_transforms: SurfaceTransforms::IDENTITY,
        current_transform: SurfaceTransforms::IDENTITY,
    }
}

#[derive(Clone, Debug)]
pub struct MockGpu {
    name: String,
    api_version: u32,
    families: Vec<QueueCapabilities>,
    present: Vec<bool>,
    formats: Vec<SurfaceFormat>,
    modes: Vec<PresentMode>,
    extensions: BTreeSet<String>,
    features: DeviceFeatures,
    surface_lost: bool,
}

impl MockGpu {
    /// One graphics+present family, every feature, swapchain extension, FIFO + mailbox.
    pub fn capable(name: &str) -> Self {
        Self {
            name: name.to_string(),
            api_version: api_version(1, 3),
            families: vec![QueueCapabilities::GRAPHICS | QueueCapabilities::TRANSFER],
            present: vec![true],
            formats: vec![SurfaceFormat::PREFERRED],
            modes: vec![PresentMode::Fifo, PresentMode::Mailbox],
            extensions: [SWAPCHAIN_EXTENSION.to_string()].into(),
            features: DeviceFeatures::all(),
            surface_lost: false,
        }
    }

    pub fn with_api_version(mut self, major: u32, minor: u32) -> Self {
        self.api_version = api_version(major, minor);
        self
    }

    pub fn with_queue_families(mut self, families: Vec<QueueCapabilities>, present: Vec<bool>) -> Self {
        self.families = families;
        self.present = present;
        self
    }

    pub fn with_formats(mut self, formats: Vec<SurfaceFormat>) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_present_modes(mut self, modes: Vec<PresentMode>) -> Self {
        self.modes = modes;
        self
    }

    pub fn with_extensions(mut self, names: &[&str]) -> Self {
        self.extensions = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_features(mut self, features: DeviceFeatures) -> Self {
        self.features = features;
        self
    }

    pub fn with_surface_lost(mut self) -> Self {
        self.surface_lost = true;
        self
    }
}

pub struct MockProbe {
    gpus: Vec<MockGpu>,
    present_queries: RefCell<Vec<(usize, u32)>>,
}

impl MockProbe {
    pub fn new(gpus: Vec<MockGpu>) -> Self {
        Self {
            gpus,
            present_queries: RefCell::new(Vec::new()),
        }
    }

    pub fn present_queries(&self) -> Vec<(usize, u32)> {
        self.present_queries.borrow().clone()
    }

    fn gpu(&self, index: usize) -> anyhow::Result<&MockGpu> {
        self.gpus.get(index).ok_or_else(|| anyhow!("no mock gpu {index}"))
    }

    fn surface(&self, index: usize) -> anyhow::Result<&MockGpu> {
        let gpu = self.gpu(index)?;
        if gpu.surface_lost {
            return Err(anyhow!("VK_ERROR_SURFACE_LOST_KHR"));
        }
        Ok(gpu)
    }
}

impl CapabilityProbe for MockProbe {
    type Accelerator = usize;

    fn accelerator_name(&self, accelerator: usize) -> String {
        self.gpu(accelerator)
            .map(|g| g.name.clone())
            .unwrap_or_else(|_| format!("gpu{accelerator}"))
    }

    fn api_version(&self, accelerator: usize) -> anyhow::Result<u32> {
        Ok(self.gpu(accelerator)?.api_version)
    }

    fn queue_families(&self, accelerator: usize) -> anyhow::Result<Vec<QueueFamilyProps>> {
        Ok(self
            .gpu(accelerator)?
            .families
            .iter()
            .map(|&capabilities| QueueFamilyProps {
                capabilities,
                queue_count: 1,
            })
            .collect())
    }

    fn supports_present(&self, accelerator: usize, family: u32) -> anyhow::Result<bool> {
        self.present_queries.borrow_mut().push((accelerator, family));
        let gpu = self.surface(accelerator)?;
        Ok(gpu.present.get(family as usize).copied().unwrap_or(false))
    }

    fn query_surface_formats(&self, accelerator: usize) -> anyhow::Result<Vec<SurfaceFormat>> {
        Ok(self.surface(accelerator)?.formats.clone())
    }

    fn query_present_modes(&self, accelerator: usize) -> anyhow::Result<Vec<PresentMode>> {
        Ok(self.surface(accelerator)?.modes.clone())
    }

    fn device_extensions(&self, accelerator: usize) -> anyhow::Result<BTreeSet<String>> {
        Ok(self.gpu(accelerator)?.extensions.clone())
    }

    fn features(&self, accelerator: usize) -> anyhow::Result<DeviceFeatures> {
        Ok(self.gpu(accelerator)?.features)
    }

    fn surface_capabilities(&self, accelerator: usize) -> anyhow::Result<SurfaceCapabilities> {
        self.surface(accelerator)?;
        Ok(caps_with_extent(800, 600))
    }
}

#[derive(Default)]
pub struct MockFactory {
    fail_with: Option<String>,
    requests: RefCell<Vec<DeviceRequest>>,
}

impl MockFactory {
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<DeviceRequest> {
        self.requests.borrow().clone()
    }
}

impl DeviceFactory for MockFactory {
    type Accelerator = usize;
    type Device = usize;

    fn create_device(&self, accelerator: usize, request: &DeviceRequest) -> anyhow::Result<usize> {
        self.requests.borrow_mut().push(request.clone());
        match &self.fail_with {
            Some(msg) => Err(anyhow!("{msg}")),
            None => Ok(accelerator),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainEvent {
    Created(u64),
    Destroyed(u64),
}

pub struct MockSurface {
    caps: Rc<RefCell<SurfaceCapabilities>>,
    modes: Vec<PresentMode>,
    fail: Rc<Cell<bool>>,
    events: Rc<RefCell<Vec<ChainEvent>>>,
    next_id: u64,
}

impl MockSurface {
    pub fn new(caps: SurfaceCapabilities) -> Self {
        Self {
            caps: Rc::new(RefCell::new(caps)),
            modes: vec![PresentMode::Fifo],
            fail: Rc::new(Cell::new(false)),
            events: Rc::new(RefCell::new(Vec::new())),
            next_id: 1,
        }
    }

    pub fn with_present_modes(mut self, modes: Vec<PresentMode>) -> Self {
        self.modes = modes;
        self
    }

    pub fn events(&self) -> Rc<RefCell<Vec<ChainEvent>>> {
        Rc::clone(&self.events)
    }

    pub fn caps_handle(&self) -> Rc<RefCell<SurfaceCapabilities>> {
        Rc::clone(&self.caps)
    }

    pub fn fail_handle(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.fail)
    }
}

impl SwapchainBackend for MockSurface {
    type Chain = u64;

    fn surface_capabilities(&self) -> anyhow::Result<SurfaceCapabilities> {
        Ok(*self.caps.borrow())
    }

    fn surface_formats(&self) -> anyhow::Result<Vec<SurfaceFormat>> {
        Ok(vec![SurfaceFormat::PREFERRED])
    }

    fn present_modes(&self) -> anyhow::Result<Vec<PresentMode>> {
        Ok(self.modes.clone())
    }

    fn create_chain(&mut self, _config: &SwapchainConfig) -> anyhow::Result<u64> {
        if self.fail.get() {
            return Err(anyhow!("VK_ERROR_NATIVE_WINDOW_IN_USE_KHR"));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.events.borrow_mut().push(ChainEvent::Created(id));
        Ok(id)
    }

    fn destroy_chain(&mut self, chain: u64) {
        self.events.borrow_mut().push(ChainEvent::Destroyed(chain));
    }
}
