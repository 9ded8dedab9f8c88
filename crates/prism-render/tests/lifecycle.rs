// SPDX-License-Identifier: CEPL-1.0
//! End-to-end bootstrap against a scripted fake GPU: select, build the
//! device, then drive the swapchain through create / recreate / cleanup.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use prism_render::caps::UNDEFINED_EXTENT;
use prism_render::{
    build_logical_device, select_accelerator, CapabilityProbe, DeviceFactory, DeviceFeatures,
    DeviceRequest, DeviceRequirements, Extent2D, LifecycleState, Platform, PresentError,
    PresentMode, QueueCapabilities, QueueFamilyProps, SharingMode, SurfaceCapabilities,
    SurfaceFormat, SurfaceTransforms, SwapchainBackend, SwapchainConfig, SwapchainManager,
};

#[derive(Clone)]
struct FakeGpu {
    families: Vec<(QueueCapabilities, bool)>,
    modes: Vec<PresentMode>,
    caps: SurfaceCapabilities,
}

impl FakeGpu {
    fn new(families: Vec<(QueueCapabilities, bool)>) -> Self {
        Self {
            families,
            modes: vec![PresentMode::Fifo, PresentMode::Mailbox],
            caps: SurfaceCapabilities {
                min_image_count: 2,
                max_image_count: 0,
                current_extent: Extent2D::new(1280, 720),
                min_image_extent: Extent2D::new(1, 1),
                max_image_extent: Extent2D::new(8192, 8192),
                supported_transforms: SurfaceTransforms::IDENTITY,
                current_transform: SurfaceTransforms::IDENTITY,
            },
        }
    }
}

struct FakeApi {
    gpus: Vec<FakeGpu>,
}

impl CapabilityProbe for FakeApi {
    type Accelerator = usize;

    fn accelerator_name(&self, accelerator: usize) -> String {
        format!("fake-{accelerator}")
    }

    fn api_version(&self, _accelerator: usize) -> anyhow::Result<u32> {
        Ok(prism_render::requirements::api_version(1, 3))
    }

    fn queue_families(&self, accelerator: usize) -> anyhow::Result<Vec<QueueFamilyProps>> {
        Ok(self.gpus[accelerator]
            .families
            .iter()
            .map(|(capabilities, _)| QueueFamilyProps {
                capabilities: *capabilities,
                queue_count: 4,
            })
            .collect())
    }

    fn supports_present(&self, accelerator: usize, family: u32) -> anyhow::Result<bool> {
        Ok(self.gpus[accelerator].families[family as usize].1)
    }

    fn query_surface_formats(&self, _accelerator: usize) -> anyhow::Result<Vec<SurfaceFormat>> {
        Ok(vec![SurfaceFormat::PREFERRED])
    }

    fn query_present_modes(&self, accelerator: usize) -> anyhow::Result<Vec<PresentMode>> {
        Ok(self.gpus[accelerator].modes.clone())
    }

    fn device_extensions(&self, _accelerator: usize) -> anyhow::Result<BTreeSet<String>> {
        Ok(["VK_KHR_swapchain".to_string()].into())
    }

    fn features(&self, _accelerator: usize) -> anyhow::Result<DeviceFeatures> {
        Ok(DeviceFeatures::all())
    }

    fn surface_capabilities(&self, accelerator: usize) -> anyhow::Result<SurfaceCapabilities> {
        Ok(self.gpus[accelerator].caps)
    }
}

#[derive(Default)]
struct RecordingFactory {
    seen: RefCell<Vec<DeviceRequest>>,
}

impl DeviceFactory for RecordingFactory {
    type Accelerator = usize;
    type Device = usize;

    fn create_device(&self, accelerator: usize, request: &DeviceRequest) -> anyhow::Result<usize> {
        self.seen.borrow_mut().push(request.clone());
        Ok(accelerator)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Create(u32),
    Destroy(u32),
}

struct FakeSurface {
    gpu: FakeGpu,
    log: Rc<RefCell<Vec<Event>>>,
    configs: Rc<RefCell<Vec<SwapchainConfig>>>,
    next: u32,
}

impl FakeSurface {
    fn new(gpu: FakeGpu) -> Self {
        Self {
            gpu,
            log: Rc::default(),
            configs: Rc::default(),
            next: 0,
        }
    }
}

impl SwapchainBackend for FakeSurface {
    type Chain = u32;

    fn surface_capabilities(&self) -> anyhow::Result<SurfaceCapabilities> {
        Ok(self.gpu.caps)
    }

    fn surface_formats(&self) -> anyhow::Result<Vec<SurfaceFormat>> {
        Ok(vec![SurfaceFormat::PREFERRED])
    }

    fn present_modes(&self) -> anyhow::Result<Vec<PresentMode>> {
        Ok(self.gpu.modes.clone())
    }

    fn create_chain(&mut self, config: &SwapchainConfig) -> anyhow::Result<u32> {
        self.next += 1;
        self.log.borrow_mut().push(Event::Create(self.next));
        self.configs.borrow_mut().push(*config);
        Ok(self.next)
    }

    fn destroy_chain(&mut self, chain: u32) {
        self.log.borrow_mut().push(Event::Destroy(chain));
    }
}

fn requirements() -> DeviceRequirements {
    DeviceRequirements::for_platform(Platform::Linux)
}

#[test]
fn shared_family_gets_exclusive_chain_and_one_queue() {
    let gpu = FakeGpu::new(vec![(QueueCapabilities::GRAPHICS, true)]);
    let api = FakeApi {
        gpus: vec![gpu.clone()],
    };
    let selected = select_accelerator(&api, &[0], &requirements()).unwrap();

    let factory = RecordingFactory::default();
    build_logical_device(&factory, &selected, &requirements()).unwrap();
    assert_eq!(factory.seen.borrow()[0].queues.len(), 1);

    let mut swapchain = SwapchainManager::new(FakeSurface::new(gpu));
    swapchain.create(selected.families, &(1280, 720)).unwrap();
    let info = swapchain.info().unwrap();
    assert_eq!(info.sharing, SharingMode::Exclusive);
    assert_eq!(info.extent, Extent2D::new(1280, 720));
    assert_eq!(info.present_mode, PresentMode::Mailbox);
    assert_eq!(info.image_count, 3);
}

#[test]
fn split_families_get_concurrent_chain_and_two_queues() {
    let gpu = FakeGpu::new(vec![
        (QueueCapabilities::GRAPHICS, false),
        (QueueCapabilities::TRANSFER, false),
        (QueueCapabilities::COMPUTE, true),
    ]);
    let api = FakeApi {
        gpus: vec![gpu.clone()],
    };
    let selected = select_accelerator(&api, &[0], &requirements()).unwrap();
    assert_eq!((selected.families.graphics, selected.families.present), (0, 2));

    let factory = RecordingFactory::default();
    build_logical_device(&factory, &selected, &requirements()).unwrap();
    let families: Vec<u32> = factory.seen.borrow()[0]
        .queues
        .iter()
        .map(|q| q.family)
        .collect();
    assert_eq!(families, vec![0, 2]);

    let mut swapchain = SwapchainManager::new(FakeSurface::new(gpu));
    swapchain.create(selected.families, &(1280, 720)).unwrap();
    assert_eq!(swapchain.info().unwrap().sharing, SharingMode::Concurrent([0, 2]));
}

#[test]
fn free_sized_surface_clamps_oversized_framebuffer() {
    let mut gpu = FakeGpu::new(vec![(QueueCapabilities::GRAPHICS, true)]);
    gpu.caps.current_extent = Extent2D::new(UNDEFINED_EXTENT, UNDEFINED_EXTENT);
    gpu.caps.max_image_extent = Extent2D::new(2000, 2000);
    gpu.modes = vec![PresentMode::Fifo];

    let surface = FakeSurface::new(gpu);
    let configs = Rc::clone(&surface.configs);
    let mut swapchain = SwapchainManager::new(surface);
    swapchain
        .create(prism_render::QueueFamilies::new(0, 0), &(4000, 4000))
        .unwrap();

    let config = configs.borrow()[0];
    assert_eq!(config.extent, Extent2D::new(2000, 2000));
    assert_eq!(config.present_mode, PresentMode::Fifo);
}

#[test]
fn zero_width_framebuffer_fails_without_a_chain() {
    let mut gpu = FakeGpu::new(vec![(QueueCapabilities::GRAPHICS, true)]);
    gpu.caps.current_extent = Extent2D::new(UNDEFINED_EXTENT, UNDEFINED_EXTENT);

    let surface = FakeSurface::new(gpu);
    let log = Rc::clone(&surface.log);
    let mut swapchain = SwapchainManager::new(surface);
    assert_eq!(
        swapchain.create(prism_render::QueueFamilies::new(0, 0), &(0, 600)),
        Err(PresentError::InvalidWindowSize {
            width: 0,
            height: 600
        })
    );
    assert_eq!(swapchain.state(), LifecycleState::Uninitialized);
    assert!(log.borrow().is_empty());
}

#[test]
fn resize_cycle_tears_down_before_building() {
    let gpu = FakeGpu::new(vec![(QueueCapabilities::GRAPHICS, true)]);
    let surface = FakeSurface::new(gpu);
    let log = Rc::clone(&surface.log);
    let families = prism_render::QueueFamilies::new(0, 0);

    {
        let mut swapchain = SwapchainManager::new(surface);
        swapchain.create(families, &(1280, 720)).unwrap();
        swapchain.recreate(families, &(1280, 720)).unwrap();
        swapchain.recreate(families, &(1280, 720)).unwrap();
        swapchain.cleanup();
        assert_eq!(swapchain.state(), LifecycleState::Destroyed);
    }

    assert_eq!(
        *log.borrow(),
        vec![
            Event::Create(1),
            Event::Destroy(1),
            Event::Create(2),
            Event::Destroy(2),
            Event::Create(3),
            Event::Destroy(3),
        ]
    );
}

#[test]
fn headless_first_gpu_is_skipped() {
    let api = FakeApi {
        gpus: vec![
            FakeGpu::new(vec![(QueueCapabilities::COMPUTE, true)]),
            FakeGpu::new(vec![(QueueCapabilities::GRAPHICS, true)]),
        ],
    };
    let selected = select_accelerator(&api, &[0, 1], &requirements()).unwrap();
    assert_eq!(selected.handle, 1);
    assert_eq!(selected.name, "fake-1");
}
