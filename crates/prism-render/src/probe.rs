// SPDX-License-Identifier: CEPL-1.0
use std::collections::BTreeSet;

use crate::caps::{DeviceFeatures, PresentMode, QueueFamilyProps, SurfaceCapabilities, SurfaceFormat};
use crate::error::{PresentError, Result};

/// Read-only queries against an accelerator, bound to one presentation surface.
///
/// Implementations must be side-effect free: selection calls every query once
/// per candidate, and the swapchain manager calls the surface queries again on
/// every (re)creation because extent and transform follow the window.
pub trait CapabilityProbe {
    type Accelerator: Copy;

    fn accelerator_name(&self, accelerator: Self::Accelerator) -> String;

    /// Packed API version the accelerator reports (Vulkan encoding).
    fn api_version(&self, accelerator: Self::Accelerator) -> anyhow::Result<u32>;

    fn queue_families(&self, accelerator: Self::Accelerator) -> anyhow::Result<Vec<QueueFamilyProps>>;

    fn supports_present(&self, accelerator: Self::Accelerator, family: u32) -> anyhow::Result<bool>;

    fn query_surface_formats(&self, accelerator: Self::Accelerator) -> anyhow::Result<Vec<SurfaceFormat>>;

    fn query_present_modes(&self, accelerator: Self::Accelerator) -> anyhow::Result<Vec<PresentMode>>;

    fn device_extensions(&self, accelerator: Self::Accelerator) -> anyhow::Result<BTreeSet<String>>;

    fn features(&self, accelerator: Self::Accelerator) -> anyhow::Result<DeviceFeatures>;

    fn surface_capabilities(&self, accelerator: Self::Accelerator) -> anyhow::Result<SurfaceCapabilities>;

    /// Surface formats, failing with `NoSurfaceSupport` when the list is empty.
    fn surface_formats(&self, accelerator: Self::Accelerator) -> Result<Vec<SurfaceFormat>> {
        non_empty(self.query_surface_formats(accelerator))
    }

    /// Present modes, failing with `NoSurfaceSupport` when the list is empty.
    fn present_modes(&self, accelerator: Self::Accelerator) -> Result<Vec<PresentMode>> {
        non_empty(self.query_present_modes(accelerator))
    }
}

pub(crate) fn non_empty<T>(queried: anyhow::Result<Vec<T>>) -> Result<Vec<T>> {
    let items = queried.map_err(PresentError::probe)?;
    if items.is_empty() {
        return Err(PresentError::NoSurfaceSupport);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::{ColorSpace, PixelFormat};
    use crate::testing::{MockGpu, MockProbe};

    #[test]
    fn empty_surface_lists_are_no_surface_support() {
        let probe = MockProbe::new(vec![MockGpu::capable("bare")
            .with_formats(vec![])
            .with_present_modes(vec![])]);

        assert_eq!(probe.surface_formats(0), Err(PresentError::NoSurfaceSupport));
        assert_eq!(probe.present_modes(0), Err(PresentError::NoSurfaceSupport));
    }

    #[test]
    fn populated_lists_pass_through_in_order() {
        let formats = vec![
            SurfaceFormat {
                format: PixelFormat::Rgba8Unorm,
                color_space: ColorSpace::SrgbNonLinear,
            },
            SurfaceFormat::PREFERRED,
        ];
        let probe = MockProbe::new(vec![MockGpu::capable("gpu").with_formats(formats.clone())]);
        assert_eq!(probe.surface_formats(0).unwrap(), formats);
    }

    #[test]
    fn query_failure_is_a_probe_error() {
        let probe = MockProbe::new(vec![MockGpu::capable("lost").with_surface_lost()]);
        assert!(matches!(probe.surface_formats(0), Err(PresentError::Probe(_))));
    }
}
