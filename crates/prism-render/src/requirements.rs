// SPDX-License-Identifier: CEPL-1.0
use std::collections::BTreeSet;

use crate::caps::DeviceFeatures;

pub const SWAPCHAIN_EXTENSION: &str = "VK_KHR_swapchain";
pub const PORTABILITY_SUBSET_EXTENSION: &str = "VK_KHR_portability_subset";
pub const VALIDATION_LAYER: &str = "VK_LAYER_KHRONOS_validation";

/// Packs a version the way Vulkan reports it (variant 0, patch 0).
pub const fn api_version(major: u32, minor: u32) -> u32 {
    (major << 22) | (minor << 12)
}

/// `(major, minor, patch)` of a packed Vulkan version.
pub const fn api_version_parts(v: u32) -> (u32, u32, u32) {
    ((v >> 22) & 0x7f, (v >> 12) & 0x3ff, v & 0xfff)
}

/// Oldest API both the loader and every candidate accelerator must offer.
/// The feature snapshot and device creation chain 1.2 structures.
pub const MIN_API_VERSION: u32 = api_version(1, 2);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
    MacOs,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Other
        }
    }
}

/// Per-target names that differ between platforms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlatformRequirements {
    pub device_extensions: &'static [&'static str],
    pub validation_layers: &'static [&'static str],
}

const PLATFORM_TABLE: &[(Platform, PlatformRequirements)] = &[
    (
        Platform::Windows,
        PlatformRequirements {
            device_extensions: &[SWAPCHAIN_EXTENSION],
            validation_layers: &[VALIDATION_LAYER],
        },
    ),
    (
        Platform::Linux,
        PlatformRequirements {
            device_extensions: &[SWAPCHAIN_EXTENSION],
            validation_layers: &[VALIDATION_LAYER],
        },
    ),
    (
        Platform::MacOs,
        PlatformRequirements {
            device_extensions: &[SWAPCHAIN_EXTENSION, PORTABILITY_SUBSET_EXTENSION],
            validation_layers: &[VALIDATION_LAYER],
        },
    ),
];

impl PlatformRequirements {
    pub fn for_target(platform: Platform) -> Self {
        PLATFORM_TABLE
            .iter()
            .find(|(p, _)| *p == platform)
            .map(|(_, req)| *req)
            .unwrap_or(PlatformRequirements {
                device_extensions: &[SWAPCHAIN_EXTENSION],
                validation_layers: &[],
            })
    }
}

/// What an accelerator must (and should) offer. Fixed once the session starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceRequirements {
    extensions: BTreeSet<String>,
    required_features: DeviceFeatures,
    preferred_features: DeviceFeatures,
}

impl DeviceRequirements {
    pub const DEFAULT_REQUIRED: DeviceFeatures =
        DeviceFeatures::SAMPLER_ANISOTROPY.union(DeviceFeatures::FILL_MODE_NON_SOLID);
    pub const DEFAULT_PREFERRED: DeviceFeatures =
        DeviceFeatures::GEOMETRY_SHADER.union(DeviceFeatures::BUFFER_DEVICE_ADDRESS);

    pub fn new<I, S>(extensions: I, required: DeviceFeatures, preferred: DeviceFeatures) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
            required_features: required,
            // a flag is either a hard or a soft requirement, never both
            preferred_features: preferred.difference(required),
        }
    }

    pub fn for_platform(platform: Platform) -> Self {
        let table = PlatformRequirements::for_target(platform);
        Self::new(
            table.device_extensions.iter().copied(),
            Self::DEFAULT_REQUIRED,
            Self::DEFAULT_PREFERRED,
        )
    }

    pub fn with_extra_extensions<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions.extend(extra.into_iter().map(Into::into));
        self
    }

    /// Turns every preferred feature into a hard requirement.
    pub fn promote_preferred(self) -> Self {
        Self {
            required_features: self.required_features | self.preferred_features,
            preferred_features: DeviceFeatures::empty(),
            ..self
        }
    }

    pub fn extensions(&self) -> &BTreeSet<String> {
        &self.extensions
    }

    pub fn required_features(&self) -> DeviceFeatures {
        self.required_features
    }

    pub fn preferred_features(&self) -> DeviceFeatures {
        self.preferred_features
    }

    pub fn missing_extensions(&self, supported: &BTreeSet<String>) -> Vec<String> {
        self.extensions.difference(supported).cloned().collect()
    }
}

impl Default for DeviceRequirements {
    fn default() -> Self {
        Self::for_platform(Platform::current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_table_always_wants_swapchain() {
        for p in [Platform::Windows, Platform::Linux, Platform::MacOs, Platform::Other] {
            let table = PlatformRequirements::for_target(p);
            assert!(table.device_extensions.contains(&SWAPCHAIN_EXTENSION), "{p:?}");
        }
        assert!(PlatformRequirements::for_target(Platform::MacOs)
            .device_extensions
            .contains(&PORTABILITY_SUBSET_EXTENSION));
        assert!(PlatformRequirements::for_target(Platform::Other)
            .validation_layers
            .is_empty());
    }

    #[test]
    fn packed_versions_compare_by_major_then_minor() {
        assert_eq!(api_version_parts(MIN_API_VERSION), (1, 2, 0));
        assert_eq!(api_version_parts(api_version(1, 3) | 280), (1, 3, 280));
        assert!(api_version(1, 1) < MIN_API_VERSION);
        assert!(api_version(1, 3) > MIN_API_VERSION);
    }

    #[test]
    fn preferred_never_overlaps_required() {
        let req = DeviceRequirements::new(
            [SWAPCHAIN_EXTENSION],
            DeviceFeatures::GEOMETRY_SHADER,
            DeviceFeatures::GEOMETRY_SHADER | DeviceFeatures::BUFFER_DEVICE_ADDRESS,
        );
        assert_eq!(req.preferred_features(), DeviceFeatures::BUFFER_DEVICE_ADDRESS);
    }

    #[test]
    fn promote_moves_everything_to_required() {
        let req = DeviceRequirements::for_platform(Platform::Linux).promote_preferred();
        assert_eq!(
            req.required_features(),
            DeviceRequirements::DEFAULT_REQUIRED | DeviceRequirements::DEFAULT_PREFERRED
        );
        assert!(req.preferred_features().is_empty());
    }

    #[test]
    fn missing_extensions_lists_the_gap() {
        let req = DeviceRequirements::for_platform(Platform::Linux)
            .with_extra_extensions(["VK_KHR_ray_query"]);
        let supported: BTreeSet<String> = [SWAPCHAIN_EXTENSION.to_string()].into();
        assert_eq!(req.missing_extensions(&supported), vec!["VK_KHR_ray_query".to_string()]);
    }
}
