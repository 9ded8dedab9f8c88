// SPDX-License-Identifier: CEPL-1.0
//! Vulkan entry, instance, validation messenger and window surface.

use std::collections::BTreeSet;
use std::ffi::{c_void, CStr, CString};

use anyhow::{anyhow, Context, Result};
use ash::ext::debug_utils;
use ash::khr::surface;
use ash::{vk, Entry};
use prism_render::requirements::MIN_API_VERSION;
use prism_render::{Platform, PlatformRequirements, PresentError, ValidationMode};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use tracing::{debug, error, info, warn};

unsafe extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    types: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user: *mut c_void,
) -> vk::Bool32 {
    if data.is_null() || (*data).p_message.is_null() {
        return vk::FALSE;
    }
    let msg = CStr::from_ptr((*data).p_message).to_string_lossy();
    let tag = if types.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "[Validation]"
    } else if types.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "[Performance]"
    } else {
        "[General]"
    };

    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        error!("{tag} {msg}");
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        warn!("{tag} {msg}");
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        info!("{tag} {msg}");
    } else {
        debug!("{tag} {msg}");
    }
    vk::FALSE
}

struct DebugMessenger {
    loader: debug_utils::Instance,
    messenger: vk::DebugUtilsMessengerEXT,
}

pub fn version_string(v: u32) -> String {
    format!(
        "{}.{}.{}",
        vk::api_version_major(v),
        vk::api_version_minor(v),
        vk::api_version_patch(v)
    )
}

fn cstr_names<'a>(raw: impl Iterator<Item = &'a [std::ffi::c_char]>) -> BTreeSet<String> {
    raw.map(|name| unsafe { CStr::from_ptr(name.as_ptr()) }.to_string_lossy().into_owned())
        .collect()
}

/// Names in `wanted` that `available` lacks.
pub fn missing_names<'a>(wanted: &[&'a CStr], available: &BTreeSet<String>) -> Vec<&'a CStr> {
    wanted
        .iter()
        .copied()
        .filter(|name| !available.contains(&*name.to_string_lossy()))
        .collect()
}

fn join(names: &[&CStr]) -> String {
    names
        .iter()
        .map(|n| n.to_string_lossy())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Layers to enable for `mode`, given what this platform lists and what is
/// installed. `Auto` degrades to no validation; `On` fails instead.
pub fn resolve_validation_layers(
    mode: ValidationMode,
    platform_layers: &[&'static str],
    available_layers: &BTreeSet<String>,
    has_debug_utils: bool,
) -> std::result::Result<Vec<&'static str>, PresentError> {
    if !mode.requested() {
        return Ok(Vec::new());
    }

    let missing: Vec<&str> = platform_layers
        .iter()
        .copied()
        .filter(|l| !available_layers.contains(*l))
        .collect();
    let problem = if platform_layers.is_empty() {
        Some("no validation layers are known for this platform".to_string())
    } else if !missing.is_empty() {
        Some(format!("validation layers not installed: {}", missing.join(", ")))
    } else if !has_debug_utils {
        Some("VK_EXT_debug_utils is not available".to_string())
    } else {
        None
    };

    match problem {
        None => Ok(platform_layers.to_vec()),
        Some(why) if mode == ValidationMode::On => {
            error!("vk: validation requested but unavailable: {why}");
            Err(PresentError::Instance(why))
        }
        Some(why) => {
            warn!("vk: {why}; continuing without validation");
            Ok(Vec::new())
        }
    }
}

/// Owns the loader entry, the instance and (optionally) the debug messenger.
pub struct VkInstance {
    pub(crate) entry: Entry,
    pub(crate) instance: ash::Instance,
    debug: Option<DebugMessenger>,
    loader_version: u32,
}

impl VkInstance {
    /// # Safety
    /// `display` must stay valid for the lifetime of the instance.
    pub unsafe fn new(
        display: RawDisplayHandle,
        app_name: &str,
        validation: ValidationMode,
    ) -> Result<Self> {
        let entry = Entry::linked();

        let loader_version = entry
            .try_enumerate_instance_version()
            .context("vkEnumerateInstanceVersion")?
            .unwrap_or(vk::API_VERSION_1_0);
        info!("vk: loader instance API {}", version_string(loader_version));
        if loader_version < MIN_API_VERSION {
            return Err(PresentError::Instance(format!(
                "Vulkan {} required, loader offers {}",
                version_string(MIN_API_VERSION),
                version_string(loader_version)
            ))
            .into());
        }

        let available_exts = cstr_names(
            entry
                .enumerate_instance_extension_properties(None)
                .context("enumerate_instance_extension_properties")?
                .iter()
                .map(|e| &e.extension_name[..]),
        );
        let available_layers = cstr_names(
            entry
                .enumerate_instance_layer_properties()
                .context("enumerate_instance_layer_properties")?
                .iter()
                .map(|l| &l.layer_name[..]),
        );

        let mut extensions: Vec<&CStr> = ash_window::enumerate_required_extensions(display)
            .context("enumerate_required_extensions")?
            .iter()
            .map(|&p| CStr::from_ptr(p))
            .collect();

        let missing = missing_names(&extensions, &available_exts);
        if !missing.is_empty() {
            error!("vk: missing instance extensions: {}", join(&missing));
            return Err(PresentError::Instance(format!(
                "missing instance extensions: {}",
                join(&missing)
            ))
            .into());
        }

        let mut flags = vk::InstanceCreateFlags::empty();
        if Platform::current() == Platform::MacOs
            && available_exts.contains(&*ash::khr::portability_enumeration::NAME.to_string_lossy())
        {
            extensions.push(ash::khr::portability_enumeration::NAME);
            flags |= vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR;
        }

        let layer_names = resolve_validation_layers(
            validation,
            PlatformRequirements::for_target(Platform::current()).validation_layers,
            &available_layers,
            available_exts.contains(&*debug_utils::NAME.to_string_lossy()),
        )?
        .into_iter()
        .map(CString::new)
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("validation layer name contains NUL")?;
        let validate = !layer_names.is_empty();
        if validate {
            extensions.push(debug_utils::NAME);
        }
        let layers: Vec<*const std::ffi::c_char> =
            layer_names.iter().map(|l| l.as_ptr()).collect();
        let ext_ptrs: Vec<*const std::ffi::c_char> =
            extensions.iter().map(|e| e.as_ptr()).collect();

        let app = CString::new(app_name).context("application name contains NUL")?;
        let app_info = vk::ApplicationInfo {
            s_type: vk::StructureType::APPLICATION_INFO,
            p_application_name: app.as_ptr(),
            application_version: 0,
            p_engine_name: c"prism".as_ptr(),
            engine_version: 0,
            api_version: MIN_API_VERSION,
            ..Default::default()
        };

        let create_info = vk::InstanceCreateInfo {
            s_type: vk::StructureType::INSTANCE_CREATE_INFO,
            flags,
            p_application_info: &app_info,
            enabled_extension_count: ext_ptrs.len() as u32,
            pp_enabled_extension_names: ext_ptrs.as_ptr(),
            enabled_layer_count: layers.len() as u32,
            pp_enabled_layer_names: layers.as_ptr(),
            ..Default::default()
        };

        let instance = entry
            .create_instance(&create_info, None)
            .map_err(|e| PresentError::Instance(format!("vkCreateInstance: {e}")))?;
        info!(
            "vk: instance ready (extensions: {}; layers: {:?})",
            join(&extensions),
            layer_names
        );

        let debug = if validate {
            match create_debug_messenger(&entry, &instance) {
                Ok(d) => Some(d),
                Err(e) => {
                    warn!("vk: debug messenger unavailable: {e:#}");
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            entry,
            instance,
            debug,
            loader_version,
        })
    }

    pub fn handle(&self) -> &ash::Instance {
        &self.instance
    }

    /// Instance API offered by the loader (not the one requested).
    pub fn loader_version(&self) -> u32 {
        self.loader_version
    }

    pub fn validation_enabled(&self) -> bool {
        self.debug.is_some()
    }
}

unsafe fn create_debug_messenger(entry: &Entry, instance: &ash::Instance) -> Result<DebugMessenger> {
    let loader = debug_utils::Instance::new(entry, instance);
    let ci = vk::DebugUtilsMessengerCreateInfoEXT {
        s_type: vk::StructureType::DEBUG_UTILS_MESSENGER_CREATE_INFO_EXT,
        message_severity: vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
            | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
            | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
            | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        message_type: vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        pfn_user_callback: Some(debug_callback),
        ..Default::default()
    };
    let messenger = loader
        .create_debug_utils_messenger(&ci, None)
        .context("create_debug_utils_messenger")?;
    Ok(DebugMessenger { loader, messenger })
}

// Messenger first, instance last. Everything created from the instance must
// already be gone.
impl Drop for VkInstance {
    fn drop(&mut self) {
        unsafe {
            if let Some(d) = self.debug.take() {
                d.loader.destroy_debug_utils_messenger(d.messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

/// Non-owning surface handle plus the loader for its queries.
#[derive(Clone)]
pub struct SurfaceRef {
    pub(crate) loader: surface::Instance,
    pub(crate) handle: vk::SurfaceKHR,
}

/// The window surface. Destroyed on drop.
pub struct VkSurface {
    inner: SurfaceRef,
}

impl VkSurface {
    /// # Safety
    /// The window behind `window` must outlive the surface.
    pub unsafe fn new(
        instance: &VkInstance,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> Result<Self> {
        let loader = surface::Instance::new(&instance.entry, &instance.instance);
        let handle =
            ash_window::create_surface(&instance.entry, &instance.instance, display, window, None)
                .map_err(|e| anyhow!(PresentError::Instance(format!("surface creation: {e}"))))?;
        Ok(Self {
            inner: SurfaceRef { loader, handle },
        })
    }

    pub fn handle(&self) -> vk::SurfaceKHR {
        self.inner.handle
    }

    pub(crate) fn shared(&self) -> &SurfaceRef {
        &self.inner
    }
}

impl Drop for VkSurface {
    fn drop(&mut self) {
        unsafe { self.inner.loader.destroy_surface(self.inner.handle, None) };
    }
}
