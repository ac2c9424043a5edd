//! `ash`-backed [`Driver`].

use std::ffi::{c_char, CString};

use ash::prelude::VkResult;
use ash::vk;

use crate::debug::DebugMessenger;
use crate::driver::{DeviceRequest, Driver, InstanceRequest};
use crate::error::{GpuError, Result};
use crate::inventory::InventoryEntry;
use crate::selector::{PhysicalDeviceDescriptor, QueueFamily};

/// Driver talking to the system Vulkan loader.
pub struct VulkanDriver {
    entry: ash::Entry,
}

impl VulkanDriver {
    /// Load the Vulkan loader library.
    pub fn load() -> Result<Self> {
        let entry = unsafe { ash::Entry::load() }.map_err(|e| GpuError::Loader(e.to_string()))?;
        Ok(Self { entry })
    }

    pub fn entry(&self) -> &ash::Entry {
        &self.entry
    }
}

/// Instance handle plus the validation messenger attached to it, if any.
pub struct VulkanInstance {
    handle: ash::Instance,
    debug: Option<DebugMessenger>,
}

impl VulkanInstance {
    pub fn handle(&self) -> &ash::Instance {
        &self.handle
    }

    pub fn has_debug_messenger(&self) -> bool {
        self.debug.is_some()
    }
}

impl Driver for VulkanDriver {
    type Instance = VulkanInstance;
    type PhysicalDevice = vk::PhysicalDevice;
    type Device = ash::Device;

    fn instance_layers(&self) -> VkResult<Vec<InventoryEntry>> {
        let layers = unsafe { self.entry.enumerate_instance_layer_properties() }?;
        Ok(layers
            .iter()
            .filter_map(InventoryEntry::from_layer_properties)
            .collect())
    }

    fn instance_extensions(&self) -> VkResult<Vec<InventoryEntry>> {
        let extensions = unsafe { self.entry.enumerate_instance_extension_properties(None) }?;
        Ok(extensions
            .iter()
            .filter_map(InventoryEntry::from_extension_properties)
            .collect())
    }

    fn create_instance(&self, request: &InstanceRequest<'_>) -> VkResult<VulkanInstance> {
        let app_name =
            CString::new(request.app_name).map_err(|_| vk::Result::ERROR_INITIALIZATION_FAILED)?;

        let app_info = vk::ApplicationInfo::default()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(c"No Engine")
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(request.api_version);

        let extension_names: Vec<*const c_char> =
            request.extensions.iter().map(|ext| ext.as_ptr()).collect();
        let layer_names: Vec<*const c_char> =
            request.layers.iter().map(|layer| layer.as_ptr()).collect();

        let create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_layer_names(&layer_names)
            .enabled_extension_names(&extension_names);

        let handle = unsafe { self.entry.create_instance(&create_info, None) }?;

        let debug = if request.debug_messenger {
            match unsafe { DebugMessenger::new(&self.entry, &handle) } {
                Ok(messenger) => Some(messenger),
                Err(e) => {
                    tracing::warn!("Failed to attach validation messenger: {e}");
                    None
                }
            }
        } else {
            tracing::debug!("Validation messenger not attached");
            None
        };

        Ok(VulkanInstance { handle, debug })
    }

    fn physical_devices(
        &self,
        instance: &VulkanInstance,
    ) -> VkResult<Vec<PhysicalDeviceDescriptor<vk::PhysicalDevice>>> {
        let devices = unsafe { instance.handle.enumerate_physical_devices() }?;
        Ok(devices
            .into_iter()
            .map(|device| unsafe { describe_physical_device(&instance.handle, device) })
            .collect())
    }

    fn device_extensions(
        &self,
        instance: &VulkanInstance,
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<Vec<InventoryEntry>> {
        let extensions = unsafe {
            instance
                .handle
                .enumerate_device_extension_properties(physical_device)
        }?;
        Ok(extensions
            .iter()
            .filter_map(InventoryEntry::from_extension_properties)
            .collect())
    }

    fn create_device(
        &self,
        instance: &VulkanInstance,
        physical_device: vk::PhysicalDevice,
        request: &DeviceRequest<'_>,
    ) -> VkResult<ash::Device> {
        let priorities = [request.queue_priority];
        let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
            .queue_family_index(request.queue_family_index)
            .queue_priorities(&priorities)];

        let extension_names: Vec<*const c_char> =
            request.extensions.iter().map(|ext| ext.as_ptr()).collect();

        let mut features = request.features.to_native();

        let create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extension_names)
            .push_next(features.root_mut());

        unsafe {
            instance
                .handle
                .create_device(physical_device, &create_info, None)
        }
    }

    fn destroy_device(&self, device: ash::Device) {
        // SAFETY: the device is taken by value, so this is its last use.
        unsafe {
            let _ = device.device_wait_idle();
            device.destroy_device(None);
        }
    }

    fn destroy_instance(&self, instance: VulkanInstance) {
        // SAFETY: the instance is taken by value and every device created from it
        // has already been destroyed.
        unsafe {
            if let Some(debug) = &instance.debug {
                debug.destroy();
            }
            instance.handle.destroy_instance(None);
        }
    }
}

/// Read the properties and queue-family table of a physical device.
///
/// # Safety
/// The instance and physical device must be valid.
unsafe fn describe_physical_device(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
) -> PhysicalDeviceDescriptor<vk::PhysicalDevice> {
    let properties = unsafe { instance.get_physical_device_properties(physical_device) };
    let queue_families =
        unsafe { instance.get_physical_device_queue_family_properties(physical_device) };

    let name = properties
        .device_name_as_c_str()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|_| String::from("<unnamed device>"));

    PhysicalDeviceDescriptor {
        handle: physical_device,
        name,
        vendor_id: properties.vendor_id,
        device_type: properties.device_type,
        driver_version: properties.driver_version,
        api_version: properties.api_version,
        queue_families: queue_families.iter().map(QueueFamily::from).collect(),
    }
}
