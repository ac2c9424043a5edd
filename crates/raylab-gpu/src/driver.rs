//! Host/driver boundary.
//!
//! Every call the acquisition pipeline makes against the graphics runtime goes
//! through [`Driver`]. [`crate::vulkan::VulkanDriver`] implements it with `ash`.

use std::ffi::CStr;

use ash::prelude::VkResult;

use crate::features::FeatureChain;
use crate::inventory::InventoryEntry;
use crate::selector::PhysicalDeviceDescriptor;

/// Everything needed to create an instance after instance negotiation.
#[derive(Debug, Clone)]
pub struct InstanceRequest<'a> {
    pub app_name: &'a str,
    pub api_version: u32,
    pub layers: &'a [&'static CStr],
    pub extensions: &'a [&'static CStr],
    /// Attach the validation message bridge. Only set when
    /// `VK_EXT_debug_utils` was accepted.
    pub debug_messenger: bool,
}

/// Everything needed to create the logical device.
#[derive(Debug, Clone)]
pub struct DeviceRequest<'a> {
    pub queue_family_index: u32,
    pub queue_priority: f32,
    pub extensions: &'a [&'static CStr],
    pub features: &'a FeatureChain,
}

/// Calls the pipeline makes against the graphics runtime.
///
/// Enumerations follow the count-then-fetch protocol of the underlying API.
/// Destruction takes handles by value, so a handle cannot be used after it is
/// released.
pub trait Driver {
    type Instance;
    type PhysicalDevice: Copy;
    type Device;

    fn instance_layers(&self) -> VkResult<Vec<InventoryEntry>>;

    fn instance_extensions(&self) -> VkResult<Vec<InventoryEntry>>;

    fn create_instance(&self, request: &InstanceRequest<'_>) -> VkResult<Self::Instance>;

    fn physical_devices(
        &self,
        instance: &Self::Instance,
    ) -> VkResult<Vec<PhysicalDeviceDescriptor<Self::PhysicalDevice>>>;

    fn device_extensions(
        &self,
        instance: &Self::Instance,
        physical_device: Self::PhysicalDevice,
    ) -> VkResult<Vec<InventoryEntry>>;

    fn create_device(
        &self,
        instance: &Self::Instance,
        physical_device: Self::PhysicalDevice,
        request: &DeviceRequest<'_>,
    ) -> VkResult<Self::Device>;

    fn destroy_device(&self, device: Self::Device);

    fn destroy_instance(&self, instance: Self::Instance);
}
