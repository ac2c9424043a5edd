//! In-memory [`Driver`] for exercising the pipeline without a GPU.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::rc::Rc;

use ash::prelude::VkResult;
use ash::vk;

use crate::driver::{DeviceRequest, Driver, InstanceRequest};
use crate::features::FeatureKind;
use crate::inventory::InventoryEntry;
use crate::requirements::{RAY_TRACING_DEVICE_EXTENSIONS, VALIDATION_LAYER};
use crate::selector::{PhysicalDeviceDescriptor, QueueFamily};

/// What the fake driver was asked to do, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum FakeEvent {
    InstanceCreated {
        layers: Vec<CString>,
        extensions: Vec<CString>,
        debug_messenger: bool,
    },
    DeviceCreated {
        physical_device: usize,
        queue_family_index: u32,
        queue_priority: f32,
        extensions: Vec<CString>,
        features: Vec<FeatureKind>,
    },
    DeviceDestroyed,
    InstanceDestroyed,
}

/// A physical device offered by the fake driver.
#[derive(Debug, Clone)]
pub struct FakeDevice {
    pub descriptor: PhysicalDeviceDescriptor<usize>,
    pub extensions: Vec<InventoryEntry>,
}

impl FakeDevice {
    /// Discrete GPU with a graphics family and every ray tracing extension.
    pub fn ray_tracing(name: &str) -> Self {
        Self {
            descriptor: PhysicalDeviceDescriptor {
                handle: 0,
                name: name.to_string(),
                vendor_id: 0x10DE,
                device_type: vk::PhysicalDeviceType::DISCRETE_GPU,
                driver_version: (550 << 22) | (54 << 12) | 14,
                api_version: vk::API_VERSION_1_3,
                queue_families: vec![
                    Self::family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE),
                    Self::family(vk::QueueFlags::TRANSFER),
                ],
            },
            extensions: RAY_TRACING_DEVICE_EXTENSIONS
                .iter()
                .map(|&name| InventoryEntry::extension(name, 1))
                .collect(),
        }
    }

    pub fn family(flags: vk::QueueFlags) -> QueueFamily {
        QueueFamily {
            flags,
            queue_count: 1,
        }
    }

    pub fn remove_extension(&mut self, name: &CStr) {
        self.extensions.retain(|e| e.name.as_c_str() != name);
    }
}

pub struct FakeInstance;

pub struct FakeLogicalDevice;

/// Driver answering from preset tables and recording every creation and
/// destruction.
pub struct FakeDriver {
    pub layers: Vec<InventoryEntry>,
    pub instance_extensions: Vec<InventoryEntry>,
    pub devices: Vec<FakeDevice>,
    pub fail_instance: bool,
    pub fail_enumeration: bool,
    pub fail_device_extensions: bool,
    pub fail_device: bool,
    events: Rc<RefCell<Vec<FakeEvent>>>,
}

impl FakeDriver {
    /// Host offering the validation layer and every instance extension the
    /// profiles ask for.
    pub fn complete(devices: Vec<FakeDevice>) -> Self {
        let devices = devices
            .into_iter()
            .enumerate()
            .map(|(index, mut device)| {
                device.descriptor.handle = index;
                device
            })
            .collect();

        Self {
            layers: vec![InventoryEntry::layer(VALIDATION_LAYER)],
            instance_extensions: vec![
                InventoryEntry::extension(ash::khr::get_physical_device_properties2::NAME, 2),
                InventoryEntry::extension(ash::ext::debug_utils::NAME, 2),
            ],
            devices,
            fail_instance: false,
            fail_enumeration: false,
            fail_device_extensions: false,
            fail_device: false,
            events: Rc::default(),
        }
    }

    /// Shared handle on the event log; stays readable after the driver moves.
    pub fn events(&self) -> Rc<RefCell<Vec<FakeEvent>>> {
        Rc::clone(&self.events)
    }

    fn record(&self, event: FakeEvent) {
        self.events.borrow_mut().push(event);
    }
}

fn owned(names: &[&CStr]) -> Vec<CString> {
    names.iter().map(|&name| name.to_owned()).collect()
}

impl Driver for FakeDriver {
    type Instance = FakeInstance;
    type PhysicalDevice = usize;
    type Device = FakeLogicalDevice;

    fn instance_layers(&self) -> VkResult<Vec<InventoryEntry>> {
        Ok(self.layers.clone())
    }

    fn instance_extensions(&self) -> VkResult<Vec<InventoryEntry>> {
        Ok(self.instance_extensions.clone())
    }

    fn create_instance(&self, request: &InstanceRequest<'_>) -> VkResult<FakeInstance> {
        if self.fail_instance {
            return Err(vk::Result::ERROR_INCOMPATIBLE_DRIVER);
        }
        self.record(FakeEvent::InstanceCreated {
            layers: owned(request.layers),
            extensions: owned(request.extensions),
            debug_messenger: request.debug_messenger,
        });
        Ok(FakeInstance)
    }

    fn physical_devices(
        &self,
        _instance: &FakeInstance,
    ) -> VkResult<Vec<PhysicalDeviceDescriptor<usize>>> {
        if self.fail_enumeration {
            return Err(vk::Result::ERROR_INITIALIZATION_FAILED);
        }
        Ok(self.devices.iter().map(|d| d.descriptor.clone()).collect())
    }

    fn device_extensions(
        &self,
        _instance: &FakeInstance,
        physical_device: usize,
    ) -> VkResult<Vec<InventoryEntry>> {
        if self.fail_device_extensions {
            return Err(vk::Result::ERROR_OUT_OF_HOST_MEMORY);
        }
        self.devices
            .get(physical_device)
            .map(|d| d.extensions.clone())
            .ok_or(vk::Result::ERROR_DEVICE_LOST)
    }

    fn create_device(
        &self,
        _instance: &FakeInstance,
        physical_device: usize,
        request: &DeviceRequest<'_>,
    ) -> VkResult<FakeLogicalDevice> {
        if self.fail_device {
            return Err(vk::Result::ERROR_FEATURE_NOT_PRESENT);
        }
        self.record(FakeEvent::DeviceCreated {
            physical_device,
            queue_family_index: request.queue_family_index,
            queue_priority: request.queue_priority,
            extensions: owned(request.extensions),
            features: request.features.kinds().collect(),
        });
        Ok(FakeLogicalDevice)
    }

    fn destroy_device(&self, _device: FakeLogicalDevice) {
        self.record(FakeEvent::DeviceDestroyed);
    }

    fn destroy_instance(&self, _instance: FakeInstance) {
        self.record(FakeEvent::InstanceDestroyed);
    }
}
