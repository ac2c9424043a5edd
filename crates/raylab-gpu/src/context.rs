//! GPU context acquisition.

use std::ffi::CStr;
use std::mem::ManuallyDrop;

use ash::vk;

use crate::driver::{DeviceRequest, Driver, InstanceRequest};
use crate::error::{CreationStage, GpuError, Result};
use crate::features::{build_feature_chain, FeatureChain};
use crate::inventory::Inventory;
use crate::negotiate::{negotiate, NegotiationReport};
use crate::requirements::{Profile, RequirementSet, Scope};
use crate::selector::{select_device, DeviceChooser, DeviceSummary, PhysicalDeviceDescriptor};

/// Priority of the single graphics queue.
const GRAPHICS_QUEUE_PRIORITY: f32 = 1.0;

/// Instance, chosen physical device, graphics queue family and logical device.
///
/// Dropping the context destroys the logical device, then the instance.
pub struct DeviceContext<D: Driver> {
    instance: ManuallyDrop<D::Instance>,
    device: ManuallyDrop<D::Device>,
    physical_device: PhysicalDeviceDescriptor<D::PhysicalDevice>,
    physical_device_index: usize,
    graphics_queue_family: u32,
    device_extensions: Vec<&'static CStr>,
    features: FeatureChain,
    instance_report: NegotiationReport,
    device_report: NegotiationReport,
    // Declared last: must outlive the handles above.
    driver: D,
}

impl<D: Driver> DeviceContext<D> {
    pub fn instance(&self) -> &D::Instance {
        &self.instance
    }

    pub fn device(&self) -> &D::Device {
        &self.device
    }

    pub fn physical_device(&self) -> &PhysicalDeviceDescriptor<D::PhysicalDevice> {
        &self.physical_device
    }

    /// Position of the chosen device in the enumeration order.
    pub fn physical_device_index(&self) -> usize {
        self.physical_device_index
    }

    pub fn graphics_queue_family(&self) -> u32 {
        self.graphics_queue_family
    }

    /// Device extensions the logical device was created with.
    pub fn device_extensions(&self) -> &[&'static CStr] {
        &self.device_extensions
    }

    /// Feature chain the logical device was created with.
    pub fn features(&self) -> &FeatureChain {
        &self.features
    }

    pub fn instance_report(&self) -> &NegotiationReport {
        &self.instance_report
    }

    pub fn device_report(&self) -> &NegotiationReport {
        &self.device_report
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// One-line description of the chosen device.
    pub fn summary(&self) -> DeviceSummary {
        self.physical_device.describe(self.physical_device_index)
    }
}

impl<D: Driver> Drop for DeviceContext<D> {
    fn drop(&mut self) {
        // SAFETY: both fields are initialised for the whole life of the context
        // and are never touched again after being taken here.
        let (device, instance) = unsafe {
            (
                ManuallyDrop::take(&mut self.device),
                ManuallyDrop::take(&mut self.instance),
            )
        };
        self.driver.destroy_device(device);
        self.driver.destroy_instance(instance);
    }
}

/// Builder for acquiring a [`DeviceContext`].
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    app_name: String,
    api_version: u32,
    enable_validation: bool,
    profile: Profile,
    requirements: Option<RequirementSet>,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self {
            app_name: "Hello Vulkan RT".to_string(),
            api_version: vk::API_VERSION_1_3,
            enable_validation: cfg!(debug_assertions),
            profile: Profile::default(),
            requirements: None,
        }
    }
}

impl ContextBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the application name.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Set the requested instance API version.
    pub fn api_version(mut self, version: u32) -> Self {
        self.api_version = version;
        self
    }

    /// Enable or disable validation layers.
    pub fn validation(mut self, enable: bool) -> Self {
        self.enable_validation = enable;
        self
    }

    /// Select the requirement profile.
    pub fn profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    /// Replace the profile's requirements with an explicit set.
    pub fn requirements(mut self, requirements: RequirementSet) -> Self {
        self.requirements = Some(requirements);
        self
    }

    fn requirement_set(&self) -> RequirementSet {
        self.requirements
            .clone()
            .unwrap_or_else(|| RequirementSet::for_profile(self.profile, self.enable_validation))
    }

    /// Run the acquisition pipeline.
    ///
    /// Any failure after the instance exists releases it before returning.
    pub fn build<D: Driver>(
        self,
        driver: D,
        chooser: &mut dyn DeviceChooser,
    ) -> Result<DeviceContext<D>> {
        let requirements = self.requirement_set();
        tracing::info!(
            "Acquiring GPU context for {} (profile: {})",
            self.app_name,
            self.profile
        );

        let inventory = Inventory::instance(&driver)?;
        let instance_report = negotiate(
            Scope::Instance,
            requirements.scoped(Scope::Instance),
            &inventory,
        );
        instance_report.log();
        let accepted = instance_report.accepted()?;

        let request = InstanceRequest {
            app_name: &self.app_name,
            api_version: self.api_version,
            layers: &accepted.layers,
            extensions: &accepted.extensions,
            debug_messenger: accepted.has_extension(ash::ext::debug_utils::NAME),
        };
        let instance = driver
            .create_instance(&request)
            .map_err(GpuError::creation(CreationStage::Instance))?;
        tracing::info!("Vulkan instance created");

        match acquire_device(&driver, &instance, &requirements, &instance_report, chooser) {
            Ok(acquired) => {
                tracing::info!(
                    "Logical device created on queue family {}",
                    acquired.graphics_queue_family
                );
                Ok(DeviceContext {
                    instance: ManuallyDrop::new(instance),
                    device: ManuallyDrop::new(acquired.device),
                    physical_device: acquired.physical_device,
                    physical_device_index: acquired.physical_device_index,
                    graphics_queue_family: acquired.graphics_queue_family,
                    device_extensions: acquired.device_extensions,
                    features: acquired.features,
                    instance_report,
                    device_report: acquired.device_report,
                    driver,
                })
            }
            Err(e) => {
                tracing::debug!("Releasing instance after failed acquisition");
                driver.destroy_instance(instance);
                Err(e)
            }
        }
    }
}

/// Everything created after the instance.
struct AcquiredDevice<D: Driver> {
    physical_device: PhysicalDeviceDescriptor<D::PhysicalDevice>,
    physical_device_index: usize,
    graphics_queue_family: u32,
    device: D::Device,
    device_extensions: Vec<&'static CStr>,
    features: FeatureChain,
    device_report: NegotiationReport,
}

fn acquire_device<D: Driver>(
    driver: &D,
    instance: &D::Instance,
    requirements: &RequirementSet,
    instance_report: &NegotiationReport,
    chooser: &mut dyn DeviceChooser,
) -> Result<AcquiredDevice<D>> {
    let mut descriptors = driver
        .physical_devices(instance)
        .map_err(GpuError::discovery("physical devices"))?;
    if descriptors.is_empty() {
        return Err(GpuError::NoCompatibleDevice);
    }

    let summaries: Vec<DeviceSummary> = descriptors
        .iter()
        .enumerate()
        .map(|(index, descriptor)| descriptor.describe(index))
        .collect();
    for summary in &summaries {
        tracing::info!("Physical device {summary}");
    }

    let physical_device_index = select_device(chooser, &summaries, instance_report)?;
    let physical_device = descriptors.swap_remove(physical_device_index);
    tracing::info!("Selected {}", summaries[physical_device_index]);

    let graphics_queue_family = physical_device.graphics_queue_family().ok_or_else(|| {
        GpuError::NoGraphicsQueue {
            device: physical_device.name.clone(),
        }
    })?;

    let inventory = Inventory::device(driver, instance, physical_device.handle)?;
    let device_report = negotiate(Scope::Device, requirements.scoped(Scope::Device), &inventory);
    device_report.log();
    let accepted = device_report.accepted()?;

    let features = build_feature_chain(&accepted.extensions);
    tracing::debug!("Feature chain: {:?}", features.blocks());

    let request = DeviceRequest {
        queue_family_index: graphics_queue_family,
        queue_priority: GRAPHICS_QUEUE_PRIORITY,
        extensions: &accepted.extensions,
        features: &features,
    };
    let device = driver
        .create_device(instance, physical_device.handle, &request)
        .map_err(GpuError::creation(CreationStage::Device))?;

    Ok(AcquiredDevice {
        physical_device,
        physical_device_index,
        graphics_queue_family,
        device,
        device_extensions: accepted.extensions,
        features,
        device_report,
    })
}
