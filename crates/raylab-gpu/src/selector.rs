//! Physical device description and selection.

use std::fmt;

use ash::vk;
use thiserror::Error;

use crate::error::{GpuError, Result};
use crate::negotiate::NegotiationReport;

/// GPU vendor identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuVendor {
    Nvidia,
    Amd,
    Intel,
    Apple,
    Other(u32),
}

impl GpuVendor {
    /// Identify vendor from PCI vendor ID.
    pub fn from_vendor_id(id: u32) -> Self {
        match id {
            0x10DE => Self::Nvidia,
            0x1002 => Self::Amd,
            0x8086 => Self::Intel,
            0x106B => Self::Apple,
            other => Self::Other(other),
        }
    }
}

/// Decoded `major.minor.patch` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    /// Decode a packed API version, ignoring the variant bits.
    pub fn from_api(packed: u32) -> Self {
        Self {
            major: vk::api_version_major(packed),
            minor: vk::api_version_minor(packed),
            patch: vk::api_version_patch(packed),
        }
    }

    /// Decode a driver version with the classic 10/10/12-bit layout.
    pub fn from_driver(packed: u32) -> Self {
        Self {
            major: packed >> 22,
            minor: (packed >> 12) & 0x3ff,
            patch: packed & 0xfff,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// One entry of a device's queue-family table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamily {
    pub flags: vk::QueueFlags,
    pub queue_count: u32,
}

impl From<&vk::QueueFamilyProperties> for QueueFamily {
    fn from(props: &vk::QueueFamilyProperties) -> Self {
        Self {
            flags: props.queue_flags,
            queue_count: props.queue_count,
        }
    }
}

/// A physical device and the read-only properties the pipeline uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalDeviceDescriptor<H> {
    pub handle: H,
    pub name: String,
    pub vendor_id: u32,
    pub device_type: vk::PhysicalDeviceType,
    /// Packed driver version as reported by the driver.
    pub driver_version: u32,
    /// Packed API version.
    pub api_version: u32,
    pub queue_families: Vec<QueueFamily>,
}

impl<H> PhysicalDeviceDescriptor<H> {
    pub fn vendor(&self) -> GpuVendor {
        GpuVendor::from_vendor_id(self.vendor_id)
    }

    /// Presentation data for the device chooser.
    pub fn describe(&self, index: usize) -> DeviceSummary {
        DeviceSummary {
            index,
            name: self.name.clone(),
            vendor: self.vendor(),
            device_type: self.device_type,
            driver_version: Version::from_driver(self.driver_version),
            api_version: Version::from_api(self.api_version),
        }
    }

    /// Index of the first queue family with graphics support.
    pub fn graphics_queue_family(&self) -> Option<u32> {
        resolve_queue_family(&self.queue_families)
    }
}

/// Human-readable view of a device, handed to the chooser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSummary {
    pub index: usize,
    pub name: String,
    pub vendor: GpuVendor,
    pub device_type: vk::PhysicalDeviceType,
    pub driver_version: Version,
    pub api_version: Version,
}

impl fmt::Display for DeviceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({:?}, {:?}) - driver {} - Vulkan {}",
            self.index,
            self.name,
            self.vendor,
            self.device_type,
            self.driver_version,
            self.api_version,
        )
    }
}

/// Lowest index in the table whose flags include graphics.
pub fn resolve_queue_family(families: &[QueueFamily]) -> Option<u32> {
    families
        .iter()
        .position(|family| family.flags.contains(vk::QueueFlags::GRAPHICS))
        .and_then(|index| u32::try_from(index).ok())
}

/// Why a chooser's input was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("'{0}' is not a device index")]
    NotANumber(String),

    #[error("index {index} is out of range [0, {count})")]
    OutOfRange { index: i64, count: usize },
}

/// Parse and bounds-check a device index against `[0, count)`.
pub fn validate_selection(
    input: &str,
    count: usize,
) -> std::result::Result<usize, SelectionError> {
    let trimmed = input.trim();
    let index: i64 = trimmed
        .parse()
        .map_err(|_| SelectionError::NotANumber(trimmed.to_string()))?;

    match usize::try_from(index) {
        Ok(index) if index < count => Ok(index),
        _ => Err(SelectionError::OutOfRange { index, count }),
    }
}

/// External source of the device choice.
///
/// The pipeline keeps asking until the input validates. Returning `None` means
/// the input source is exhausted and aborts acquisition.
pub trait DeviceChooser {
    fn choose(&mut self, devices: &[DeviceSummary], diagnostics: &NegotiationReport)
        -> Option<String>;

    /// Called after `input` was refused, before the next [`Self::choose`].
    fn rejected(&mut self, _input: &str, _error: &SelectionError) {}
}

impl<F> DeviceChooser for F
where
    F: FnMut(&[DeviceSummary]) -> Option<String>,
{
    fn choose(
        &mut self,
        devices: &[DeviceSummary],
        _diagnostics: &NegotiationReport,
    ) -> Option<String> {
        self(devices)
    }
}

/// Chooser that answers with a preset index once.
///
/// A preset that fails validation aborts, since there is nobody to re-prompt.
#[derive(Debug, Clone)]
pub struct FixedChooser {
    index: Option<usize>,
}

impl FixedChooser {
    pub fn new(index: usize) -> Self {
        Self { index: Some(index) }
    }
}

impl DeviceChooser for FixedChooser {
    fn choose(
        &mut self,
        _devices: &[DeviceSummary],
        _diagnostics: &NegotiationReport,
    ) -> Option<String> {
        self.index.take().map(|index| index.to_string())
    }
}

/// Ask `chooser` until it yields a valid index into `devices`.
pub fn select_device(
    chooser: &mut dyn DeviceChooser,
    devices: &[DeviceSummary],
    diagnostics: &NegotiationReport,
) -> Result<usize> {
    let mut last_rejection: Option<SelectionError> = None;
    loop {
        let Some(input) = chooser.choose(devices, diagnostics) else {
            let reason = last_rejection.map_or_else(
                || "no valid device index was provided".to_string(),
                |err| format!("last input rejected, {err}"),
            );
            return Err(GpuError::SelectionAborted(reason));
        };

        match validate_selection(&input, devices.len()) {
            Ok(index) => return Ok(index),
            Err(err) => {
                tracing::warn!("Rejected device selection: {err}");
                chooser.rejected(&input, &err);
                last_rejection = Some(err);
            }
        }
    }
}
