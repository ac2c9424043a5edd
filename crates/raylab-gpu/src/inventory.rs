//! Layer and extension discovery.

use std::ffi::{CStr, CString};

use ash::vk;

use crate::driver::Driver;
use crate::error::{GpuError, Result};
use crate::requirements::RequirementKind;

/// A discovered layer or extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InventoryEntry {
    pub name: CString,
    /// Extension spec version. Layers carry none.
    pub spec_version: Option<u32>,
}

impl InventoryEntry {
    pub fn layer(name: &CStr) -> Self {
        Self {
            name: name.to_owned(),
            spec_version: None,
        }
    }

    pub fn extension(name: &CStr, spec_version: u32) -> Self {
        Self {
            name: name.to_owned(),
            spec_version: Some(spec_version),
        }
    }

    pub(crate) fn from_layer_properties(props: &vk::LayerProperties) -> Option<Self> {
        props.layer_name_as_c_str().ok().map(Self::layer)
    }

    pub(crate) fn from_extension_properties(props: &vk::ExtensionProperties) -> Option<Self> {
        props
            .extension_name_as_c_str()
            .ok()
            .map(|name| Self::extension(name, props.spec_version))
    }
}

/// Everything the host offers for one negotiation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    pub layers: Vec<InventoryEntry>,
    pub extensions: Vec<InventoryEntry>,
}

impl Inventory {
    pub fn new(layers: Vec<InventoryEntry>, extensions: Vec<InventoryEntry>) -> Self {
        Self { layers, extensions }
    }

    /// Instance layers and instance extensions.
    pub fn instance<D: Driver>(driver: &D) -> Result<Self> {
        let layers = driver
            .instance_layers()
            .map_err(GpuError::discovery("instance layers"))?;
        let extensions = driver
            .instance_extensions()
            .map_err(GpuError::discovery("instance extensions"))?;

        tracing::debug!(
            "Host offers {} instance layers and {} instance extensions",
            layers.len(),
            extensions.len()
        );
        for layer in &layers {
            tracing::debug!("  layer {}", layer.name.to_string_lossy());
        }

        Ok(Self { layers, extensions })
    }

    /// Device extensions of one physical device. Devices expose no layers.
    pub fn device<D: Driver>(
        driver: &D,
        instance: &D::Instance,
        physical_device: D::PhysicalDevice,
    ) -> Result<Self> {
        let extensions = driver
            .device_extensions(instance, physical_device)
            .map_err(GpuError::discovery("device extensions"))?;

        tracing::debug!("Device offers {} extensions", extensions.len());

        Ok(Self {
            layers: Vec::new(),
            extensions,
        })
    }

    /// Exact, case-sensitive presence check. Spec versions are not compared.
    pub fn contains(&self, kind: RequirementKind, name: &CStr) -> bool {
        let entries = match kind {
            RequirementKind::Layer => &self.layers,
            RequirementKind::Extension => &self.extensions,
        };
        entries.iter().any(|entry| entry.name.as_c_str() == name)
    }
}
