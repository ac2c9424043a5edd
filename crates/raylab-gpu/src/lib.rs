//! GPU context acquisition for the raylab ray tracing sandbox.
//!
//! This crate provides:
//! - Layer and extension discovery
//! - Requirement negotiation (instance and device scope)
//! - Physical device description and externally driven selection
//! - Ordered device feature chains
//! - Logical device creation with ordered teardown

pub mod context;
pub mod debug;
pub mod driver;
pub mod error;
pub mod features;
pub mod inventory;
pub mod negotiate;
pub mod requirements;
pub mod selector;
pub mod vulkan;

#[cfg(test)]
mod fake;

pub use context::{ContextBuilder, DeviceContext};
pub use driver::{DeviceRequest, Driver, InstanceRequest};
pub use error::{CreationStage, GpuError, Result};
pub use features::{build_feature_chain, FeatureBlock, FeatureChain, FeatureKind};
pub use inventory::{Inventory, InventoryEntry};
pub use negotiate::{negotiate, Accepted, NegotiationReport, NegotiationResult, Resolution};
pub use requirements::{Necessity, Profile, Requirement, RequirementKind, RequirementSet, Scope};
pub use selector::{
    resolve_queue_family, select_device, validate_selection, DeviceChooser, DeviceSummary,
    FixedChooser, GpuVendor, PhysicalDeviceDescriptor, QueueFamily, SelectionError, Version,
};
pub use vulkan::{VulkanDriver, VulkanInstance};
