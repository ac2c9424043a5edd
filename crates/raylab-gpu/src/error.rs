//! GPU error types.

use std::fmt;

use ash::vk;
use thiserror::Error;

use crate::requirements::Scope;

/// Stage of the pipeline at which the driver refused a creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationStage {
    Instance,
    Device,
}

impl fmt::Display for CreationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance => f.write_str("instance"),
            Self::Device => f.write_str("logical device"),
        }
    }
}

/// Errors raised while acquiring a GPU context.
///
/// Every variant is terminal: the pipeline never retries.
#[derive(Error, Debug)]
pub enum GpuError {
    /// The Vulkan loader could not be found or initialised.
    #[error("Failed to load Vulkan: {0}")]
    Loader(String),

    /// An enumeration call against the driver failed.
    #[error("Failed to query {query}: {source}")]
    Discovery {
        query: &'static str,
        #[source]
        source: vk::Result,
    },

    /// One or more mandatory requirements are not offered by the host.
    #[error("Missing required {scope} capabilities: {}", .missing.join(", "))]
    NegotiationRejected { scope: Scope, missing: Vec<String> },

    /// The instance reports no physical devices at all.
    #[error("Failed to find GPUs with Vulkan support")]
    NoCompatibleDevice,

    /// The chosen device has no queue family with graphics support.
    #[error("Device {device} has no graphics queue family")]
    NoGraphicsQueue { device: String },

    /// The device chooser stopped providing input.
    #[error("Device selection aborted: {0}")]
    SelectionAborted(String),

    /// The driver refused to create the instance or the logical device.
    #[error("Failed to create {stage}: {source}")]
    CreationRejected {
        stage: CreationStage,
        #[source]
        source: vk::Result,
    },
}

impl GpuError {
    pub(crate) fn discovery(query: &'static str) -> impl FnOnce(vk::Result) -> Self {
        move |source| Self::Discovery { query, source }
    }

    pub(crate) fn creation(stage: CreationStage) -> impl FnOnce(vk::Result) -> Self {
        move |source| Self::CreationRejected { stage, source }
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, GpuError>;
