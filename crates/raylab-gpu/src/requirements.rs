//! Declarative capability requirements.
//!
//! A [`RequirementSet`] lists every layer and extension the application asks for,
//! tagged with whether its absence is fatal. The set is built once from a
//! [`Profile`] and never changes afterwards.

use std::ffi::CStr;
use std::fmt;

/// Khronos validation layer.
pub const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Device extensions needed for hardware ray tracing.
pub const RAY_TRACING_DEVICE_EXTENSIONS: [&CStr; 9] = [
    ash::khr::acceleration_structure::NAME,
    ash::khr::ray_tracing_pipeline::NAME,
    ash::khr::deferred_host_operations::NAME,
    ash::khr::buffer_device_address::NAME,
    ash::ext::descriptor_indexing::NAME,
    ash::khr::spirv_1_4::NAME,
    ash::khr::shader_float_controls::NAME,
    ash::khr::device_group::NAME,
    ash::khr::maintenance3::NAME,
];

/// Where a requirement is looked up and submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Instance,
    Device,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance => f.write_str("instance"),
            Self::Device => f.write_str("device"),
        }
    }
}

/// Whether a requirement names a layer or an extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequirementKind {
    Layer,
    Extension,
}

/// Whether a missing requirement rejects the whole negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Necessity {
    Mandatory,
    Optional,
}

/// A single named layer or extension the application wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Requirement {
    pub name: &'static CStr,
    pub kind: RequirementKind,
    pub scope: Scope,
    pub necessity: Necessity,
}

impl Requirement {
    pub const fn layer(name: &'static CStr, necessity: Necessity) -> Self {
        Self {
            name,
            kind: RequirementKind::Layer,
            scope: Scope::Instance,
            necessity,
        }
    }

    pub const fn instance_extension(name: &'static CStr, necessity: Necessity) -> Self {
        Self {
            name,
            kind: RequirementKind::Extension,
            scope: Scope::Instance,
            necessity,
        }
    }

    pub const fn device_extension(name: &'static CStr, necessity: Necessity) -> Self {
        Self {
            name,
            kind: RequirementKind::Extension,
            scope: Scope::Device,
            necessity,
        }
    }

    pub fn is_mandatory(&self) -> bool {
        self.necessity == Necessity::Mandatory
    }

    /// Requirement name as UTF-8 for logs and error messages.
    pub fn display_name(&self) -> String {
        self.name.to_string_lossy().into_owned()
    }
}

/// Which of the sandbox's device-requirement variants to negotiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    /// Buffer device address only, and only if available.
    Baseline,
    /// Ask for the full ray tracing extension set but accept any subset.
    ///
    /// Each extension is negotiated on its own, so a device may get
    /// `VK_KHR_ray_tracing_pipeline` enabled without `VK_KHR_spirv_1_4`.
    /// The feature chain only enables a capability whose whole extension set
    /// was accepted, which leaves such an extension enabled but unused.
    RayTracingPreferred,
    /// Refuse any device without the full ray tracing extension set.
    #[default]
    RayTracing,
}

impl Profile {
    /// Parse the CLI spelling of a profile.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "baseline" => Some(Self::Baseline),
            "preferred" | "ray-tracing-preferred" => Some(Self::RayTracingPreferred),
            "ray-tracing" | "rt" => Some(Self::RayTracing),
            _ => None,
        }
    }

    fn device_requirements(self) -> Vec<Requirement> {
        match self {
            Self::Baseline => vec![Requirement::device_extension(
                ash::khr::buffer_device_address::NAME,
                Necessity::Optional,
            )],
            Self::RayTracingPreferred => RAY_TRACING_DEVICE_EXTENSIONS
                .iter()
                .map(|&name| Requirement::device_extension(name, Necessity::Optional))
                .collect(),
            Self::RayTracing => RAY_TRACING_DEVICE_EXTENSIONS
                .iter()
                .map(|&name| Requirement::device_extension(name, Necessity::Mandatory))
                .collect(),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Baseline => f.write_str("baseline"),
            Self::RayTracingPreferred => f.write_str("ray-tracing-preferred"),
            Self::RayTracing => f.write_str("ray-tracing"),
        }
    }
}

/// Full list of requirements for both negotiation passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementSet {
    requirements: Vec<Requirement>,
}

impl RequirementSet {
    pub fn new(requirements: Vec<Requirement>) -> Self {
        Self { requirements }
    }

    /// Requirements for a profile. The validation layer is only listed when
    /// `validation` is set.
    pub fn for_profile(profile: Profile, validation: bool) -> Self {
        let mut requirements = Vec::new();

        if validation {
            requirements.push(Requirement::layer(VALIDATION_LAYER, Necessity::Optional));
        }
        requirements.push(Requirement::instance_extension(
            ash::khr::get_physical_device_properties2::NAME,
            Necessity::Mandatory,
        ));
        requirements.push(Requirement::instance_extension(
            ash::ext::debug_utils::NAME,
            Necessity::Optional,
        ));
        requirements.extend(profile.device_requirements());

        Self { requirements }
    }

    /// Requirements belonging to one negotiation pass, in declaration order.
    pub fn scoped(&self, scope: Scope) -> impl Iterator<Item = &Requirement> + '_ {
        self.requirements.iter().filter(move |r| r.scope == scope)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Requirement> + '_ {
        self.requirements.iter()
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}
