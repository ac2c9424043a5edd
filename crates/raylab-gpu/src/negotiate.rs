//! Requirement negotiation.
//!
//! Cross-references a requirement list against an [`Inventory`]. Requirements are
//! resolved independently of each other; there are no conflict rules between them.

use std::ffi::CStr;

use crate::error::{GpuError, Result};
use crate::inventory::Inventory;
use crate::requirements::{Requirement, RequirementKind, Scope};

/// Whether the inventory offers a requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Satisfied,
    Missing,
}

/// A requirement together with its resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub requirement: Requirement,
    pub resolution: Resolution,
}

impl Resolved {
    pub fn is_satisfied(&self) -> bool {
        self.resolution == Resolution::Satisfied
    }
}

/// Names to submit at creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accepted {
    pub layers: Vec<&'static CStr>,
    pub extensions: Vec<&'static CStr>,
}

impl Accepted {
    pub fn has_extension(&self, name: &CStr) -> bool {
        self.extensions.iter().any(|&ext| ext == name)
    }
}

/// Overall outcome of one negotiation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationResult {
    Accepted(Accepted),
    /// Every mandatory requirement that was missing, in declaration order.
    Rejected { missing: Vec<&'static CStr> },
}

/// Per-requirement outcome of one negotiation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationReport {
    pub scope: Scope,
    pub entries: Vec<Resolved>,
}

/// Resolve each requirement against the inventory.
pub fn negotiate<'a, I>(scope: Scope, requirements: I, inventory: &Inventory) -> NegotiationReport
where
    I: IntoIterator<Item = &'a Requirement>,
{
    let entries = requirements
        .into_iter()
        .map(|&requirement| {
            let resolution = if inventory.contains(requirement.kind, requirement.name) {
                Resolution::Satisfied
            } else {
                Resolution::Missing
            };
            Resolved {
                requirement,
                resolution,
            }
        })
        .collect();

    NegotiationReport { scope, entries }
}

impl NegotiationReport {
    /// Collapse the per-requirement resolutions into the overall outcome.
    pub fn result(&self) -> NegotiationResult {
        let missing: Vec<&'static CStr> = self
            .entries
            .iter()
            .filter(|e| !e.is_satisfied() && e.requirement.is_mandatory())
            .map(|e| e.requirement.name)
            .collect();

        if !missing.is_empty() {
            return NegotiationResult::Rejected { missing };
        }

        let mut accepted = Accepted::default();
        for entry in self.entries.iter().filter(|e| e.is_satisfied()) {
            let list = match entry.requirement.kind {
                RequirementKind::Layer => &mut accepted.layers,
                RequirementKind::Extension => &mut accepted.extensions,
            };
            if !list.contains(&entry.requirement.name) {
                list.push(entry.requirement.name);
            }
        }
        NegotiationResult::Accepted(accepted)
    }

    /// Like [`Self::result`], with rejection turned into an error.
    pub fn accepted(&self) -> Result<Accepted> {
        match self.result() {
            NegotiationResult::Accepted(accepted) => Ok(accepted),
            NegotiationResult::Rejected { missing } => Err(GpuError::NegotiationRejected {
                scope: self.scope,
                missing: missing
                    .iter()
                    .map(|name| name.to_string_lossy().into_owned())
                    .collect(),
            }),
        }
    }

    pub fn satisfied(&self) -> impl Iterator<Item = &Resolved> + '_ {
        self.entries.iter().filter(|e| e.is_satisfied())
    }

    pub fn missing(&self) -> impl Iterator<Item = &Resolved> + '_ {
        self.entries.iter().filter(|e| !e.is_satisfied())
    }

    /// Emit one diagnostic line per requirement.
    pub fn log(&self) {
        for entry in &self.entries {
            let name = entry.requirement.display_name();
            match (entry.resolution, entry.requirement.is_mandatory()) {
                (Resolution::Satisfied, _) => tracing::info!("{name} ... [OK]"),
                (Resolution::Missing, false) => {
                    tracing::warn!("{name} ... missing optional {} capability", self.scope);
                }
                (Resolution::Missing, true) => {
                    tracing::error!("{name} ... missing required {} capability", self.scope);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::InventoryEntry;
    use crate::requirements::{Necessity, Profile, RequirementSet, RAY_TRACING_DEVICE_EXTENSIONS};

    fn extensions(names: &[&CStr]) -> Inventory {
        Inventory::new(
            Vec::new(),
            names
                .iter()
                .map(|&name| InventoryEntry::extension(name, 1))
                .collect(),
        )
    }

    #[test]
    fn accepted_when_every_mandatory_is_present() {
        let reqs = [
            Requirement::device_extension(c"VK_KHR_a", Necessity::Mandatory),
            Requirement::device_extension(c"VK_KHR_b", Necessity::Mandatory),
        ];
        let report = negotiate(Scope::Device, &reqs, &extensions(&[c"VK_KHR_b", c"VK_KHR_a"]));

        assert_eq!(
            report.result(),
            NegotiationResult::Accepted(Accepted {
                layers: Vec::new(),
                extensions: vec![c"VK_KHR_a", c"VK_KHR_b"],
            })
        );
    }

    #[test]
    fn rejected_names_exactly_the_missing_mandatory() {
        let reqs = [
            Requirement::device_extension(c"VK_KHR_a", Necessity::Mandatory),
            Requirement::device_extension(c"VK_KHR_b", Necessity::Mandatory),
            Requirement::device_extension(c"VK_KHR_c", Necessity::Optional),
            Requirement::device_extension(c"VK_KHR_d", Necessity::Mandatory),
        ];
        let report = negotiate(Scope::Device, &reqs, &extensions(&[c"VK_KHR_b"]));

        assert_eq!(
            report.result(),
            NegotiationResult::Rejected {
                missing: vec![c"VK_KHR_a", c"VK_KHR_d"],
            }
        );
        assert_eq!(report.missing().count(), 3);
    }

    #[test]
    fn optional_missing_is_dropped_not_rejected() {
        let reqs = [
            Requirement::instance_extension(c"VK_KHR_a", Necessity::Mandatory),
            Requirement::instance_extension(c"VK_KHR_b", Necessity::Optional),
        ];
        let report = negotiate(Scope::Instance, &reqs, &extensions(&[c"VK_KHR_a"]));
        let accepted = report.accepted().unwrap();

        assert_eq!(accepted.extensions, vec![c"VK_KHR_a"]);
        assert!(!accepted.has_extension(c"VK_KHR_b"));
    }

    #[test]
    fn layers_are_accepted_separately() {
        let reqs = [
            Requirement::layer(c"VK_LAYER_KHRONOS_validation", Necessity::Optional),
            Requirement::instance_extension(c"VK_EXT_debug_utils", Necessity::Optional),
        ];
        let inventory = Inventory::new(
            vec![InventoryEntry::layer(c"VK_LAYER_KHRONOS_validation")],
            vec![InventoryEntry::extension(c"VK_EXT_debug_utils", 2)],
        );
        let accepted = negotiate(Scope::Instance, &reqs, &inventory)
            .accepted()
            .unwrap();

        assert_eq!(accepted.layers, vec![c"VK_LAYER_KHRONOS_validation"]);
        assert_eq!(accepted.extensions, vec![c"VK_EXT_debug_utils"]);
    }

    #[test]
    fn missing_debug_utils_still_accepts() {
        let set = RequirementSet::for_profile(Profile::RayTracing, true);
        let inventory = Inventory::new(
            vec![InventoryEntry::layer(c"VK_LAYER_KHRONOS_validation")],
            vec![InventoryEntry::extension(
                c"VK_KHR_get_physical_device_properties2",
                2,
            )],
        );
        let accepted = negotiate(Scope::Instance, set.scoped(Scope::Instance), &inventory)
            .accepted()
            .unwrap();

        assert!(!accepted.has_extension(ash::ext::debug_utils::NAME));
        assert_eq!(
            accepted.extensions,
            vec![c"VK_KHR_get_physical_device_properties2"]
        );
    }

    #[test]
    fn missing_ray_tracing_pipeline_rejects_full_profile() {
        let set = RequirementSet::for_profile(Profile::RayTracing, false);
        let offered: Vec<&CStr> = RAY_TRACING_DEVICE_EXTENSIONS
            .iter()
            .copied()
            .filter(|&name| name != c"VK_KHR_ray_tracing_pipeline")
            .collect();
        let report = negotiate(Scope::Device, set.scoped(Scope::Device), &extensions(&offered));

        let err = report.accepted().unwrap_err();
        match err {
            GpuError::NegotiationRejected { scope, missing } => {
                assert_eq!(scope, Scope::Device);
                assert_eq!(missing, vec!["VK_KHR_ray_tracing_pipeline".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn preferred_profile_accepts_partial_ray_tracing_set() {
        let set = RequirementSet::for_profile(Profile::RayTracingPreferred, false);
        let offered: Vec<&CStr> = RAY_TRACING_DEVICE_EXTENSIONS
            .iter()
            .copied()
            .filter(|&name| name != c"VK_KHR_spirv_1_4")
            .collect();
        let accepted = negotiate(Scope::Device, set.scoped(Scope::Device), &extensions(&offered))
            .accepted()
            .unwrap();

        assert!(accepted.has_extension(c"VK_KHR_ray_tracing_pipeline"));
        assert!(!accepted.has_extension(c"VK_KHR_spirv_1_4"));

        let chain = crate::features::build_feature_chain(&accepted.extensions);
        assert!(!chain.contains(crate::features::FeatureKind::RayTracingPipeline));
        assert!(chain.contains(crate::features::FeatureKind::AccelerationStructure));
    }

    #[test]
    fn empty_requirements_accept_nothing() {
        let none: [Requirement; 0] = [];
        let report = negotiate(Scope::Device, &none, &extensions(&[c"VK_KHR_a"]));
        assert_eq!(
            report.result(),
            NegotiationResult::Accepted(Accepted::default())
        );
    }
}
