//! Device feature chain.
//!
//! Feature requests are kept as an ordered list of tagged blocks. The order in
//! which blocks appear in the native `pNext` chain is [`FeatureKind::CHAIN_ORDER`];
//! [`FeatureChain::to_native`] is the only place that links structures together.

use std::ffi::{c_void, CStr};
use std::ptr;

use ash::vk;

/// Capability block type. Each kind appears at most once in a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureKind {
    /// Vulkan 1.1 core feature block. Always present.
    Vulkan11,
    BufferDeviceAddress,
    RayTracingPipeline,
    AccelerationStructure,
}

impl FeatureKind {
    /// Outermost first.
    pub const CHAIN_ORDER: [Self; 4] = [
        Self::Vulkan11,
        Self::BufferDeviceAddress,
        Self::RayTracingPipeline,
        Self::AccelerationStructure,
    ];

    /// Device extensions that must all be accepted before the block is requested.
    pub fn required_extensions(self) -> &'static [&'static CStr] {
        match self {
            Self::Vulkan11 => &[],
            Self::BufferDeviceAddress => &[ash::khr::buffer_device_address::NAME],
            Self::RayTracingPipeline => &[
                ash::khr::ray_tracing_pipeline::NAME,
                ash::khr::acceleration_structure::NAME,
                ash::khr::spirv_1_4::NAME,
            ],
            Self::AccelerationStructure => &[
                ash::khr::acceleration_structure::NAME,
                ash::khr::deferred_host_operations::NAME,
                ash::khr::buffer_device_address::NAME,
                ash::ext::descriptor_indexing::NAME,
            ],
        }
    }

    pub fn structure_type(self) -> vk::StructureType {
        match self {
            Self::Vulkan11 => vk::StructureType::PHYSICAL_DEVICE_VULKAN_1_1_FEATURES,
            Self::BufferDeviceAddress => {
                vk::StructureType::PHYSICAL_DEVICE_BUFFER_DEVICE_ADDRESS_FEATURES
            }
            Self::RayTracingPipeline => {
                vk::StructureType::PHYSICAL_DEVICE_RAY_TRACING_PIPELINE_FEATURES_KHR
            }
            Self::AccelerationStructure => {
                vk::StructureType::PHYSICAL_DEVICE_ACCELERATION_STRUCTURE_FEATURES_KHR
            }
        }
    }
}

/// One feature-request record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureBlock {
    /// Core 1.1 features, all left at their defaults.
    Vulkan11,
    BufferDeviceAddress { buffer_device_address: bool },
    RayTracingPipeline { ray_tracing_pipeline: bool },
    AccelerationStructure { acceleration_structure: bool },
}

impl FeatureBlock {
    /// Block for `kind` with its feature switched on.
    pub fn enabled(kind: FeatureKind) -> Self {
        match kind {
            FeatureKind::Vulkan11 => Self::Vulkan11,
            FeatureKind::BufferDeviceAddress => Self::BufferDeviceAddress {
                buffer_device_address: true,
            },
            FeatureKind::RayTracingPipeline => Self::RayTracingPipeline {
                ray_tracing_pipeline: true,
            },
            FeatureKind::AccelerationStructure => Self::AccelerationStructure {
                acceleration_structure: true,
            },
        }
    }

    pub fn kind(&self) -> FeatureKind {
        match self {
            Self::Vulkan11 => FeatureKind::Vulkan11,
            Self::BufferDeviceAddress { .. } => FeatureKind::BufferDeviceAddress,
            Self::RayTracingPipeline { .. } => FeatureKind::RayTracingPipeline,
            Self::AccelerationStructure { .. } => FeatureKind::AccelerationStructure,
        }
    }
}

/// Ordered, duplicate-free list of feature blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureChain {
    blocks: Vec<FeatureBlock>,
}

/// Build the chain for a set of accepted device extensions.
///
/// A capability whose extensions were not all accepted is left out of the chain.
pub fn build_feature_chain(accepted_extensions: &[&CStr]) -> FeatureChain {
    let blocks = FeatureKind::CHAIN_ORDER
        .iter()
        .copied()
        .filter(|kind| {
            kind.required_extensions()
                .iter()
                .all(|required| accepted_extensions.contains(required))
        })
        .map(FeatureBlock::enabled)
        .collect();

    FeatureChain { blocks }
}

impl FeatureChain {
    pub fn blocks(&self) -> &[FeatureBlock] {
        &self.blocks
    }

    pub fn kinds(&self) -> impl Iterator<Item = FeatureKind> + '_ {
        self.blocks.iter().map(FeatureBlock::kind)
    }

    pub fn contains(&self, kind: FeatureKind) -> bool {
        self.kinds().any(|k| k == kind)
    }

    /// Lower into native structures linked beneath `VkPhysicalDeviceFeatures2`.
    pub fn to_native(&self) -> NativeFeatureChain {
        let mut blocks: Vec<NativeBlock> = self.blocks.iter().map(NativeBlock::lower).collect();

        let mut next: *mut c_void = ptr::null_mut();
        for block in blocks.iter_mut().rev() {
            block.set_next(next);
            next = block.as_mut_ptr();
        }

        let mut root = vk::PhysicalDeviceFeatures2::default();
        root.p_next = next;

        NativeFeatureChain { root, blocks }
    }
}

enum NativeBlock {
    Vulkan11(vk::PhysicalDeviceVulkan11Features<'static>),
    BufferDeviceAddress(vk::PhysicalDeviceBufferDeviceAddressFeatures<'static>),
    RayTracingPipeline(vk::PhysicalDeviceRayTracingPipelineFeaturesKHR<'static>),
    AccelerationStructure(vk::PhysicalDeviceAccelerationStructureFeaturesKHR<'static>),
}

impl NativeBlock {
    fn lower(block: &FeatureBlock) -> Self {
        match *block {
            FeatureBlock::Vulkan11 => Self::Vulkan11(vk::PhysicalDeviceVulkan11Features::default()),
            FeatureBlock::BufferDeviceAddress {
                buffer_device_address,
            } => Self::BufferDeviceAddress(
                vk::PhysicalDeviceBufferDeviceAddressFeatures::default()
                    .buffer_device_address(buffer_device_address),
            ),
            FeatureBlock::RayTracingPipeline {
                ray_tracing_pipeline,
            } => Self::RayTracingPipeline(
                vk::PhysicalDeviceRayTracingPipelineFeaturesKHR::default()
                    .ray_tracing_pipeline(ray_tracing_pipeline),
            ),
            FeatureBlock::AccelerationStructure {
                acceleration_structure,
            } => Self::AccelerationStructure(
                vk::PhysicalDeviceAccelerationStructureFeaturesKHR::default()
                    .acceleration_structure(acceleration_structure),
            ),
        }
    }

    fn set_next(&mut self, next: *mut c_void) {
        match self {
            Self::Vulkan11(s) => s.p_next = next,
            Self::BufferDeviceAddress(s) => s.p_next = next,
            Self::RayTracingPipeline(s) => s.p_next = next,
            Self::AccelerationStructure(s) => s.p_next = next,
        }
    }

    fn as_mut_ptr(&mut self) -> *mut c_void {
        match self {
            Self::Vulkan11(s) => ptr::from_mut(s).cast(),
            Self::BufferDeviceAddress(s) => ptr::from_mut(s).cast(),
            Self::RayTracingPipeline(s) => ptr::from_mut(s).cast(),
            Self::AccelerationStructure(s) => ptr::from_mut(s).cast(),
        }
    }
}

/// Native feature structures, linked in chain order.
///
/// The blocks live in a heap buffer that is never resized, so the links stay
/// valid when this value moves.
pub struct NativeFeatureChain {
    root: vk::PhysicalDeviceFeatures2<'static>,
    blocks: Vec<NativeBlock>,
}

impl NativeFeatureChain {
    /// Head of the chain, to be pushed onto `VkDeviceCreateInfo`.
    pub fn root_mut(&mut self) -> &mut vk::PhysicalDeviceFeatures2<'static> {
        &mut self.root
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Structure types in link order, starting with the root.
    pub fn structure_types(&self) -> Vec<vk::StructureType> {
        let mut types = vec![self.root.s_type];
        let mut next = self.root.p_next.cast::<vk::BaseOutStructure<'static>>();
        while !next.is_null() {
            // SAFETY: every link targets an element of `self.blocks`, which
            // outlives this borrow.
            let base = unsafe { &*next };
            types.push(base.s_type);
            next = base.p_next;
        }
        types
    }
}
