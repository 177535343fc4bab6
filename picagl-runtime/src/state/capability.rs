// Capability enables and dirty tracking.
//
// Each capability is a plain boolean except for two coupled pairs. Blend and
// logic op share one fragment-operation field, so at most one of them is on.
// The normal and inverted scissor tests share one enable plus an orientation
// bit.

use crate::error::GlError;
use crate::gl;
use bitflags::bitflags;

bitflags! {
    /// Register groups that must be re-emitted before the next draw.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DirtyFlags: u32 {
        const ALPHA = 1 << 0;
        /// Blend and logic op.
        const BLEND = 1 << 1;
        const CULL = 1 << 2;
        /// Depth test, depth/color write masks.
        const COLOR_DEPTH = 1 << 3;
        /// Depth map: polygon offset and depth range.
        const DEPTHMAP = 1 << 4;
        const SCISSOR = 1 << 5;
        const STENCIL = 1 << 6;
        const MATRIX = 1 << 7;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    AlphaTest,
    Blend,
    ColorLogicOp,
    CullFace,
    DepthTest,
    PolygonOffsetFill,
    ScissorTest,
    ScissorTestInverted,
    StencilTest,
}

impl Capability {
    pub fn from_token(token: u32) -> Option<Self> {
        match token {
            gl::ALPHA_TEST => Some(Self::AlphaTest),
            gl::BLEND => Some(Self::Blend),
            gl::COLOR_LOGIC_OP => Some(Self::ColorLogicOp),
            gl::CULL_FACE => Some(Self::CullFace),
            gl::DEPTH_TEST => Some(Self::DepthTest),
            gl::POLYGON_OFFSET_FILL => Some(Self::PolygonOffsetFill),
            gl::SCISSOR_TEST => Some(Self::ScissorTest),
            gl::SCISSOR_TEST_INVERTED_PICA => Some(Self::ScissorTestInverted),
            gl::STENCIL_TEST => Some(Self::StencilTest),
            _ => None,
        }
    }

    /// The register group a change of this capability invalidates.
    pub fn dirty_group(self) -> DirtyFlags {
        match self {
            Self::AlphaTest => DirtyFlags::ALPHA,
            Self::Blend | Self::ColorLogicOp => DirtyFlags::BLEND,
            Self::CullFace => DirtyFlags::CULL,
            Self::DepthTest => DirtyFlags::COLOR_DEPTH,
            Self::PolygonOffsetFill => DirtyFlags::DEPTHMAP,
            Self::ScissorTest | Self::ScissorTestInverted => DirtyFlags::SCISSOR,
            Self::StencilTest => DirtyFlags::STENCIL,
        }
    }
}

/// What the fragment-operation unit does with incoming colors.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentOp {
    #[default]
    Disabled,
    Blend,
    LogicOp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityState {
    pub alpha_test: bool,
    pub fragment_op: FragmentOp,
    pub cull_face: bool,
    pub depth_test: bool,
    pub polygon_offset: bool,
    pub scissor_enabled: bool,
    /// Discard inside the box instead of outside.
    pub scissor_inverted: bool,
    pub stencil_test: bool,
    dirty: DirtyFlags,
}

impl Default for CapabilityState {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityState {
    /// All capabilities off; every group dirty so the first draw emits
    /// the full register set.
    pub fn new() -> Self {
        Self {
            alpha_test: false,
            fragment_op: FragmentOp::Disabled,
            cull_face: false,
            depth_test: false,
            polygon_offset: false,
            scissor_enabled: false,
            scissor_inverted: false,
            stencil_test: false,
            dirty: DirtyFlags::all(),
        }
    }

    /// Enable or disable the capability named by a GL token.
    pub fn set_capability(&mut self, token: u32, enabled: bool) -> Result<(), GlError> {
        let cap = Capability::from_token(token).ok_or_else(|| {
            log::warn!("unknown capability 0x{:04X}", token);
            GlError::InvalidEnum
        })?;
        self.set(cap, enabled);
        Ok(())
    }

    pub fn set(&mut self, cap: Capability, enabled: bool) {
        match cap {
            Capability::AlphaTest => self.alpha_test = enabled,
            Capability::Blend => self.set_fragment_op(FragmentOp::Blend, enabled),
            Capability::ColorLogicOp => self.set_fragment_op(FragmentOp::LogicOp, enabled),
            Capability::CullFace => self.cull_face = enabled,
            Capability::DepthTest => self.depth_test = enabled,
            Capability::PolygonOffsetFill => self.polygon_offset = enabled,
            Capability::ScissorTest => self.set_scissor(false, enabled),
            Capability::ScissorTestInverted => self.set_scissor(true, enabled),
            Capability::StencilTest => self.stencil_test = enabled,
        }
        self.dirty |= cap.dirty_group();
    }

    fn set_fragment_op(&mut self, op: FragmentOp, enabled: bool) {
        if enabled {
            self.fragment_op = op;
        } else if self.fragment_op == op {
            self.fragment_op = FragmentOp::Disabled;
        }
    }

    fn set_scissor(&mut self, inverted: bool, enabled: bool) {
        if enabled {
            self.scissor_enabled = true;
            self.scissor_inverted = inverted;
        } else if self.scissor_enabled && self.scissor_inverted == inverted {
            self.scissor_enabled = false;
        }
    }

    pub fn is_enabled(&self, token: u32) -> Result<bool, GlError> {
        Capability::from_token(token)
            .map(|cap| self.get(cap))
            .ok_or(GlError::InvalidEnum)
    }

    pub fn get(&self, cap: Capability) -> bool {
        match cap {
            Capability::AlphaTest => self.alpha_test,
            Capability::Blend => self.fragment_op == FragmentOp::Blend,
            Capability::ColorLogicOp => self.fragment_op == FragmentOp::LogicOp,
            Capability::CullFace => self.cull_face,
            Capability::DepthTest => self.depth_test,
            Capability::PolygonOffsetFill => self.polygon_offset,
            Capability::ScissorTest => self.scissor_enabled && !self.scissor_inverted,
            Capability::ScissorTestInverted => self.scissor_enabled && self.scissor_inverted,
            Capability::StencilTest => self.stencil_test,
        }
    }

    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    pub fn mark_dirty(&mut self, flags: DirtyFlags) {
        self.dirty |= flags;
    }

    /// Called by the command-list builder once it has encoded `flags`.
    pub fn clear_dirty(&mut self, flags: DirtyFlags) {
        self.dirty.remove(flags);
    }
}
