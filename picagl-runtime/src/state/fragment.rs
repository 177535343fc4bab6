//! Per-fragment state values
//!
//! The values the command-list builder encodes next to the capability
//! enables. Setters validate GL tokens and ranges; on error nothing changes.

use super::capability::DirtyFlags;
use crate::error::GlError;
use crate::gl::{BlendFactor, CompareFunc, CullFace, FrontFace, LogicOp, StencilOp};

fn lookup<T>(token: u32, from_token: impl Fn(u32) -> Option<T>) -> Result<T, GlError> {
    from_token(token).ok_or_else(|| {
        log::warn!("invalid enum 0x{:04X}", token);
        GlError::InvalidEnum
    })
}

/// Scissor rectangle in window coordinates.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScissorBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilState {
    pub func: CompareFunc,
    pub reference: i32,
    pub mask: u32,
    pub write_mask: u32,
    pub fail: StencilOp,
    pub depth_fail: StencilOp,
    pub depth_pass: StencilOp,
}

impl Default for StencilState {
    fn default() -> Self {
        Self {
            func: CompareFunc::Always,
            reference: 0,
            mask: 0xFF,
            write_mask: 0xFF,
            fail: StencilOp::Keep,
            depth_fail: StencilOp::Keep,
            depth_pass: StencilOp::Keep,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FragmentState {
    pub alpha_func: CompareFunc,
    /// Clamped to 0..=1.
    pub alpha_ref: f32,
    pub blend_src: BlendFactor,
    pub blend_dst: BlendFactor,
    pub logic_op: LogicOp,
    pub cull_face: CullFace,
    pub front_face: FrontFace,
    pub depth_func: CompareFunc,
    pub depth_write: bool,
    /// Red, green, blue, alpha write enables.
    pub color_mask: [bool; 4],
    pub depth_range: (f32, f32),
    pub polygon_offset_factor: f32,
    pub polygon_offset_units: f32,
    pub scissor: ScissorBox,
    pub stencil: StencilState,
}

impl Default for FragmentState {
    fn default() -> Self {
        Self {
            alpha_func: CompareFunc::Always,
            alpha_ref: 0.0,
            blend_src: BlendFactor::One,
            blend_dst: BlendFactor::Zero,
            logic_op: LogicOp::Copy,
            cull_face: CullFace::Back,
            front_face: FrontFace::CounterClockwise,
            depth_func: CompareFunc::Less,
            depth_write: true,
            color_mask: [true; 4],
            depth_range: (0.0, 1.0),
            polygon_offset_factor: 0.0,
            polygon_offset_units: 0.0,
            scissor: ScissorBox::default(),
            stencil: StencilState::default(),
        }
    }
}

impl FragmentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_alpha_func(&mut self, func: u32, reference: f32) -> Result<DirtyFlags, GlError> {
        self.alpha_func = lookup(func, CompareFunc::from_token)?;
        self.alpha_ref = reference.clamp(0.0, 1.0);
        Ok(DirtyFlags::ALPHA)
    }

    pub fn set_blend_func(&mut self, src: u32, dst: u32) -> Result<DirtyFlags, GlError> {
        let src = lookup(src, BlendFactor::from_token)?;
        let dst = lookup(dst, BlendFactor::from_token)?;
        // Saturate is a source-only factor.
        if dst == BlendFactor::SrcAlphaSaturate {
            return Err(GlError::InvalidEnum);
        }
        self.blend_src = src;
        self.blend_dst = dst;
        Ok(DirtyFlags::BLEND)
    }

    pub fn set_logic_op(&mut self, op: u32) -> Result<DirtyFlags, GlError> {
        self.logic_op = lookup(op, LogicOp::from_token)?;
        Ok(DirtyFlags::BLEND)
    }

    pub fn set_cull_face(&mut self, mode: u32) -> Result<DirtyFlags, GlError> {
        self.cull_face = lookup(mode, CullFace::from_token)?;
        Ok(DirtyFlags::CULL)
    }

    pub fn set_front_face(&mut self, mode: u32) -> Result<DirtyFlags, GlError> {
        self.front_face = lookup(mode, FrontFace::from_token)?;
        Ok(DirtyFlags::CULL)
    }

    pub fn set_depth_func(&mut self, func: u32) -> Result<DirtyFlags, GlError> {
        self.depth_func = lookup(func, CompareFunc::from_token)?;
        Ok(DirtyFlags::COLOR_DEPTH)
    }

    pub fn set_depth_mask(&mut self, write: bool) -> DirtyFlags {
        self.depth_write = write;
        DirtyFlags::COLOR_DEPTH
    }

    pub fn set_color_mask(&mut self, red: bool, green: bool, blue: bool, alpha: bool) -> DirtyFlags {
        self.color_mask = [red, green, blue, alpha];
        DirtyFlags::COLOR_DEPTH
    }

    pub fn set_depth_range(&mut self, near: f32, far: f32) -> DirtyFlags {
        self.depth_range = (near.clamp(0.0, 1.0), far.clamp(0.0, 1.0));
        DirtyFlags::DEPTHMAP
    }

    pub fn set_polygon_offset(&mut self, factor: f32, units: f32) -> DirtyFlags {
        self.polygon_offset_factor = factor;
        self.polygon_offset_units = units;
        DirtyFlags::DEPTHMAP
    }

    pub fn set_scissor(&mut self, x: i32, y: i32, width: i32, height: i32) -> Result<DirtyFlags, GlError> {
        if width < 0 || height < 0 {
            return Err(GlError::InvalidValue);
        }
        self.scissor = ScissorBox {
            x,
            y,
            width: width as u32,
            height: height as u32,
        };
        Ok(DirtyFlags::SCISSOR)
    }

    pub fn set_stencil_func(&mut self, func: u32, reference: i32, mask: u32) -> Result<DirtyFlags, GlError> {
        self.stencil.func = lookup(func, CompareFunc::from_token)?;
        // The stencil buffer is 8 bits deep.
        self.stencil.reference = reference.clamp(0, 0xFF);
        self.stencil.mask = mask & 0xFF;
        Ok(DirtyFlags::STENCIL)
    }

    pub fn set_stencil_mask(&mut self, mask: u32) -> DirtyFlags {
        self.stencil.write_mask = mask & 0xFF;
        DirtyFlags::STENCIL
    }

    pub fn set_stencil_op(&mut self, fail: u32, depth_fail: u32, depth_pass: u32) -> Result<DirtyFlags, GlError> {
        let fail = lookup(fail, StencilOp::from_token)?;
        let depth_fail = lookup(depth_fail, StencilOp::from_token)?;
        let depth_pass = lookup(depth_pass, StencilOp::from_token)?;
        self.stencil.fail = fail;
        self.stencil.depth_fail = depth_fail;
        self.stencil.depth_pass = depth_pass;
        Ok(DirtyFlags::STENCIL)
    }
}
