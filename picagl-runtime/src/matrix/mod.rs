//! Matrix stacks
//!
//! One model-view stack, one projection stack and one texture stack per
//! texture unit. The current mode and, for texture mode, the active unit
//! select which stack matrix calls act on.

pub mod stack;
pub mod transform;

pub use stack::MatrixStack;

use crate::config::ContextConfig;
use crate::error::GlError;
use crate::gl;
use glam::Mat4;

pub const TEXTURE_UNITS: usize = gl::MAX_TEXTURE_UNITS as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MatrixMode {
    #[default]
    ModelView,
    Projection,
    Texture,
}

impl MatrixMode {
    pub fn from_token(token: u32) -> Option<Self> {
        match token {
            gl::MODELVIEW => Some(Self::ModelView),
            gl::PROJECTION => Some(Self::Projection),
            gl::TEXTURE => Some(Self::Texture),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatrixStacks {
    modelview: MatrixStack,
    projection: MatrixStack,
    texture: [MatrixStack; TEXTURE_UNITS],
    mode: MatrixMode,
    active_unit: usize,
}

impl Default for MatrixStacks {
    fn default() -> Self {
        Self::new(&ContextConfig::default())
    }
}

impl MatrixStacks {
    pub fn new(config: &ContextConfig) -> Self {
        Self {
            modelview: MatrixStack::new(config.modelview_depth),
            projection: MatrixStack::new(config.projection_depth),
            texture: std::array::from_fn(|_| MatrixStack::new(config.texture_depth)),
            mode: MatrixMode::ModelView,
            active_unit: 0,
        }
    }

    pub fn mode(&self) -> MatrixMode {
        self.mode
    }

    pub fn set_mode(&mut self, token: u32) -> Result<(), GlError> {
        self.mode = MatrixMode::from_token(token).ok_or(GlError::InvalidEnum)?;
        Ok(())
    }

    pub fn active_unit(&self) -> usize {
        self.active_unit
    }

    /// Select a texture unit by its `TEXTURE0 + n` token.
    pub fn set_active_texture(&mut self, token: u32) -> Result<(), GlError> {
        let unit = token.wrapping_sub(gl::TEXTURE0) as usize;
        if unit >= TEXTURE_UNITS {
            return Err(GlError::InvalidEnum);
        }
        self.active_unit = unit;
        Ok(())
    }

    pub fn stack(&self, mode: MatrixMode) -> &MatrixStack {
        match mode {
            MatrixMode::ModelView => &self.modelview,
            MatrixMode::Projection => &self.projection,
            MatrixMode::Texture => &self.texture[self.active_unit],
        }
    }

    /// The stack matrix calls currently act on.
    pub fn current(&self) -> &MatrixStack {
        self.stack(self.mode)
    }

    pub fn current_mut(&mut self) -> &mut MatrixStack {
        match self.mode {
            MatrixMode::ModelView => &mut self.modelview,
            MatrixMode::Projection => &mut self.projection,
            MatrixMode::Texture => &mut self.texture[self.active_unit],
        }
    }

    pub fn modelview(&self) -> Mat4 {
        self.modelview.top()
    }

    pub fn projection(&self) -> Mat4 {
        self.projection.top()
    }

    pub fn texture(&self, unit: usize) -> Option<Mat4> {
        self.texture.get(unit).map(MatrixStack::top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn texture_mode_follows_active_unit() {
        let mut stacks = MatrixStacks::default();
        stacks.set_mode(gl::TEXTURE).unwrap();
        stacks.set_active_texture(gl::TEXTURE0 + 2).unwrap();
        stacks.current_mut().load(Mat4::from_scale(Vec3::splat(2.0)));

        assert_eq!(stacks.texture(2), Some(Mat4::from_scale(Vec3::splat(2.0))));
        assert_eq!(stacks.texture(0), Some(Mat4::IDENTITY));
        assert_eq!(stacks.modelview(), Mat4::IDENTITY);
    }

    #[test]
    fn invalid_selectors_are_rejected() {
        let mut stacks = MatrixStacks::default();
        assert_eq!(stacks.set_mode(0x1703), Err(GlError::InvalidEnum));
        assert_eq!(
            stacks.set_active_texture(gl::TEXTURE0 + 3),
            Err(GlError::InvalidEnum)
        );
        assert_eq!(stacks.set_active_texture(0), Err(GlError::InvalidEnum));
        assert_eq!(stacks.mode(), MatrixMode::ModelView);
        assert_eq!(stacks.active_unit(), 0);
    }

    #[test]
    fn configured_depths_apply() {
        let stacks = MatrixStacks::new(&ContextConfig::default());
        assert_eq!(stacks.stack(MatrixMode::ModelView).max_depth(), 32);
        assert_eq!(stacks.stack(MatrixMode::Projection).max_depth(), 4);
        assert_eq!(stacks.stack(MatrixMode::Texture).max_depth(), 4);
    }
}
