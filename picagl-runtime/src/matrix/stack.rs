// Bounded matrix stack.

use crate::error::GlError;
use glam::Mat4;

/// The current matrix plus up to `max_depth` saved ones.
///
/// Failed pushes and pops leave the stack as it was.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixStack {
    top: Mat4,
    saved: Vec<Mat4>,
    max_depth: usize,
}

impl MatrixStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            top: Mat4::IDENTITY,
            saved: Vec::with_capacity(max_depth),
            max_depth,
        }
    }

    pub fn top(&self) -> Mat4 {
        self.top
    }

    /// Number of saved matrices.
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn push(&mut self) -> Result<(), GlError> {
        if self.saved.len() >= self.max_depth {
            return Err(GlError::StackOverflow);
        }
        self.saved.push(self.top);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<(), GlError> {
        self.top = self.saved.pop().ok_or(GlError::StackUnderflow)?;
        Ok(())
    }

    pub fn load(&mut self, m: Mat4) {
        self.top = m;
    }

    pub fn load_identity(&mut self) {
        self.load(Mat4::IDENTITY);
    }

    /// `top = top * m`
    pub fn multiply(&mut self, m: Mat4) {
        self.top *= m;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn push_pop_restores_top() {
        let mut stack = MatrixStack::new(4);
        stack.load(Mat4::from_translation(Vec3::X));
        let before = stack.top();
        stack.push().unwrap();
        stack.multiply(Mat4::from_scale(Vec3::splat(3.0)));
        assert_ne!(stack.top(), before);
        stack.pop().unwrap();
        assert_eq!(stack.top(), before);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn bounds_are_reported_without_change() {
        let mut stack = MatrixStack::new(2);
        assert_eq!(stack.pop(), Err(GlError::StackUnderflow));
        stack.push().unwrap();
        stack.push().unwrap();
        stack.load(Mat4::from_translation(Vec3::Y));
        assert_eq!(stack.push(), Err(GlError::StackOverflow));
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.top(), Mat4::from_translation(Vec3::Y));
    }

    #[test]
    fn multiply_is_on_the_right() {
        let mut stack = MatrixStack::new(1);
        stack.load(Mat4::from_translation(Vec3::X));
        stack.multiply(Mat4::from_scale(Vec3::splat(2.0)));
        let p = stack.top().transform_point3(Vec3::ONE);
        assert_eq!(p, Vec3::new(3.0, 2.0, 2.0));
    }
}
