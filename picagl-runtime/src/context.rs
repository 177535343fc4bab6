//! GL context
//!
//! Owns everything a GL-style front end needs: the command queue and its
//! backend, the memory domains, the tiling engine, pipeline state, matrix
//! stacks, texture objects and the error latch. Entry points never return
//! errors; recoverable failures are latched and read with
//! [`GlContext::get_error`].

use crate::config::ContextConfig;
use crate::error::{ErrorLatch, GlError};
use crate::matrix::{transform, MatrixMode, MatrixStacks};
use crate::state::{CapabilityState, DirtyFlags, FragmentState};
use crate::texture::{TextureId, TextureImage, TexturePlacement, TextureStore};
use glam::Mat4;
use picagl_core::gpu::{CommandQueue, GpuBackend, SimulatedGpu};
use picagl_core::memory::{MemorySystem, SharedMemory};
use picagl_core::texture::TilingEngine;
use std::sync::Arc;

pub struct GlContext {
    memory: SharedMemory,
    queue: Arc<CommandQueue>,
    tiling: TilingEngine,
    caps: CapabilityState,
    fragment: FragmentState,
    matrices: MatrixStacks,
    textures: TextureStore,
    errors: ErrorLatch,
}

impl GlContext {
    /// Context on an existing backend. Whoever delivers the backend's
    /// completion events must route them to [`GlContext::queue`].
    pub fn new(config: &ContextConfig, backend: Arc<dyn GpuBackend>, memory: SharedMemory) -> Self {
        let queue = CommandQueue::new(backend);
        Self {
            tiling: TilingEngine::new(Arc::clone(&queue), Arc::clone(&memory)),
            memory,
            queue,
            caps: CapabilityState::new(),
            fragment: FragmentState::new(),
            matrices: MatrixStacks::new(config),
            textures: TextureStore::new(),
            errors: ErrorLatch::new(),
        }
    }

    /// Context on a freshly spawned [`SimulatedGpu`] with its own memory.
    pub fn with_simulator(config: &ContextConfig) -> Self {
        let memory = MemorySystem::new(&config.memory).into_shared();
        let gpu = SimulatedGpu::spawn(Some(Arc::clone(&memory)), config.gpu_latency());
        let context = Self::new(config, gpu.clone(), memory);
        gpu.attach(&context.queue);
        log::info!("GL context created on the simulated GPU");
        context
    }

    pub fn queue(&self) -> &Arc<CommandQueue> {
        &self.queue
    }

    pub fn memory(&self) -> &SharedMemory {
        &self.memory
    }

    pub fn tiling(&self) -> &TilingEngine {
        &self.tiling
    }

    fn check<T>(&mut self, result: Result<T, GlError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.errors.record(err);
                None
            }
        }
    }

    // -- Errors ---------------------------------------------------------

    /// Read and clear the latched error code, `NO_ERROR` if none.
    pub fn get_error(&mut self) -> u32 {
        self.errors.take_code()
    }

    // -- Capabilities ---------------------------------------------------

    pub fn enable(&mut self, cap: u32) {
        let result = self.caps.set_capability(cap, true);
        self.check(result);
    }

    pub fn disable(&mut self, cap: u32) {
        let result = self.caps.set_capability(cap, false);
        self.check(result);
    }

    /// Unknown capabilities latch `InvalidEnum` and read as disabled.
    pub fn is_enabled(&mut self, cap: u32) -> bool {
        let result = self.caps.is_enabled(cap);
        self.check(result).unwrap_or(false)
    }

    pub fn capabilities(&self) -> &CapabilityState {
        &self.caps
    }

    pub fn fragment_state(&self) -> &FragmentState {
        &self.fragment
    }

    pub fn dirty_flags(&self) -> DirtyFlags {
        self.caps.dirty()
    }

    /// Acknowledge that the command-list builder has emitted `flags`.
    pub fn clear_dirty(&mut self, flags: DirtyFlags) {
        self.caps.clear_dirty(flags);
    }

    // -- Fragment state -------------------------------------------------

    fn mark(&mut self, result: Result<DirtyFlags, GlError>) {
        if let Some(flags) = self.check(result) {
            self.caps.mark_dirty(flags);
        }
    }

    pub fn alpha_func(&mut self, func: u32, reference: f32) {
        let result = self.fragment.set_alpha_func(func, reference);
        self.mark(result);
    }

    pub fn blend_func(&mut self, src: u32, dst: u32) {
        let result = self.fragment.set_blend_func(src, dst);
        self.mark(result);
    }

    pub fn logic_op(&mut self, op: u32) {
        let result = self.fragment.set_logic_op(op);
        self.mark(result);
    }

    pub fn cull_face(&mut self, mode: u32) {
        let result = self.fragment.set_cull_face(mode);
        self.mark(result);
    }

    pub fn front_face(&mut self, mode: u32) {
        let result = self.fragment.set_front_face(mode);
        self.mark(result);
    }

    pub fn depth_func(&mut self, func: u32) {
        let result = self.fragment.set_depth_func(func);
        self.mark(result);
    }

    pub fn depth_mask(&mut self, write: bool) {
        let flags = self.fragment.set_depth_mask(write);
        self.caps.mark_dirty(flags);
    }

    pub fn color_mask(&mut self, red: bool, green: bool, blue: bool, alpha: bool) {
        let flags = self.fragment.set_color_mask(red, green, blue, alpha);
        self.caps.mark_dirty(flags);
    }

    pub fn depth_range(&mut self, near: f32, far: f32) {
        let flags = self.fragment.set_depth_range(near, far);
        self.caps.mark_dirty(flags);
    }

    pub fn polygon_offset(&mut self, factor: f32, units: f32) {
        let flags = self.fragment.set_polygon_offset(factor, units);
        self.caps.mark_dirty(flags);
    }

    pub fn scissor(&mut self, x: i32, y: i32, width: i32, height: i32) {
        let result = self.fragment.set_scissor(x, y, width, height);
        self.mark(result);
    }

    pub fn stencil_func(&mut self, func: u32, reference: i32, mask: u32) {
        let result = self.fragment.set_stencil_func(func, reference, mask);
        self.mark(result);
    }

    pub fn stencil_mask(&mut self, mask: u32) {
        let flags = self.fragment.set_stencil_mask(mask);
        self.caps.mark_dirty(flags);
    }

    pub fn stencil_op(&mut self, fail: u32, depth_fail: u32, depth_pass: u32) {
        let result = self.fragment.set_stencil_op(fail, depth_fail, depth_pass);
        self.mark(result);
    }

    // -- Matrices -------------------------------------------------------

    pub fn matrix_mode(&mut self, mode: u32) {
        let result = self.matrices.set_mode(mode);
        self.check(result);
    }

    pub fn active_texture(&mut self, unit: u32) {
        let result = self.matrices.set_active_texture(unit);
        self.check(result);
    }

    fn matrix_changed(&mut self, result: Result<(), GlError>) {
        if self.check(result).is_some() {
            self.caps.mark_dirty(DirtyFlags::MATRIX);
        }
    }

    pub fn push_matrix(&mut self) {
        let result = self.matrices.current_mut().push();
        self.matrix_changed(result);
    }

    pub fn pop_matrix(&mut self) {
        let result = self.matrices.current_mut().pop();
        self.matrix_changed(result);
    }

    pub fn load_identity(&mut self) {
        self.matrices.current_mut().load_identity();
        self.matrix_changed(Ok(()));
    }

    /// Replace the current matrix with a column-major array.
    pub fn load_matrix(&mut self, m: &[f32; 16]) {
        self.matrices.current_mut().load(Mat4::from_cols_array(m));
        self.matrix_changed(Ok(()));
    }

    /// Right-multiply the current matrix by a column-major array.
    pub fn mult_matrix(&mut self, m: &[f32; 16]) {
        self.multiply(Ok(Mat4::from_cols_array(m)));
    }

    fn multiply(&mut self, m: Result<Mat4, GlError>) {
        let result = m.map(|m| self.matrices.current_mut().multiply(m));
        self.matrix_changed(result);
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.multiply(Ok(transform::translation(x, y, z)));
    }

    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.multiply(Ok(transform::scaling(x, y, z)));
    }

    pub fn rotate(&mut self, degrees: f32, x: f32, y: f32, z: f32) {
        self.multiply(transform::rotation(degrees, x, y, z));
    }

    pub fn ortho(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) {
        self.multiply(transform::ortho(left, right, bottom, top, near, far));
    }

    pub fn frustum(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) {
        self.multiply(transform::frustum(left, right, bottom, top, near, far));
    }

    /// Top of the stack selected by the current mode and texture unit.
    pub fn current_matrix(&self) -> Mat4 {
        self.matrices.current().top()
    }

    pub fn matrix(&self, mode: MatrixMode) -> Mat4 {
        self.matrices.stack(mode).top()
    }

    pub fn matrices(&self) -> &MatrixStacks {
        &self.matrices
    }

    // -- Textures -------------------------------------------------------

    /// Create a texture from row-major data. Returns `None` and latches
    /// the error on failure.
    pub fn create_texture(&mut self, placement: TexturePlacement, image: &TextureImage<'_>) -> Option<TextureId> {
        let result = self
            .textures
            .create(&self.tiling, &self.memory, placement, image);
        self.check(result)
    }

    /// Row-major contents of a texture.
    pub fn read_texture(&mut self, id: TextureId) -> Option<Vec<u8>> {
        let result = self.textures.read(&self.tiling, &self.memory, id);
        self.check(result)
    }

    pub fn delete_texture(&mut self, id: TextureId) {
        if !self.textures.delete(&self.memory, id) {
            log::debug!("delete of unknown texture {}", id);
        }
    }

    pub fn textures(&self) -> &TextureStore {
        &self.textures
    }
}

impl Drop for GlContext {
    fn drop(&mut self) {
        self.queue.wait_idle();
        self.textures.clear(&self.memory);
        log::debug!("GL context destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl;

    #[test]
    fn failed_calls_latch_the_first_error() {
        let mut ctx = GlContext::with_simulator(&ContextConfig::default());
        ctx.enable(0xFFFF);
        ctx.pop_matrix();
        assert_eq!(ctx.get_error(), gl::INVALID_ENUM);
        assert_eq!(ctx.get_error(), gl::NO_ERROR);
    }

    #[test]
    fn matrix_calls_mark_matrix_dirty() {
        let mut ctx = GlContext::with_simulator(&ContextConfig::default());
        ctx.clear_dirty(DirtyFlags::all());
        ctx.rotate(30.0, 0.0, 0.0, 0.0);
        assert!(ctx.dirty_flags().is_empty());
        assert_eq!(ctx.get_error(), gl::INVALID_VALUE);

        ctx.translate(1.0, 0.0, 0.0);
        assert_eq!(ctx.dirty_flags(), DirtyFlags::MATRIX);
        assert_eq!(
            ctx.matrix(MatrixMode::ModelView),
            Mat4::from_translation(glam::Vec3::X)
        );
    }
}
