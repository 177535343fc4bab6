//! picagl-runtime
//!
//! GL-style front end over [`picagl_core`]: capability and fragment state
//! with dirty tracking, the five matrix stacks, texture objects and the GL
//! error latch, all owned by an explicit [`GlContext`].
//!
//! # Example
//!
//! ```rust,no_run
//! use picagl_runtime::{gl, ContextConfig, GlContext};
//!
//! let mut ctx = GlContext::with_simulator(&ContextConfig::default());
//! ctx.enable(gl::DEPTH_TEST);
//! ctx.matrix_mode(gl::PROJECTION);
//! ctx.ortho(0.0, 400.0, 0.0, 240.0, -1.0, 1.0);
//! assert_eq!(ctx.get_error(), gl::NO_ERROR);
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod gl;
pub mod matrix;
pub mod state;
pub mod texture;

pub use config::ContextConfig;
pub use context::GlContext;
pub use error::{ErrorLatch, GlError};
pub use matrix::{MatrixMode, MatrixStack, MatrixStacks};
pub use state::{CapabilityState, DirtyFlags, FragmentState};
pub use texture::{Texture, TextureId, TextureImage, TexturePlacement};
