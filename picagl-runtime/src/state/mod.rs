//! Fixed-function pipeline state read by the command-list builder.

pub mod capability;
pub mod fragment;

pub use capability::{Capability, CapabilityState, DirtyFlags, FragmentOp};
pub use fragment::{FragmentState, ScissorBox, StencilState};
