pub mod engine;
pub mod format;
pub mod tiling;

pub use engine::{TilePath, TilingEngine, TilingRequest};
pub use format::{tokens, TexelFormat};
pub use tiling::{flip_rows, morton_index, swizzle, Direction, MORTON_TABLE, TILE_SIZE};
