#[macro_use]
pub mod macros;
pub mod float_ext;
pub mod key_index_vec;
pub mod log_setup;
pub mod timestamp;

pub use float_ext::{FloatExt, Vec2Ext};
pub use key_index_vec::{KeyIndexKey, KeyIndexVec};

/// Tolerance used for canvas-space float comparisons.
pub const EPSILON: f32 = 1e-3;

pub type Result<T> = anyhow::Result<T>;

pub fn is_debug() -> bool {
    cfg!(debug_assertions)
}
