//! ww-core: stable foundation for waterworks.
//!
//! Contains:
//! - ids (stable compact IDs for tanks and ports)
//! - error (shared error types)
//! - value (payloads flowing along ports, plus the `Fill` sentinel)
//! - array (small n-dimensional array with broadcasting)
//! - keys (path and handle addressing of ports)
//! - numeric (tolerances + float helpers)

pub mod array;
pub mod error;
pub mod ids;
pub mod keys;
pub mod numeric;
pub mod value;

// Re-exports: nice ergonomics for downstream crates
pub use array::{Array, ArrayData, DType, broadcast_shape};
pub use error::{WwError, WwResult};
pub use ids::*;
pub use keys::{Key, KeyStyle, PortKey, PortKind, TankKey};
pub use numeric::*;
pub use value::{Fill, Value};
