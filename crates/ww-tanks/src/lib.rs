//! ww-tanks: reversible operations for waterworks.
//!
//! Provides:
//! - The operation contract (`TankOp`, `Signature`, `PortValues`)
//! - A registry mapping type names to operations, including closure-backed tanks
//! - Built-in sample tanks covering arithmetic, reductions, splitting and masking
//!
//! Every tank is a pair of pure functions: `pour` maps slot values to tube
//! values and `pump` maps them back. Information `pour` discards travels
//! through extra tubes so that `pump` recovers the inputs exactly.
//!
//! # Example
//!
//! ```
//! use ww_core::Value;
//! use ww_tanks::{PortValues, Registry};
//!
//! let registry = Registry::with_builtins();
//! let add = registry.get("Add").unwrap();
//!
//! let mut slots = PortValues::new();
//! slots.insert("a".into(), Value::from(vec![1, 2, 3]));
//! slots.insert("b".into(), Value::from(vec![3, 4, 5]));
//!
//! let tubes = add.pour(&slots).unwrap();
//! assert_eq!(tubes["target"], Value::from(vec![4, 6, 8]));
//! assert_eq!(add.pump(&tubes).unwrap(), slots);
//! ```

pub mod arith;
pub mod clone;
pub mod concat;
pub mod div;
pub mod isnan;
pub mod reduce;
pub mod registry;
pub mod replace;
pub mod split;
pub mod traits;

pub use arith::{Add, Mul, Sub};
pub use clone::CloneTank;
pub use concat::Concat;
pub use div::Div;
pub use isnan::IsNan;
pub use reduce::{Max, Min};
pub use registry::{FnTank, Registry};
pub use replace::Replace;
pub use split::Split;
pub use traits::{PortValues, Signature, TankOp, checked_pour, checked_pump, input};
