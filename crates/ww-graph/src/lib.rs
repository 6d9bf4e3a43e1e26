//! ww-graph: graph layer for waterworks.
//!
//! Provides:
//! - Port model: tanks own named slots (inputs) and tubes (outputs)
//! - Incremental builder with eager evaluation and cycle checks
//! - The frozen, shareable `Waterwork`
//! - Key-to-id indexing for the evaluation engine
//!
//! # Example
//!
//! ```
//! use ww_core::{Fill, Value};
//! use ww_graph::{SlotInput, Waterwork};
//! use ww_tanks::Registry;
//!
//! let registry = Registry::with_builtins();
//! let ww = Waterwork::build(&registry, |b| {
//!     let add = b.add_tank("Add", [
//!         ("a", SlotInput::from(vec![1, 2, 3])),
//!         ("b", Fill::Empty.into()),
//!     ])?;
//!     b.add_tank("Mul", [
//!         ("a", SlotInput::from(add.tube("target"))),
//!         ("b", vec![2, 2, 2].into()),
//!     ])?;
//!     Ok(())
//! })
//! .unwrap();
//!
//! assert_eq!(ww.tanks().len(), 2);
//! assert_eq!(ww.funnels().len(), 3);
//! assert_eq!(ww.taps().len(), 6);
//! ```

pub mod builder;
pub mod error;
pub mod graph;
pub mod indexing;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::{SlotInput, WaterworkBuilder};
pub use error::{GraphError, GraphResult};
pub use graph::{Port, Tank, Waterwork};
pub use indexing::PortIndex;
