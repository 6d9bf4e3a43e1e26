//! ww-engine: forward and inverse evaluation of frozen waterworks.
//!
//! Both directions keep their working values in a call-local state, so a
//! `Waterwork` can be shared between threads and evaluated concurrently.
//!
//! ```
//! use ww_core::{Fill, Key, KeyStyle, Value};
//! use ww_engine::Flow;
//! use ww_graph::{SlotInput, Waterwork};
//! use ww_tanks::Registry;
//!
//! let registry = Registry::with_builtins();
//! let ww = Waterwork::build(&registry, |b| {
//!     let add = b.add_tank("Add", [("a", SlotInput::from(vec![1, 2, 3])), ("b", Fill::Empty.into())])?;
//!     b.add_tank("Mul", [("a", SlotInput::from(add.tube("target"))), ("b", vec![2, 2, 2].into())])?;
//!     Ok(())
//! })
//! .unwrap();
//!
//! let taps = ww.pour([("Add_0/slots/b", Value::from(vec![3, 4, 5]))], KeyStyle::Path).unwrap();
//! assert_eq!(taps[&Key::from("Mul_0/tubes/target")], Value::from(vec![8, 12, 16]));
//!
//! let funnels = ww.pump(taps, KeyStyle::Path).unwrap();
//! assert_eq!(funnels[&Key::from("Add_0/slots/b")], Value::from(vec![3, 4, 5]));
//! ```

pub mod batch;
pub mod error;
mod flow;
pub mod pour;
pub mod pump;
mod state;

pub use batch::{Inputs, pour_batch, pump_batch};
pub use error::{FlowError, FlowResult};
pub use flow::Flow;
pub use pour::{PourReport, pour, pour_report};
pub use pump::pump;
pub use state::Outputs;
