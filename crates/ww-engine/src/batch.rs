//! Many independent evaluations against one frozen waterwork.

use rayon::prelude::*;
use ww_core::{Key, KeyStyle, Value};
use ww_graph::Waterwork;

use crate::error::FlowResult;
use crate::state::Outputs;
use crate::{pour, pump};

/// One input map of a batch.
pub type Inputs = Vec<(Key, Value)>;

/// Pour every input map in parallel. Results keep the order of `batch`.
pub fn pour_batch(ww: &Waterwork, batch: Vec<Inputs>, style: KeyStyle) -> Vec<FlowResult<Outputs>> {
    batch
        .into_par_iter()
        .map(|inputs| pour(ww, inputs, style))
        .collect()
}

/// Pump every tap map in parallel. Results keep the order of `batch`.
pub fn pump_batch(ww: &Waterwork, batch: Vec<Inputs>, style: KeyStyle) -> Vec<FlowResult<Outputs>> {
    batch
        .into_par_iter()
        .map(|taps| pump(ww, taps, style))
        .collect()
}
