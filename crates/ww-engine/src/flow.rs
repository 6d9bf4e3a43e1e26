//! Pour and pump as methods on a frozen waterwork.

use ww_core::{Key, KeyStyle, Value};
use ww_graph::Waterwork;

use crate::error::FlowResult;
use crate::pour::PourReport;
use crate::state::Outputs;

/// Pour and pump as methods on a frozen waterwork.
pub trait Flow {
    fn pour<I, K>(&self, values: I, style: KeyStyle) -> FlowResult<Outputs>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<Key>;

    fn pour_report<I, K>(&self, values: I, style: KeyStyle) -> FlowResult<PourReport>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<Key>;

    fn pump<I, K>(&self, values: I, style: KeyStyle) -> FlowResult<Outputs>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<Key>;
}

impl Flow for Waterwork {
    fn pour<I, K>(&self, values: I, style: KeyStyle) -> FlowResult<Outputs>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<Key>,
    {
        crate::pour(self, values, style)
    }

    fn pour_report<I, K>(&self, values: I, style: KeyStyle) -> FlowResult<PourReport>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<Key>,
    {
        crate::pour_report(self, values, style)
    }

    fn pump<I, K>(&self, values: I, style: KeyStyle) -> FlowResult<Outputs>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<Key>,
    {
        crate::pump(self, values, style)
    }
}
