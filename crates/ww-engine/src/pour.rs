//! Forward evaluation: funnels to taps.

use tracing::{debug, trace};
use ww_core::{Fill, Key, KeyStyle, PortId, PortKey, Value};
use ww_graph::Waterwork;
use ww_tanks::{PortValues, checked_pour};

use crate::error::{FlowError, FlowResult};
use crate::state::{FlowState, Outputs};

/// Result of a pour, including the taps that could not be computed.
#[derive(Debug, Clone, PartialEq)]
pub struct PourReport {
    pub taps: Outputs,
    /// Taps left unresolved because an upstream funnel was empty.
    pub absent: Vec<PortKey>,
}

/// Run the waterwork forward.
///
/// Supplied values override build-time fills. Taps downstream of an empty
/// funnel are left out of the result.
pub fn pour<I, K>(ww: &Waterwork, values: I, style: KeyStyle) -> FlowResult<Outputs>
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<Key>,
{
    pour_report(ww, values, style).map(|report| report.taps)
}

/// Like [`pour`], also listing the taps that were absent.
pub fn pour_report<I, K>(ww: &Waterwork, values: I, style: KeyStyle) -> FlowResult<PourReport>
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<Key>,
{
    let ports = ww.ports().len();
    let mut state = FlowState::new(ports);
    let mut supplied = vec![false; ports];

    for (key, value) in values {
        let id = funnel_id(ww, key.into())?;
        state.set(id, Some(value));
        supplied[id.slot()] = true;
    }
    debug!(supplied = supplied.iter().filter(|s| **s).count(), "pour");

    for &funnel in ww.funnel_ids() {
        if supplied[funnel.slot()] {
            continue;
        }
        match ww.fill_of(funnel) {
            Some(Fill::Value(value)) => state.set(funnel, Some(value.clone())),
            Some(Fill::Empty) => {}
            None => {
                return Err(FlowError::MissingInput {
                    key: port_key(ww, funnel).clone(),
                });
            }
        }
    }

    // Tanks whose outputs may differ from the build-time values.
    let mut changed = vec![false; ww.tanks().len()];
    for &tank_id in ww.order() {
        let Some(tank) = ww.tank_at(tank_id) else {
            continue;
        };

        let mut inputs = PortValues::new();
        let mut complete = true;
        let mut dirty = false;
        for &slot in &tank.slots {
            match ww.producer_of(slot) {
                Some(tube) => {
                    let upstream = ww.port(tube).map(|p| p.tank);
                    dirty |= upstream.is_some_and(|t| changed[t.slot()]);
                    let value = state.get(tube).cloned();
                    state.set(slot, value);
                }
                None => dirty |= supplied[slot.slot()],
            }
            match state.get(slot) {
                Some(value) => {
                    inputs.insert(port_key(ww, slot).name.clone(), value.clone());
                }
                None => complete = false,
            }
        }
        if !complete {
            trace!(tank = %tank.key, "skipped, input unresolved");
            continue;
        }

        let cached: Option<Vec<&Value>> = tank.tubes.iter().map(|&t| ww.build_value_of(t)).collect();
        if let (false, Some(cached)) = (dirty, cached) {
            for (&tube, value) in tank.tubes.iter().zip(cached) {
                state.set(tube, Some(value.clone()));
            }
            trace!(tank = %tank.key, "reused build values");
            continue;
        }

        trace!(tank = %tank.key, "pour");
        changed[tank_id.slot()] = true;
        let mut outputs = checked_pour(tank.op(), &tank.key.to_string(), &inputs)?;
        for &tube in &tank.tubes {
            state.set(tube, outputs.remove(&port_key(ww, tube).name));
        }
    }

    let mut taps = Outputs::new();
    let mut absent = Vec::new();
    for &tap in ww.tap_ids() {
        let key = port_key(ww, tap);
        match state.take(tap) {
            Some(value) => {
                taps.insert(key.styled(style), value);
            }
            None => absent.push(key.clone()),
        }
    }
    debug!(taps = taps.len(), absent = absent.len(), "poured");
    Ok(PourReport { taps, absent })
}

fn funnel_id(ww: &Waterwork, key: Key) -> FlowResult<PortId> {
    let id = ww
        .port_index()
        .resolve(&key)?
        .ok_or_else(|| FlowError::UnknownKey { key: key.to_string() })?;
    if !ww.is_funnel(id) {
        return Err(FlowError::NotAFunnel { key: key.to_string() });
    }
    Ok(id)
}

/// Key of a port id taken from the frozen graph itself.
pub(crate) fn port_key(ww: &Waterwork, id: PortId) -> &PortKey {
    &ww.ports()[id.slot()].key
}

#[cfg(test)]
mod tests {
    use super::*;
    use ww_graph::SlotInput;
    use ww_tanks::Registry;

    fn scale(b_fill: SlotInput) -> Waterwork {
        let registry = Registry::with_builtins();
        Waterwork::build(&registry, |b| {
            let add = b.add_tank("Add", [("a", SlotInput::from(vec![1, 2, 3])), ("b", b_fill)])?;
            b.add_tank(
                "Mul",
                [("a", SlotInput::from(add.tube("target"))), ("b", vec![2, 2, 2].into())],
            )?;
            Ok(())
        })
        .unwrap()
    }

    #[test]
    fn override_recomputes_downstream() {
        let ww = scale(vec![3, 4, 5].into());
        let out = pour(&ww, [("Add_0/slots/b", Value::from(vec![0, 0, 0]))], KeyStyle::Path).unwrap();
        assert_eq!(
            out[&Key::from("Mul_0/tubes/target")],
            Value::from(vec![2, 4, 6])
        );
        // graph keeps its eager values
        assert_eq!(
            ww.build_value(&"Mul_0/tubes/target".parse().unwrap()),
            Some(&Value::from(vec![8, 12, 16]))
        );
    }

    #[test]
    fn empty_funnel_reports_absent_taps() {
        let ww = scale(Fill::Empty.into());
        let report = pour_report(&ww, Vec::<(Key, Value)>::new(), KeyStyle::Path).unwrap();
        assert!(report.taps.is_empty());
        assert_eq!(report.absent.len(), 6);
    }

    #[test]
    fn key_errors() {
        let ww = scale(Fill::Empty.into());
        let err = pour(&ww, [("Add_0/slots/c", Value::Int(1))], KeyStyle::Path).unwrap_err();
        assert!(matches!(err, FlowError::UnknownKey { .. }));

        let err = pour(&ww, [("Mul_0/slots/a", Value::Int(1))], KeyStyle::Path).unwrap_err();
        assert!(matches!(err, FlowError::NotAFunnel { .. }));

        let err = pour(&ww, [("Add_0/tubes/target", Value::Int(1))], KeyStyle::Path).unwrap_err();
        assert!(matches!(err, FlowError::NotAFunnel { .. }));

        let err = pour(&ww, [("nonsense", Value::Int(1))], KeyStyle::Path).unwrap_err();
        assert!(matches!(err, FlowError::Value(_)));
    }
}
