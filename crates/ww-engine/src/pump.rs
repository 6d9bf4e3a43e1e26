//! Inverse evaluation: taps back to funnels.

use std::collections::BTreeSet;

use tracing::{debug, trace};
use ww_core::{Key, KeyStyle, PortId, Value, WwError};
use ww_graph::Waterwork;
use ww_tanks::{PortValues, checked_pump};

use crate::error::{FlowError, FlowResult};
use crate::pour::port_key;
use crate::state::{FlowState, Outputs};

/// Run the waterwork backwards from a complete set of tap values.
///
/// Every tap must be supplied. The result holds exactly the funnels.
pub fn pump<I, K>(ww: &Waterwork, values: I, style: KeyStyle) -> FlowResult<Outputs>
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<Key>,
{
    let mut state = FlowState::new(ww.ports().len());
    let mut seen = BTreeSet::new();

    for (key, value) in values {
        let key = key.into();
        let id = tap_id(ww, &key)?;
        if !seen.insert(id) {
            return Err(FlowError::Reversal {
                what: format!("tap {} supplied twice", port_key(ww, id)),
            });
        }
        state.set(id, Some(value));
    }
    let missing: Vec<String> = ww
        .tap_ids()
        .iter()
        .filter(|id| !seen.contains(*id))
        .map(|&id| port_key(ww, id).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(FlowError::Reversal {
            what: format!("missing taps {}", missing.join(", ")),
        });
    }
    debug!(taps = seen.len(), "pump");

    for &tank_id in ww.order().iter().rev() {
        let Some(tank) = ww.tank_at(tank_id) else {
            continue;
        };

        let mut tubes = PortValues::new();
        for &tube in &tank.tubes {
            let value = if ww.is_tap(tube) {
                state.take(tube)
            } else {
                recovered(ww, &state, tube)?
            };
            let value = value.ok_or(WwError::Invariant {
                what: "tube has no value during pump",
            })?;
            tubes.insert(port_key(ww, tube).name.clone(), value);
        }

        trace!(tank = %tank.key, "pump");
        let mut slots = checked_pump(tank.op(), &tank.key.to_string(), &tubes)?;
        for &slot in &tank.slots {
            state.set(slot, slots.remove(&port_key(ww, slot).name));
        }
    }

    let mut funnels = Outputs::new();
    for &funnel in ww.funnel_ids() {
        let key = port_key(ww, funnel);
        let value = state.take(funnel).ok_or(WwError::Invariant {
            what: "funnel not recovered by pump",
        })?;
        funnels.insert(key.styled(style), value);
    }
    debug!(funnels = funnels.len(), "pumped");
    Ok(funnels)
}

fn tap_id(ww: &Waterwork, key: &Key) -> FlowResult<PortId> {
    let not_a_tap = || FlowError::Reversal {
        what: format!("{key} is not a tap"),
    };
    let id = ww
        .port_index()
        .resolve(key)
        .map_err(|_| not_a_tap())?
        .ok_or_else(not_a_tap)?;
    if !ww.is_tap(id) {
        return Err(not_a_tap());
    }
    Ok(id)
}

/// Value of an inner tube, read back from the slots it feeds. Copies sent
/// to several slots must agree.
fn recovered(ww: &Waterwork, state: &FlowState, tube: PortId) -> FlowResult<Option<Value>> {
    let mut copies = ww.consumers_of(tube).iter().map(|&slot| state.get(slot));
    let Some(first) = copies.next().flatten() else {
        return Ok(None);
    };
    for copy in copies {
        if copy != Some(first) {
            return Err(FlowError::Reversal {
                what: format!("inconsistent values recovered for {}", port_key(ww, tube)),
            });
        }
    }
    Ok(Some(first.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ww_graph::SlotInput;
    use ww_tanks::Registry;

    fn fan_out() -> Waterwork {
        // one tube feeding both slots of an Add
        let registry = Registry::with_builtins();
        Waterwork::build(&registry, |b| {
            let c = b.add_tank("Clone", [("a", SlotInput::from(vec![1, 2]))])?;
            let add = b.add_tank("Add", [("a", SlotInput::from(c.tube("a")))])?;
            b.connect(&c.tube("a"), &add.slot("b"))?;
            Ok(())
        })
        .unwrap()
    }

    #[test]
    fn fan_out_round_trip() {
        let ww = fan_out();
        let taps = crate::pour(&ww, Vec::<(Key, Value)>::new(), KeyStyle::Path).unwrap();
        assert_eq!(taps[&Key::from("Add_0/tubes/target")], Value::from(vec![2, 4]));

        let funnels = pump(&ww, taps, KeyStyle::Path).unwrap();
        assert_eq!(funnels.len(), 1);
        assert_eq!(funnels[&Key::from("Clone_0/slots/a")], Value::from(vec![1, 2]));
    }

    #[test]
    fn fan_out_disagreement() {
        let ww = fan_out();
        let mut taps = crate::pour(&ww, Vec::<(Key, Value)>::new(), KeyStyle::Path).unwrap();
        // recovered a becomes [2, 2] while b stays [1, 2]
        taps.insert(Key::from("Add_0/tubes/target"), Value::from(vec![3, 4]));
        let err = pump(&ww, taps, KeyStyle::Path).unwrap_err();
        assert!(matches!(err, FlowError::Reversal { .. }));
    }

    #[test]
    fn rejects_bad_tap_sets() {
        let ww = fan_out();
        let taps = crate::pour(&ww, Vec::<(Key, Value)>::new(), KeyStyle::Path).unwrap();

        let mut missing = taps.clone();
        missing.remove(&Key::from("Clone_0/tubes/b"));
        assert!(matches!(
            pump(&ww, missing, KeyStyle::Path),
            Err(FlowError::Reversal { .. })
        ));

        let mut extra = taps.clone();
        extra.insert(Key::from("Clone_0/slots/a"), Value::Int(0));
        assert!(matches!(
            pump(&ww, extra, KeyStyle::Path),
            Err(FlowError::Reversal { .. })
        ));

        let mut twice: Vec<(Key, Value)> = taps.into_iter().collect();
        let first = twice[0].clone();
        twice.push(first);
        assert!(matches!(
            pump(&ww, twice, KeyStyle::Path),
            Err(FlowError::Reversal { .. })
        ));
    }
}
