//! End-to-end pour/pump scenarios.

use std::collections::BTreeMap;

use proptest::prelude::*;
use ww_core::{Fill, Key, KeyStyle, PortKey, Value};
use ww_engine::{Flow, FlowError, Outputs};
use ww_graph::{SlotInput, Waterwork};
use ww_tanks::Registry;

fn path_map(pairs: &[(&str, Value)]) -> Outputs {
    pairs
        .iter()
        .map(|(k, v)| (Key::from(*k), v.clone()))
        .collect()
}

fn no_inputs() -> Vec<(Key, Value)> {
    Vec::new()
}

/// `mul(add(a, b), [2, 2, 2])`
fn scale(a: SlotInput, b: SlotInput) -> Waterwork {
    let registry = Registry::with_builtins();
    Waterwork::build(&registry, |w| {
        let add = w.add_tank("Add", [("a", a), ("b", b)])?;
        w.add_tank(
            "Mul",
            [("a", SlotInput::from(add.tube("target"))), ("b", vec![2, 2, 2].into())],
        )?;
        Ok(())
    })
    .unwrap()
}

#[test]
fn fully_concrete_graph() {
    let ww = scale(vec![1, 2, 3].into(), vec![3, 4, 5].into());
    let taps = ww.pour(no_inputs(), KeyStyle::Path).unwrap();
    assert_eq!(
        taps,
        path_map(&[
            ("Add_0/tubes/a_is_smaller", Value::Bool(false)),
            ("Add_0/tubes/smaller_size_array", Value::from(vec![3, 4, 5])),
            ("Mul_0/tubes/a_is_smaller", Value::Bool(false)),
            ("Mul_0/tubes/missing_vals", Value::from(Vec::<i64>::new())),
            ("Mul_0/tubes/smaller_size_array", Value::from(vec![2, 2, 2])),
            ("Mul_0/tubes/target", Value::from(vec![8, 12, 16])),
        ])
    );

    let funnels = ww.pump(taps, KeyStyle::Path).unwrap();
    assert_eq!(
        funnels,
        path_map(&[
            ("Add_0/slots/a", Value::from(vec![1, 2, 3])),
            ("Add_0/slots/b", Value::from(vec![3, 4, 5])),
            ("Mul_0/slots/b", Value::from(vec![2, 2, 2])),
        ])
    );
}

#[test]
fn deferred_funnel_is_reused() {
    let ww = scale(vec![1, 2, 3].into(), Fill::Empty.into());
    let target = Key::from("Mul_0/tubes/target");

    let first = ww
        .pour([("Add_0/slots/b", Value::from(vec![3, 4, 5]))], KeyStyle::Path)
        .unwrap();
    assert_eq!(first[&target], Value::from(vec![8, 12, 16]));

    let second = ww
        .pour([("Add_0/slots/b", Value::from(vec![5, 6, 7]))], KeyStyle::Path)
        .unwrap();
    assert_eq!(second[&target], Value::from(vec![12, 16, 20]));

    let funnels = ww.pump(second, KeyStyle::Path).unwrap();
    assert_eq!(funnels[&Key::from("Add_0/slots/b")], Value::from(vec![5, 6, 7]));
}

#[test]
fn pump_with_missing_tap_fails() {
    let ww = scale(vec![1, 2, 3].into(), vec![3, 4, 5].into());
    let mut taps = ww.pour(no_inputs(), KeyStyle::Path).unwrap();
    taps.remove(&Key::from("Mul_0/tubes/missing_vals"));
    let err = ww.pump(taps, KeyStyle::Path).unwrap_err();
    assert!(matches!(err, FlowError::Reversal { .. }));
}

#[test]
fn partial_pour_omits_unreachable_taps() {
    let ww = scale(vec![1, 2, 3].into(), Fill::Empty.into());
    let report = ww.pour_report(no_inputs(), KeyStyle::Path).unwrap();
    assert!(report.taps.is_empty());
    let absent: Vec<String> = report.absent.iter().map(|k| k.to_string()).collect();
    assert!(absent.contains(&"Mul_0/tubes/target".to_string()));
    assert_eq!(absent.len(), 6);
}

#[test]
fn unset_funnel_must_be_supplied() {
    let registry = Registry::with_builtins();
    let ww = Waterwork::build(&registry, |w| {
        w.add_tank("Add", [("a", SlotInput::from(1))])?;
        Ok(())
    })
    .unwrap();

    let err = ww.pour(no_inputs(), KeyStyle::Path).unwrap_err();
    assert_eq!(
        err,
        FlowError::MissingInput {
            key: "Add_0/slots/b".parse().unwrap()
        }
    );

    let taps = ww.pour([("Add_0/slots/b", Value::Int(2))], KeyStyle::Path).unwrap();
    assert_eq!(taps[&Key::from("Add_0/tubes/target")], Value::Int(3));
}

#[test]
fn eager_and_lazy_builds_agree() {
    let eager = scale(vec![1, 2, 3].into(), vec![3, 4, 5].into());
    let lazy = scale(Fill::Empty.into(), Fill::Empty.into());

    let inputs = [
        ("Add_0/slots/a", Value::from(vec![1, 2, 3])),
        ("Add_0/slots/b", Value::from(vec![3, 4, 5])),
    ];
    let from_eager = eager.pour(no_inputs(), KeyStyle::Path).unwrap();
    let from_lazy = lazy.pour(inputs, KeyStyle::Path).unwrap();
    assert_eq!(from_eager, from_lazy);
}

#[test]
fn repeated_calls_are_identical() {
    let registry = Registry::with_builtins();
    let ww = Waterwork::build(&registry, |w| {
        w.add_tank("Sub", [("a", SlotInput::from(vec![1.5, -2.0, f64::NAN])), ("b", Fill::Empty.into())])?;
        Ok(())
    })
    .unwrap();
    let inputs = || [("Sub_0/slots/b", Value::from(vec![0.5, 0.25, 3.25]))];

    let first = ww.pour(inputs(), KeyStyle::Path).unwrap();
    let second = ww.pour(inputs(), KeyStyle::Path).unwrap();
    assert_eq!(first, second);

    let back = ww.pump(first.clone(), KeyStyle::Path).unwrap();
    assert_eq!(back, ww.pump(second, KeyStyle::Path).unwrap());
    assert_eq!(back[&Key::from("Sub_0/slots/b")], Value::from(vec![0.5, 0.25, 3.25]));
    assert_eq!(back[&Key::from("Sub_0/slots/a")], Value::from(vec![1.5, -2.0, f64::NAN]));
}

/// `mul(sub(a, b), c)` over floats, with a zero in `c` and a NaN in `a`.
fn float_chain() -> Waterwork {
    let registry = Registry::with_builtins();
    Waterwork::build(&registry, |w| {
        let sub = w.add_tank("Sub", [("a", Fill::Empty.into()), ("b", SlotInput::from(0.75))])?;
        w.add_tank(
            "Mul",
            [("a", SlotInput::from(sub.tube("target"))), ("b", Fill::Empty.into())],
        )?;
        Ok(())
    })
    .unwrap()
}

#[test]
fn float_chain_pumps_back_bit_for_bit() {
    let ww = float_chain();
    let a = Value::from(vec![1.25, f64::NAN, -3.5, f64::INFINITY]);
    let c = Value::from(vec![4.0, 2.0, 0.0, 0.5]);
    let taps = ww
        .pour(
            [("Sub_0/slots/a", a.clone()), ("Mul_0/slots/b", c.clone())],
            KeyStyle::Path,
        )
        .unwrap();
    assert_eq!(
        taps[&Key::from("Mul_0/tubes/target")],
        Value::from(vec![2.0, f64::NAN, 0.0, f64::INFINITY])
    );
    assert_eq!(taps[&Key::from("Mul_0/tubes/missing_vals")], Value::from(vec![-4.25]));

    let funnels = ww.pump(taps, KeyStyle::Path).unwrap();
    assert_eq!(
        funnels,
        path_map(&[
            ("Mul_0/slots/b", c),
            ("Sub_0/slots/a", a),
            ("Sub_0/slots/b", Value::Float(0.75)),
        ])
    );
}

#[test]
fn float_chain_refuses_rounding_inputs() {
    let ww = float_chain();
    // 0.1 - 0.75 + 0.75 != 0.1
    let err = ww
        .pour(
            [("Sub_0/slots/a", Value::from(vec![0.1])), ("Mul_0/slots/b", Value::from(vec![1.0]))],
            KeyStyle::Path,
        )
        .unwrap_err();
    assert!(matches!(err, FlowError::Value(_)));

    // 1e308 * 10 overflows
    let err = ww
        .pour(
            [("Sub_0/slots/a", Value::from(vec![1e308])), ("Mul_0/slots/b", Value::from(vec![10.0]))],
            KeyStyle::Path,
        )
        .unwrap_err();
    assert!(matches!(err, FlowError::Value(_)));
}

#[test]
fn key_styles_are_interchangeable() {
    let ww = scale(vec![1, 2, 3].into(), Fill::Empty.into());
    let b: PortKey = "Add_0/slots/b".parse().unwrap();

    let by_path = ww
        .pour([("Add_0/slots/b", Value::from(vec![3, 4, 5]))], KeyStyle::Path)
        .unwrap();
    let by_handle = ww
        .pour([(b.clone(), Value::from(vec![3, 4, 5]))], KeyStyle::Handle)
        .unwrap();

    assert!(by_handle.keys().all(|k| matches!(k, Key::Handle(_))));
    let normalized: Outputs = by_handle
        .into_iter()
        .map(|(k, v)| (k.resolve().unwrap().styled(KeyStyle::Path), v))
        .collect();
    assert_eq!(by_path, normalized);

    // pump accepts handle keys and answers in the requested style
    let funnels = ww.pump(by_path, KeyStyle::Handle).unwrap();
    assert_eq!(funnels[&Key::from(b)], Value::from(vec![3, 4, 5]));
}

#[test]
fn split_concat_pipeline() {
    let registry = Registry::with_builtins();
    let ww = Waterwork::build(&registry, |w| {
        let split = w.add_tank(
            "Split",
            [
                ("a", SlotInput::from(vec![1, 2, 3, 4, 5])),
                ("indices", vec![2].into()),
                ("axis", 0.into()),
            ],
        )?;
        w.add_tank(
            "Concat",
            [("a", SlotInput::from(split.tube("target"))), ("axis", 0.into())],
        )?;
        Ok(())
    })
    .unwrap();

    let taps = ww.pour(no_inputs(), KeyStyle::Path).unwrap();
    assert_eq!(taps[&Key::from("Concat_0/tubes/target")], Value::from(vec![1, 2, 3, 4, 5]));
    let funnels = ww.pump(taps, KeyStyle::Path).unwrap();
    assert_eq!(funnels[&Key::from("Split_0/slots/a")], Value::from(vec![1, 2, 3, 4, 5]));
}

#[derive(Debug, Clone)]
enum Step {
    Add(i64),
    Sub(i64),
    Mul(i64),
    Clone,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (-5i64..5).prop_map(Step::Add),
        (-5i64..5).prop_map(Step::Sub),
        (-3i64..4).prop_map(Step::Mul),
        Just(Step::Clone),
    ]
}

proptest! {
    #[test]
    fn chains_pump_back_what_they_pour(
        start in prop::collection::vec(-20i64..20, 3),
        steps in prop::collection::vec((step(), any::<bool>()), 1..7),
    ) {
        let registry = Registry::with_builtins();
        let (ww, (assignment, supplied)) = Waterwork::build_with(&registry, |w| {
            let first = w.add_tank("Clone", [("a", SlotInput::from(start.clone()))])?;
            let mut assignment = vec![(first.slot("a"), Value::from(start.clone()))];
            let mut supplied = Vec::new();
            let mut current = first.tube("a");

            for (step, eager) in &steps {
                let (type_name, operand) = match *step {
                    Step::Add(x) => ("Add", x),
                    Step::Sub(x) => ("Sub", x),
                    Step::Mul(x) => ("Mul", x),
                    Step::Clone => {
                        let c = w.add_tank("Clone", [("a", SlotInput::from(current))])?;
                        current = c.tube("a");
                        continue;
                    }
                };
                let fill = if *eager { SlotInput::from(operand) } else { Fill::Empty.into() };
                let tank = w.add_tank(type_name, [("a", SlotInput::from(current)), ("b", fill)])?;
                assignment.push((tank.slot("b"), Value::Int(operand)));
                if !eager {
                    supplied.push((tank.slot("b"), Value::Int(operand)));
                }
                current = tank.tube("target");
            }
            Ok((assignment, supplied))
        })
        .unwrap();

        let taps = ww.pour(supplied, KeyStyle::Handle).unwrap();
        prop_assert_eq!(taps.len(), ww.taps().len());

        let funnels = ww.pump(taps, KeyStyle::Path).unwrap();
        let expected: BTreeMap<Key, Value> = assignment
            .into_iter()
            .map(|(k, v)| (k.styled(KeyStyle::Path), v))
            .collect();
        prop_assert_eq!(funnels, expected);
    }
}
