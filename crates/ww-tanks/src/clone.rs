//! Duplication of a value into two tubes.

use ww_core::{WwError, WwResult};

use crate::traits::{PortValues, Signature, TankOp, input};

/// Copies `a` into tubes `a` and `b`. Registered as `Clone`.
///
/// The inverse requires both copies to agree.
#[derive(Debug, Clone)]
pub struct CloneTank {
    sig: Signature,
}

impl Default for CloneTank {
    fn default() -> Self {
        Self {
            sig: Signature::new("Clone", &["a"], &["a", "b"]),
        }
    }
}

impl TankOp for CloneTank {
    fn signature(&self) -> &Signature {
        &self.sig
    }

    fn pour(&self, slots: &PortValues) -> WwResult<PortValues> {
        let a = input(slots, "a")?;
        Ok(PortValues::from([
            ("a".to_string(), a.clone()),
            ("b".to_string(), a.clone()),
        ]))
    }

    fn pump(&self, tubes: &PortValues) -> WwResult<PortValues> {
        let a = input(tubes, "a")?;
        let b = input(tubes, "b")?;
        if a != b {
            return Err(WwError::value("the two copies of a clone differ"));
        }
        Ok(PortValues::from([("a".to_string(), a.clone())]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ww_core::Value;

    #[test]
    fn copies_and_restores() {
        let op = CloneTank::default();
        let slots = PortValues::from([("a".to_string(), Value::from(vec![f64::NAN, 1.0]))]);
        let tubes = op.pour(&slots).unwrap();
        assert_eq!(tubes["a"], tubes["b"]);
        assert_eq!(op.pump(&tubes).unwrap(), slots);
    }

    #[test]
    fn diverging_copies_rejected() {
        let op = CloneTank::default();
        let tubes = PortValues::from([
            ("a".to_string(), Value::Int(1)),
            ("b".to_string(), Value::Int(2)),
        ]);
        assert!(matches!(op.pump(&tubes), Err(WwError::Value { .. })));
    }
}
