//! The operation contract every tank type implements.

use std::collections::{BTreeMap, BTreeSet};

use ww_core::{Value, WwError, WwResult};

/// Values keyed by port name: slot values going into `pour`, tube values
/// going into `pump`.
pub type PortValues = BTreeMap<String, Value>;

/// Type name plus the ordered slot and tube names of a tank type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    type_name: String,
    slots: Vec<String>,
    tubes: Vec<String>,
}

impl Signature {
    /// Create a signature. Checked by [`Signature::validate`] when registered.
    pub fn new(type_name: impl Into<String>, slots: &[&str], tubes: &[&str]) -> Self {
        Self {
            type_name: type_name.into(),
            slots: slots.iter().map(|s| s.to_string()).collect(),
            tubes: tubes.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn slots(&self) -> &[String] {
        &self.slots
    }

    pub fn tubes(&self) -> &[String] {
        &self.tubes
    }

    pub fn has_slot(&self, name: &str) -> bool {
        self.slots.iter().any(|s| s == name)
    }

    pub fn has_tube(&self, name: &str) -> bool {
        self.tubes.iter().any(|t| t == name)
    }

    /// Check that names can be addressed by path keys and are unique.
    pub fn validate(&self) -> WwResult<()> {
        let invalid = |what: String| Err(WwError::InvalidSignature { what });

        if self.type_name.is_empty() || self.type_name.contains('/') {
            return invalid(format!(
                "type name '{}' must be non-empty and contain no '/'",
                self.type_name
            ));
        }
        if self.tubes.is_empty() {
            return invalid(format!("{} declares no tubes", self.type_name));
        }
        for (kind, names) in [("slot", &self.slots), ("tube", &self.tubes)] {
            let mut seen = BTreeSet::new();
            for name in names {
                if name.is_empty() || name.contains('/') {
                    return invalid(format!(
                        "{} {} name '{}' must be non-empty and contain no '/'",
                        self.type_name, kind, name
                    ));
                }
                if !seen.insert(name.as_str()) {
                    return invalid(format!(
                        "{} declares {} '{}' twice",
                        self.type_name, kind, name
                    ));
                }
            }
        }
        Ok(())
    }
}

/// A reversible operation.
///
/// Implementations must be pure: the same inputs always give the same
/// outputs, and `pump(pour(x)) == x` on the tank's domain. `pour` receives
/// exactly the declared slots and must return exactly the declared tubes;
/// `pump` the other way round.
pub trait TankOp: Send + Sync {
    fn signature(&self) -> &Signature;

    /// Forward direction: slot values to tube values.
    fn pour(&self, slots: &PortValues) -> WwResult<PortValues>;

    /// Inverse direction: tube values to slot values.
    fn pump(&self, tubes: &PortValues) -> WwResult<PortValues>;
}

/// Fetch a declared input. Absence is a value error, never a default.
pub fn input<'a>(ports: &'a PortValues, name: &str) -> WwResult<&'a Value> {
    ports
        .get(name)
        .ok_or_else(|| WwError::value(format!("missing input '{}'", name)))
}

/// Run `pour` and check the result carries exactly the declared tubes.
pub fn checked_pour(op: &dyn TankOp, tank: &str, slots: &PortValues) -> WwResult<PortValues> {
    let tubes = op.pour(slots)?;
    check_names(tank, "pour", op.signature().tubes(), &tubes)?;
    Ok(tubes)
}

/// Run `pump` and check the result carries exactly the declared slots.
pub fn checked_pump(op: &dyn TankOp, tank: &str, tubes: &PortValues) -> WwResult<PortValues> {
    let slots = op.pump(tubes)?;
    check_names(tank, "pump", op.signature().slots(), &slots)?;
    Ok(slots)
}

fn check_names(tank: &str, direction: &str, declared: &[String], got: &PortValues) -> WwResult<()> {
    let matches =
        declared.len() == got.len() && declared.iter().all(|name| got.contains_key(name));
    if matches {
        return Ok(());
    }
    Err(WwError::Contract {
        tank: tank.to_string(),
        what: format!(
            "{} returned {:?}, expected {:?}",
            direction,
            got.keys().collect::<Vec<_>>(),
            declared
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Leaky {
        sig: Signature,
    }

    impl TankOp for Leaky {
        fn signature(&self) -> &Signature {
            &self.sig
        }

        fn pour(&self, slots: &PortValues) -> WwResult<PortValues> {
            let mut out = PortValues::new();
            out.insert("wrong".into(), input(slots, "a")?.clone());
            Ok(out)
        }

        fn pump(&self, tubes: &PortValues) -> WwResult<PortValues> {
            Ok(tubes.clone())
        }
    }

    #[test]
    fn signature_validation() {
        assert!(Signature::new("Add", &["a", "b"], &["target"]).validate().is_ok());
        assert!(Signature::new("", &["a"], &["t"]).validate().is_err());
        assert!(Signature::new("A/B", &["a"], &["t"]).validate().is_err());
        assert!(Signature::new("Add", &["a", "a"], &["t"]).validate().is_err());
        assert!(Signature::new("Add", &["a"], &["t", "t"]).validate().is_err());
        assert!(Signature::new("Add", &["a/b"], &["t"]).validate().is_err());
        assert!(Signature::new("Add", &["a"], &[]).validate().is_err());
        // a slot and a tube may share a name
        assert!(Signature::new("Clone", &["a"], &["a", "b"]).validate().is_ok());
    }

    #[test]
    fn missing_input_is_value_error() {
        let ports = PortValues::new();
        assert!(matches!(input(&ports, "a"), Err(WwError::Value { .. })));
    }

    #[test]
    fn contract_violation_detected() {
        let op = Leaky {
            sig: Signature::new("Leaky", &["a"], &["target"]),
        };
        let mut slots = PortValues::new();
        slots.insert("a".into(), Value::Int(1));

        let err = checked_pour(&op, "Leaky_0", &slots).unwrap_err();
        assert!(matches!(err, WwError::Contract { ref tank, .. } if tank == "Leaky_0"));

        let mut tubes = PortValues::new();
        tubes.insert("target".into(), Value::Int(1));
        assert!(checked_pump(&op, "Leaky_0", &tubes).is_err());
    }
}
