//! Registration of tank types by name.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use ww_core::{WwError, WwResult};

use crate::traits::{PortValues, Signature, TankOp};

type PortFn = dyn Fn(&PortValues) -> WwResult<PortValues> + Send + Sync;

/// A tank type backed by a pair of closures.
///
/// Lets callers outside this crate add reversible operations without
/// defining a type. The closures are trusted to be inverse of each other.
pub struct FnTank {
    sig: Signature,
    forward: Box<PortFn>,
    inverse: Box<PortFn>,
}

impl FnTank {
    pub fn new<F, G>(sig: Signature, forward: F, inverse: G) -> Self
    where
        F: Fn(&PortValues) -> WwResult<PortValues> + Send + Sync + 'static,
        G: Fn(&PortValues) -> WwResult<PortValues> + Send + Sync + 'static,
    {
        Self {
            sig,
            forward: Box::new(forward),
            inverse: Box::new(inverse),
        }
    }
}

impl fmt::Debug for FnTank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTank").field("sig", &self.sig).finish_non_exhaustive()
    }
}

impl TankOp for FnTank {
    fn signature(&self) -> &Signature {
        &self.sig
    }

    fn pour(&self, slots: &PortValues) -> WwResult<PortValues> {
        (self.forward)(slots)
    }

    fn pump(&self, tubes: &PortValues) -> WwResult<PortValues> {
        (self.inverse)(tubes)
    }
}

/// Maps tank type names to their operations.
///
/// Cheap to clone: operations are shared behind `Arc`.
#[derive(Clone, Default)]
pub struct Registry {
    ops: BTreeMap<String, Arc<dyn TankOp>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in tank.
    pub fn with_builtins() -> Self {
        let builtins: Vec<Arc<dyn TankOp>> = vec![
            Arc::new(crate::arith::Add::default()),
            Arc::new(crate::arith::Sub::default()),
            Arc::new(crate::arith::Mul::default()),
            Arc::new(crate::div::Div::default()),
            Arc::new(crate::clone::CloneTank::default()),
            Arc::new(crate::reduce::Max::default()),
            Arc::new(crate::reduce::Min::default()),
            Arc::new(crate::split::Split::default()),
            Arc::new(crate::concat::Concat::default()),
            Arc::new(crate::isnan::IsNan::default()),
            Arc::new(crate::replace::Replace::default()),
        ];
        let ops = builtins
            .into_iter()
            .map(|op| (op.signature().type_name().to_string(), op))
            .collect();
        Self { ops }
    }

    /// Register an operation under its signature's type name.
    pub fn register(&mut self, op: impl TankOp + 'static) -> WwResult<()> {
        self.register_arc(Arc::new(op))
    }

    /// Register an already shared operation.
    pub fn register_arc(&mut self, op: Arc<dyn TankOp>) -> WwResult<()> {
        let sig = op.signature();
        sig.validate()?;
        if self.ops.contains_key(sig.type_name()) {
            return Err(WwError::InvalidSignature {
                what: format!("tank type '{}' is already registered", sig.type_name()),
            });
        }
        self.ops.insert(sig.type_name().to_string(), op);
        Ok(())
    }

    /// Register a closure-backed tank type.
    pub fn register_fn<F, G>(
        &mut self,
        type_name: &str,
        slots: &[&str],
        tubes: &[&str],
        forward: F,
        inverse: G,
    ) -> WwResult<()>
    where
        F: Fn(&PortValues) -> WwResult<PortValues> + Send + Sync + 'static,
        G: Fn(&PortValues) -> WwResult<PortValues> + Send + Sync + 'static,
    {
        let sig = Signature::new(type_name, slots, tubes);
        self.register(FnTank::new(sig, forward, inverse))
    }

    pub fn get(&self, type_name: &str) -> Option<&Arc<dyn TankOp>> {
        self.ops.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.ops.contains_key(type_name)
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        self.ops.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("types", &self.type_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::input;
    use ww_core::Value;

    fn negate(ports: &PortValues, from: &str, to: &str) -> WwResult<PortValues> {
        let v = input(ports, from)?.as_int()?;
        let neg = v
            .checked_neg()
            .ok_or_else(|| WwError::value("negation overflows"))?;
        Ok(PortValues::from([(to.to_string(), Value::Int(neg))]))
    }

    #[test]
    fn builtins_are_registered() {
        let registry = Registry::with_builtins();
        assert_eq!(
            registry.type_names(),
            vec![
                "Add", "Clone", "Concat", "Div", "IsNan", "Max", "Min", "Mul", "Replace",
                "Split", "Sub"
            ]
        );
        for name in registry.type_names() {
            assert!(registry.get(name).unwrap().signature().validate().is_ok());
        }
    }

    #[test]
    fn duplicate_type_rejected() {
        let mut registry = Registry::with_builtins();
        let err = registry
            .register(crate::arith::Add::default())
            .unwrap_err();
        assert!(matches!(err, WwError::InvalidSignature { .. }));
    }

    #[test]
    fn closure_tank_round_trip() {
        let mut registry = Registry::new();
        registry
            .register_fn(
                "Neg",
                &["a"],
                &["target"],
                |p| negate(p, "a", "target"),
                |p| negate(p, "target", "a"),
            )
            .unwrap();
        assert!(registry.contains("Neg"));

        let op = registry.get("Neg").unwrap();
        let slots = PortValues::from([("a".to_string(), Value::Int(5))]);
        let tubes = op.pour(&slots).unwrap();
        assert_eq!(tubes["target"], Value::Int(-5));
        assert_eq!(op.pump(&tubes).unwrap(), slots);
    }

    #[test]
    fn invalid_closure_signature_rejected() {
        let mut registry = Registry::new();
        let result = registry.register_fn("Bad/Name", &["a"], &["t"], identity, identity);
        assert!(result.is_err());
        assert!(registry.is_empty());
    }

    fn identity(p: &PortValues) -> WwResult<PortValues> {
        Ok(p.clone())
    }
}
