//! Key/naming scheme for tanks and ports.
//!
//! Every port has one canonical identifier, [`PortKey`] (tank, kind, name).
//! The path form `"{tank}/{slots|tubes}/{name}"` is derived from it by
//! `Display` and parsed back by `FromStr`, so both addressing styles are
//! projections of the same key.

use core::fmt;
use core::str::FromStr;

use crate::error::{WwError, WwResult};

/// Whether a port is an input (slot) or an output (tube).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PortKind {
    /// Input port.
    Slot,
    /// Output port.
    Tube,
}

impl PortKind {
    /// Path segment used for this kind.
    pub fn segment(self) -> &'static str {
        match self {
            PortKind::Slot => "slots",
            PortKind::Tube => "tubes",
        }
    }

    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "slots" => Some(PortKind::Slot),
            "tubes" => Some(PortKind::Tube),
            _ => None,
        }
    }
}

/// Identity of a tank within one waterwork: `"{type_name}_{index}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TankKey {
    type_name: String,
    index: u32,
}

impl TankKey {
    pub fn new(type_name: impl Into<String>, index: u32) -> Self {
        Self {
            type_name: type_name.into(),
            index,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Per-type instance index, counted within one waterwork.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Key of the slot `name` on this tank.
    pub fn slot(&self, name: impl Into<String>) -> PortKey {
        PortKey::new(self.clone(), PortKind::Slot, name)
    }

    /// Key of the tube `name` on this tank.
    pub fn tube(&self, name: impl Into<String>) -> PortKey {
        PortKey::new(self.clone(), PortKind::Tube, name)
    }
}

impl fmt::Display for TankKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.type_name, self.index)
    }
}

impl FromStr for TankKey {
    type Err = WwError;

    fn from_str(s: &str) -> WwResult<Self> {
        let invalid = |reason| WwError::InvalidKey {
            key: s.to_string(),
            reason,
        };
        let (type_name, index) = s
            .rsplit_once('_')
            .ok_or_else(|| invalid("tank key needs a '_{index}' suffix"))?;
        if type_name.is_empty() || type_name.contains('/') {
            return Err(invalid("tank type name must be non-empty and contain no '/'"));
        }
        let index = index
            .parse::<u32>()
            .map_err(|_| invalid("tank index is not a non-negative integer"))?;
        Ok(Self::new(type_name, index))
    }
}

/// Canonical identifier of a port: the handle-style key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortKey {
    pub tank: TankKey,
    pub kind: PortKind,
    pub name: String,
}

impl PortKey {
    pub fn new(tank: TankKey, kind: PortKind, name: impl Into<String>) -> Self {
        Self {
            tank,
            kind,
            name: name.into(),
        }
    }

    /// Path-style rendering, e.g. `"Add_0/slots/a"`.
    pub fn path(&self) -> String {
        self.to_string()
    }

    /// Project this key into the requested addressing style.
    pub fn styled(&self, style: KeyStyle) -> Key {
        match style {
            KeyStyle::Path => Key::Path(self.path()),
            KeyStyle::Handle => Key::Handle(self.clone()),
        }
    }
}

impl fmt::Display for PortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.tank, self.kind.segment(), self.name)
    }
}

impl FromStr for PortKey {
    type Err = WwError;

    fn from_str(s: &str) -> WwResult<Self> {
        let invalid = |reason| WwError::InvalidKey {
            key: s.to_string(),
            reason,
        };
        let mut parts = s.split('/');
        let (Some(tank), Some(kind), Some(name), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid("expected '{tank}/{slots|tubes}/{name}'"));
        };
        let kind =
            PortKind::from_segment(kind).ok_or_else(|| invalid("middle segment must be 'slots' or 'tubes'"))?;
        if name.is_empty() {
            return Err(invalid("port name is empty"));
        }
        Ok(Self::new(tank.parse()?, kind, name))
    }
}

/// Addressing style selected per pour/pump call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyStyle {
    /// `"Add_0/slots/a"` strings.
    #[default]
    Path,
    /// Structured [`PortKey`] handles.
    Handle,
}

/// A port address in either style.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Path(String),
    Handle(PortKey),
}

impl Key {
    /// Resolve to the canonical identifier, parsing path keys.
    pub fn resolve(&self) -> WwResult<PortKey> {
        match self {
            Key::Path(path) => path.parse(),
            Key::Handle(key) => Ok(key.clone()),
        }
    }

    pub fn style(&self) -> KeyStyle {
        match self {
            Key::Path(_) => KeyStyle::Path,
            Key::Handle(_) => KeyStyle::Handle,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Path(path) => f.write_str(path),
            Key::Handle(key) => write!(f, "{}", key),
        }
    }
}

impl From<&str> for Key {
    fn from(path: &str) -> Self {
        Key::Path(path.to_string())
    }
}

impl From<String> for Key {
    fn from(path: String) -> Self {
        Key::Path(path)
    }
}

impl From<PortKey> for Key {
    fn from(key: PortKey) -> Self {
        Key::Handle(key)
    }
}

impl From<&PortKey> for Key {
    fn from(key: &PortKey) -> Self {
        Key::Handle(key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tank_key_display_and_parse() {
        let key = TankKey::new("Add", 0);
        assert_eq!(key.to_string(), "Add_0");
        assert_eq!("Add_0".parse::<TankKey>().unwrap(), key);

        let key: TankKey = "Sub_Typed_12".parse().unwrap();
        assert_eq!(key.type_name(), "Sub_Typed");
        assert_eq!(key.index(), 12);
    }

    #[test]
    fn tank_key_rejects_malformed() {
        assert!("Add".parse::<TankKey>().is_err());
        assert!("_3".parse::<TankKey>().is_err());
        assert!("Add_x".parse::<TankKey>().is_err());
        assert!("Add_-1".parse::<TankKey>().is_err());
    }

    #[test]
    fn port_key_path_round_trip() {
        let key = TankKey::new("Mul", 0).tube("target");
        assert_eq!(key.path(), "Mul_0/tubes/target");
        assert_eq!("Mul_0/tubes/target".parse::<PortKey>().unwrap(), key);

        let slot: PortKey = "Add_0/slots/a".parse().unwrap();
        assert_eq!(slot.kind, PortKind::Slot);
        assert_eq!(slot.name, "a");
    }

    #[test]
    fn port_key_rejects_malformed() {
        for bad in [
            "Add_0",
            "Add_0/slots",
            "Add_0/inputs/a",
            "Add_0/slots/",
            "Add_0/slots/a/b",
            "Add/slots/a",
        ] {
            let err = bad.parse::<PortKey>().unwrap_err();
            assert!(matches!(err, WwError::InvalidKey { .. }), "{bad}");
        }
    }

    #[test]
    fn both_styles_resolve_to_the_same_key() {
        let handle = TankKey::new("Add", 1).slot("b");
        let by_path = Key::from("Add_1/slots/b");
        let by_handle = Key::from(handle.clone());
        assert_eq!(by_path.resolve().unwrap(), by_handle.resolve().unwrap());
        assert_eq!(handle.styled(KeyStyle::Path), by_path);
        assert_eq!(handle.styled(KeyStyle::Handle), by_handle);
        assert_eq!(by_handle.style(), KeyStyle::Handle);
    }
}
