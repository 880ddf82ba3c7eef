//! Module identifiers and function dispatch records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The name of a compiled Mica module.
///
/// Module ids are owned strings rather than interned keys: they are
/// persisted inside the build manifest and must survive across processes,
/// so an in-memory interner index would not round-trip. Comparison and
/// hashing are by name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    /// Creates a module id from a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the module name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the module belongs to the toolchain itself.
    ///
    /// Toolchain-internal modules are named with a `mica_` prefix and are
    /// filtered out of dependency reports: they ship with the compiler and
    /// never invalidate user code.
    pub fn is_toolchain_internal(&self) -> bool {
        self.0.starts_with("mica_")
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleId({})", self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for ModuleId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A function dispatch observed by the compiler, at module/function/arity
/// granularity.
///
/// Dispatches are recorded in the manifest alongside module-level
/// references. They are not consulted by the staleness solver today; they
/// are retained for diagnostics and finer-grained invalidation.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct Dispatch {
    /// The module the call targets.
    pub module: ModuleId,
    /// The function name.
    pub function: String,
    /// The function arity.
    pub arity: u8,
}

impl Dispatch {
    /// Creates a dispatch record.
    pub fn new(module: impl Into<ModuleId>, function: impl Into<String>, arity: u8) -> Self {
        Self {
            module: module.into(),
            function: function.into(),
            arity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_same_id() {
        assert_eq!(ModuleId::new("Repo"), ModuleId::from("Repo"));
    }

    #[test]
    fn different_names_differ() {
        assert_ne!(ModuleId::new("Repo"), ModuleId::new("Repo.Queries"));
    }

    #[test]
    fn display_is_the_name() {
        assert_eq!(format!("{}", ModuleId::new("App.Worker")), "App.Worker");
    }

    #[test]
    fn toolchain_internal_prefix() {
        assert!(ModuleId::new("mica_lexer").is_toolchain_internal());
        assert!(!ModuleId::new("App.Micatools").is_toolchain_internal());
        assert!(!ModuleId::new("Mica.Std").is_toolchain_internal());
    }

    #[test]
    fn serde_roundtrip_is_transparent() {
        let id = ModuleId::new("App.Repo");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"App.Repo\"");
        let back: ModuleId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn dispatch_roundtrip() {
        let d = Dispatch::new("App.Repo", "insert", 2);
        let json = serde_json::to_string(&d).unwrap();
        let back: Dispatch = serde_json::from_str(&json).unwrap();
        assert_eq!(d, back);
    }
}
