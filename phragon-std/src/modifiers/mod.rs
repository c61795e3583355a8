//! # Modifier Registry
//!
//! Named modifiers available to templates as `{param:name(args)}`.
//!
//! | Modifier | Arguments          | Accepts                         | Value           |
//! |----------|--------------------|---------------------------------|-----------------|
//! | `reg`    | regex source       | segments matching `^arg$`       | raw or captures |
//! | `date`   | format [, offset]  | valid calendar date-times       | `Value::Date`   |
//! | `int`    | none, or min, max  | integers (within range)         | `Value::Int`    |
//! | `enum`   | one or more words  | exactly one of the words        | raw             |
//!
//! The registry is created at bootstrap, populated before any template is
//! compiled, and shared by reference afterwards.

pub mod date;
pub mod enums;
pub mod int;
pub mod reg;

pub use date::DateModifier;
pub use enums::EnumModifier;
pub use int::IntModifier;
pub use reg::RegModifier;

use phragon_core::{Modifier, PatternError};
use std::{collections::HashMap, fmt, sync::Arc};

/// A mapping from modifier name to modifier.
#[derive(Clone)]
pub struct ModifierRegistry {
    modifiers: HashMap<String, Arc<dyn Modifier>>,
}

impl ModifierRegistry {
    /// Create an empty registry.
    pub fn empty() -> Self {
        Self {
            modifiers: HashMap::new(),
        }
    }

    /// Create a registry holding the built-in modifiers.
    pub fn new() -> Self {
        Self::empty()
            .with("reg", RegModifier)
            .with("date", DateModifier)
            .with("int", IntModifier)
            .with("enum", EnumModifier)
    }

    /// Register a modifier (builder version). A later registration replaces an
    /// earlier one with the same name.
    pub fn with<M: Modifier>(mut self, name: impl Into<String>, modifier: M) -> Self {
        self.register(name, modifier);
        self
    }

    /// Register a modifier.
    pub fn register<M: Modifier>(&mut self, name: impl Into<String>, modifier: M) {
        self.modifiers.insert(name.into(), Arc::new(modifier));
    }

    /// Look up a modifier by name.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Modifier>, PatternError> {
        self.modifiers
            .get(name)
            .cloned()
            .ok_or_else(|| PatternError::UnknownModifier(name.to_string()))
    }

    /// Whether a modifier is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.modifiers.contains_key(name)
    }

    /// Number of registered modifiers.
    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }
}

impl Default for ModifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ModifierRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.modifiers.keys().collect();
        names.sort();
        f.debug_struct("ModifierRegistry")
            .field("modifiers", &names)
            .finish()
    }
}

/// Fail with [`PatternError::ModifierArity`] unless `args.len()` is in `range`.
pub(crate) fn check_arity(
    modifier: &str,
    args: &[String],
    range: std::ops::RangeInclusive<usize>,
) -> Result<(), PatternError> {
    if range.contains(&args.len()) {
        return Ok(());
    }
    let expected = if range.start() == range.end() {
        range.start().to_string()
    } else if *range.end() == usize::MAX {
        format!("at least {}", range.start())
    } else {
        format!("{}..={}", range.start(), range.end())
    };
    Err(PatternError::ModifierArity {
        modifier: modifier.to_string(),
        expected,
        found: args.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use phragon_core::{MatchOutcome, Validator};

    #[test]
    fn test_builtins_registered() {
        let registry = ModifierRegistry::new();
        for name in ["reg", "date", "int", "enum"] {
            assert!(registry.contains(name), "missing builtin {name}");
        }
        assert_eq!(registry.len(), 4);
        assert!(ModifierRegistry::empty().is_empty());
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = ModifierRegistry::new();
        let err = registry.resolve("slug").err().unwrap();
        assert_eq!(err, PatternError::UnknownModifier("slug".into()));
    }

    #[test]
    fn test_register_custom() {
        let registry = ModifierRegistry::new().with(
            "lower",
            |_args: &[String]| -> Result<Box<dyn Validator>, PatternError> {
                Ok(Box::new(|raw: &str| {
                    MatchOutcome::from(raw.chars().all(|c| c.is_ascii_lowercase()))
                }))
            },
        );
        let validator = registry.resolve("lower").unwrap().build(&[]).unwrap();
        assert_eq!(validator.validate("abc"), MatchOutcome::AcceptedRaw);
        assert_eq!(validator.validate("aBc"), MatchOutcome::Rejected);
    }

    #[test]
    fn test_check_arity_messages() {
        let one = check_arity("reg", &[], 1..=1).unwrap_err();
        assert_eq!(
            one.to_string(),
            "modifier `reg` expects 1 argument(s), got 0"
        );
        let many = check_arity("enum", &[], 1..=usize::MAX).unwrap_err();
        assert!(many.to_string().contains("at least 1"));
        assert!(check_arity("date", &["Y".into()], 1..=2).is_ok());
    }
}
