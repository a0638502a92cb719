//! Load-time configuration errors.
//!
//! A record is validated once, when it is turned into typed settings. All
//! problems found in one record are reported together, each prefixed by the
//! dotted path of the record that contained it.

/// A record failed validation. Construction never partially succeeds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid configuration in '{path}': {}", .violations.join("; "))]
pub struct ConfigurationError {
    /// Dotted path of the failing record, e.g. `games.duel.buttons.shop`.
    pub path: String,
    /// Every violation found, in discovery order.
    pub violations: Vec<String>,
}

impl ConfigurationError {
    /// An error with a single violation.
    pub fn new(path: impl Into<String>, violation: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            violations: vec![violation.into()],
        }
    }

    /// Returns `true` if any violation message contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.violations.iter().any(|v| v.contains(needle))
    }
}

/// Collects violations for one record so they can be reported at once.
///
/// ```
/// use skirmish_types::Violations;
///
/// let mut v = Violations::new("games.duel");
/// v.check(false, "radius must be positive");
/// v.check(true, "never reported");
/// let err = v.finish().unwrap_err();
/// assert_eq!(err.violations, vec!["radius must be positive".to_string()]);
/// ```
#[derive(Debug)]
pub struct Violations {
    path: String,
    found: Vec<String>,
}

impl Violations {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            found: Vec::new(),
        }
    }

    /// The dotted path this collector reports under.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path of a nested record, e.g. `child("buttons.shop")`.
    pub fn child(&self, segment: &str) -> String {
        format!("{}.{}", self.path, segment)
    }

    pub fn push(&mut self, violation: impl Into<String>) {
        self.found.push(violation.into());
    }

    /// Records `violation` unless `ok` holds.
    pub fn check(&mut self, ok: bool, violation: impl Into<String>) {
        if !ok {
            self.push(violation);
        }
    }

    /// Folds a nested record's error into this one, keeping its path.
    pub fn absorb(&mut self, err: ConfigurationError) {
        for violation in err.violations {
            self.found.push(format!("{}: {}", err.path, violation));
        }
    }

    /// Unwraps a nested result, absorbing its error.
    pub fn take<T>(&mut self, result: Result<T, ConfigurationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.absorb(err);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.found.is_empty()
    }

    pub fn finish(self) -> Result<(), ConfigurationError> {
        if self.found.is_empty() {
            Ok(())
        } else {
            Err(ConfigurationError {
                path: self.path,
                violations: self.found,
            })
        }
    }
}
