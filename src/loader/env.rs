//! Environment variable access behind an injectable lookup.
//!
//! The loader consults the environment at override-resolution time through
//! an [`EnvSource`], which defaults to the process environment. Tests and
//! embedders can substitute a fixed map instead of mutating the real
//! environment.

use std::collections::HashMap;
use std::fmt;

/// A key → value lookup over environment variables.
pub struct EnvSource {
    lookup: Box<dyn Fn(&str) -> Option<String> + Send + Sync>,
}

impl EnvSource {
    /// Read from the process environment. Values are looked up at
    /// resolution time; a set-then-unset race mid-load is unsupported.
    pub fn process() -> Self {
        EnvSource {
            lookup: Box::new(|key| std::env::var(key).ok()),
        }
    }

    /// Fixed set of variables, independent of the process environment.
    pub fn from_map(vars: HashMap<String, String>) -> Self {
        EnvSource {
            lookup: Box::new(move |key| vars.get(key).cloned()),
        }
    }

    /// Arbitrary lookup function, for embedders with their own stores.
    pub fn from_fn(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        EnvSource {
            lookup: Box::new(lookup),
        }
    }

    pub(crate) fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
    }
}

impl Default for EnvSource {
    fn default() -> Self {
        EnvSource::process()
    }
}

impl fmt::Debug for EnvSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EnvSource(..)")
    }
}
