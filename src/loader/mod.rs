//! Load orchestration: flags, then file, then flag/env override resolution.

pub mod env;
pub mod file;
pub mod flags;

pub use env::EnvSource;
pub use file::{DecodeFn, DecoderRegistry};
pub use flags::FlagSet;

use std::ffi::OsString;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::ConfigResult;
use crate::schema::{ConfigNode, FieldCx, OverrideSources};

/// A root configuration record: walkable for override resolution and
/// (de)serializable for the file layer.
///
/// Optional sections that a file may populate only partially should carry
/// `#[serde(default)]` at the struct level, so the unmentioned fields fall
/// back to their defaults when the section is first materialized.
pub trait ConfigRecord: ConfigNode + Serialize + DeserializeOwned {}

impl<T: ConfigNode + Serialize + DeserializeOwned> ConfigRecord for T {}

/// One-shot loader over a caller-constructed record.
///
/// The loader owns its flag namespace and decoder registry, so separate
/// loads never interfere with each other; its state lives for a single
/// [`load`](Loader::load) call.
pub struct Loader<'a, T: ConfigRecord> {
    record: &'a mut T,
    file_path: Option<PathBuf>,
    flags: Option<FlagSet>,
    flag_args: Option<Vec<OsString>>,
    env: EnvSource,
    decoders: DecoderRegistry,
}

impl<'a, T: ConfigRecord> Loader<'a, T> {
    pub fn new(record: &'a mut T) -> Self {
        Loader {
            record,
            file_path: None,
            flags: None,
            flag_args: None,
            env: EnvSource::process(),
            decoders: DecoderRegistry::builtin(),
        }
    }

    /// Default config file path. The reserved `-c` flag overrides it; an
    /// empty path disables file loading.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Enable flag overrides, parsed from the process arguments. One flag
    /// is registered per leaf field, named by its dotted path.
    pub fn with_flags(mut self) -> Self {
        self.register_flags();
        self.flag_args = None;
        self
    }

    /// Enable flag overrides with an explicit argument list (without the
    /// binary name). Mainly for tests and embedders that own their argv.
    pub fn with_flag_args<I, S>(mut self, argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.register_flags();
        self.flag_args = Some(argv.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the environment source; defaults to the process environment.
    pub fn with_env_source(mut self, env: EnvSource) -> Self {
        self.env = env;
        self
    }

    /// Register an additional file decoder. Existing extensions, built-ins
    /// included, are kept as-is.
    pub fn with_decoder(mut self, ext: &str, decode: DecodeFn) -> Self {
        self.decoders.register(ext, decode);
        self
    }

    fn register_flags(&mut self) {
        if self.flags.is_none() {
            let mut flags = FlagSet::new("config");
            T::register(&FieldCx::root(), &mut flags);
            self.flags = Some(flags);
        }
    }

    /// Run the load sequence: parse flags if enabled and not yet parsed,
    /// decode the effective config file if any, then resolve flag and
    /// environment overrides over the whole record. Each step
    /// short-circuits the rest on error.
    pub fn load(mut self) -> ConfigResult<()> {
        if let Some(flags) = self.flags.as_mut() {
            if !flags.is_parsed() {
                match self.flag_args.take() {
                    Some(argv) => flags.parse(argv)?,
                    None => flags.parse(std::env::args_os().skip(1))?,
                }
            }
        }

        match self.effective_file_path() {
            Some(path) => file::load_into(&mut *self.record, &path, &self.decoders)?,
            None => debug!("no config file configured, skipping file layer"),
        }

        let sources = OverrideSources::new(self.flags.as_ref(), &self.env);
        self.record.resolve(&FieldCx::root(), &sources)?;

        Ok(())
    }

    /// The `-c` flag wins over the configured default; an empty result
    /// means the file layer is skipped entirely.
    fn effective_file_path(&self) -> Option<PathBuf> {
        if let Some(flags) = &self.flags {
            if let Some(path) = flags.config_path() {
                return Some(PathBuf::from(path));
            }
        }

        self.file_path
            .clone()
            .filter(|path| !path.as_os_str().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, FieldMeta, Section};
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Mini {
        name: String,
    }

    impl Section for Mini {
        fn fields() -> Vec<Field<Self>> {
            vec![Field::new(
                FieldMeta::new().flag("name").env("MINI_NAME"),
                |mini| &mut mini.name,
            )]
        }
    }

    crate::config_node!(Mini);

    #[test]
    fn config_path_flag_overrides_configured_default() {
        let mut override_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(override_file, r#"{{"name": "from-override"}}"#).unwrap();

        let mut record = Mini::default();
        Loader::new(&mut record)
            .with_file("/nonexistent/default.json")
            .with_flag_args(["-c", override_file.path().to_str().unwrap()])
            .load()
            .unwrap();

        assert_eq!(record.name, "from-override");
    }

    #[test]
    fn empty_file_path_skips_file_loading() {
        let mut record = Mini::default();
        Loader::new(&mut record).with_file("").load().unwrap();
        assert_eq!(record, Mini::default());
    }

    #[test]
    fn flag_beats_env_for_the_same_leaf() {
        let mut record = Mini::default();
        let env = EnvSource::from_fn(|key| (key == "MINI_NAME").then(|| "from-env".to_string()));

        Loader::new(&mut record)
            .with_flag_args(["--name", "from-flag"])
            .with_env_source(env)
            .load()
            .unwrap();

        assert_eq!(record.name, "from-flag");
    }
}
