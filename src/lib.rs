//! Layered configuration loading for nested records.
//!
//! This crate populates a caller-constructed configuration record by
//! merging, in increasing priority:
//!
//! 1. defaults already present on the record,
//! 2. values decoded from a YAML, JSON or TOML file,
//! 3. environment variables,
//! 4. command-line flags.
//!
//! Records describe their tree shape once, through a per-section field
//! table carrying override metadata (flag path segment, environment
//! variable, usage text). The loader walks the schema to register one
//! string flag per leaf under its dotted path, and walks the live value to
//! resolve each leaf by priority, materializing unset `Option` sections
//! only when a leaf beneath them actually receives an override.
//!
//! ```ignore
//! use cascade_config::{config_node, Field, FieldMeta, Loader, Section};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize)]
//! #[serde(default)]
//! struct ApiConfig {
//!     port: u16,
//! }
//!
//! impl Section for ApiConfig {
//!     fn fields() -> Vec<Field<Self>> {
//!         vec![Field::new(
//!             FieldMeta::new().flag("port").env("API_PORT").usage("API listen port"),
//!             |api| &mut api.port,
//!         )]
//!     }
//! }
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize)]
//! #[serde(default)]
//! struct Config {
//!     api: Option<ApiConfig>,
//!     debug: bool,
//! }
//!
//! impl Section for Config {
//!     fn fields() -> Vec<Field<Self>> {
//!         vec![
//!             Field::new(FieldMeta::new().flag("api"), |config| &mut config.api),
//!             Field::new(FieldMeta::new().flag("debug").env("DEBUG"), |config| &mut config.debug),
//!         ]
//!     }
//! }
//!
//! config_node!(ApiConfig, Config);
//!
//! fn main() -> cascade_config::ConfigResult<()> {
//!     let mut config = Config::default();
//!     Loader::new(&mut config)
//!         .with_file("config.yaml") // -c on the command line overrides this
//!         .with_flags()
//!         .load()?;
//!     // LOG_LEVEL=DEBUG app -c other.yaml --api.port=8001 --debug=1
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod loader;
pub mod schema;

// Re-export the loading surface
pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigRecord, DecodeFn, DecoderRegistry, EnvSource, FlagSet, Loader};

// Re-export the schema-description surface
pub use schema::{ConfigNode, Field, FieldCx, FieldMeta, OverrideSources, Section};
