//! File-based configuration loading through a pluggable decoder registry.
//!
//! A decoder turns file text into a generic [`serde_json::Value`] tree;
//! the loader deep-merges that tree over the record's serialized image and
//! deserializes the result back in place. Fields the file does not mention
//! therefore keep whatever the record already held.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Decode file text into a generic value tree.
pub type DecodeFn = fn(&str) -> ConfigResult<Value>;

/// Mapping from file-extension string to decoder, owned by one loader.
///
/// Extension match is case-sensitive and exact (`yaml`, not `.yaml`).
pub struct DecoderRegistry {
    decoders: HashMap<String, DecodeFn>,
}

impl DecoderRegistry {
    /// Registry holding the built-in decoders: `yml`/`yaml`, `json`, `toml`.
    pub fn builtin() -> Self {
        let mut registry = DecoderRegistry {
            decoders: HashMap::new(),
        };

        registry.register("yml", decode_yaml);
        registry.register("yaml", decode_yaml);
        registry.register("json", decode_json);
        registry.register("toml", decode_toml);
        registry
    }

    /// Register a decoder for a file extension. A pre-existing extension,
    /// built-ins included, is never overridden; returns whether the
    /// decoder was installed.
    pub fn register(&mut self, ext: &str, decode: DecodeFn) -> bool {
        if self.decoders.contains_key(ext) {
            return false;
        }

        self.decoders.insert(ext.to_string(), decode);
        true
    }

    pub fn get(&self, ext: &str) -> Option<DecodeFn> {
        self.decoders.get(ext).copied()
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        DecoderRegistry::builtin()
    }
}

fn decode_yaml(text: &str) -> ConfigResult<Value> {
    Ok(serde_yaml::from_str(text)?)
}

fn decode_json(text: &str) -> ConfigResult<Value> {
    Ok(serde_json::from_str(text)?)
}

fn decode_toml(text: &str) -> ConfigResult<Value> {
    let value: toml::Value = toml::from_str(text)?;
    Ok(serde_json::to_value(value)?)
}

/// Decode the file at `path` and merge it into `record`.
///
/// The extension is checked before any I/O, so an unsupported extension
/// leaves the record untouched; the record itself is only written after
/// the whole decode-merge-deserialize pipeline has succeeded.
pub(crate) fn load_into<T>(
    record: &mut T,
    path: &Path,
    decoders: &DecoderRegistry,
) -> ConfigResult<()>
where
    T: Serialize + DeserializeOwned,
{
    let ext = path.extension().and_then(OsStr::to_str).unwrap_or("");
    let decode = decoders
        .get(ext)
        .ok_or_else(|| ConfigError::UnsupportedExtension(ext.to_string()))?;

    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    debug!(path = %path.display(), ext, "loading config file");

    let text = fs::read_to_string(path)?;
    let tree = decode(&text)?;

    let mut merged = serde_json::to_value(&*record)?;
    merge_values(&mut merged, tree);
    *record = serde_json::from_value(merged)?;

    Ok(())
}

/// Deep-merge `overlay` onto `base`: objects merge per key, scalars and
/// arrays replace, explicit nulls never override.
fn merge_values(base: &mut Value, overlay: Value) {
    if overlay.is_null() {
        return;
    }

    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(slot) => merge_values(slot, value),
                    None => {
                        if !value.is_null() {
                            base_map.insert(key, value);
                        }
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::io::Write;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Sample {
        host: String,
        port: u16,
        tags: Vec<String>,
    }

    #[test]
    fn merge_is_recursive_for_objects() {
        let mut base = json!({"api": {"host": "localhost", "port": 8000}, "debug": false});
        merge_values(&mut base, json!({"api": {"port": 9000}}));

        assert_eq!(
            base,
            json!({"api": {"host": "localhost", "port": 9000}, "debug": false})
        );
    }

    #[test]
    fn merge_replaces_arrays_wholesale() {
        let mut base = json!({"tags": ["a", "b"]});
        merge_values(&mut base, json!({"tags": ["c"]}));
        assert_eq!(base, json!({"tags": ["c"]}));
    }

    #[test]
    fn merge_ignores_nulls() {
        let mut base = json!({"host": "localhost"});
        merge_values(&mut base, json!({"host": null}));
        assert_eq!(base, json!({"host": "localhost"}));
    }

    #[test]
    fn builtin_extensions_are_registered() {
        let registry = DecoderRegistry::builtin();
        for ext in ["yml", "yaml", "json", "toml"] {
            assert!(registry.get(ext).is_some(), "missing decoder for {ext}");
        }
        assert!(registry.get("ini").is_none());
    }

    #[test]
    fn register_never_overrides() {
        fn custom(_: &str) -> ConfigResult<Value> {
            Ok(Value::Null)
        }

        let mut registry = DecoderRegistry::builtin();
        assert!(!registry.register("json", custom));
        assert!(registry.register("ini", custom));
        assert!(registry.get("ini").is_some());
    }

    #[test]
    fn file_values_layer_over_record_defaults() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"port": 9000}}"#).unwrap();

        let mut record = Sample {
            host: "localhost".to_string(),
            port: 8000,
            tags: vec!["default".to_string()],
        };
        load_into(&mut record, file.path(), &DecoderRegistry::builtin()).unwrap();

        assert_eq!(record.port, 9000);
        assert_eq!(record.host, "localhost");
        assert_eq!(record.tags, vec!["default".to_string()]);
    }

    #[test]
    fn toml_decodes_through_the_same_pipeline() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "host = \"remote\"\nport = 7000\ntags = [\"t\"]").unwrap();

        let mut record = Sample::default();
        load_into(&mut record, file.path(), &DecoderRegistry::builtin()).unwrap();

        assert_eq!(record.host, "remote");
        assert_eq!(record.port, 7000);
        assert_eq!(record.tags, vec!["t".to_string()]);
    }

    #[test]
    fn unsupported_extension_leaves_record_untouched() {
        let mut file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        write!(file, "port = 9000").unwrap();

        let mut record = Sample::default();
        let err = load_into(&mut record, file.path(), &DecoderRegistry::builtin()).unwrap_err();

        assert!(matches!(err, ConfigError::UnsupportedExtension(ref ext) if ext == "ini"));
        assert_eq!(record, Sample::default());
    }

    #[test]
    fn missing_file_is_an_error() {
        let mut record = Sample::default();
        let err = load_into(
            &mut record,
            Path::new("/definitely/not/here.yaml"),
            &DecoderRegistry::builtin(),
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn malformed_content_is_a_decode_error() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "host = [[[").unwrap();

        let mut record = Sample::default();
        let err = load_into(&mut record, file.path(), &DecoderRegistry::builtin()).unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
