//! Schema description and tree traversal for configuration records.
//!
//! A configuration record is a tree of nested sections whose leaves are
//! primitive values. Every type that can appear in a record implements
//! [`ConfigNode`], which carries the two traversal modes the loader needs:
//! a static walk over the declared schema (flag registration) and a walk
//! over the live value (override resolution).
//!
//! Sections describe their children through a [`Field`] table instead of
//! runtime type introspection, so the whole tree shape is known at compile
//! time and unsupported leaf types are rejected by the type system.

pub mod leaf;

use crate::error::ConfigResult;
use crate::loader::env::EnvSource;
use crate::loader::flags::FlagSet;

/// Override metadata attached to a single field at schema-definition time.
///
/// A field with no metadata participates only in file decoding; it is never
/// registered as a flag and never looked up in the environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldMeta {
    /// Flag-path segment, joined with ancestor segments by `.`.
    pub flag: Option<&'static str>,
    /// Environment variable consulted when no flag value is present.
    pub env: Option<&'static str>,
    /// Usage text surfaced as flag help.
    pub usage: Option<&'static str>,
}

impl FieldMeta {
    pub const fn new() -> Self {
        FieldMeta {
            flag: None,
            env: None,
            usage: None,
        }
    }

    pub const fn flag(mut self, segment: &'static str) -> Self {
        self.flag = Some(segment);
        self
    }

    pub const fn env(mut self, name: &'static str) -> Self {
        self.env = Some(name);
        self
    }

    pub const fn usage(mut self, text: &'static str) -> Self {
        self.usage = Some(text);
        self
    }
}

/// Traversal context threaded through both walks: the dotted flag path
/// accumulated so far and the metadata visible at the current field.
///
/// The environment name is scoped strictly to the field that declared it;
/// it is replaced, not inherited, on every descent.
#[derive(Debug, Clone, Default)]
pub struct FieldCx {
    path: String,
    env: Option<&'static str>,
    usage: Option<&'static str>,
}

impl FieldCx {
    /// Context for the record root: empty path, no metadata.
    pub fn root() -> Self {
        FieldCx::default()
    }

    /// Context for a child field: the path grows by the field's flag
    /// segment (an empty or missing segment contributes nothing, so two
    /// untagged siblings collide on the same path — a documented edge
    /// case), and the field's own metadata replaces the parent's.
    pub fn child(&self, meta: &FieldMeta) -> FieldCx {
        FieldCx {
            path: join_path(&self.path, meta.flag.unwrap_or("")),
            env: meta.env,
            usage: meta.usage,
        }
    }

    /// Dotted flag path for the current node; empty at the root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Environment variable declared by the current field, if any.
    pub fn env_name(&self) -> Option<&'static str> {
        self.env
    }

    /// Flag help text declared by the current field, if any.
    pub fn usage(&self) -> Option<&'static str> {
        self.usage
    }

    /// Best available label for error messages: the flag path when the
    /// field has one, the environment name otherwise.
    pub(crate) fn describe(&self) -> &str {
        if !self.path.is_empty() {
            &self.path
        } else {
            self.env.unwrap_or("<unnamed field>")
        }
    }
}

/// Join two dotted-path fragments, skipping empty ones.
fn join_path(parent: &str, segment: &str) -> String {
    match (parent.is_empty(), segment.is_empty()) {
        (_, true) => parent.to_string(),
        (true, false) => segment.to_string(),
        (false, false) => format!("{parent}.{segment}"),
    }
}

/// Override lookups available during resolution: the parsed flag set, if
/// flags are enabled, and an environment reader.
pub struct OverrideSources<'a> {
    flags: Option<&'a FlagSet>,
    env: &'a EnvSource,
}

impl<'a> OverrideSources<'a> {
    pub fn new(flags: Option<&'a FlagSet>, env: &'a EnvSource) -> Self {
        OverrideSources { flags, env }
    }

    /// Look up the override value for a leaf: flag first, then environment.
    /// Empty strings never override, from either source.
    pub fn lookup(&self, cx: &FieldCx) -> Option<String> {
        if let Some(flags) = self.flags {
            if !cx.path().is_empty() {
                if let Some(value) = flags.value_of(cx.path()) {
                    return Some(value.to_string());
                }
            }
        }

        let name = cx.env_name()?;
        self.env.get(name).filter(|value| !value.is_empty())
    }
}

/// A node in the configuration tree.
///
/// Leaves terminate the traversal: registration binds a flag at the leaf's
/// dotted path, resolution reads an override string, coerces it into the
/// native type and writes it. Sections recurse into their field tables.
pub trait ConfigNode {
    /// Static walk over the declared schema, registering one string flag
    /// per leaf. No instance of the type is required.
    fn register(cx: &FieldCx, flags: &mut FlagSet);

    /// Walk the live value, applying flag and environment overrides.
    /// Returns whether any leaf in this subtree was written; `Option`
    /// intermediates use the answer to decide whether to materialize.
    fn resolve(&mut self, cx: &FieldCx, sources: &OverrideSources<'_>) -> ConfigResult<bool>;
}

type BindFn<S> =
    Box<dyn Fn(&mut S, &FieldCx, &OverrideSources<'_>) -> ConfigResult<bool> + Send + Sync>;

/// One entry in a section's field table: metadata plus the bindings that
/// project the field out of the section for each traversal mode.
pub struct Field<S> {
    meta: FieldMeta,
    register: fn(&FieldCx, &mut FlagSet),
    resolve: BindFn<S>,
}

impl<S: 'static> Field<S> {
    /// Bind a field of type `T` to its metadata. The projector returns a
    /// mutable reference to the field inside its section.
    pub fn new<T: ConfigNode + 'static>(
        meta: FieldMeta,
        project: for<'a> fn(&'a mut S) -> &'a mut T,
    ) -> Self {
        let resolve: BindFn<S> =
            Box::new(move |section, cx, sources| project(section).resolve(cx, sources));

        Field {
            meta,
            register: T::register,
            resolve,
        }
    }

    pub fn meta(&self) -> &FieldMeta {
        &self.meta
    }
}

/// A composite node with named child fields, described as a table.
pub trait Section: Sized {
    /// The section's children in declaration order.
    fn fields() -> Vec<Field<Self>>;
}

/// Register flags for every leaf below a section.
///
/// Only fields that declare a flag segment are descended, mirroring the
/// resolution-side rule that a flag lookup needs a non-empty path.
pub fn register_section<S: Section>(cx: &FieldCx, flags: &mut FlagSet) {
    for field in S::fields() {
        if field.meta.flag.is_some() {
            (field.register)(&cx.child(&field.meta), flags);
        }
    }
}

/// Resolve overrides for every field of a section, in declaration order.
/// Returns whether any leaf below the section was written.
pub fn resolve_section<S: Section>(
    section: &mut S,
    cx: &FieldCx,
    sources: &OverrideSources<'_>,
) -> ConfigResult<bool> {
    let mut changed = false;
    for field in S::fields() {
        changed |= (field.resolve)(section, &cx.child(&field.meta), sources)?;
    }

    Ok(changed)
}

/// Derives [`ConfigNode`] for section types from their [`Section`] field
/// table, so a record type only describes its fields once.
#[macro_export]
macro_rules! config_node {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::ConfigNode for $ty {
            fn register(cx: &$crate::FieldCx, flags: &mut $crate::FlagSet) {
                $crate::schema::register_section::<Self>(cx, flags);
            }

            fn resolve(
                &mut self,
                cx: &$crate::FieldCx,
                sources: &$crate::OverrideSources<'_>,
            ) -> $crate::ConfigResult<bool> {
                $crate::schema::resolve_section(self, cx, sources)
            }
        }
    )+};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_skips_empty_segments() {
        assert_eq!(join_path("", ""), "");
        assert_eq!(join_path("", "api"), "api");
        assert_eq!(join_path("api", ""), "api");
        assert_eq!(join_path("api", "port"), "api.port");
    }

    #[test]
    fn child_context_builds_dotted_path() {
        let root = FieldCx::root();
        let api = root.child(&FieldMeta::new().flag("api"));
        let port = api.child(&FieldMeta::new().flag("port").env("API_PORT"));

        assert_eq!(api.path(), "api");
        assert_eq!(port.path(), "api.port");
        assert_eq!(port.env_name(), Some("API_PORT"));
    }

    #[test]
    fn env_name_is_not_inherited() {
        let root = FieldCx::root();
        let parent = root.child(&FieldMeta::new().flag("db").env("DB"));
        let child = parent.child(&FieldMeta::new().flag("host"));

        assert_eq!(parent.env_name(), Some("DB"));
        assert_eq!(child.env_name(), None);
    }

    #[test]
    fn untagged_child_keeps_parent_path() {
        let root = FieldCx::root();
        let parent = root.child(&FieldMeta::new().flag("db"));
        let child = parent.child(&FieldMeta::new().env("DB_HOST"));

        assert_eq!(child.path(), "db");
    }
}
