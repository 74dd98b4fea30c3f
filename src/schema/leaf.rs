//! Leaf implementations of [`ConfigNode`]: the primitive types an override
//! string can be coerced into.
//!
//! Coercion failures surface the flag path (or environment name), the target
//! type and the offending value, and abort the whole load.

use std::time::Duration;

use tracing::trace;

use crate::error::{ConfigError, ConfigResult};
use crate::loader::flags::FlagSet;
use crate::schema::{ConfigNode, FieldCx, OverrideSources};

fn trace_write(cx: &FieldCx) {
    trace!(key = cx.describe(), "override applied");
}

macro_rules! numeric_leaf {
    ($($ty:ty),+ $(,)?) => {$(
        impl ConfigNode for $ty {
            fn register(cx: &FieldCx, flags: &mut FlagSet) {
                flags.add(cx);
            }

            fn resolve(
                &mut self,
                cx: &FieldCx,
                sources: &OverrideSources<'_>,
            ) -> ConfigResult<bool> {
                let Some(raw) = sources.lookup(cx) else {
                    return Ok(false);
                };

                *self = raw
                    .parse::<$ty>()
                    .map_err(|err| ConfigError::coerce(cx.describe(), stringify!($ty), &raw, err))?;

                trace_write(cx);
                Ok(true)
            }
        }
    )+};
}

numeric_leaf!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl ConfigNode for String {
    fn register(cx: &FieldCx, flags: &mut FlagSet) {
        flags.add(cx);
    }

    fn resolve(&mut self, cx: &FieldCx, sources: &OverrideSources<'_>) -> ConfigResult<bool> {
        let Some(raw) = sources.lookup(cx) else {
            return Ok(false);
        };

        *self = raw;
        trace_write(cx);
        Ok(true)
    }
}

impl ConfigNode for bool {
    fn register(cx: &FieldCx, flags: &mut FlagSet) {
        flags.add(cx);
    }

    fn resolve(&mut self, cx: &FieldCx, sources: &OverrideSources<'_>) -> ConfigResult<bool> {
        let Some(raw) = sources.lookup(cx) else {
            return Ok(false);
        };

        *self = parse_bool(&raw)
            .ok_or_else(|| ConfigError::coerce(cx.describe(), "bool", &raw, "not a boolean"))?;

        trace_write(cx);
        Ok(true)
    }
}

/// Conventional boolean literals, the same set `strconv.ParseBool` accepts.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Durations use a human-readable grammar (`"1s"`, `"500ms"`, `"2h 30m"`)
/// rather than a bare integer.
impl ConfigNode for Duration {
    fn register(cx: &FieldCx, flags: &mut FlagSet) {
        flags.add(cx);
    }

    fn resolve(&mut self, cx: &FieldCx, sources: &OverrideSources<'_>) -> ConfigResult<bool> {
        let Some(raw) = sources.lookup(cx) else {
            return Ok(false);
        };

        *self = humantime::parse_duration(&raw)
            .map_err(|err| ConfigError::coerce(cx.describe(), "duration", &raw, err))?;

        trace_write(cx);
        Ok(true)
    }
}

/// String lists split the override value on `,` and drop empty segments.
/// The whole list is replaced, never appended to, so resolving twice with
/// the same inputs is idempotent.
impl ConfigNode for Vec<String> {
    fn register(cx: &FieldCx, flags: &mut FlagSet) {
        flags.add(cx);
    }

    fn resolve(&mut self, cx: &FieldCx, sources: &OverrideSources<'_>) -> ConfigResult<bool> {
        let Some(raw) = sources.lookup(cx) else {
            return Ok(false);
        };

        *self = raw
            .split(',')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();

        trace_write(cx);
        Ok(true)
    }
}

/// Optional nodes are materialized lazily: when the slot is `None`, the
/// walk descends into a staged default value and commits it only if some
/// leaf below actually received an override. A slot left alone by both the
/// file decoder and the override sources therefore stays `None`.
impl<T: ConfigNode + Default> ConfigNode for Option<T> {
    fn register(cx: &FieldCx, flags: &mut FlagSet) {
        T::register(cx, flags);
    }

    fn resolve(&mut self, cx: &FieldCx, sources: &OverrideSources<'_>) -> ConfigResult<bool> {
        match self {
            Some(inner) => inner.resolve(cx, sources),
            None => {
                let mut staged = T::default();
                let changed = staged.resolve(cx, sources)?;
                if changed {
                    *self = Some(staged);
                }

                Ok(changed)
            }
        }
    }
}

impl<T: ConfigNode> ConfigNode for Box<T> {
    fn register(cx: &FieldCx, flags: &mut FlagSet) {
        T::register(cx, flags);
    }

    fn resolve(&mut self, cx: &FieldCx, sources: &OverrideSources<'_>) -> ConfigResult<bool> {
        (**self).resolve(cx, sources)
    }
}
