//! Per-loader flag namespace built on clap's builder API.
//!
//! Every leaf field with a flag path gets one string-valued long option
//! named by its dotted path; type coercion happens later, during override
//! resolution, not during parsing. The namespace belongs to a single
//! [`Loader`](crate::Loader), so repeated loads never trample a global
//! flag table.

use std::ffi::OsString;

use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::trace;

use crate::error::ConfigResult;
use crate::schema::FieldCx;

/// Reserved flag that overrides the configured file path (`-c <PATH>`).
pub const CONFIG_PATH_FLAG: &str = "c";

/// An accumulating set of string flags plus, after parsing, their values.
pub struct FlagSet {
    name: String,
    args: Vec<Arg>,
    matches: Option<ArgMatches>,
}

impl FlagSet {
    /// Empty namespace holding only the reserved `-c` flag. A record leaf
    /// whose dotted path is literally `c` would collide with it; like any
    /// duplicate path, that is left to the flag library to reject.
    pub fn new(name: impl Into<String>) -> Self {
        let config_path = Arg::new(CONFIG_PATH_FLAG)
            .short('c')
            .value_name("PATH")
            .action(ArgAction::Set)
            .help("config file path");

        FlagSet {
            name: name.into(),
            args: vec![config_path],
            matches: None,
        }
    }

    /// Register one string flag for the leaf at the current path. Called
    /// from leaf `register` impls; a context without a path (untagged
    /// field at the root) registers nothing.
    pub fn add(&mut self, cx: &FieldCx) {
        if cx.path().is_empty() {
            return;
        }

        trace!(flag = cx.path(), "registering flag");

        let mut arg = Arg::new(cx.path().to_string())
            .long(cx.path().to_string())
            .value_name("VALUE")
            .action(ArgAction::Set);
        if let Some(usage) = cx.usage() {
            arg = arg.help(usage);
        }

        self.args.push(arg);
    }

    /// Parse the given argument list (binary name already stripped).
    /// Parsing is terminal for the namespace; the loader calls it at most
    /// once per load.
    pub fn parse<I, T>(&mut self, argv: I) -> ConfigResult<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cmd = Command::new(self.name.clone())
            .no_binary_name(true)
            .args(self.args.iter().cloned());

        self.matches = Some(cmd.try_get_matches_from(argv)?);
        Ok(())
    }

    pub fn is_parsed(&self) -> bool {
        self.matches.is_some()
    }

    /// Value supplied for the flag at `path`, if the flag exists, was
    /// given, and is non-empty.
    pub fn value_of(&self, path: &str) -> Option<&str> {
        let matches = self.matches.as_ref()?;

        matches
            .try_get_one::<String>(path)
            .ok()
            .flatten()
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// The `-c` override for the config file path, if given.
    pub fn config_path(&self) -> Option<&str> {
        self.value_of(CONFIG_PATH_FLAG)
    }
}
