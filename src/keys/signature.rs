//! Call signatures
//!
//! A signature is the canonical text form of a call's arguments. Positional
//! arguments keep their order; keyword arguments are sorted by name, so two
//! calls with the same keywords in any order produce the same signature.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

const ARG_SEPARATOR: char = ',';
const SECTION_SEPARATOR: char = ':';
const PAIR_SEPARATOR: char = '=';
const ESCAPE: char = '%';
const EMPTY_ARG: &str = "%00";

/// Arguments of a cached call: ordered positional values plus named values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallArgs {
    args: Vec<String>,
    kwargs: BTreeMap<String, String>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl fmt::Display) -> Self {
        self.args.push(value.to_string());
        self
    }

    /// Sets a keyword argument, replacing an earlier value for the same name.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.kwargs.insert(name.into(), value.to_string());
        self
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn kwargs(&self) -> &BTreeMap<String, String> {
        &self.kwargs
    }

    /// Renders the canonical signature.
    ///
    /// Layout is `a1,a2:k1=v1:k2=v2`. Separator characters inside values are
    /// percent-escaped so distinct argument lists never render alike.
    pub fn signature(&self) -> Signature {
        let mut out = String::new();

        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                out.push(ARG_SEPARATOR);
            }
            if arg.is_empty() {
                // Keeps `[""]` apart from no positional arguments at all
                out.push_str(EMPTY_ARG);
            } else {
                push_escaped(&mut out, arg);
            }
        }
        out.push(SECTION_SEPARATOR);
        for (i, (name, value)) in self.kwargs.iter().enumerate() {
            if i > 0 {
                out.push(SECTION_SEPARATOR);
            }
            push_escaped(&mut out, name);
            out.push(PAIR_SEPARATOR);
            push_escaped(&mut out, value);
        }

        Signature(out)
    }
}

impl<K, V> FromIterator<(K, V)> for CallArgs
where
    K: Into<String>,
    V: fmt::Display,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(CallArgs::new(), |call, (name, value)| call.kwarg(name, value))
    }
}

fn push_escaped(out: &mut String, raw: &str) {
    for ch in raw.chars() {
        match ch {
            ESCAPE => out.push_str("%25"),
            ARG_SEPARATOR => out.push_str("%2C"),
            SECTION_SEPARATOR => out.push_str("%3A"),
            PAIR_SEPARATOR => out.push_str("%3D"),
            _ => out.push(ch),
        }
    }
}

/// Canonical call signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(String);

impl Signature {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Signature {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
