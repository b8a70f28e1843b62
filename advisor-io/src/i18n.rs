//! Display strings looked up by dotted key, e.g. `report.title`.
//!
//! Only the report and the shells use this; the engine deals in data.

use std::path::Path;

use advisor_core::AdvisorError;
use serde_json::Value;

use crate::loader::read_json_file;

pub const DEFAULT_LANGUAGE: &str = "pl";

const BUILTIN: &[(&str, &str)] = &[
    ("pl", include_str!("../i18n/pl.json")),
    ("en", include_str!("../i18n/en.json")),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Translations {
    language: String,
    strings: Value,
}

impl Translations {
    pub fn new(language: impl Into<String>, strings: Value) -> Self {
        Self {
            language: language.into(),
            strings,
        }
    }

    /// One of the catalogues shipped with the crate.
    pub fn builtin(language: &str) -> Option<Self> {
        let (code, json) = BUILTIN.iter().find(|(code, _)| *code == language)?;
        let strings = serde_json::from_str(json).ok()?;
        Some(Self::new(*code, strings))
    }

    pub fn available_languages() -> Vec<&'static str> {
        BUILTIN.iter().map(|(code, _)| *code).collect()
    }

    /// Loads a catalogue file; the language code is the file stem.
    pub fn from_file(path: &Path) -> Result<Self, AdvisorError> {
        let language = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(DEFAULT_LANGUAGE)
            .to_string();
        Ok(Self::new(language, read_json_file(path)?))
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn lookup(&self, key: &str) -> Option<&str> {
        key.split('.')
            .try_fold(&self.strings, |node, part| node.get(part))
            .and_then(Value::as_str)
    }

    /// The string for `key`, or the key itself when it is missing.
    pub fn t(&self, key: &str) -> String {
        self.lookup(key).unwrap_or(key).to_string()
    }

    /// Like [`t`](Self::t), filling `{}` and `{N}` placeholders from `args`.
    pub fn t_args(&self, key: &str, args: &[&str]) -> String {
        match self.lookup(key) {
            Some(template) => fill_placeholders(template, args),
            None => key.to_string(),
        }
    }
}

impl Default for Translations {
    fn default() -> Self {
        Self::builtin(DEFAULT_LANGUAGE).unwrap_or_else(|| Self::new(DEFAULT_LANGUAGE, Value::Null))
    }
}

fn fill_placeholders(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut next = 0;
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            rest = "";
            break;
        };

        let inner = &after[..close];
        let index = if inner.is_empty() {
            next += 1;
            Some(next - 1)
        } else {
            inner.parse::<usize>().ok()
        };
        match index.and_then(|index| args.get(index)) {
            Some(arg) => out.push_str(arg),
            // Unknown or named placeholders stay verbatim.
            None => {
                out.push('{');
                out.push_str(inner);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}
