//! Placeholder substitution for argument templates
//!
//! Argument values in the registry may reference a small, closed set of
//! placeholders (`$YAML_DIR`, `${DATA_DIR}`, ...). Templates are parsed once when
//! the registry is built, so a misspelled placeholder is rejected before any
//! process is launched. Resolution against a [`SubstitutionContext`] is pure.
//!
//! ## Syntax
//!
//! - `$NAME` where `NAME` matches `[A-Za-z_][A-Za-z0-9_]*`
//! - `${NAME}` for placeholders embedded in identifiers
//! - `$$` for a literal `$`

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use thiserror::Error;

/// Errors raised while parsing or resolving a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubstitutionError {
    #[error("unknown placeholder `${name}` in `{template}`")]
    UnknownPlaceholder { name: String, template: String },

    #[error("invalid placeholder at offset {offset} in `{template}`")]
    InvalidPlaceholder { offset: usize, template: String },

    #[error("no value supplied for placeholder `${0}`")]
    MissingVariable(Placeholder),
}

/// The placeholders a template may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Placeholder {
    /// Directory holding the validator YAML configurations
    YamlDir,
    /// Directory holding the validator input data
    DataDir,
}

impl Placeholder {
    pub const ALL: [Placeholder; 2] = [Placeholder::YamlDir, Placeholder::DataDir];

    /// Name as written in templates (without the sigil).
    pub fn name(self) -> &'static str {
        match self {
            Placeholder::YamlDir => "YAML_DIR",
            Placeholder::DataDir => "DATA_DIR",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read-only placeholder values for one harness run.
#[derive(Debug, Clone, Default)]
pub struct SubstitutionContext {
    values: BTreeMap<Placeholder, String>,
}

impl SubstitutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a placeholder value, replacing any previous one.
    pub fn with(mut self, placeholder: Placeholder, value: impl Into<String>) -> Self {
        self.values.insert(placeholder, value.into());
        self
    }

    /// Set a placeholder to a filesystem path.
    pub fn with_path(self, placeholder: Placeholder, path: &Path) -> Self {
        self.with(placeholder, path.to_string_lossy())
    }

    pub fn get(&self, placeholder: Placeholder) -> Option<&str> {
        self.values.get(&placeholder).map(String::as_str)
    }

    pub fn contains(&self, placeholder: Placeholder) -> bool {
        self.values.contains_key(&placeholder)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Var(Placeholder),
}

/// A parsed argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template, rejecting malformed or unknown placeholders.
    pub fn parse(source: &str) -> Result<Self, SubstitutionError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let bytes = source.as_bytes();
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i] != b'$' {
                // Copy up to the next sigil in one go; '$' is ASCII so this stays on a char boundary
                let end = source[i..].find('$').map_or(source.len(), |off| i + off);
                literal.push_str(&source[i..end]);
                i = end;
                continue;
            }

            let start = i;
            let invalid = move || SubstitutionError::InvalidPlaceholder {
                offset: start,
                template: source.to_string(),
            };

            let (name, next) = match bytes.get(i + 1) {
                Some(b'$') => {
                    literal.push('$');
                    i += 2;
                    continue;
                }
                Some(b'{') => {
                    let close = source[i + 2..].find('}').ok_or_else(invalid)?;
                    let name = &source[i + 2..i + 2 + close];
                    if !is_identifier(name) {
                        return Err(invalid());
                    }
                    (name, i + 2 + close + 1)
                }
                Some(_) => {
                    let len = identifier_len(&source[i + 1..]);
                    if len == 0 {
                        return Err(invalid());
                    }
                    (&source[i + 1..i + 1 + len], i + 1 + len)
                }
                None => return Err(invalid()),
            };

            let placeholder = Placeholder::from_name(name).ok_or_else(|| SubstitutionError::UnknownPlaceholder {
                name: name.to_string(),
                template: source.to_string(),
            })?;
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Var(placeholder));
            i = next;
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Placeholders referenced by this template, in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = Placeholder> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Var(p) => Some(*p),
            Segment::Literal(_) => None,
        })
    }

    /// Replace every placeholder with its context value.
    pub fn resolve(&self, context: &SubstitutionContext) -> Result<String, SubstitutionError> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Var(p) => {
                    let value = context.get(*p).ok_or(SubstitutionError::MissingVariable(*p))?;
                    out.push_str(value);
                }
            }
        }
        tracing::debug!("Input:'{}' output:'{}'", self.source, out);
        Ok(out)
    }
}

fn identifier_len(s: &str) -> usize {
    let mut len = 0;
    for (idx, ch) in s.char_indices() {
        let ok = if idx == 0 {
            ch.is_ascii_alphabetic() || ch == '_'
        } else {
            ch.is_ascii_alphanumeric() || ch == '_'
        };
        if !ok {
            break;
        }
        len = idx + ch.len_utf8();
    }
    len
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && identifier_len(s) == s.len()
}
