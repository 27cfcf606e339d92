//! Path grammar and schema-tree resolution.
//!
//! Paths address schema (and, during leafref checking, data) positions:
//! `/` separates segments; a segment is `..`, a `module:name` qualified
//! name, or a name followed by bracketed predicates
//! (`name[key="value"]`, `name[key=current()/../other]`). Module
//! prefixes are stripped before lookup. A predicate value starting with
//! `current()` is evaluated against the data-tree position of the node
//! instantiating the path, not its schema position.

use thiserror::Error;

use crate::schema::{SchemaNodeId, SchemaTree};

/// Syntax errors in a path expression.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PathSyntaxError {
    #[error("empty path")]
    Empty,

    #[error("empty segment in path '{path}'")]
    EmptySegment { path: String },

    #[error("mismatched brackets in '{path}'")]
    MismatchedBrackets { path: String },

    #[error("misordered brackets in '{path}'")]
    MisorderedBrackets { path: String },

    #[error("invalid prefixed name '{name}'")]
    InvalidPrefixedName { name: String },

    #[error("invalid predicate '{predicate}'")]
    InvalidPredicate { predicate: String },
}

/// Resolution errors against a schema tree.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PathResolveError {
    #[error(transparent)]
    Syntax(#[from] PathSyntaxError),

    #[error("dangling reference: no parent to ascend to from '{at}'")]
    DanglingParent { at: String },

    #[error("schema node '{at}' has no child '{name}'")]
    MissingChild { at: String, name: String },
}

/// One step of a parsed path.
#[derive(Debug, Clone, PartialEq)]
pub enum PathStep {
    /// `..`
    Up,
    /// A named child, with any predicates attached to the segment.
    Named {
        name: String,
        predicates: Vec<Predicate>,
    },
}

/// One bracketed predicate: `[key=value]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub key: String,
    pub value: PredicateValue,
}

/// The right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateValue {
    /// A quoted literal.
    Literal(String),
    /// A `current()`-anchored relative path: the steps following
    /// `current()`, each either `..` or a child name.
    Current(Vec<CurrentStep>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CurrentStep {
    Up,
    Child(String),
}

/// A fully parsed path expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPath {
    pub absolute: bool,
    pub steps: Vec<PathStep>,
}

/// Strip a module prefix from a qualified name. More than one `:` is
/// invalid; an empty remainder is invalid.
pub fn strip_module_prefix(name: &str) -> Result<&str, PathSyntaxError> {
    let mut parts = name.split(':');
    let first = parts.next().unwrap_or("");
    let bare = match parts.next() {
        None => first,
        Some(rest) => {
            if parts.next().is_some() || first.is_empty() {
                return Err(PathSyntaxError::InvalidPrefixedName {
                    name: name.to_string(),
                });
            }
            rest
        }
    };
    if bare.is_empty() {
        return Err(PathSyntaxError::InvalidPrefixedName {
            name: name.to_string(),
        });
    }
    Ok(bare)
}

/// Remove all bracketed predicates from a path, keeping only the
/// schema-tree address: `/a/b[k="v"]/c` becomes `/a/b/c`. Unbalanced or
/// misordered brackets are syntax errors.
pub fn strip_predicates(path: &str) -> Result<String, PathSyntaxError> {
    let mut out = String::with_capacity(path.len());
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for c in path.chars() {
        match c {
            '"' | '\'' if depth > 0 => {
                match quote {
                    None => quote = Some(c),
                    Some(q) if q == c => quote = None,
                    Some(_) => {}
                }
            }
            '[' if quote.is_none() => depth += 1,
            ']' if quote.is_none() => {
                if depth == 0 {
                    return Err(PathSyntaxError::MisorderedBrackets {
                        path: path.to_string(),
                    });
                }
                depth -= 1;
            }
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    if depth != 0 || quote.is_some() {
        return Err(PathSyntaxError::MismatchedBrackets {
            path: path.to_string(),
        });
    }
    Ok(out)
}

/// Split a path into raw segments, honoring brackets and quotes.
fn split_segments(path: &str) -> Result<Vec<&str>, PathSyntaxError> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0usize;
    for (i, c) in path.char_indices() {
        match c {
            '"' | '\'' if depth > 0 => {
                match quote {
                    None => quote = Some(c),
                    Some(q) if q == c => quote = None,
                    Some(_) => {}
                }
            }
            '[' if quote.is_none() => depth += 1,
            ']' if quote.is_none() => {
                if depth == 0 {
                    return Err(PathSyntaxError::MisorderedBrackets {
                        path: path.to_string(),
                    });
                }
                depth -= 1;
            }
            '/' if quote.is_none() && depth == 0 => {
                segments.push(&path[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 || quote.is_some() {
        return Err(PathSyntaxError::MismatchedBrackets {
            path: path.to_string(),
        });
    }
    segments.push(&path[start..]);
    Ok(segments)
}

/// Parse one `key=value` predicate body (the text between brackets).
fn parse_predicate(body: &str) -> Result<Predicate, PathSyntaxError> {
    let invalid = || PathSyntaxError::InvalidPredicate {
        predicate: body.to_string(),
    };

    let (key, value) = body.split_once('=').ok_or_else(invalid)?;
    let key = strip_module_prefix(key.trim())?.to_string();
    let value = value.trim();

    for quote in ['"', '\''] {
        if let Some(rest) = value.strip_prefix(quote) {
            let literal = rest.strip_suffix(quote).ok_or_else(invalid)?;
            return Ok(Predicate {
                key,
                value: PredicateValue::Literal(literal.to_string()),
            });
        }
    }

    if let Some(rest) = value.strip_prefix("current()/") {
        let mut steps = Vec::new();
        for step in rest.split('/') {
            if step == ".." {
                steps.push(CurrentStep::Up);
            } else if step.is_empty() {
                return Err(invalid());
            } else {
                steps.push(CurrentStep::Child(strip_module_prefix(step)?.to_string()));
            }
        }
        return Ok(Predicate {
            key,
            value: PredicateValue::Current(steps),
        });
    }

    // Unquoted values that are not current()-anchored are invalid.
    Err(invalid())
}

/// Parse one raw segment into a step.
fn parse_segment(segment: &str, path: &str) -> Result<PathStep, PathSyntaxError> {
    if segment.is_empty() {
        return Err(PathSyntaxError::EmptySegment {
            path: path.to_string(),
        });
    }
    if segment == ".." {
        return Ok(PathStep::Up);
    }

    let (name_part, mut rest) = match segment.find('[') {
        Some(pos) => (&segment[..pos], &segment[pos..]),
        None => (segment, ""),
    };
    let name = strip_module_prefix(name_part)?.to_string();

    let mut predicates = Vec::new();
    while !rest.is_empty() {
        let close = find_closing_bracket(rest).ok_or_else(|| {
            PathSyntaxError::MismatchedBrackets {
                path: path.to_string(),
            }
        })?;
        predicates.push(parse_predicate(&rest[1..close])?);
        rest = &rest[close + 1..];
        if !rest.is_empty() && !rest.starts_with('[') {
            return Err(PathSyntaxError::MisorderedBrackets {
                path: path.to_string(),
            });
        }
    }

    Ok(PathStep::Named { name, predicates })
}

/// Position of the `]` matching the `[` at the start of `s`.
fn find_closing_bracket(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match c {
            '"' | '\'' => match quote {
                None => quote = Some(c),
                Some(q) if q == c => quote = None,
                Some(_) => {}
            },
            ']' if quote.is_none() => return Some(i),
            _ => {}
        }
    }
    None
}

/// Parse a full path expression.
pub fn parse_path(path: &str) -> Result<ParsedPath, PathSyntaxError> {
    if path.is_empty() {
        return Err(PathSyntaxError::Empty);
    }
    let (absolute, body) = match path.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, path),
    };
    if body.is_empty() {
        return Err(PathSyntaxError::Empty);
    }

    let mut steps = Vec::new();
    for segment in split_segments(body)? {
        steps.push(parse_segment(segment, path)?);
    }
    Ok(ParsedPath { absolute, steps })
}

/// Resolve a path to a schema node, starting from `from`.
///
/// An absolute path begins at the tree root reached by ascending parent
/// links (a node flagged as the synthetic root counts as the root). A
/// relative path is evaluated from the node itself, so its leading `..`
/// moves to the node's parent. Predicates only restrict the data-tree
/// walk, not the schema address, and are skipped here.
pub fn resolve_schema_path(
    tree: &SchemaTree,
    from: SchemaNodeId,
    path: &str,
) -> Result<SchemaNodeId, PathResolveError> {
    let parsed = parse_path(path)?;
    resolve_parsed(tree, from, &parsed)
}

/// Resolve an already-parsed path to a schema node.
pub fn resolve_parsed(
    tree: &SchemaTree,
    from: SchemaNodeId,
    parsed: &ParsedPath,
) -> Result<SchemaNodeId, PathResolveError> {
    let mut cur = if parsed.absolute {
        tree.root_of(from)
    } else {
        from
    };

    for step in &parsed.steps {
        match step {
            PathStep::Up => {
                cur = tree
                    .node(cur)
                    .parent
                    .ok_or_else(|| PathResolveError::DanglingParent {
                        at: tree.node(cur).name.clone(),
                    })?;
            }
            PathStep::Named { name, .. } => {
                cur = tree.data_child(cur, name).ok_or_else(|| {
                    PathResolveError::MissingChild {
                        at: tree.node(cur).name.clone(),
                        name: name.clone(),
                    }
                })?;
            }
        }
    }
    Ok(cur)
}
