//! Path template compilation.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::{DispatchError, Result};

/// Matches a `:name` token inside a template.
static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":(\w+)").expect("token regex is valid"));

/// Capture group emitted in place of each token.
const VARIABLE_GROUP: &str = r"(\w+)";

/// A piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text, matched as-is.
    Literal(String),
    /// A `:name` variable.
    Variable(String),
}

/// A compiled path template.
#[derive(Debug, Clone)]
pub struct PathPattern {
    /// The original template string.
    template: String,
    /// Parsed segments, in template order.
    segments: Vec<Segment>,
    /// Anchored matcher.
    regex: Regex,
    /// Variable names, one per capture group, in scan order.
    variables: Vec<String>,
}

impl PathPattern {
    /// Compiles a path template.
    ///
    /// Every `:name` token (a colon followed by word characters) becomes a
    /// capture group for one or more word characters. Everything else is
    /// matched literally. The resulting matcher only accepts full-string
    /// matches.
    ///
    /// # Example
    ///
    /// ```
    /// use oxide_dispatch::PathPattern;
    ///
    /// let pattern = PathPattern::compile("/a/:x/b/:y").unwrap();
    /// assert_eq!(pattern.variables(), ["x", "y"]);
    /// let bound = pattern.match_path("/a/1/b/2").unwrap();
    /// assert_eq!(bound, vec![("x", "1"), ("y", "2")]);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidPattern`] if the generated matcher is
    /// rejected by the regex engine.
    pub fn compile(template: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut variables = Vec::new();
        let mut source = String::from("^");
        let mut last = 0;

        for caps in TOKEN.captures_iter(template) {
            let (Some(token), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            push_literal(&mut source, &mut segments, &template[last..token.start()]);
            source.push_str(VARIABLE_GROUP);
            segments.push(Segment::Variable(name.as_str().to_string()));
            variables.push(name.as_str().to_string());
            last = token.end();
        }
        push_literal(&mut source, &mut segments, &template[last..]);
        source.push('$');

        let regex = Regex::new(&source).map_err(|source| DispatchError::InvalidPattern {
            template: template.to_string(),
            source,
        })?;
        debug_assert_eq!(regex.captures_len() - 1, variables.len());

        Ok(Self {
            template: template.to_string(),
            segments,
            regex,
            variables,
        })
    }

    /// Returns the captured values, in variable order, if `path` matches.
    pub fn captures<'p>(&self, path: &'p str) -> Option<Vec<&'p str>> {
        let caps = self.regex.captures(path)?;
        Some(
            caps.iter()
                .skip(1)
                .map(|m| m.map_or("", |m| m.as_str()))
                .collect(),
        )
    }

    /// Matches `path` and pairs each variable name with its captured value.
    pub fn match_path<'s, 'p>(&'s self, path: &'p str) -> Option<Vec<(&'s str, &'p str)>> {
        let values = self.captures(path)?;
        Some(
            self.variables
                .iter()
                .map(String::as_str)
                .zip(values)
                .collect(),
        )
    }

    /// Returns true if `path` matches this pattern.
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Returns the original template string.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the variable names in the order they appear.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Returns the parsed segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the matcher source, including anchors.
    pub fn as_regex_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Builds a concrete path by substituting variable values.
    ///
    /// Returns `None` if any variable has no value.
    ///
    /// # Example
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use oxide_dispatch::PathPattern;
    ///
    /// let pattern = PathPattern::compile("/books/:id").unwrap();
    /// let values: HashMap<String, String> =
    ///     [("id".to_string(), "42".to_string())].into_iter().collect();
    /// assert_eq!(pattern.reverse(&values).as_deref(), Some("/books/42"));
    /// ```
    pub fn reverse(&self, values: &HashMap<String, String>) -> Option<String> {
        let mut path = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => path.push_str(s),
                Segment::Variable(name) => path.push_str(values.get(name)?),
            }
        }
        Some(path)
    }
}

fn push_literal(source: &mut String, segments: &mut Vec<Segment>, literal: &str) {
    if literal.is_empty() {
        return;
    }
    source.push_str(&regex::escape(literal));
    segments.push(Segment::Literal(literal.to_string()));
}
