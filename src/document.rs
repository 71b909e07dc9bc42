//! Document model for parsed configuration.
//!
//! A [`Document`] owns the whole tree: variables in declaration order,
//! top-level lines, and categories which in turn own their lines and
//! subcategories. Categories are identified by `(name, key)`, and several
//! siblings may share one identity, so lookups walk them in order.
//!
//! Serialization is synthetic: comments and original layout are not kept,
//! but re-parsing the output yields a structurally equal document.

use indexmap::IndexMap;

use crate::grammar::parse_path;
use crate::variables::{Bindings, Value};

/// One `name[key]` step of a colon path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub name: String,
    /// `None` matches any key during lookup
    pub key: Option<String>,
}

impl PathSegment {
    pub fn new(name: impl Into<String>, key: Option<String>) -> Self {
        Self {
            name: name.into(),
            key,
        }
    }
}

/// A `key = value` assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub key: String,
    pub value: Value,
    /// Written as `$key` when serialized
    pub is_variable: bool,
}

impl Line {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            is_variable: false,
        }
    }
}

/// A `name[key] { ... }` block
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Category {
    pub name: String,
    pub key: Option<String>,
    pub lines: Vec<Line>,
    pub subcategories: Vec<Category>,
}

impl Category {
    pub fn new(name: impl Into<String>, key: Option<String>) -> Self {
        Self {
            name: name.into(),
            key,
            lines: Vec::new(),
            subcategories: Vec::new(),
        }
    }

    /// Exact `(name, key)` identity
    pub fn has_identity(&self, name: &str, key: Option<&str>) -> bool {
        self.name == name && self.key.as_deref() == key
    }

    /// Lookup match: name equal, and key equal unless the segment has none
    pub fn matches(&self, segment: &PathSegment) -> bool {
        self.name == segment.name
            && segment
                .key
                .as_deref()
                .is_none_or(|key| self.key.as_deref() == Some(key))
    }

    /// First line with the given key
    pub fn line(&self, key: &str) -> Option<&Line> {
        self.lines.iter().find(|line| line.key == key)
    }

    /// First subcategory named `name`; a `None` key matches any key
    pub fn subcategory(&self, name: &str, key: Option<&str>) -> Option<&Category> {
        self.subcategories
            .iter()
            .find(|cat| cat.name == name && key.is_none_or(|k| cat.key.as_deref() == Some(k)))
    }

    fn header(&self) -> String {
        match &self.key {
            Some(key) => format!("{}[{}]", self.name, key),
            None => self.name.clone(),
        }
    }
}

/// Root of a parsed configuration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    /// Variables in declaration order
    pub variables: IndexMap<String, Value>,
    /// Top-level assignments
    pub lines: Vec<Line>,
    /// Top-level categories
    pub categories: Vec<Category>,
}

type Container<'a> = (&'a mut Vec<Line>, &'a mut Vec<Category>);

/// Find the first category with exact identity, creating it when absent.
pub(crate) fn find_or_create<'a>(
    categories: &'a mut Vec<Category>,
    name: &str,
    key: Option<&str>,
) -> &'a mut Category {
    let index = match categories.iter().position(|c| c.has_identity(name, key)) {
        Some(index) => index,
        None => {
            categories.push(Category::new(name, key.map(str::to_string)));
            categories.len() - 1
        }
    };
    &mut categories[index]
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty() && self.lines.is_empty() && self.categories.is_empty()
    }

    /// Variable name to raw value.
    ///
    /// Raw text is used so resolution is one level deep and can never
    /// recurse through self-referencing variables. Only `##` is unescaped.
    pub fn bindings(&self) -> Bindings {
        self.variables
            .iter()
            .map(|(name, value)| (name.clone(), value.raw.replace("##", "#")))
            .collect()
    }

    /// Resolved variable value, falling back to the process environment
    pub fn variable(&self, name: &str) -> Option<String> {
        match self.variables.get(name) {
            Some(value) => Some(value.resolve(&self.bindings())),
            None => std::env::var(name).ok(),
        }
    }

    /// Define or overwrite a variable, keeping its original position
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    /// First top-level category named `name`; a `None` key matches any key
    pub fn category(&self, name: &str, key: Option<&str>) -> Option<&Category> {
        self.categories
            .iter()
            .find(|cat| cat.name == name && key.is_none_or(|k| cat.key.as_deref() == Some(k)))
    }

    /// All top-level categories named `name`
    pub fn categories_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Category> {
        self.categories.iter().filter(move |cat| cat.name == name)
    }

    /// Resolved value at a colon path such as `general:gaps_in` or
    /// `device[mouse]:sensitivity`.
    pub fn get(&self, path: &str) -> Option<String> {
        let segments = parse_path(path).ok()?;
        let (last, intermediate) = segments.split_last()?;

        let mut lines = &self.lines;
        let mut categories = &self.categories;
        for segment in intermediate {
            let found = categories.iter().find(|cat| cat.matches(segment))?;
            lines = &found.lines;
            categories = &found.subcategories;
        }

        lines
            .iter()
            .find(|line| line.key == last.name)
            .map(|line| line.value.resolve(&self.bindings()))
    }

    /// Assign a value at a colon path, creating categories as needed.
    ///
    /// Every category matching an intermediate segment is followed. The
    /// first existing line with the final key is updated; otherwise a new
    /// line goes into the first matched container. Returns `false` only
    /// for an empty or malformed path.
    pub fn set(&mut self, path: &str, value: &str) -> bool {
        let Ok(segments) = parse_path(path) else {
            return false;
        };
        let Some((last, intermediate)) = segments.split_last() else {
            return false;
        };
        let value = Value::parse(value);

        let mut containers: Vec<Container<'_>> = vec![(&mut self.lines, &mut self.categories)];
        for segment in intermediate {
            let any_match = containers
                .iter()
                .any(|(_, cats)| cats.iter().any(|cat| cat.matches(segment)));

            containers = if any_match {
                containers
                    .into_iter()
                    .flat_map(|(_, cats)| cats.iter_mut().filter(|cat| cat.matches(segment)))
                    .map(|cat| (&mut cat.lines, &mut cat.subcategories))
                    .collect()
            } else {
                let Some((_, cats)) = containers.into_iter().next() else {
                    return false;
                };
                cats.push(Category::new(&segment.name, segment.key.clone()));
                match cats.last_mut() {
                    Some(cat) => vec![(&mut cat.lines, &mut cat.subcategories)],
                    None => return false,
                }
            };
        }

        for (lines, _) in containers.iter_mut() {
            if let Some(line) = lines.iter_mut().find(|line| line.key == last.name) {
                line.value = value;
                return true;
            }
        }
        if let Some((lines, _)) = containers.into_iter().next() {
            lines.push(Line::new(&last.name, value));
        }
        true
    }

    /// Fold another document into this one.
    ///
    /// Variables overwrite, lines append, and top-level categories with
    /// the same identity absorb the incoming lines and subcategories.
    pub fn merge(&mut self, other: Document) {
        for (name, value) in other.variables {
            self.variables.insert(name, value);
        }
        self.lines.extend(other.lines);

        for incoming in other.categories {
            match self
                .categories
                .iter_mut()
                .find(|cat| cat.has_identity(&incoming.name, incoming.key.as_deref()))
            {
                Some(existing) => {
                    existing.lines.extend(incoming.lines);
                    existing.subcategories.extend(incoming.subcategories);
                }
                None => self.categories.push(incoming),
            }
        }
    }

    /// Render the document as configuration text.
    pub fn serialize(&self) -> String {
        let mut out = String::new();

        for (name, value) in &self.variables {
            push_assignment(&mut out, 0, &format!("${name}"), &value.raw);
        }
        if !self.variables.is_empty() && (!self.lines.is_empty() || !self.categories.is_empty()) {
            out.push('\n');
        }

        for line in &self.lines {
            push_line(&mut out, 0, line);
        }

        for category in &self.categories {
            if !out.is_empty() {
                out.push('\n');
            }
            push_category(&mut out, 0, category);
        }

        if !out.ends_with('\n') {
            out.push('\n');
        }
        out
    }
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str("    ");
    }
}

fn push_assignment(out: &mut String, level: usize, key: &str, raw: &str) {
    indent(out, level);
    out.push_str(key);
    if raw.is_empty() {
        out.push_str(" =\n");
    } else {
        out.push_str(" = ");
        out.push_str(raw);
        out.push('\n');
    }
}

fn push_line(out: &mut String, level: usize, line: &Line) {
    if line.is_variable {
        push_assignment(out, level, &format!("${}", line.key), &line.value.raw);
    } else {
        push_assignment(out, level, &line.key, &line.value.raw);
    }
}

fn push_category(out: &mut String, level: usize, category: &Category) {
    indent(out, level);
    out.push_str(&category.header());
    out.push_str(" {\n");
    for line in &category.lines {
        push_line(out, level + 1, line);
    }
    for sub in &category.subcategories {
        push_category(out, level + 1, sub);
    }
    indent(out, level);
    out.push_str("}\n");
}
