//! # Selectors
//!
//! A small CSS selector subset: compound selectors made of a type (`div`,
//! `*`), `#id`, `.class`, `[attr]` and `[attr=value]` parts, joined by the
//! descendant combinator and grouped with `,`.

use crate::{Document, DomError, DomResult, NodeId, TreeTraversal};
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList {
    selectors: Vec<ComplexSelector>,
}

/// Compounds from outermost ancestor to subject
#[derive(Debug, Clone, PartialEq)]
struct ComplexSelector {
    compounds: Vec<Compound>,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeMatch>,
}

#[derive(Debug, Clone, PartialEq)]
struct AttributeMatch {
    name: String,
    value: Option<String>,
}

impl SelectorList {
    pub fn parse(input: &str) -> DomResult<Self> {
        let mut selectors = Vec::new();
        for group in split_groups(input) {
            selectors.push(parse_complex(group, input)?);
        }
        if selectors.is_empty() {
            return Err(DomError::InvalidSelector(input.to_string()));
        }
        Ok(Self { selectors })
    }

    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.selectors.iter().any(|s| s.matches(doc, node))
    }
}

impl ComplexSelector {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some((subject, ancestors)) = self.compounds.split_last() else {
            return false;
        };
        if !subject.matches(doc, node) {
            return false;
        }

        // Greedy right-to-left walk is exact for descendant-only chains.
        let mut remaining = ancestors.iter().rev().peekable();
        let mut current = doc.parent(node);
        while let (Some(compound), Some(candidate)) = (remaining.peek(), current) {
            if compound.matches(doc, candidate) {
                remaining.next();
            }
            current = doc.parent(candidate);
        }
        remaining.peek().is_none()
    }
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.id.is_none() && self.classes.is_empty() && self.attributes.is_empty()
    }

    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(tag) = doc.tag_name(node) else {
            return false;
        };
        if let Some(expected) = &self.tag {
            if expected != "*" && !expected.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if doc.get_attribute(node, "id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let class_attr = doc.get_attribute(node, "class").unwrap_or("");
            if !self
                .classes
                .iter()
                .all(|c| class_attr.split_ascii_whitespace().any(|have| have == c))
            {
                return false;
            }
        }
        self.attributes.iter().all(|attr| {
            match (&attr.value, doc.get_attribute(node, &attr.name)) {
                (None, found) => found.is_some(),
                (Some(expected), Some(found)) => expected == found,
                (Some(_), None) => false,
            }
        })
    }
}

/// Split on top-level commas (commas inside `[...]` are kept).
fn split_groups(input: &str) -> Vec<&str> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in input.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                groups.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    groups.push(&input[start..]);
    groups
}

fn parse_complex(group: &str, whole: &str) -> DomResult<ComplexSelector> {
    let invalid = || DomError::InvalidSelector(whole.to_string());
    let mut chars = group.trim().chars().peekable();
    let mut compounds = Vec::new();
    let mut current = Compound::default();

    while let Some(&ch) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
                if !current.is_empty() {
                    compounds.push(std::mem::take(&mut current));
                }
            }
            '#' => {
                chars.next();
                current.id = Some(read_ident(&mut chars).ok_or_else(invalid)?);
            }
            '.' => {
                chars.next();
                current.classes.push(read_ident(&mut chars).ok_or_else(invalid)?);
            }
            '[' => {
                chars.next();
                current.attributes.push(read_attribute(&mut chars).ok_or_else(invalid)?);
            }
            '*' => {
                chars.next();
                if current.tag.is_some() {
                    return Err(invalid());
                }
                current.tag = Some("*".to_string());
            }
            _ => {
                if current.tag.is_some() || !current.is_empty() {
                    return Err(invalid());
                }
                current.tag = Some(read_ident(&mut chars).ok_or_else(invalid)?);
            }
        }
    }
    if !current.is_empty() {
        compounds.push(current);
    }
    if compounds.is_empty() {
        return Err(invalid());
    }
    Ok(ComplexSelector { compounds })
}

fn read_ident(chars: &mut Peekable<Chars<'_>>) -> Option<String> {
    let mut ident = String::new();
    while let Some(&ch) = chars.peek() {
        if ch.is_alphanumeric() || ch == '-' || ch == '_' {
            ident.push(ch);
            chars.next();
        } else {
            break;
        }
    }
    (!ident.is_empty()).then_some(ident)
}

fn read_attribute(chars: &mut Peekable<Chars<'_>>) -> Option<AttributeMatch> {
    let name = read_ident(chars)?;
    match chars.next()? {
        ']' => Some(AttributeMatch { name, value: None }),
        '=' => {
            let value = match chars.peek()? {
                '"' | '\'' => {
                    let quote = chars.next()?;
                    let mut value = String::new();
                    loop {
                        let ch = chars.next()?;
                        if ch == quote {
                            break;
                        }
                        value.push(ch);
                    }
                    value
                }
                _ => read_ident(chars)?,
            };
            (chars.next()? == ']').then_some(AttributeMatch {
                name,
                value: Some(value),
            })
        }
        _ => None,
    }
}
