//! feature-support checks (`@supports` style conditions)
//!
//! grammar:
//!   condition := "not" in-parens
//!              | in-parens ("and" in-parens)*
//!              | in-parens ("or" in-parens)*
//!   in-parens := "(" condition ")" | "(" declaration ")"
//!
//! a bare `property: value` is accepted as a single declaration.

use std::collections::{BTreeMap, BTreeSet};

/// deepest parenthesized group the parser descends into
const MAX_DEPTH: usize = 32;

/// declarations a simulated host claims to support
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupportTable {
    /// property -> accepted values; an empty set accepts any value
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl SupportTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// build a table from entries like "display: grid" or "gap: *"
    ///
    /// fails with the first malformed entry.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        for entry in entries {
            let entry = entry.as_ref();
            if !table.allow(entry) {
                return Err(entry.to_string());
            }
        }
        Ok(table)
    }

    /// allow a declaration; returns false if the entry is malformed
    pub fn allow(&mut self, entry: &str) -> bool {
        let Some((property, value)) = split_declaration(entry) else {
            return false;
        };
        let values = self.entries.entry(property).or_default();
        if value == "*" {
            values.clear();
            values.insert("*".to_string());
        } else if !values.contains("*") {
            values.insert(value);
        }
        true
    }

    /// check a single declaration
    pub fn supports_declaration(&self, property: &str, value: &str) -> bool {
        let property = property.trim().to_ascii_lowercase();
        let value = normalize_value(value);
        self.entries
            .get(&property)
            .map(|values| values.contains("*") || values.contains(&value))
            .unwrap_or(false)
    }

    /// evaluate a support query; malformed queries are unsupported
    pub fn supports(&self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return false;
        }

        let mut parser = Parser::new(query);
        if let Some(expr) = parser.parse_condition() {
            parser.skip_ws();
            if parser.at_end() {
                return expr.evaluate(self);
            }
        }

        // bare declaration form
        match split_declaration(query) {
            Some((property, value)) if !query.starts_with('(') => {
                self.supports_declaration(&property, &value)
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize_value(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn split_declaration(text: &str) -> Option<(String, String)> {
    let (property, value) = text.split_once(':')?;
    let property = property.trim().to_ascii_lowercase();
    let value = normalize_value(value);
    if property.is_empty()
        || value.is_empty()
        || !property
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return None;
    }
    Some((property, value))
}

#[derive(Debug)]
enum Expr {
    Declaration(String, String),
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl Expr {
    fn evaluate(&self, table: &SupportTable) -> bool {
        match self {
            Expr::Declaration(property, value) => table.supports_declaration(property, value),
            Expr::Not(inner) => !inner.evaluate(table),
            Expr::And(items) => items.iter().all(|e| e.evaluate(table)),
            Expr::Or(items) => items.iter().any(|e| e.evaluate(table)),
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Joiner {
    And,
    Or,
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            depth: 0,
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, c: char) -> bool {
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    /// consume a keyword followed by whitespace or '('
    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let rest = self.rest();
        match rest.get(..keyword.len()) {
            Some(head) if head.eq_ignore_ascii_case(keyword) => {}
            _ => return false,
        }
        let next = rest[keyword.len()..].chars().next();
        if matches!(next, Some(c) if c.is_whitespace() || c == '(') {
            self.pos += keyword.len();
            true
        } else {
            false
        }
    }

    fn parse_condition(&mut self) -> Option<Expr> {
        self.skip_ws();
        if self.eat_keyword("not") {
            let inner = self.parse_in_parens()?;
            return Some(Expr::Not(Box::new(inner)));
        }

        let mut items = vec![self.parse_in_parens()?];
        let mut joiner = None;
        loop {
            let save = self.pos;
            self.skip_ws();
            let next = if self.eat_keyword("and") {
                Joiner::And
            } else if self.eat_keyword("or") {
                Joiner::Or
            } else {
                self.pos = save;
                break;
            };
            // mixing and/or without parentheses is invalid
            if joiner.is_some_and(|j| j != next) {
                return None;
            }
            joiner = Some(next);
            items.push(self.parse_in_parens()?);
        }

        Some(match joiner {
            None => items.remove(0),
            Some(Joiner::And) => Expr::And(items),
            Some(Joiner::Or) => Expr::Or(items),
        })
    }

    /// nesting beyond MAX_DEPTH fails the group instead of recursing further
    fn parse_in_parens(&mut self) -> Option<Expr> {
        self.skip_ws();
        if self.depth >= MAX_DEPTH || !self.eat('(') {
            return None;
        }

        self.depth += 1;
        let expr = self.parse_group();
        self.depth -= 1;
        expr
    }

    /// body of a group whose opening '(' was consumed
    fn parse_group(&mut self) -> Option<Expr> {
        let save = self.pos;
        if let Some(expr) = self.parse_condition() {
            self.skip_ws();
            if self.eat(')') {
                return Some(expr);
            }
        }
        self.pos = save;

        let text = self.read_balanced()?;
        let (property, value) = split_declaration(text)?;
        Some(Expr::Declaration(property, value))
    }

    /// read up to the ')' closing the current group and consume it
    fn read_balanced(&mut self) -> Option<&'a str> {
        let start = self.pos;
        let mut depth = 0usize;
        for (offset, c) in self.rest().char_indices() {
            match c {
                '(' => depth += 1,
                ')' if depth == 0 => {
                    let text = &self.src[start..start + offset];
                    self.pos = start + offset + 1;
                    return Some(text);
                }
                ')' => depth -= 1,
                _ => {}
            }
        }
        None
    }
}
