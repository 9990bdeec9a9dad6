//! Selector matcher for the integration tests
//!
//! Compound selectors (type, universal, id, class, attribute presence and
//! equality) joined by descendant or child combinators, in comma-separated
//! lists. Documents under test install it with `set_selector_matcher`.

use std::iter::Peekable;
use std::str::Chars;

use fos_dom::{NodeType, HTML_NAMESPACE};
use fos_js_dom::{parse_tokens, DomException, DomResult, DomTree, NodeId, SelectorMatcher};

/// Simple selector types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    /// Universal selector (*)
    Universal,
    /// Type selector (div, span, etc.)
    Tag(Box<str>),
    /// Class selector (.class)
    Class(Box<str>),
    /// ID selector (#id)
    Id(Box<str>),
    /// Attribute existence ([attr])
    AttrExists(Box<str>),
    /// Attribute equals ([attr=value])
    AttrEquals(Box<str>, Box<str>),
}

impl SimpleSelector {
    /// Match against an element
    pub fn matches(&self, tree: &DomTree, id: NodeId) -> bool {
        let html = tree.namespace(id) == Some(HTML_NAMESPACE);
        let attr = |name: &str| {
            if html {
                tree.get_attr(id, &name.to_ascii_lowercase())
            } else {
                tree.get_attr(id, name)
            }
        };
        match self {
            SimpleSelector::Universal => true,
            SimpleSelector::Tag(tag) => tree.local_name(id).is_some_and(|local| {
                if html {
                    local.eq_ignore_ascii_case(tag)
                } else {
                    local == tag.as_ref()
                }
            }),
            SimpleSelector::Class(class) => attr("class")
                .is_some_and(|value| parse_tokens(value).iter().any(|c| c == class.as_ref())),
            SimpleSelector::Id(wanted) => attr("id") == Some(wanted.as_ref()),
            SimpleSelector::AttrExists(name) => attr(name).is_some(),
            SimpleSelector::AttrEquals(name, value) => attr(name) == Some(value.as_ref()),
        }
    }
}

/// Simple selectors that must all match one element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundSelector {
    pub selectors: Vec<SimpleSelector>,
}

impl CompoundSelector {
    pub fn matches(&self, tree: &DomTree, id: NodeId) -> bool {
        tree.node_type(id) == Some(NodeType::Element)
            && self.selectors.iter().all(|s| s.matches(tree, id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `a b`
    Descendant,
    /// `a > b`
    Child,
}

/// Compound selectors joined by combinators; `combinators[i]` sits between
/// `compounds[i]` and `compounds[i + 1]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub compounds: Vec<CompoundSelector>,
    pub combinators: Vec<Combinator>,
}

impl ComplexSelector {
    pub fn matches(&self, tree: &DomTree, id: NodeId) -> bool {
        match self.compounds.len() {
            0 => false,
            n => self.matches_from(tree, id, n - 1),
        }
    }

    /// Right-to-left match of `compounds[..=index]` ending at `id`
    fn matches_from(&self, tree: &DomTree, id: NodeId, index: usize) -> bool {
        if !self.compounds[index].matches(tree, id) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match self.combinators[index - 1] {
            Combinator::Child => tree
                .parent(id)
                .is_some_and(|parent| self.matches_from(tree, parent, index - 1)),
            Combinator::Descendant => tree
                .ancestors(id)
                .any(|ancestor| self.matches_from(tree, ancestor, index - 1)),
        }
    }
}

/// Parse a comma-separated selector list
pub fn parse_selector_list(text: &str) -> DomResult<Vec<ComplexSelector>> {
    let mut parser = Parser {
        text,
        chars: text.chars().peekable(),
    };
    let mut list = vec![parser.complex()?];
    while parser.chars.next_if_eq(&',').is_some() {
        list.push(parser.complex()?);
    }
    match parser.chars.peek() {
        None => Ok(list),
        Some(&c) => Err(parser.error(&format!("unexpected {c:?}"))),
    }
}

struct Parser<'a> {
    text: &'a str,
    chars: Peekable<Chars<'a>>,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

impl Parser<'_> {
    fn error(&self, message: &str) -> DomException {
        DomException::Syntax(format!("{message} in selector {:?}", self.text))
    }

    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while self.chars.next_if(|c| c.is_ascii_whitespace()).is_some() {
            skipped = true;
        }
        skipped
    }

    fn ident(&mut self) -> DomResult<String> {
        let mut ident = String::new();
        while let Some(c) = self.chars.next_if(|&c| is_ident_char(c)) {
            ident.push(c);
        }
        if ident.is_empty() {
            return Err(self.error("expected identifier"));
        }
        Ok(ident)
    }

    fn complex(&mut self) -> DomResult<ComplexSelector> {
        self.skip_whitespace();
        let mut selector = ComplexSelector {
            compounds: vec![self.compound()?],
            combinators: Vec::new(),
        };
        loop {
            let spaced = self.skip_whitespace();
            let combinator = match self.chars.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.chars.next();
                    self.skip_whitespace();
                    Combinator::Child
                }
                Some('+') | Some('~') => return Err(self.error("unsupported combinator")),
                Some(_) if spaced => Combinator::Descendant,
                Some(&c) => return Err(self.error(&format!("unexpected {c:?}"))),
            };
            selector.combinators.push(combinator);
            selector.compounds.push(self.compound()?);
        }
        Ok(selector)
    }

    fn compound(&mut self) -> DomResult<CompoundSelector> {
        let mut selectors = Vec::new();
        match self.chars.peek() {
            Some('*') => {
                self.chars.next();
                selectors.push(SimpleSelector::Universal);
            }
            Some(&c) if is_ident_char(c) => {
                selectors.push(SimpleSelector::Tag(self.ident()?.into()));
            }
            _ => {}
        }
        loop {
            match self.chars.peek() {
                Some('#') => {
                    self.chars.next();
                    selectors.push(SimpleSelector::Id(self.ident()?.into()));
                }
                Some('.') => {
                    self.chars.next();
                    selectors.push(SimpleSelector::Class(self.ident()?.into()));
                }
                Some('[') => {
                    self.chars.next();
                    selectors.push(self.attribute()?);
                }
                Some(':') => return Err(self.error("pseudo-classes are not supported")),
                _ => break,
            }
        }
        if selectors.is_empty() {
            return Err(self.error("expected selector"));
        }
        Ok(CompoundSelector { selectors })
    }

    /// `[name]` or `[name=value]`, after the opening bracket
    fn attribute(&mut self) -> DomResult<SimpleSelector> {
        self.skip_whitespace();
        let name = self.ident()?;
        self.skip_whitespace();
        let selector = if self.chars.next_if_eq(&'=').is_some() {
            self.skip_whitespace();
            let value = match self.chars.peek() {
                Some(&quote) if quote == '"' || quote == '\'' => {
                    self.chars.next();
                    let mut value = String::new();
                    loop {
                        match self.chars.next() {
                            Some(c) if c == quote => break,
                            Some(c) => value.push(c),
                            None => return Err(self.error("unterminated string")),
                        }
                    }
                    value
                }
                _ => self.ident()?,
            };
            self.skip_whitespace();
            SimpleSelector::AttrEquals(name.into(), value.into())
        } else {
            SimpleSelector::AttrExists(name.into())
        };
        if self.chars.next_if_eq(&']').is_none() {
            return Err(self.error("expected ']'"));
        }
        Ok(selector)
    }
}

/// Matcher for the selector subset described above
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleSelectorMatcher;

impl SelectorMatcher for SimpleSelectorMatcher {
    fn query_all(&self, tree: &DomTree, root: NodeId, selectors: &str) -> DomResult<Vec<NodeId>> {
        let list = parse_selector_list(selectors)?;
        let found: Vec<NodeId> = tree
            .descendants(root)
            .filter(|&id| list.iter().any(|selector| selector.matches(tree, id)))
            .collect();
        tracing::trace!(selectors, matches = found.len(), "selector query");
        Ok(found)
    }

    fn query(&self, tree: &DomTree, root: NodeId, selectors: &str) -> DomResult<Option<NodeId>> {
        let list = parse_selector_list(selectors)?;
        Ok(tree
            .descendants(root)
            .find(|&id| list.iter().any(|selector| selector.matches(tree, id))))
    }
}
