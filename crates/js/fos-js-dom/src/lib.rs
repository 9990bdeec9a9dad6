//! fOS JS DOM - script-facing Document Object Model
//!
//! Exposes a `fos_dom::DomTree` to a scripting host as DOM objects:
//! identity-stable node proxies, live and static collections, token lists,
//! ranges, node iterators and tree walkers, and node equality.
//!
//! Everything here is single-threaded (`Rc`/`RefCell`). A `Document` owns
//! the tree; nodes, collections, ranges and cursors refer back to it.
//!
//! ```
//! use fos_js_dom::{Document, DocumentConfig};
//!
//! let doc = Document::new(DocumentConfig::default());
//! let div = doc.create_element("div").unwrap();
//! doc.node().append_child(&div).unwrap();
//!
//! let divs = doc.get_elements_by_tag_name("div");
//! assert_eq!(divs.item(0), Some(div));
//! ```

mod character_data;
mod collection;
mod config;
mod document;
mod element;
mod equality;
mod error;
mod html_collection;
mod node;
mod range;
mod registry;
mod selector;
mod token_list;
mod traversal;

pub use collection::{
    reset_on_attributes, reset_on_child_list, Collection, CollectionScope, EffectFn,
    MutationEffect, MutationEvent, Predicate,
};
pub use config::{DocumentConfig, DocumentKind, ScriptRealm};
pub use document::Document;
pub use error::{DomException, DomResult};
pub use node::{Node, NodeKind};
pub use range::{AbstractRange, Range, StaticRange};
pub use registry::{ProxyRegistry, ScriptHost};
pub use selector::SelectorMatcher;
pub use token_list::{parse_tokens, DOMTokenList};
pub use traversal::{FilterResult, NodeFilter, NodeIterator, TreeWalker, WhatToShow};

pub use fos_dom::{DomTree, NodeId};
