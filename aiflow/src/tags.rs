//! Tag predicate interface.
//!
//! Condition nodes evaluate a predicate over the agent's externally supplied
//! tag set. The matching rules belong to the tag subsystem; the engine only
//! calls [`TagPredicate::evaluate`] and treats an error as node Failure.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Set of tags describing the agent (e.g. `State.Alerted`, `Team.Red`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: impl Into<String>) -> bool {
        self.0.insert(tag.into())
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        self.0.remove(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        TagSet(iter.into_iter().map(Into::into).collect())
    }
}

/// Opaque predicate text, interpreted by the [`TagPredicate`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagQuery(pub String);

impl TagQuery {
    pub fn new(query: impl Into<String>) -> Self {
        TagQuery(query.into())
    }
}

/// Error raised by a tag predicate evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("evaluation failed: {0}")]
    Evaluation(String),
}

/// Evaluates a predicate against a tag set.
pub trait TagPredicate: Send + Sync {
    fn evaluate(&self, tags: &TagSet, query: &TagQuery) -> Result<bool, TagError>;
}

/// Minimal evaluator: the query is a whitespace-separated list of tags that
/// must all be present; a `!` prefix requires the tag to be absent.
///
/// An empty query matches everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllTagsPredicate;

impl TagPredicate for AllTagsPredicate {
    fn evaluate(&self, tags: &TagSet, query: &TagQuery) -> Result<bool, TagError> {
        for term in query.0.split_whitespace() {
            let (negated, tag) = match term.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, term),
            };
            if tag.is_empty() {
                return Err(TagError::InvalidQuery(query.0.clone()));
            }
            if tags.contains(tag) == negated {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
