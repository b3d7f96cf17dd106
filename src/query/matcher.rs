//! Matchers: doc-at-a-time query evaluation.
//!
//! A matcher walks the documents matching a query in ascending doc id order
//! and scores the document it is positioned on. Matchers are positioned on
//! their first match at construction; `next` and `skip_to` move strictly
//! forward. An exhausted matcher reports [`NO_MORE_DOCS`] as its doc id.

use std::fmt::Debug;
use std::sync::Arc;

use crate::error::Result;
use crate::index::posting::PostingList;
use crate::query::scorer::TfIdfScorer;

/// Sentinel doc id for exhausted matchers.
pub const NO_MORE_DOCS: u64 = u64::MAX;

/// Trait for document matchers.
pub trait Matcher: Send + Debug {
    /// The doc id this matcher is positioned on.
    fn doc_id(&self) -> u64;

    /// Move to the next matching document. Returns false when exhausted.
    fn next(&mut self) -> Result<bool>;

    /// Skip to the first matching document with id >= target.
    ///
    /// Returns false when no such document exists.
    fn skip_to(&mut self, target: u64) -> Result<bool>;

    /// Score the current document. Only valid while positioned.
    fn score(&self) -> f32;

    /// Estimated number of documents this matcher will visit.
    fn cost(&self) -> u64;

    /// Whether this matcher has run out of documents.
    fn is_exhausted(&self) -> bool {
        self.doc_id() == NO_MORE_DOCS
    }
}

/// A matcher that matches no documents.
#[derive(Debug, Default)]
pub struct EmptyMatcher;

impl EmptyMatcher {
    /// Create a new empty matcher.
    pub fn new() -> Self {
        EmptyMatcher
    }
}

impl Matcher for EmptyMatcher {
    fn doc_id(&self) -> u64 {
        NO_MORE_DOCS
    }

    fn next(&mut self) -> Result<bool> {
        Ok(false)
    }

    fn skip_to(&mut self, _target: u64) -> Result<bool> {
        Ok(false)
    }

    fn score(&self) -> f32 {
        0.0
    }

    fn cost(&self) -> u64 {
        0
    }
}

/// A matcher over a single term's posting list.
#[derive(Debug)]
pub struct TermMatcher {
    postings: Arc<PostingList>,
    index: usize,
    scorer: TfIdfScorer,
}

impl TermMatcher {
    /// Create a matcher positioned on the first posting.
    pub fn new(postings: Arc<PostingList>, scorer: TfIdfScorer) -> Self {
        TermMatcher {
            postings,
            index: 0,
            scorer,
        }
    }
}

impl Matcher for TermMatcher {
    fn doc_id(&self) -> u64 {
        match self.postings.postings.get(self.index) {
            Some(posting) => posting.doc_id,
            None => NO_MORE_DOCS,
        }
    }

    fn next(&mut self) -> Result<bool> {
        if self.index < self.postings.len() {
            self.index += 1;
        }
        Ok(self.index < self.postings.len())
    }

    fn skip_to(&mut self, target: u64) -> Result<bool> {
        while self.index < self.postings.len()
            && self.postings.postings[self.index].doc_id < target
        {
            self.index += 1;
        }
        Ok(self.index < self.postings.len())
    }

    fn score(&self) -> f32 {
        match self.postings.postings.get(self.index) {
            Some(posting) => self.scorer.score(posting.frequency),
            None => 0.0,
        }
    }

    fn cost(&self) -> u64 {
        self.postings.len() as u64
    }
}

/// A matcher over the intersection of its children.
///
/// Matches documents matched by every child; the score is the sum of the
/// children's scores.
#[derive(Debug)]
pub struct ConjunctionMatcher {
    children: Vec<Box<dyn Matcher>>,
    exhausted: bool,
}

impl ConjunctionMatcher {
    /// Create a matcher positioned on the first common document.
    pub fn new(mut children: Vec<Box<dyn Matcher>>) -> Result<Self> {
        // Cheapest child leads the alignment loop.
        children.sort_by_key(|child| child.cost());

        let mut matcher = ConjunctionMatcher {
            exhausted: children.is_empty(),
            children,
        };
        if !matcher.exhausted {
            matcher.align()?;
        }
        Ok(matcher)
    }

    /// Advance children until all sit on the same doc id, or exhaust.
    fn align(&mut self) -> Result<()> {
        loop {
            let mut target = 0u64;
            for child in &self.children {
                if child.is_exhausted() {
                    self.exhausted = true;
                    return Ok(());
                }
                target = target.max(child.doc_id());
            }

            let mut aligned = true;
            for child in &mut self.children {
                if child.doc_id() < target {
                    if !child.skip_to(target)? {
                        self.exhausted = true;
                        return Ok(());
                    }
                    if child.doc_id() > target {
                        aligned = false;
                    }
                }
            }

            if aligned {
                return Ok(());
            }
        }
    }
}

impl Matcher for ConjunctionMatcher {
    fn doc_id(&self) -> u64 {
        if self.exhausted {
            NO_MORE_DOCS
        } else {
            self.children[0].doc_id()
        }
    }

    fn next(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        if !self.children[0].next()? {
            self.exhausted = true;
            return Ok(false);
        }
        self.align()?;
        Ok(!self.exhausted)
    }

    fn skip_to(&mut self, target: u64) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        if !self.children[0].skip_to(target)? {
            self.exhausted = true;
            return Ok(false);
        }
        self.align()?;
        Ok(!self.exhausted)
    }

    fn score(&self) -> f32 {
        self.children.iter().map(|child| child.score()).sum()
    }

    fn cost(&self) -> u64 {
        self.children
            .iter()
            .map(|child| child.cost())
            .min()
            .unwrap_or(0)
    }
}

/// A matcher over the union of its children.
///
/// Matches documents matched by any child; the score is the sum of the
/// scores of the children that match the current document.
#[derive(Debug)]
pub struct DisjunctionMatcher {
    children: Vec<Box<dyn Matcher>>,
    current: u64,
}

impl DisjunctionMatcher {
    /// Create a matcher positioned on the first document of any child.
    pub fn new(children: Vec<Box<dyn Matcher>>) -> Self {
        let mut matcher = DisjunctionMatcher {
            children,
            current: NO_MORE_DOCS,
        };
        matcher.current = matcher.min_doc();
        matcher
    }

    fn min_doc(&self) -> u64 {
        self.children
            .iter()
            .map(|child| child.doc_id())
            .min()
            .unwrap_or(NO_MORE_DOCS)
    }
}

impl Matcher for DisjunctionMatcher {
    fn doc_id(&self) -> u64 {
        self.current
    }

    fn next(&mut self) -> Result<bool> {
        if self.current == NO_MORE_DOCS {
            return Ok(false);
        }
        for child in &mut self.children {
            if child.doc_id() == self.current {
                child.next()?;
            }
        }
        self.current = self.min_doc();
        Ok(self.current != NO_MORE_DOCS)
    }

    fn skip_to(&mut self, target: u64) -> Result<bool> {
        if self.current == NO_MORE_DOCS {
            return Ok(false);
        }
        for child in &mut self.children {
            if child.doc_id() < target {
                child.skip_to(target)?;
            }
        }
        self.current = self.min_doc();
        Ok(self.current != NO_MORE_DOCS)
    }

    fn score(&self) -> f32 {
        self.children
            .iter()
            .filter(|child| child.doc_id() == self.current)
            .map(|child| child.score())
            .sum()
    }

    fn cost(&self) -> u64 {
        self.children.iter().map(|child| child.cost()).sum()
    }
}

/// A matcher driven by required clauses, with optional clauses contributing
/// only to the score.
#[derive(Debug)]
pub struct ReqOptMatcher {
    required: Box<dyn Matcher>,
    optional: Vec<Box<dyn Matcher>>,
}

impl ReqOptMatcher {
    /// Create a matcher positioned where the required matcher is.
    pub fn new(required: Box<dyn Matcher>, optional: Vec<Box<dyn Matcher>>) -> Result<Self> {
        let mut matcher = ReqOptMatcher { required, optional };
        matcher.catch_up()?;
        Ok(matcher)
    }

    /// Bring optional matchers forward to the required position.
    fn catch_up(&mut self) -> Result<()> {
        let current = self.required.doc_id();
        if current == NO_MORE_DOCS {
            return Ok(());
        }
        for child in &mut self.optional {
            if child.doc_id() < current {
                child.skip_to(current)?;
            }
        }
        Ok(())
    }
}

impl Matcher for ReqOptMatcher {
    fn doc_id(&self) -> u64 {
        self.required.doc_id()
    }

    fn next(&mut self) -> Result<bool> {
        let more = self.required.next()?;
        self.catch_up()?;
        Ok(more)
    }

    fn skip_to(&mut self, target: u64) -> Result<bool> {
        let found = self.required.skip_to(target)?;
        self.catch_up()?;
        Ok(found)
    }

    fn score(&self) -> f32 {
        let current = self.required.doc_id();
        let optional: f32 = self
            .optional
            .iter()
            .filter(|child| child.doc_id() == current)
            .map(|child| child.score())
            .sum();
        self.required.score() + optional
    }

    fn cost(&self) -> u64 {
        self.required.cost()
    }
}
