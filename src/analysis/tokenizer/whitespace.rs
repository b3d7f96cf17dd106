//! Whitespace tokenizer implementation.

use super::Tokenizer;

use crate::analysis::token::{Token, TokenStream};
use crate::error::Result;

/// A tokenizer that splits text on whitespace runs.
///
/// Offsets are computed while walking the text, so repeated words get the
/// byte range they actually occupy.
#[derive(Clone, Debug, Default)]
pub struct WhitespaceTokenizer;

impl WhitespaceTokenizer {
    /// Create a new whitespace tokenizer.
    pub fn new() -> Self {
        WhitespaceTokenizer
    }
}

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let mut tokens = Vec::new();
        let mut position = 0;
        let mut start: Option<usize> = None;

        for (offset, ch) in text.char_indices() {
            if ch.is_whitespace() {
                if let Some(word_start) = start.take() {
                    tokens.push(Token::with_offsets(
                        &text[word_start..offset],
                        position,
                        word_start,
                        offset,
                    ));
                    position += 1;
                }
            } else if start.is_none() {
                start = Some(offset);
            }
        }

        if let Some(word_start) = start {
            tokens.push(Token::with_offsets(
                &text[word_start..],
                position,
                word_start,
                text.len(),
            ));
        }

        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "whitespace"
    }
}
