//! Unicode word tokenizer implementation.
//!
//! This module provides a tokenizer that splits text using Unicode word
//! boundary rules (UAX #29). It properly handles international text and
//! filters out non-word segments like punctuation and whitespace.
//!
//! # Examples
//!
//! ```
//! use lancea::analysis::tokenizer::Tokenizer;
//! use lancea::analysis::tokenizer::unicode_word::UnicodeWordTokenizer;
//!
//! let tokenizer = UnicodeWordTokenizer::new();
//! let tokens: Vec<_> = tokenizer.tokenize("Hello, world!").unwrap().collect();
//!
//! // Punctuation and whitespace are automatically filtered out
//! assert_eq!(tokens[0].text, "Hello");
//! assert_eq!(tokens[1].text, "world");
//! ```

use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::tokenizer::Tokenizer;
use crate::error::Result;

/// A tokenizer that splits text on Unicode word boundaries.
///
/// Segments that contain no alphanumeric character (pure punctuation,
/// whitespace) are dropped. Token positions count only the kept segments.
#[derive(Clone, Debug, Default)]
pub struct UnicodeWordTokenizer;

impl UnicodeWordTokenizer {
    /// Create a new Unicode word tokenizer.
    pub fn new() -> Self {
        UnicodeWordTokenizer
    }
}

impl Tokenizer for UnicodeWordTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let mut tokens = Vec::new();
        let mut position = 0;

        for (start_offset, word) in text.split_word_bound_indices() {
            if word.chars().any(|c| c.is_alphanumeric()) {
                let end_offset = start_offset + word.len();
                tokens.push(Token::with_offsets(word, position, start_offset, end_offset));
                position += 1;
            }
        }

        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "unicode_word"
    }
}
