//! N-gram tokenizer implementation.

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::tokenizer::Tokenizer;
use crate::error::{LanceaError, Result};

/// A tokenizer that generates character n-grams.
///
/// N-grams are the segmentation strategy for scripts without
/// whitespace-delimited words (CJK and similar), and are also useful for
/// substring matching.
///
/// # Examples
///
/// ```
/// use lancea::analysis::tokenizer::ngram::NgramTokenizer;
/// use lancea::analysis::tokenizer::Tokenizer;
///
/// // Bigram (n=2)
/// let tokenizer = NgramTokenizer::new(2, 2).unwrap();
/// let tokens: Vec<_> = tokenizer.tokenize("hello").unwrap()
///     .map(|t| t.text.to_string())
///     .collect();
/// assert_eq!(tokens, vec!["he", "el", "ll", "lo"]);
/// ```
#[derive(Clone, Debug)]
pub struct NgramTokenizer {
    /// Minimum n-gram size
    min_gram: usize,
    /// Maximum n-gram size
    max_gram: usize,
}

impl NgramTokenizer {
    /// Create a new n-gram tokenizer.
    ///
    /// # Errors
    ///
    /// Returns an error if `min_gram` is 0 or `max_gram` is less than
    /// `min_gram`.
    pub fn new(min_gram: usize, max_gram: usize) -> Result<Self> {
        if min_gram == 0 {
            return Err(LanceaError::analysis("min_gram must be at least 1"));
        }
        if max_gram < min_gram {
            return Err(LanceaError::analysis(format!(
                "max_gram ({max_gram}) must be >= min_gram ({min_gram})"
            )));
        }
        Ok(Self { min_gram, max_gram })
    }

    /// Create a bigram tokenizer (n=2).
    pub fn bigram() -> Self {
        Self {
            min_gram: 2,
            max_gram: 2,
        }
    }

    /// Create a trigram tokenizer (n=3).
    pub fn trigram() -> Self {
        Self {
            min_gram: 3,
            max_gram: 3,
        }
    }
}

impl Tokenizer for NgramTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let char_offsets: Vec<usize> = text
            .char_indices()
            .map(|(offset, _)| offset)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_count = char_offsets.len() - 1;

        let mut tokens = Vec::new();
        let mut position = 0;

        for start in 0..char_count {
            for gram_size in self.min_gram..=self.max_gram {
                let end = start + gram_size;
                if end > char_count {
                    break;
                }

                let start_offset = char_offsets[start];
                let end_offset = char_offsets[end];
                tokens.push(Token::with_offsets(
                    &text[start_offset..end_offset],
                    position,
                    start_offset,
                    end_offset,
                ));
                position += 1;
            }
        }

        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "ngram"
    }
}
