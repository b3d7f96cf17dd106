//! Token filter implementations for token transformation.

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for filters that transform token streams.
pub trait TokenFilter: Send + Sync {
    /// Apply this filter to a token stream.
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream>;

    /// Get the name of this filter (for debugging and configuration).
    fn name(&self) -> &'static str;
}

/// A filter that converts token text to lowercase.
///
/// This filter normalizes text casing to enable case-insensitive matching.
/// Positions and offsets are preserved.
///
/// # Examples
///
/// ```
/// use lancea::analysis::token::Token;
/// use lancea::analysis::token_filter::{LowercaseFilter, TokenFilter};
///
/// let filter = LowercaseFilter::new();
/// let tokens = vec![Token::new("Hello", 0), Token::new("WORLD", 1)];
/// let filtered: Vec<_> = filter.filter(Box::new(tokens.into_iter()))
///     .unwrap()
///     .collect();
///
/// assert_eq!(filtered[0].text, "hello");
/// assert_eq!(filtered[1].text, "world");
/// ```
#[derive(Clone, Debug, Default)]
pub struct LowercaseFilter;

impl LowercaseFilter {
    /// Create a new lowercase filter.
    pub fn new() -> Self {
        LowercaseFilter
    }
}

impl TokenFilter for LowercaseFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let filtered = tokens.map(|token| {
            if token.text.chars().any(|c| c.is_uppercase()) {
                let lowered = token.text.to_lowercase();
                token.with_text(lowered)
            } else {
                token
            }
        });

        Ok(Box::new(filtered))
    }

    fn name(&self) -> &'static str {
        "lowercase"
    }
}

/// A filter that removes tokens with no alphanumeric content.
///
/// Pure-punctuation and whitespace-only tokens carry no searchable term, so
/// they are dropped from the stream. Positions of surviving tokens are kept
/// as assigned by the tokenizer.
#[derive(Clone, Debug, Default)]
pub struct StripPunctuationFilter;

impl StripPunctuationFilter {
    /// Create a new strip-punctuation filter.
    pub fn new() -> Self {
        StripPunctuationFilter
    }
}

impl TokenFilter for StripPunctuationFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let filtered = tokens.filter(|token| token.text.chars().any(|c| c.is_alphanumeric()));

        Ok(Box::new(filtered))
    }

    fn name(&self) -> &'static str {
        "strip_punctuation"
    }
}
