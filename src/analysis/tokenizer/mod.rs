//! Tokenizer implementations for text analysis.

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for tokenizers that convert text into tokens.
///
/// Tokenization is total over valid UTF-8 input: empty text produces an
/// empty stream. Segmentation strategy is pluggable; scripts without
/// whitespace-delimited words can use [`ngram::NgramTokenizer`].
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text into a stream of tokens.
    fn tokenize(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this tokenizer (for debugging and configuration).
    fn name(&self) -> &'static str;
}

// Individual tokenizer modules
pub mod ngram;
pub mod regex;
pub mod unicode_word;
pub mod whitespace;

// Re-export all tokenizers for convenient access
pub use ngram::NgramTokenizer;
pub use regex::RegexTokenizer;
pub use unicode_word::UnicodeWordTokenizer;
pub use whitespace::WhitespaceTokenizer;
