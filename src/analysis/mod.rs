//! Text analysis: tokens, tokenizers, token filters, and analyzers.
//!
//! Analysis converts raw field text into a stream of normalized terms with
//! positional offsets. The same pipeline runs at index time, at query-parse
//! time, and inside the highlighter, so all three agree on what a term is.

pub mod analyzer;
pub mod token;
pub mod token_filter;
pub mod tokenizer;

pub use analyzer::{Analyzer, PipelineAnalyzer, StandardAnalyzer};
pub use token::{IntoTokenStream, Token, TokenStream};
pub use token_filter::{LowercaseFilter, StripPunctuationFilter, TokenFilter};
pub use tokenizer::{
    NgramTokenizer, RegexTokenizer, Tokenizer, UnicodeWordTokenizer, WhitespaceTokenizer,
};
