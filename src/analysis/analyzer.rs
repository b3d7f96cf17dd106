//! Analyzer implementations that combine tokenizers and filters.
//!
//! An analyzer is the unit of text normalization: a tokenizer followed by a
//! chain of token filters applied in order. The same analyzer instance must
//! be used for indexing and query parsing so terms compare equal.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use lancea::analysis::analyzer::{Analyzer, PipelineAnalyzer};
//! use lancea::analysis::token_filter::LowercaseFilter;
//! use lancea::analysis::tokenizer::WhitespaceTokenizer;
//!
//! let analyzer = PipelineAnalyzer::new(Arc::new(WhitespaceTokenizer::new()))
//!     .add_filter(Arc::new(LowercaseFilter::new()));
//!
//! let tokens: Vec<_> = analyzer.analyze("Hello World").unwrap().collect();
//! assert_eq!(tokens[0].text, "hello");
//! assert_eq!(tokens[1].text, "world");
//! ```

use std::sync::Arc;

use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::{LowercaseFilter, StripPunctuationFilter, TokenFilter};
use crate::analysis::tokenizer::{Tokenizer, UnicodeWordTokenizer};
use crate::error::Result;

/// Trait for analyzers that convert text into a normalized token stream.
pub trait Analyzer: Send + Sync {
    /// Analyze the given text into a stream of normalized tokens.
    fn analyze(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this analyzer.
    fn name(&self) -> &'static str;
}

/// A configurable analyzer that combines a tokenizer with a chain of filters.
#[derive(Clone)]
pub struct PipelineAnalyzer {
    tokenizer: Arc<dyn Tokenizer>,
    filters: Vec<Arc<dyn TokenFilter>>,
}

impl PipelineAnalyzer {
    /// Create a new pipeline analyzer with the given tokenizer.
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        PipelineAnalyzer {
            tokenizer,
            filters: Vec::new(),
        }
    }

    /// Add a filter to the pipeline. Filters run in insertion order.
    pub fn add_filter(mut self, filter: Arc<dyn TokenFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Get the tokenizer used by this analyzer.
    pub fn tokenizer(&self) -> &Arc<dyn Tokenizer> {
        &self.tokenizer
    }
}

impl std::fmt::Debug for PipelineAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineAnalyzer")
            .field("tokenizer", &self.tokenizer.name())
            .field(
                "filters",
                &self.filters.iter().map(|f| f.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Analyzer for PipelineAnalyzer {
    fn analyze(&self, text: &str) -> Result<TokenStream> {
        let mut stream = self.tokenizer.tokenize(text)?;
        for filter in &self.filters {
            stream = filter.filter(stream)?;
        }
        Ok(stream)
    }

    fn name(&self) -> &'static str {
        "pipeline"
    }
}

/// The default analyzer: Unicode word segmentation, lowercase folding, and
/// removal of punctuation-only tokens.
#[derive(Clone, Debug)]
pub struct StandardAnalyzer {
    pipeline: PipelineAnalyzer,
}

impl StandardAnalyzer {
    /// Create a new standard analyzer.
    pub fn new() -> Self {
        let pipeline = PipelineAnalyzer::new(Arc::new(UnicodeWordTokenizer::new()))
            .add_filter(Arc::new(LowercaseFilter::new()))
            .add_filter(Arc::new(StripPunctuationFilter::new()));

        StandardAnalyzer { pipeline }
    }

    /// Create a standard analyzer over a custom segmentation strategy.
    ///
    /// The lowercase and strip-punctuation filters are applied on top of the
    /// given tokenizer.
    pub fn with_tokenizer(tokenizer: Arc<dyn Tokenizer>) -> Self {
        let pipeline = PipelineAnalyzer::new(tokenizer)
            .add_filter(Arc::new(LowercaseFilter::new()))
            .add_filter(Arc::new(StripPunctuationFilter::new()));

        StandardAnalyzer { pipeline }
    }
}

impl Default for StandardAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for StandardAnalyzer {
    fn analyze(&self, text: &str) -> Result<TokenStream> {
        self.pipeline.analyze(text)
    }

    fn name(&self) -> &'static str {
        "standard"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::token::Token;
    use crate::analysis::tokenizer::NgramTokenizer;

    #[test]
    fn test_standard_analyzer() {
        let analyzer = StandardAnalyzer::new();
        let tokens: Vec<Token> = analyzer.analyze("Spicy Tofu, please!").unwrap().collect();

        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].text, "spicy");
        assert_eq!(tokens[1].text, "tofu");
        assert_eq!(tokens[2].text, "please");
    }

    #[test]
    fn test_standard_analyzer_empty_text() {
        let analyzer = StandardAnalyzer::new();
        let tokens: Vec<Token> = analyzer.analyze("").unwrap().collect();
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_standard_with_ngram_tokenizer() {
        let analyzer = StandardAnalyzer::with_tokenizer(Arc::new(NgramTokenizer::bigram()));
        let tokens: Vec<Token> = analyzer.analyze("麻婆豆腐").unwrap().collect();

        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].text, "麻婆");
        assert_eq!(tokens[2].text, "豆腐");
    }

    #[test]
    fn test_pipeline_analyzer_filter_order() {
        let analyzer = PipelineAnalyzer::new(Arc::new(UnicodeWordTokenizer::new()))
            .add_filter(Arc::new(LowercaseFilter::new()));

        let tokens: Vec<Token> = analyzer.analyze("MiXeD CaSe").unwrap().collect();
        assert_eq!(tokens[0].text, "mixed");
        assert_eq!(tokens[1].text, "case");
    }
}
