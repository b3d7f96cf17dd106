//! Query term highlighting over stored field text.
//!
//! The highlighter re-analyzes the stored text with the index analyzer, so
//! token offsets line up with the original bytes and matches are found
//! case-insensitively (or however the analyzer normalizes).

use std::sync::Arc;

use ahash::AHashSet;

use crate::analysis::analyzer::Analyzer;
use crate::error::Result;

/// Markup wrapped around each highlighted occurrence.
#[derive(Debug, Clone)]
pub struct HighlightConfig {
    /// Opening tag inserted before a match.
    pub pre_tag: String,
    /// Closing tag inserted after a match.
    pub post_tag: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        HighlightConfig {
            pre_tag: "<mark>".to_string(),
            post_tag: "</mark>".to_string(),
        }
    }
}

impl HighlightConfig {
    /// Create a config with custom tags.
    pub fn new<P: Into<String>, Q: Into<String>>(pre_tag: P, post_tag: Q) -> Self {
        HighlightConfig {
            pre_tag: pre_tag.into(),
            post_tag: post_tag.into(),
        }
    }
}

/// Marks query term occurrences in stored field text.
pub struct Highlighter {
    analyzer: Arc<dyn Analyzer>,
    config: HighlightConfig,
}

impl std::fmt::Debug for Highlighter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Highlighter")
            .field("analyzer", &self.analyzer.name())
            .field("config", &self.config)
            .finish()
    }
}

impl Highlighter {
    /// Create a highlighter using the index analyzer and default tags.
    pub fn new(analyzer: Arc<dyn Analyzer>) -> Self {
        Highlighter {
            analyzer,
            config: HighlightConfig::default(),
        }
    }

    /// Create a highlighter with custom markup.
    pub fn with_config(analyzer: Arc<dyn Analyzer>, config: HighlightConfig) -> Self {
        Highlighter { analyzer, config }
    }

    /// Highlight every occurrence of the query terms within the best
    /// fragment of `text`.
    ///
    /// The fragment is the window of at most `max_fragment_len` bytes
    /// containing the most term occurrences; ties go to the earliest such
    /// window. Text that fits entirely is returned whole. Text with no
    /// occurrence is returned unchanged.
    ///
    /// `terms` must be in normalized form, as produced by the analyzer or
    /// [`crate::query::Query::extract_terms`].
    pub fn highlight(
        &self,
        text: &str,
        terms: &[String],
        max_fragment_len: usize,
    ) -> Result<String> {
        let term_set: AHashSet<&str> = terms.iter().map(|t| t.as_str()).collect();

        let mut occurrences: Vec<(usize, usize)> = self
            .analyzer
            .analyze(text)?
            .filter(|token| term_set.contains(token.text.as_str()))
            .map(|token| (token.start_offset, token.end_offset))
            .collect();
        occurrences.sort_unstable();

        if occurrences.is_empty() {
            return Ok(text.to_string());
        }

        let (frag_start, frag_end) = if text.len() <= max_fragment_len {
            (0, text.len())
        } else {
            self.best_window(text, &occurrences, max_fragment_len)
        };

        let mut result = String::with_capacity(frag_end - frag_start + 32);
        let mut cursor = frag_start;
        for &(start, end) in &occurrences {
            if start < cursor || end > frag_end {
                // Outside the fragment, or overlapping an already marked
                // occurrence.
                continue;
            }
            result.push_str(&text[cursor..start]);
            result.push_str(&self.config.pre_tag);
            result.push_str(&text[start..end]);
            result.push_str(&self.config.post_tag);
            cursor = end;
        }
        result.push_str(&text[cursor..frag_end]);

        Ok(result)
    }

    /// Find the window of at most `max_len` bytes covering the most
    /// occurrences, preferring the earliest on ties.
    fn best_window(
        &self,
        text: &str,
        occurrences: &[(usize, usize)],
        max_len: usize,
    ) -> (usize, usize) {
        let mut best_index = 0;
        let mut best_count = 0;

        for (index, &(start, _)) in occurrences.iter().enumerate() {
            // Overlapping spans (n-gram analyzers) do not have monotonic end
            // offsets, so every candidate in the slice must be examined.
            let count = occurrences[index..]
                .iter()
                .filter(|&&(_, end)| end.saturating_sub(start) <= max_len)
                .count();
            if count > best_count {
                best_count = count;
                best_index = index;
            }
        }

        let frag_start = occurrences[best_index].0;
        let mut frag_end = (frag_start + max_len).min(text.len());
        while !text.is_char_boundary(frag_end) {
            frag_end -= 1;
        }
        (frag_start, frag_end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyzer::StandardAnalyzer;

    fn highlighter() -> Highlighter {
        Highlighter::new(Arc::new(StandardAnalyzer::new()))
    }

    fn terms(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_marks_single_occurrence() {
        let result = highlighter()
            .highlight("plain tofu dish", &terms(&["tofu"]), 100)
            .unwrap();
        assert_eq!(result, "plain <mark>tofu</mark> dish");
    }

    #[test]
    fn test_marks_all_occurrences_in_window() {
        let result = highlighter()
            .highlight("tofu with tofu on tofu", &terms(&["tofu"]), 100)
            .unwrap();
        assert_eq!(
            result,
            "<mark>tofu</mark> with <mark>tofu</mark> on <mark>tofu</mark>"
        );
    }

    #[test]
    fn test_no_match_returns_input_unchanged() {
        let text = "nothing relevant here";
        let result = highlighter().highlight(text, &terms(&["tofu"]), 100).unwrap();
        assert_eq!(result, text);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let result = highlighter()
            .highlight("Tofu is TOFU", &terms(&["tofu"]), 100)
            .unwrap();
        assert_eq!(result, "<mark>Tofu</mark> is <mark>TOFU</mark>");
    }

    #[test]
    fn test_picks_densest_window() {
        // One early lone occurrence, then a dense cluster past the fragment
        // size; the cluster wins.
        let text = "tofu aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa tofu tofu tofu";
        let result = highlighter().highlight(text, &terms(&["tofu"]), 20).unwrap();
        assert_eq!(
            result,
            "<mark>tofu</mark> <mark>tofu</mark> <mark>tofu</mark>"
        );
    }

    #[test]
    fn test_earliest_window_wins_ties() {
        let text = "tofu aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa tofu";
        let result = highlighter().highlight(text, &terms(&["tofu"]), 10).unwrap();
        assert!(result.starts_with("<mark>tofu</mark>"));
        assert!(!result.contains("aaaa tofu"));
    }

    #[test]
    fn test_custom_tags() {
        let highlighter = Highlighter::with_config(
            Arc::new(StandardAnalyzer::new()),
            HighlightConfig::new("<font color=red>", "</font>"),
        );
        let result = highlighter
            .highlight("hot tofu", &terms(&["tofu"]), 100)
            .unwrap();
        assert_eq!(result, "hot <font color=red>tofu</font>");
    }

    #[test]
    fn test_multiple_terms_marked() {
        let result = highlighter()
            .highlight("spicy tofu with rice", &terms(&["spicy", "tofu"]), 100)
            .unwrap();
        assert_eq!(result, "<mark>spicy</mark> <mark>tofu</mark> with rice");
    }

    #[test]
    fn test_empty_terms_returns_input() {
        let text = "anything at all";
        let result = highlighter().highlight(text, &[], 100).unwrap();
        assert_eq!(result, text);
    }

    #[test]
    fn test_best_window_with_overlapping_spans() {
        let highlighter = highlighter();
        let text = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
        // Sorted by start but with a long span whose end exceeds the window;
        // the shorter spans after it still fit and must be counted.
        let occurrences = vec![(0, 2), (10, 18), (11, 13), (12, 14)];

        let window = highlighter.best_window(text, &occurrences, 5);
        assert_eq!(window, (10, 15));
    }

    #[test]
    fn test_multibyte_text() {
        let result = highlighter()
            .highlight("美味しい tofu です", &terms(&["tofu"]), 100)
            .unwrap();
        assert_eq!(result, "美味しい <mark>tofu</mark> です");
    }
}
