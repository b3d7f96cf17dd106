//! TF-IDF scoring.

/// Inverse document frequency of a term.
///
/// `ln(1 + total_docs / doc_freq)`, or 0 for terms that match no documents.
/// The +1 keeps the idf positive even when a term occurs in every document.
pub fn idf(doc_freq: u64, total_docs: u64) -> f32 {
    if doc_freq == 0 {
        return 0.0;
    }
    (1.0 + total_docs as f32 / doc_freq as f32).ln()
}

/// A per-term TF-IDF scorer.
///
/// The idf is fixed when the scorer is built against an index snapshot; only
/// the term frequency varies per document.
#[derive(Debug, Clone, Copy)]
pub struct TfIdfScorer {
    idf: f32,
    boost: f32,
}

impl TfIdfScorer {
    /// Create a scorer for a term.
    pub fn new(doc_freq: u64, total_docs: u64, boost: f32) -> Self {
        TfIdfScorer {
            idf: idf(doc_freq, total_docs),
            boost,
        }
    }

    /// The idf component of this scorer.
    pub fn idf(&self) -> f32 {
        self.idf * self.boost
    }

    /// Score one document given the term frequency in it.
    pub fn score(&self, term_frequency: u32) -> f32 {
        term_frequency as f32 * self.idf * self.boost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idf_zero_doc_freq() {
        assert_eq!(idf(0, 100), 0.0);
    }

    #[test]
    fn test_idf_rarer_terms_score_higher() {
        let rare = idf(1, 100);
        let common = idf(90, 100);
        assert!(rare > common);
        assert!(common > 0.0);
    }

    #[test]
    fn test_score_scales_with_frequency() {
        let scorer = TfIdfScorer::new(5, 100, 1.0);
        assert!(scorer.score(3) > scorer.score(1));
        assert_eq!(scorer.score(2), 2.0 * scorer.score(1));
    }

    #[test]
    fn test_boost_multiplies_score() {
        let plain = TfIdfScorer::new(5, 100, 1.0);
        let boosted = TfIdfScorer::new(5, 100, 2.0);
        assert_eq!(boosted.score(1), 2.0 * plain.score(1));
    }
}
