//! Query parser for converting query strings to structured queries.
//!
//! Grammar, loosest binding first:
//!
//! - `OR` combines alternatives: `tofu OR noodles`
//! - adjacency (or an explicit `AND`) requires all terms: `spicy tofu`
//! - double quotes form a phrase: `"mapo tofu"`
//! - parentheses group: `(tofu OR noodles) spicy`
//!
//! Terms are normalized with the same analyzer used at index time, so the
//! parser is the only place raw user text becomes query terms. The field to
//! search is supplied by the caller; there is no `field:term` syntax.

use std::iter::Peekable;
use std::sync::Arc;
use std::vec::IntoIter;

use crate::analysis::analyzer::Analyzer;
use crate::error::{LanceaError, Result};
use crate::query::boolean::BooleanQueryBuilder;
use crate::query::phrase::PhraseQuery;
use crate::query::query::Query;
use crate::query::term::TermQuery;

/// A schema-less query parser bound to an analyzer.
pub struct QueryParser {
    analyzer: Arc<dyn Analyzer>,
}

impl std::fmt::Debug for QueryParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryParser")
            .field("analyzer", &self.analyzer.name())
            .finish()
    }
}

impl QueryParser {
    /// Create a parser that normalizes terms with the given analyzer.
    pub fn new(analyzer: Arc<dyn Analyzer>) -> Self {
        QueryParser { analyzer }
    }

    /// Parse a query string against a field.
    ///
    /// Returns a `QuerySyntax` error for empty queries, queries whose terms
    /// all normalize away, unbalanced quotes, unbalanced parentheses, and
    /// dangling operators.
    pub fn parse(&self, field: &str, query_str: &str) -> Result<Box<dyn Query>> {
        let trimmed = query_str.trim();
        if trimmed.is_empty() {
            return Err(LanceaError::query_syntax("empty query"));
        }

        let tokens = tokenize(trimmed)?;
        let mut parser = QueryStringParser {
            tokens: tokens.into_iter().peekable(),
            field,
            analyzer: self.analyzer.as_ref(),
        };

        let query = parser.parse_or()?;

        if parser.tokens.next().is_some() {
            return Err(LanceaError::query_syntax("unbalanced parenthesis"));
        }

        query.ok_or_else(|| LanceaError::query_syntax("query contains no searchable terms"))
    }
}

#[derive(Debug, PartialEq)]
enum QueryToken {
    Word(String),
    Phrase(String),
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<QueryToken>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(QueryToken::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(QueryToken::RParen);
            }
            '"' => {
                chars.next();
                let mut phrase = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '"' {
                        closed = true;
                        break;
                    }
                    phrase.push(c);
                }
                if !closed {
                    return Err(LanceaError::query_syntax("unbalanced quote"));
                }
                tokens.push(QueryToken::Phrase(phrase));
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || c == '"' || c == '(' || c == ')' {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(QueryToken::Word(word));
            }
        }
    }

    Ok(tokens)
}

/// Recursive-descent parser over the token stream.
struct QueryStringParser<'a> {
    tokens: Peekable<IntoIter<QueryToken>>,
    field: &'a str,
    analyzer: &'a dyn Analyzer,
}

impl QueryStringParser<'_> {
    fn parse_or(&mut self) -> Result<Option<Box<dyn Query>>> {
        if self.peek_is_word("OR") {
            return Err(LanceaError::query_syntax("leading OR operator"));
        }
        let mut left = self.parse_and()?;

        while self.peek_is_word("OR") {
            self.tokens.next();
            if self.tokens.peek().is_none() || self.peek_is_word("OR") {
                return Err(LanceaError::query_syntax("dangling OR operator"));
            }
            let right = self.parse_and()?;

            left = match (left, right) {
                (Some(l), Some(r)) => Some(Box::new(
                    BooleanQueryBuilder::new().should(l).should(r).build(),
                )),
                (None, right) => right,
                (left, None) => left,
            };
        }

        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Option<Box<dyn Query>>> {
        enum Step {
            Stop,
            ConsumeAnd,
            Operand,
        }

        let mut queries: Vec<Box<dyn Query>> = Vec::new();
        let mut seen_operand = false;
        let mut expect_operand = false;

        loop {
            let step = match self.tokens.peek() {
                None | Some(QueryToken::RParen) => Step::Stop,
                Some(QueryToken::Word(w)) if w == "OR" => Step::Stop,
                Some(QueryToken::Word(w)) if w == "AND" => Step::ConsumeAnd,
                _ => Step::Operand,
            };

            match step {
                Step::Stop => break,
                Step::ConsumeAnd => {
                    self.tokens.next();
                    if !seen_operand {
                        return Err(LanceaError::query_syntax("leading AND operator"));
                    }
                    expect_operand = true;
                }
                Step::Operand => {
                    if let Some(query) = self.parse_primary()? {
                        queries.push(query);
                    }
                    seen_operand = true;
                    expect_operand = false;
                }
            }
        }

        if expect_operand {
            return Err(LanceaError::query_syntax("dangling AND operator"));
        }

        Ok(match queries.len() {
            0 => None,
            1 => queries.pop(),
            _ => {
                let mut builder = BooleanQueryBuilder::new();
                for query in queries {
                    builder = builder.must(query);
                }
                Some(Box::new(builder.build()))
            }
        })
    }

    fn parse_primary(&mut self) -> Result<Option<Box<dyn Query>>> {
        match self.tokens.next() {
            Some(QueryToken::LParen) => {
                let inner = self.parse_or()?;
                match self.tokens.next() {
                    Some(QueryToken::RParen) => Ok(inner),
                    _ => Err(LanceaError::query_syntax("unbalanced parenthesis")),
                }
            }
            Some(QueryToken::Word(word)) => {
                let terms = self.normalize(&word)?;
                Ok(match terms.len() {
                    0 => None,
                    1 => Some(Box::new(TermQuery::new(
                        self.field,
                        terms.into_iter().next().unwrap(),
                    ))),
                    // A single input word that analyzes into several terms
                    // requires all of them.
                    _ => {
                        let mut builder = BooleanQueryBuilder::new();
                        for term in terms {
                            builder = builder.must(Box::new(TermQuery::new(self.field, term)));
                        }
                        Some(Box::new(builder.build()))
                    }
                })
            }
            Some(QueryToken::Phrase(phrase)) => {
                let terms = self.normalize(&phrase)?;
                Ok(match terms.len() {
                    0 => None,
                    1 => Some(Box::new(TermQuery::new(
                        self.field,
                        terms.into_iter().next().unwrap(),
                    ))),
                    _ => Some(Box::new(PhraseQuery::new(self.field, terms))),
                })
            }
            Some(QueryToken::RParen) | None => {
                Err(LanceaError::query_syntax("unexpected end of query"))
            }
        }
    }

    fn peek_is_word(&mut self, word: &str) -> bool {
        matches!(self.tokens.peek(), Some(QueryToken::Word(w)) if w == word)
    }

    fn normalize(&self, text: &str) -> Result<Vec<String>> {
        Ok(self
            .analyzer
            .analyze(text)?
            .map(|token| token.text)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyzer::StandardAnalyzer;

    fn parser() -> QueryParser {
        QueryParser::new(Arc::new(StandardAnalyzer::new()))
    }

    fn parse(query: &str) -> Box<dyn Query> {
        parser().parse("body", query).unwrap()
    }

    #[test]
    fn test_single_term() {
        assert_eq!(parse("Tofu").description(), "body:tofu");
    }

    #[test]
    fn test_implicit_and() {
        assert_eq!(parse("spicy tofu").description(), "(+body:spicy +body:tofu)");
    }

    #[test]
    fn test_explicit_and() {
        assert_eq!(
            parse("spicy AND tofu").description(),
            "(+body:spicy +body:tofu)"
        );
    }

    #[test]
    fn test_or_operator() {
        assert_eq!(parse("tofu OR rice").description(), "(body:tofu body:rice)");
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        assert_eq!(
            parse("spicy tofu OR rice").description(),
            "((+body:spicy +body:tofu) body:rice)"
        );
    }

    #[test]
    fn test_quoted_phrase() {
        assert_eq!(
            parse("\"Mapo Tofu\"").description(),
            "body:\"mapo tofu\""
        );
    }

    #[test]
    fn test_single_word_phrase_is_term() {
        assert_eq!(parse("\"tofu\"").description(), "body:tofu");
    }

    #[test]
    fn test_parentheses_group() {
        assert_eq!(
            parse("(tofu OR rice) spicy").description(),
            "(+(body:tofu body:rice) +body:spicy)"
        );
    }

    #[test]
    fn test_lowercase_or_is_a_term() {
        assert_eq!(parse("this or that").description(), "(+body:this +body:or +body:that)");
    }

    #[test]
    fn test_empty_query_errors() {
        for query in ["", "   ", "\t"] {
            let err = parser().parse("body", query).unwrap_err();
            assert!(matches!(err, LanceaError::QuerySyntax(_)), "{query:?}");
        }
    }

    #[test]
    fn test_only_punctuation_errors() {
        let err = parser().parse("body", "!!! ...").unwrap_err();
        assert!(matches!(err, LanceaError::QuerySyntax(_)));
    }

    #[test]
    fn test_unbalanced_quote_errors() {
        let err = parser().parse("body", "\"mapo tofu").unwrap_err();
        assert!(matches!(err, LanceaError::QuerySyntax(_)));
    }

    #[test]
    fn test_unbalanced_parens_error() {
        for query in ["(tofu", "tofu)"] {
            let err = parser().parse("body", query).unwrap_err();
            assert!(matches!(err, LanceaError::QuerySyntax(_)), "{query:?}");
        }
    }

    #[test]
    fn test_dangling_operators_error() {
        for query in ["tofu OR", "tofu AND", "tofu OR OR rice"] {
            let err = parser().parse("body", query).unwrap_err();
            assert!(matches!(err, LanceaError::QuerySyntax(_)), "{query:?}");
        }
    }

    #[test]
    fn test_leading_operators_error() {
        for query in ["OR tofu", "AND tofu", "(OR tofu) rice", "rice OR AND tofu"] {
            let err = parser().parse("body", query).unwrap_err();
            assert!(matches!(err, LanceaError::QuerySyntax(_)), "{query:?}");
        }
    }

    #[test]
    fn test_hyphenated_word_requires_all_parts() {
        assert_eq!(
            parse("stir-fry").description(),
            "(+body:stir +body:fry)"
        );
    }
}
