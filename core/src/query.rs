//! Boolean query evaluation.
//!
//! ```text
//! Expression := ['NOT'] Term ( ('AND' | 'OR') Term )*
//! Term       := STRING | '(' Expression ')' | Expression   (when it starts with NOT)
//! ```
//!
//! The parser evaluates while it reads, left to right. `AND` and `OR` have
//! the same precedence, so `a OR b AND c` means `(a OR b) AND c`. A `NOT`
//! in term position opens a nested expression that runs to the end of the
//! enclosing one: `a AND NOT b OR c` means `a AND ((NOT b) OR c)`.
//!
//! Both kinds of nesting count towards [`MAX_QUERY_DEPTH`]; deeper queries
//! fail with [`QueryError::TooDeep`] instead of exhausting the stack.

use crate::config::MAX_QUERY_DEPTH;
use crate::error::QueryError;
use crate::index::Index;
use crate::lexer::{QueryLexer, Token, TokenKind};
use crate::DocId;
use std::collections::BTreeSet;

/// Evaluate `query` against `index` and return the ids of matching documents.
pub fn evaluate(index: &Index, query: &str) -> Result<BTreeSet<DocId>, QueryError> {
    QueryParser::new(index, query).parse()
}

pub struct QueryParser<'a> {
    index: &'a Index,
    lexer: QueryLexer,
    depth: usize,
}

impl<'a> QueryParser<'a> {
    pub fn new(index: &'a Index, query: &str) -> Self {
        Self { index, lexer: QueryLexer::new(query), depth: 0 }
    }

    pub fn parse(mut self) -> Result<BTreeSet<DocId>, QueryError> {
        if !self.lexer.has_next() {
            return Err(QueryError::EmptyQuery);
        }
        let matches = self.expression()?;
        match self.lexer.next() {
            None => Ok(matches),
            Some(Token::RParen) => Err(QueryError::UnexpectedRightParen),
            Some(token) => Err(QueryError::UnexpectedToken(token)),
        }
    }

    fn expression(&mut self) -> Result<BTreeSet<DocId>, QueryError> {
        let negate = self.lexer.peek_type() == Some(TokenKind::Not);
        if negate {
            self.lexer.next();
        }

        let mut current = self.term()?;
        if negate {
            current = self.complement(&current);
        }

        while let Some(kind @ (TokenKind::And | TokenKind::Or)) = self.lexer.peek_type() {
            let operator = self.lexer.next().ok_or(QueryError::UnexpectedEnd)?;
            if !self.lexer.has_next() {
                return Err(QueryError::DanglingOperator(operator));
            }
            let next = self.term()?;
            current = match kind {
                TokenKind::And => current.intersection(&next).copied().collect(),
                _ => current.union(&next).copied().collect(),
            };
        }
        Ok(current)
    }

    fn term(&mut self) -> Result<BTreeSet<DocId>, QueryError> {
        match self.lexer.peek_type() {
            None => Err(QueryError::UnexpectedEnd),
            Some(TokenKind::Not) => self.nested(Self::expression),
            Some(TokenKind::RParen) => Err(QueryError::UnexpectedRightParen),
            Some(TokenKind::LParen) => {
                self.lexer.next();
                let inner = self.nested(Self::expression)?;
                match self.lexer.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(QueryError::MissingRightParen),
                }
            }
            Some(_) => match self.lexer.next() {
                Some(Token::Str(word)) => Ok(self.lookup(&word)),
                Some(token) => Err(QueryError::UnexpectedToken(token)),
                None => Err(QueryError::UnexpectedEnd),
            },
        }
    }

    fn nested(
        &mut self,
        parse: fn(&mut Self) -> Result<BTreeSet<DocId>, QueryError>,
    ) -> Result<BTreeSet<DocId>, QueryError> {
        if self.depth == MAX_QUERY_DEPTH {
            return Err(QueryError::TooDeep(MAX_QUERY_DEPTH));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Documents containing every term the word tokenizes into, so `foo-bar`
    /// behaves like `foo AND bar`. A word with no terms matches nothing.
    fn lookup(&self, word: &str) -> BTreeSet<DocId> {
        let postings = self.index.postings();
        let mut terms = self.index.tokenizer().tokenize(word).into_iter();
        let mut matches = terms.next().map(|t| postings.get_documents_with_term(&t)).unwrap_or_default();
        for term in terms {
            if matches.is_empty() {
                break;
            }
            matches = matches.intersection(&postings.get_documents_with_term(&term)).copied().collect();
        }
        tracing::debug!(word, hits = matches.len(), "query term");
        matches
    }

    fn complement(&self, set: &BTreeSet<DocId>) -> BTreeSet<DocId> {
        self.index.vocabulary().get_document_ids().difference(set).copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> Index {
        let mut index = Index::new();
        index.index_corpus([("d0", "a"), ("d1", "b"), ("d2", "c"), ("d3", "a b c")]);
        index
    }

    fn ids(index: &Index, q: &str) -> Vec<DocId> {
        evaluate(index, q).unwrap().into_iter().collect()
    }

    #[test]
    fn and_or_share_precedence() {
        let index = index();
        assert_eq!(ids(&index, "a OR b AND c"), vec![3]);
        assert_eq!(ids(&index, "a OR (b AND c)"), vec![0, 3]);
    }

    #[test]
    fn not_after_operator_extends_to_end() {
        let index = index();
        // a AND ((NOT b) OR c)
        assert_eq!(ids(&index, "a AND NOT b OR c"), vec![0, 3]);
        assert_eq!(ids(&index, "(a AND NOT b) OR c"), vec![0, 2, 3]);
    }

    #[test]
    fn terms_are_case_folded() {
        let index = index();
        assert_eq!(ids(&index, "A"), vec![0, 3]);
    }

    #[test]
    fn compound_words_need_every_part() {
        let mut index = Index::new();
        index.index_corpus([("d0", "foo bar"), ("d1", "foo"), ("d2", "bar-foo")]);
        assert_eq!(ids(&index, "foo-bar"), vec![0, 2]);
        assert_eq!(ids(&index, "foo-baz"), Vec::<DocId>::new());
        assert_eq!(ids(&index, "--"), Vec::<DocId>::new());
    }

    #[test]
    fn malformed_queries_are_rejected() {
        let index = index();
        let err = |q: &str| evaluate(&index, q).unwrap_err();
        assert_eq!(err(""), QueryError::EmptyQuery);
        assert_eq!(err("   "), QueryError::EmptyQuery);
        assert_eq!(err(")"), QueryError::UnexpectedRightParen);
        assert_eq!(err("a)"), QueryError::UnexpectedRightParen);
        assert_eq!(err("()"), QueryError::UnexpectedRightParen);
        assert_eq!(err("(a"), QueryError::MissingRightParen);
        assert_eq!(err("(a b)"), QueryError::MissingRightParen);
        assert_eq!(err("a AND"), QueryError::DanglingOperator(Token::And));
        assert_eq!(err("a OR"), QueryError::DanglingOperator(Token::Or));
        assert_eq!(err("a b"), QueryError::UnexpectedToken(Token::Str("b".into())));
        assert_eq!(err("AND a"), QueryError::UnexpectedToken(Token::And));
        assert_eq!(err("a AND OR b"), QueryError::UnexpectedToken(Token::Or));
        assert_eq!(err("NOT"), QueryError::UnexpectedEnd);
        assert_eq!(err("a AND ("), QueryError::UnexpectedEnd);
    }

    #[test]
    fn nesting_is_bounded() {
        let index = index();
        let parens = |d: usize| format!("{}a{}", "(".repeat(d), ")".repeat(d));
        assert_eq!(ids(&index, &parens(MAX_QUERY_DEPTH)), vec![0, 3]);
        assert_eq!(evaluate(&index, &parens(MAX_QUERY_DEPTH + 1)), Err(QueryError::TooDeep(MAX_QUERY_DEPTH)));
        assert_eq!(evaluate(&index, &parens(100_000)), Err(QueryError::TooDeep(MAX_QUERY_DEPTH)));

        let nots = |d: usize| format!("{}a", "NOT ".repeat(d));
        // The outermost NOT negates directly; every further one nests.
        assert_eq!(ids(&index, &nots(MAX_QUERY_DEPTH + 1)), vec![1, 2]);
        assert_eq!(evaluate(&index, &nots(100_000)), Err(QueryError::TooDeep(MAX_QUERY_DEPTH)));
        // Siblings do not add up.
        let siblings = vec![parens(MAX_QUERY_DEPTH); 3].join(" OR ");
        assert_eq!(ids(&index, &siblings), vec![0, 3]);
    }
}
