//! Splits a boolean query into tokens.
//!
//! Words are separated by whitespace. Parentheses are always tokens of their
//! own, so `(rust` lexes as `(` followed by `rust`. `AND`, `OR` and `NOT` are
//! keywords only in upper case; `and` is an ordinary search term.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Str(String),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Str,
    And,
    Or,
    Not,
    LParen,
    RParen,
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Str(_) => TokenKind::Str,
            Token::And => TokenKind::And,
            Token::Or => TokenKind::Or,
            Token::Not => TokenKind::Not,
            Token::LParen => TokenKind::LParen,
            Token::RParen => TokenKind::RParen,
        }
    }

    fn from_word(word: &str) -> Self {
        match word {
            "AND" => Token::And,
            "OR" => Token::Or,
            "NOT" => Token::Not,
            _ => Token::Str(word.to_string()),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Str(s) => write!(f, "{s:?}"),
            Token::And => f.write_str("AND"),
            Token::Or => f.write_str("OR"),
            Token::Not => f.write_str("NOT"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
        }
    }
}

/// Token stream with one token of lookahead.
#[derive(Debug, Clone)]
pub struct QueryLexer {
    tokens: Vec<Token>,
    pos: usize,
}

impl QueryLexer {
    pub fn new(query: &str) -> Self {
        let mut tokens = Vec::new();
        for word in query.split_whitespace() {
            let mut start = 0;
            for (i, c) in word.char_indices() {
                if c == '(' || c == ')' {
                    if start < i {
                        tokens.push(Token::from_word(&word[start..i]));
                    }
                    tokens.push(if c == '(' { Token::LParen } else { Token::RParen });
                    start = i + 1;
                }
            }
            if start < word.len() {
                tokens.push(Token::from_word(&word[start..]));
            }
        }
        Self { tokens, pos: 0 }
    }

    pub fn has_next(&self) -> bool { self.pos < self.tokens.len() }

    /// Kind of the next token without consuming it.
    pub fn peek_type(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(Token::kind)
    }

    /// True when the next token is `AND` or `OR`.
    pub fn is_next_operator(&self) -> bool {
        matches!(self.peek_type(), Some(TokenKind::And | TokenKind::Or))
    }
}

impl Iterator for QueryLexer {
    type Item = Token;

    /// Consume the next token; `None` once the input is exhausted.
    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned()?;
        self.pos += 1;
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_glued_parentheses() {
        let tokens: Vec<Token> = QueryLexer::new("(anders AND langballe) OR NOT(unit)").collect();
        assert_eq!(
            tokens,
            vec![
                Token::LParen,
                Token::Str("anders".into()),
                Token::And,
                Token::Str("langballe".into()),
                Token::RParen,
                Token::Or,
                Token::Not,
                Token::LParen,
                Token::Str("unit".into()),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn keywords_are_case_sensitive() {
        let tokens: Vec<Token> = QueryLexer::new("and Or NOT").collect();
        assert_eq!(tokens, vec![Token::Str("and".into()), Token::Str("Or".into()), Token::Not]);
    }

    #[test]
    fn peek_does_not_consume() {
        let mut lexer = QueryLexer::new("rust OR");
        assert_eq!(lexer.peek_type(), Some(TokenKind::Str));
        assert_eq!(lexer.peek_type(), Some(TokenKind::Str));
        assert_eq!(lexer.next(), Some(Token::Str("rust".into())));
        assert!(lexer.is_next_operator());
        assert_eq!(lexer.next(), Some(Token::Or));
        assert!(!lexer.has_next());
        assert_eq!(lexer.peek_type(), None);
        assert_eq!(lexer.next(), None);
    }
}
