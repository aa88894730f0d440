//! Tokenizer for term lists.
//!
//! A term list is split on the structural characters `,` `(` `)` `'` `"`.
//! Everything between them is kept verbatim as a text token, so the parser
//! can reassemble the exact source text of each term.

/// Token types produced by the lexer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Comma,
    LeftParen,
    RightParen,
    /// A single or double quote character.
    Quote(char),
    /// Any run of characters between structural characters.
    Text(String),
}

impl Token {
    /// Source text of this token.
    pub fn as_str(&self) -> &str {
        match self {
            Token::Comma => ",",
            Token::LeftParen => "(",
            Token::RightParen => ")",
            Token::Quote('\'') => "'",
            Token::Quote(_) => "\"",
            Token::Text(s) => s,
        }
    }
}

/// Splits a term list into tokens.
pub struct Lexer<'a> {
    input: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input }
    }

    /// Tokenize the whole input. Line breaks are treated as blanks.
    pub fn tokenize(&self) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut text = String::new();

        for ch in self.input.chars() {
            let token = match ch {
                ',' => Token::Comma,
                '(' => Token::LeftParen,
                ')' => Token::RightParen,
                '\'' | '"' => Token::Quote(ch),
                '\r' | '\n' => {
                    text.push(' ');
                    continue;
                }
                _ => {
                    text.push(ch);
                    continue;
                }
            };
            if !text.is_empty() {
                tokens.push(Token::Text(std::mem::take(&mut text)));
            }
            tokens.push(token);
        }

        if !text.is_empty() {
            tokens.push(Token::Text(text));
        }
        tokens
    }
}
