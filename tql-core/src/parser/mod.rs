//! Term-list parser.
//!
//! Turns strings such as `name, UPPER(name) AS upperName, likes DESC` into an
//! ordered list of [`Term`]s. Commas inside quotes or parentheses never split
//! a term. Function arguments are parsed recursively into sub-terms, so nested
//! calls and quoted literals containing commas are supported.
//!
//! The parser is deliberately forgiving: unbalanced quotes or parentheses do
//! not fail here. The malformed term is passed on and the caller's field or
//! function validation reports the problem.

use serde::Serialize;

use crate::lexer::{Lexer, Token};

/// Comparison mode requested by an ORDER BY modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CompareMode {
    /// Loose ordering: equality test first, then less-than.
    #[default]
    Default,
    /// Natural ordering: digit runs compare by numeric value.
    Natural,
}

/// How a function argument is resolved against a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument<'a> {
    /// A column reference, resolved from the row.
    Field(&'a str),
    /// A quoted literal, already stripped of its quotes.
    Literal(&'a str),
    /// A nested function call.
    Call(&'a Term),
}

/// One comma-separated clause of a term list.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Term {
    /// Trimmed source text of the whole term.
    pub raw: String,
    /// Field name, or the function name for calls.
    pub name: String,
    /// Alias given with `AS`.
    pub alias: Option<String>,
    /// Function name if the term is a call.
    pub function: Option<String>,
    /// Raw text between the call's parentheses.
    pub args_raw: String,
    /// `args_raw` parsed as a term list.
    pub args: Vec<Term>,
    /// Trailing modifier text, e.g. `DESC` or `NATURAL`.
    pub rest: String,
    pub descending: bool,
    pub mode: CompareMode,
}

impl Term {
    /// Column name this term produces: the alias if present, else the name.
    pub fn output_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn is_call(&self) -> bool {
        self.function.is_some()
    }

    /// Classify this term used as a function argument.
    ///
    /// A term whose text changes when stripped of surrounding quote
    /// characters is a literal. Otherwise it is a nested call or a field
    /// reference. A column whose value is its own name in quotes cannot be
    /// told apart from a literal; that ambiguity is accepted.
    pub fn argument(&self) -> Argument<'_> {
        let stripped = strip_quotes(&self.raw);
        if stripped != self.raw {
            Argument::Literal(stripped)
        } else if self.is_call() {
            Argument::Call(self)
        } else {
            Argument::Field(&self.raw)
        }
    }
}

/// Strip any run of `'` and `"` characters from both ends.
pub fn strip_quotes(s: &str) -> &str {
    s.trim_matches(|c| c == '\'' || c == '"')
}

/// Parse a term list (SELECT style).
pub fn parse_terms(input: &str) -> Vec<Term> {
    Parser::new(input).parse_term_list()
}

/// Parse a term list and interpret each term's modifier (ORDER BY style).
///
/// `DESC` anywhere in the modifier reverses that term; `NATURAL` selects
/// natural comparison. Both are matched case-insensitively.
pub fn parse_order_terms(input: &str) -> Vec<Term> {
    let mut terms = parse_terms(input);
    for term in &mut terms {
        let rest = term.rest.to_uppercase();
        term.descending = rest.contains("DESC");
        term.mode = if rest.contains("NATURAL") {
            CompareMode::Natural
        } else {
            CompareMode::Default
        };
    }
    terms
}

/// Parser over the token stream of one term list.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(input: &str) -> Self {
        Self {
            tokens: Lexer::new(input).tokenize(),
            position: 0,
        }
    }

    /// Parse all top-level terms. Empty terms are skipped.
    pub fn parse_term_list(&mut self) -> Vec<Term> {
        let mut terms = Vec::new();
        while self.position < self.tokens.len() {
            let raw = self.next_term_text();
            let raw = raw.trim();
            if !raw.is_empty() {
                terms.push(parse_term(raw));
            }
        }
        terms
    }

    /// Collect source text up to the next top-level comma and consume it.
    fn next_term_text(&mut self) -> String {
        let mut text = String::new();
        let mut depth = 0usize;
        let mut quote: Option<char> = None;

        while let Some(token) = self.tokens.get(self.position) {
            self.position += 1;
            match token {
                Token::Comma if quote.is_none() && depth == 0 => break,
                Token::Quote(q) => match quote {
                    None => quote = Some(*q),
                    Some(open) if open == *q => quote = None,
                    Some(_) => {}
                },
                Token::LeftParen if quote.is_none() => depth += 1,
                Token::RightParen if quote.is_none() => depth = depth.saturating_sub(1),
                _ => {}
            }
            text.push_str(token.as_str());
        }
        text
    }
}

/// Parse a single trimmed term.
fn parse_term(raw: &str) -> Term {
    let tokens = Lexer::new(raw).tokenize();
    let mut term = Term {
        raw: raw.to_string(),
        ..Term::default()
    };

    // Locate the first top-level opening parenthesis.
    let mut quote: Option<char> = None;
    let mut prefix = String::new();
    let mut open_at = None;
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::Quote(q) => match quote {
                None => quote = Some(*q),
                Some(open) if open == *q => quote = None,
                Some(_) => {}
            },
            Token::LeftParen if quote.is_none() => {
                open_at = Some(i);
                break;
            }
            _ => {}
        }
        prefix.push_str(token.as_str());
    }

    match open_at {
        Some(open) if !prefix.trim().is_empty() => {
            let function = prefix.trim().to_string();
            let (args_raw, after) = split_call(&tokens[open + 1..]);
            term.name = function.clone();
            term.function = Some(function);
            term.args = parse_terms(&args_raw);
            term.args_raw = args_raw;
            let (alias, rest) = split_alias(&after);
            term.alias = alias;
            term.rest = rest;
        }
        _ => match find_alias(raw) {
            Some((name, alias)) => {
                term.name = name.to_string();
                term.alias = Some(alias.to_string());
                term.rest = raw[name.len()..].trim().to_string();
            }
            None => {
                let name = raw.split_whitespace().next().unwrap_or("");
                term.name = name.to_string();
                term.rest = raw[name.len()..].trim().to_string();
            }
        },
    }
    term
}

/// Split the tokens following an opening parenthesis into the argument text
/// and the text after the matching closing parenthesis.
fn split_call(tokens: &[Token]) -> (String, String) {
    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    let mut args = String::new();
    let mut after = String::new();
    let mut closed = false;

    for token in tokens {
        if closed {
            after.push_str(token.as_str());
            continue;
        }
        match token {
            Token::Quote(q) => match quote {
                None => quote = Some(*q),
                Some(open) if open == *q => quote = None,
                Some(_) => {}
            },
            Token::LeftParen if quote.is_none() => depth += 1,
            Token::RightParen if quote.is_none() => {
                depth -= 1;
                if depth == 0 {
                    closed = true;
                    continue;
                }
            }
            _ => {}
        }
        args.push_str(token.as_str());
    }
    (args, after)
}

/// Extract `AS alias` from the text following a call.
fn split_alias(after: &str) -> (Option<String>, String) {
    let rest = after.trim().to_string();
    let padded = format!(" {}", after);
    match find_as_keyword(&padded) {
        Some(pos) => {
            let alias = padded[pos + 4..].trim();
            let alias = (!alias.is_empty()).then(|| alias.to_string());
            (alias, rest)
        }
        None => (None, rest),
    }
}

/// Split `name AS alias` outside of quotes.
fn find_alias(raw: &str) -> Option<(&str, &str)> {
    let pos = find_as_keyword(raw)?;
    let name = raw[..pos].trim();
    let alias = raw[pos + 4..].trim();
    if name.is_empty() || alias.is_empty() {
        return None;
    }
    Some((name, alias))
}

/// Byte position of a case-insensitive ` AS ` keyword outside quotes.
fn find_as_keyword(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i + 4 <= bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'\'' || b == b'"' => quote = Some(b),
            None => {
                if b.is_ascii_whitespace()
                    && bytes[i + 1].eq_ignore_ascii_case(&b'a')
                    && bytes[i + 2].eq_ignore_ascii_case(&b's')
                    && bytes[i + 3].is_ascii_whitespace()
                {
                    return Some(i);
                }
            }
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests;
