//! Query normalization: raw query text to a flat token sequence.
//!
//! Upper-case `AND`, `OR` and `NOT` become `&`, `|` and `!`; the text is
//! then folded and lower-cased with the index-time tokenizer's rules and
//! scanned into operators, parentheses, field qualifiers, words and skip
//! markers. Inside a word, `.`, `-` and `/` survive only between two
//! alphanumerics and `:` only between two digits; a period that ends a
//! sentence by the tokenizer's rule becomes a skip marker, so it occupies
//! the same position the index-time break does.
//! Every other punctuation character separates words.

use crate::analysis::tokenizer::ends_sentence;
use crate::analysis::Tokenizer;
use crate::error::{BibdexError, Result};

/// One normalized query token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    And,
    Or,
    Not,
    /// `~N`, or a run of N bare `~`.
    Near(u32),
    Open,
    Close,
    /// A bracketed field qualifier, upper-cased.
    Field(String),
    Word(String),
    /// `+` or a terminal period: occupies a position, matches anything.
    Skip,
}

impl Token {
    pub fn is_operator(&self) -> bool {
        matches!(self, Token::And | Token::Or | Token::Not | Token::Near(_))
    }
}

fn symbolize_operators(query: &str) -> String {
    fn flush(run: &mut String, out: &mut String) {
        match run.as_str() {
            "AND" => out.push_str(" & "),
            "OR" => out.push_str(" | "),
            "NOT" => out.push_str(" ! "),
            _ => out.push_str(run),
        }
        run.clear();
    }

    let mut out = String::with_capacity(query.len() + 8);
    let mut run = String::new();
    for c in query.chars() {
        if c.is_alphanumeric() {
            run.push(c);
        } else {
            flush(&mut run, &mut out);
            out.push(c);
        }
    }
    flush(&mut run, &mut out);
    out
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '*'
}

fn scan(query: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = query.chars().collect();
    let mut tokens = Vec::new();
    let mut word = String::new();

    fn flush(word: &mut String, tokens: &mut Vec<Token>) {
        if !word.is_empty() {
            tokens.push(Token::Word(std::mem::take(word)));
        }
    }

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let prev = word.chars().last();
        let next = chars.get(i + 1).copied();
        let between_alnum =
            prev.is_some_and(char::is_alphanumeric) && next.is_some_and(is_word_char);

        match c {
            c if is_word_char(c) => word.push(c),
            '.' | '-' | '/' if between_alnum => word.push(c),
            ':' if prev.is_some_and(|p| p.is_ascii_digit())
                && next.is_some_and(|n| n.is_ascii_digit()) =>
            {
                word.push(c)
            }
            '.' if ends_sentence(i.checked_sub(1).map(|j| chars[j]), next) => {
                flush(&mut word, &mut tokens);
                tokens.push(Token::Skip);
            }
            _ => {
                flush(&mut word, &mut tokens);
                match c {
                    '&' => tokens.push(Token::And),
                    '|' => tokens.push(Token::Or),
                    '!' => tokens.push(Token::Not),
                    '(' => tokens.push(Token::Open),
                    ')' => tokens.push(Token::Close),
                    '+' => tokens.push(Token::Skip),
                    '~' => {
                        let mut tildes = 1;
                        while chars.get(i + 1) == Some(&'~') {
                            tildes += 1;
                            i += 1;
                        }
                        let mut digits = String::new();
                        while let Some(d) = chars.get(i + 1).filter(|d| d.is_ascii_digit()) {
                            digits.push(*d);
                            i += 1;
                        }
                        let distance = if digits.is_empty() {
                            tildes
                        } else {
                            digits.parse().map_err(|_| {
                                BibdexError::query(format!("proximity distance ~{digits} is too large"))
                            })?
                        };
                        tokens.push(Token::Near(distance));
                    }
                    '[' => {
                        let rest: String = chars[i + 1..].iter().collect();
                        let Some(end) = rest.find(']') else {
                            return Err(BibdexError::query("unterminated field qualifier"));
                        };
                        let name = rest[..end].trim().to_ascii_uppercase();
                        if name.is_empty() {
                            return Err(BibdexError::query("empty field qualifier []"));
                        }
                        i += rest[..end].chars().count() + 1;
                        tokens.push(Token::Field(name));
                    }
                    ']' => return Err(BibdexError::query("unmatched ']'")),
                    _ => {}
                }
            }
        }
        i += 1;
    }
    flush(&mut word, &mut tokens);
    Ok(tokens)
}

fn check_balance(tokens: &[Token]) -> Result<()> {
    let mut depth = 0i32;
    for token in tokens {
        match token {
            Token::Open => depth += 1,
            Token::Close => {
                depth -= 1;
                if depth < 0 {
                    return Err(BibdexError::query("unbalanced parentheses: unexpected ')'"));
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(BibdexError::query("unbalanced parentheses: missing ')'"));
    }
    Ok(())
}

/// Pairs of (open, close) indices, innermost first.
fn paren_pairs(tokens: &[Token]) -> Vec<(usize, usize)> {
    let mut stack = Vec::new();
    let mut pairs = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::Open => stack.push(i),
            Token::Close => {
                if let Some(open) = stack.pop() {
                    pairs.push((open, i));
                }
            }
            _ => {}
        }
    }
    pairs
}

/// Drop parentheses that cannot change the parse.
fn simplify_parens(mut tokens: Vec<Token>) -> Vec<Token> {
    if !tokens.iter().any(Token::is_operator) {
        tokens.retain(|t| !matches!(t, Token::Open | Token::Close));
        return tokens;
    }

    let left_ok = |t: Option<&Token>| {
        t.is_none_or(|t| t.is_operator() || matches!(t, Token::Open | Token::Field(_)))
    };
    let right_ok = |t: Option<&Token>| {
        t.is_none_or(|t| t.is_operator() || matches!(t, Token::Close | Token::Field(_)))
    };

    loop {
        let removable = paren_pairs(&tokens).into_iter().find(|&(open, close)| {
            !tokens[open + 1..close].iter().any(Token::is_operator)
                && left_ok(open.checked_sub(1).map(|i| &tokens[i]))
                && right_ok(tokens.get(close + 1))
        });
        let Some((open, close)) = removable else {
            return tokens;
        };
        tokens.remove(close);
        tokens.remove(open);
    }
}

/// Normalize a raw query into tokens.
pub fn normalize(query: &str, tokenizer: &Tokenizer) -> Result<Vec<Token>> {
    let prepared = tokenizer.prepare(&symbolize_operators(query));
    let tokens = scan(&prepared)?;
    check_balance(&tokens)?;
    Ok(simplify_parens(tokens))
}
