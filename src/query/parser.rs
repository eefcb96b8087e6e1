//! Query parser for converting query strings to expression trees.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! or    := and ('|' and)*
//! and   := not ('&' not)*
//! not   := prox ('!' prox)*
//! prox  := atom ('~N' atom)*
//! atom  := '(' or ')' | phrase
//! ```
//!
//! Every operator is left-associative. Parsing runs the full pipeline
//! (normalization, partitioning, text rules, field expansion) and reports
//! every syntax problem before any postings are read.

use crate::analysis::{FieldAnalyzer, PhraseToken};
use crate::error::{BibdexError, Result};
use crate::query::aliases::AliasTables;
use crate::query::expand::Expander;
use crate::query::filter::apply_text_rules;
use crate::query::lexer::normalize;
use crate::query::partition::{partition, Operator, Part};
use crate::schema::FieldSchema;

/// A parsed query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Consecutive words of a free-text field; skips only shift offsets.
    Phrase {
        field: String,
        words: Vec<PhraseToken>,
    },
    /// One exact term or wildcard pattern of a non-positional field.
    Term { field: String, term: String },
    /// A fixed, sorted identifier list.
    Uids(Vec<u32>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    /// Left operand without the right one.
    Not(Box<Expr>, Box<Expr>),
    Near {
        left: Box<Expr>,
        right: Box<Expr>,
        distance: u32,
    },
}

impl Expr {
    /// OR together alternatives; no alternatives matches nothing.
    pub fn any(alternatives: Vec<Expr>) -> Expr {
        alternatives
            .into_iter()
            .reduce(|acc, next| Expr::Or(Box::new(acc), Box::new(next)))
            .unwrap_or(Expr::Uids(Vec::new()))
    }

    /// Whether the expression yields word positions.
    pub fn is_positional(&self) -> bool {
        matches!(self, Expr::Phrase { .. } | Expr::Near { .. })
    }

    /// The field whose positions a positional expression yields.
    pub fn position_field(&self) -> Option<&str> {
        match self {
            Expr::Phrase { field, .. } => Some(field),
            Expr::Near { right, .. } => right.position_field(),
            _ => None,
        }
    }

    fn binary(op: Operator, left: Expr, right: Expr) -> Expr {
        let (left, right) = (Box::new(left), Box::new(right));
        match op {
            Operator::Or => Expr::Or(left, right),
            Operator::And => Expr::And(left, right),
            Operator::Not => Expr::Not(left, right),
            Operator::Near(distance) => Expr::Near {
                left,
                right,
                distance,
            },
        }
    }
}

fn describe(part: &Part) -> String {
    match part {
        Part::Op(Operator::Or) => "'|'".to_string(),
        Part::Op(Operator::And) => "'&'".to_string(),
        Part::Op(Operator::Not) => "'!'".to_string(),
        Part::Op(Operator::Near(n)) => format!("'~{n}'"),
        Part::Open => "'('".to_string(),
        Part::Close => "')'".to_string(),
        Part::Phrase(phrase) => format!("'{}'", phrase.plain_words().join(" ")),
    }
}

/// Recursive-descent parser over partitioned query parts.
struct Parser<'a> {
    parts: std::iter::Peekable<std::vec::IntoIter<Part>>,
    expander: Expander<'a>,
}

impl Parser<'_> {
    fn peek_op(&mut self, wanted: fn(Operator) -> bool) -> Option<Operator> {
        match self.parts.peek() {
            Some(Part::Op(op)) if wanted(*op) => Some(*op),
            _ => None,
        }
    }

    fn level(
        &mut self,
        wanted: fn(Operator) -> bool,
        operand: fn(&mut Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let mut left = operand(self)?;
        while let Some(op) = self.peek_op(wanted) {
            self.parts.next();
            let right = operand(self)?;
            if let Operator::Near(distance) = op {
                if !left.is_positional() || !right.is_positional() {
                    return Err(BibdexError::query(format!(
                        "~{distance} needs free-text phrases on both sides"
                    )));
                }
                if let (Some(l), Some(r)) = (left.position_field(), right.position_field()) {
                    if l != r {
                        return Err(BibdexError::query(format!(
                            "~{distance} cannot relate [{l}] to [{r}]"
                        )));
                    }
                }
            }
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn or(&mut self) -> Result<Expr> {
        self.level(|op| op == Operator::Or, Self::and)
    }

    fn and(&mut self) -> Result<Expr> {
        self.level(|op| op == Operator::And, Self::not)
    }

    fn not(&mut self) -> Result<Expr> {
        self.level(|op| op == Operator::Not, Self::prox)
    }

    fn prox(&mut self) -> Result<Expr> {
        self.level(|op| matches!(op, Operator::Near(_)), Self::atom)
    }

    fn atom(&mut self) -> Result<Expr> {
        match self.parts.next() {
            Some(Part::Open) => {
                let inner = self.or()?;
                match self.parts.next() {
                    Some(Part::Close) => Ok(inner),
                    Some(other) => Err(BibdexError::query(format!(
                        "missing operator before {}",
                        describe(&other)
                    ))),
                    None => Err(BibdexError::query("unbalanced parentheses: missing ')'")),
                }
            }
            Some(Part::Phrase(phrase)) => self.expander.expand(phrase),
            Some(other) => Err(BibdexError::query(format!(
                "{} is missing an operand",
                describe(&other)
            ))),
            None => Err(BibdexError::query("query ends with an operator")),
        }
    }

    fn query(&mut self) -> Result<Expr> {
        if self.parts.peek().is_none() {
            return Err(BibdexError::query("empty query"));
        }
        let expr = self.or()?;
        match self.parts.next() {
            None => Ok(expr),
            Some(Part::Close) => Err(BibdexError::query("unbalanced parentheses: unexpected ')'")),
            Some(other) => Err(BibdexError::query(format!(
                "missing operator before {}",
                describe(&other)
            ))),
        }
    }
}

/// Turns query strings into expressions for one archive.
#[derive(Debug, Clone, Copy)]
pub struct QueryParser<'a> {
    schema: &'a FieldSchema,
    analyzer: &'a FieldAnalyzer,
    aliases: &'a AliasTables,
    pipe: Option<&'a [u32]>,
}

impl<'a> QueryParser<'a> {
    pub fn new(
        schema: &'a FieldSchema,
        analyzer: &'a FieldAnalyzer,
        aliases: &'a AliasTables,
    ) -> Self {
        QueryParser {
            schema,
            analyzer,
            aliases,
            pipe: None,
        }
    }

    /// Identifiers substituted for `[PIPE]` phrases.
    pub fn with_pipe(mut self, pipe: &'a [u32]) -> Self {
        self.pipe = Some(pipe);
        self
    }

    /// Parse a query string.
    pub fn parse(&self, query: &str) -> Result<Expr> {
        let tokens = normalize(query, self.analyzer.tokenizer())?;
        let parts = apply_text_rules(partition(tokens)?, self.schema, self.analyzer)?;
        log::trace!("query parts: {parts:?}");

        let mut parser = Parser {
            parts: parts.into_iter().peekable(),
            expander: Expander::new(self.schema, self.aliases, self.pipe),
        };
        parser.query()
    }
}
