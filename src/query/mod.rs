//! Boolean, phrase and proximity queries over an archive.
//!
//! A query string passes through [`lexer`] (normalization), [`partition`]
//! (phrases and qualifiers), [`filter`] (field resolution, stop words and
//! stemming), [`expand`] (per-field rules) and [`parser`] (precedence) to
//! become an [`Expr`], which [`SearchEngine`] evaluates with the merge
//! algebra in [`setops`].

pub mod aliases;
pub mod count;
pub mod eval;
pub mod expand;
pub mod filter;
pub mod lexer;
pub mod parser;
pub mod partition;
pub mod setops;

pub use aliases::{AliasTables, MeshEntry};
pub use count::TermCount;
pub use eval::SearchEngine;
pub use parser::{Expr, QueryParser};
