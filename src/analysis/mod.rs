//! Text analysis shared by the index builder and the query parser.
//!
//! Index-time and query-time token forms must match exactly, so both sides
//! go through the same tokenizer, stop-word table and stemmer.

pub mod analyzer;
pub mod stemmer;
pub mod stop;
pub mod tokenizer;
pub mod translit;

pub use analyzer::{AnalyzedTerm, FieldAnalyzer, PhraseToken, PositionCounter};
pub use stemmer::{PorterStemmer, Stemmer};
pub use stop::StopWords;
pub use tokenizer::{Lexeme, Tokenizer};
