#[macro_use]
extern crate log;
pub mod decode;
pub mod gen_seq;
pub mod model;
mod report;
pub mod train;

/// Errors raised by parameter lookup, decoding, and training.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("no transition probability found from begin to state {0}")]
    MissingBeginTransition(usize),
    #[error("no transition probability found from state {from} to state {to}")]
    MissingTransition { from: usize, to: usize },
    #[error("no emission probability found for symbol '{symbol}' in state {state}")]
    MissingEmission { symbol: char, state: usize },
    #[error("input sequence is empty")]
    EmptySequence,
    #[error("iteration count must be positive")]
    NoIterations,
    #[error("no state reaches the end of the sequence with a comparable score")]
    DegenerateModel,
}

pub type Result<T> = std::result::Result<T, Error>;
