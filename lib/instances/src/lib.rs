pub use anyhow::Result;

use std::fmt;

/// Problems with an instance file, detected before any model is built.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum InputParseError {
    Syntax(String),
    RideCount { expected: usize, found: usize },
    NegativeSlack { ride: usize, max_delay: i64 },
    OffGrid { ride: usize, pos: (i64, i64), rows: usize, cols: usize },
}


impl fmt::Display for InputParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputParseError::Syntax(msg) => write!(f, "malformed instance:\n{}", msg),
            InputParseError::RideCount { expected, found } =>
                write!(f, "header declares {} rides but {} ride lines were found", expected, found),
            InputParseError::NegativeSlack { ride, max_delay } =>
                write!(f, "ride {} cannot be completed inside its window (slack {})", ride, max_delay),
            InputParseError::OffGrid { ride, pos, rows, cols } =>
                write!(f, "ride {} visits {:?}, outside the {}x{} grid", ride, pos, rows, cols),
        }
    }
}

impl std::error::Error for InputParseError {}


pub mod dataset;
pub mod raw;

mod parsers;
pub use parsers::{ParseInstance, HashcodeFmt, HashcodeStr};
