//! Load optimization requests from JSON files. Used by the CLI; the library
//! itself only ever sees typed requests.

use std::fmt;
use std::fs;
use std::path::Path;

use crate::optimizer::OptimizationRequest;

#[derive(Debug)]
pub enum RequestError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "unable to read request: {e}"),
            Self::Parse(e) => write!(f, "unable to parse request: {e}"),
        }
    }
}

impl std::error::Error for RequestError {}

pub fn parse_request(raw: &str) -> Result<OptimizationRequest, RequestError> {
    serde_json::from_str(raw).map_err(RequestError::Parse)
}

pub fn load_request(path: impl AsRef<Path>) -> Result<OptimizationRequest, RequestError> {
    let raw = fs::read_to_string(path).map_err(RequestError::Io)?;
    parse_request(&raw)
}
