/// Engine error taxonomy.
///
/// - `Data`: a persisted record is malformed. Restore rejects it and
///   the session keeps its current mode.
/// - `Geometry`: degenerate surface dimensions. Rejected before they
///   can reach net placement (division by the canvas span).
/// - `Io`: save file could not be read or written.

use std::fmt;
use std::io;

#[derive(Debug)]
pub enum EngineError {
    Data(String),
    Geometry { width: i32, height: i32 },
    Io(io::Error),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Data(detail) => write!(f, "malformed save record: {}", detail),
            EngineError::Geometry { width, height } => {
                write!(f, "degenerate surface size {}x{}", width, height)
            }
            EngineError::Io(e) => write!(f, "save file I/O: {}", e),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for EngineError {
    fn from(e: io::Error) -> Self {
        EngineError::Io(e)
    }
}
