// DAGBENCH PARSE ERRORS
// THE ONLY WAYS TURNING A SCHEDULER LOG INTO STATISTICS CAN FAIL

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    // THE LOG HELD NO CYCLE LINE, SO THERE IS NO AVERAGE TO REPORT
    #[error("no cycle measurements in {source_name}")]
    MissingData { source_name: String },

    #[error("cannot read log {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ParseError {
    pub fn is_missing_data(&self) -> bool {
        matches!(self, ParseError::MissingData { .. })
    }
}
