//! Fatal errors. Everything else in the pipeline degrades to absent/missing
//! values; only a bad input file stops the run, before any scheduling.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read input file {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("input file {path} is missing required column \"{column}\"")]
    MissingColumn { path: String, column: String },

    #[error("failed to write output file {path}: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: csv::Error,
    },
}
