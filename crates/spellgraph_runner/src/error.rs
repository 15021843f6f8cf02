// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runner errors.

use spellgraph_graph::{EvaluationError, GraphError};
use std::path::PathBuf;

/// Error while loading or running an effect
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// File could not be read or written
    #[error("{path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Malformed RON
    #[error("{path}: {source}")]
    Ron {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: ron::error::SpannedError,
    },

    /// RON serialization failed
    #[error("Failed to serialize: {0}")]
    Serialize(#[from] ron::Error),

    /// Malformed JSON
    #[error("{path}: {source}")]
    Json {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: serde_json::Error,
    },

    /// Extension is neither `.ron` nor `.json`
    #[error("Unsupported graph format: {0}")]
    UnsupportedFormat(PathBuf),

    /// Config written by a newer runner
    #[error("Config version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },

    /// Graph rejected while building
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Evaluator rejected the graph
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}
