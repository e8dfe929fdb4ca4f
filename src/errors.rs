/*!
 * Error types for the subferry application.
 *
 * This module contains custom error types for the different failure modes of
 * the pipeline, using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors raised while moving subtitle units through the pipeline. Both are
/// fatal for the unit being processed and recoverable at batch level.
#[derive(Error, Debug)]
pub enum FerryError {
    /// A required file or directory is absent
    #[error("missing input: {0}")]
    MissingInput(String),

    /// Chunk-count, index-contiguity or block-count disagreement between
    /// paired locations
    #[error("count mismatch: {0}")]
    CountMismatch(String),
}
