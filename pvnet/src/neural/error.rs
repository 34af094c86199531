
use thiserror::Error;

///
/// Failures specific to the policy-value network. These travel inside 
/// `utils::error::Error` and can be recovered with `downcast_ref`.
///
#[derive(Debug, Error, PartialEq)]
pub enum NetworkError 
{
    #[error("Board size {width}x{height} is invalid; both dimensions must be positive.")]
    InvalidBoardSize { width: i64, height: i64 },

    #[error("Expected {what} of shape {expected:?}, found {actual:?}.")]
    ShapeMismatch { what: &'static str, expected: Vec<usize>, actual: Vec<usize> },

    #[error("Move {index} is outside the board's {cells} cells.")]
    IllegalMove { index: usize, cells: usize },

    #[error("Batch components disagree on size: {states} states, {policies} policies, {winners} winners.")]
    BatchMismatch { states: usize, policies: usize, winners: usize },

    #[error("A training batch needs at least one sample.")]
    EmptyBatch,

    #[error("No checkpoint metadata found at '{0}'.")]
    MissingCheckpoint (String),

    #[error("Checkpoint '{path}' does not fit this network: {reason}")]
    CheckpointMismatch { path: String, reason: String },

    #[error("Parameter set does not fit this network: {0}")]
    ParameterMismatch (String)
}
