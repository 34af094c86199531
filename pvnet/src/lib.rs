
pub mod board;
pub mod config;
pub mod neural;

pub use board::Board;
pub use config::{Config, NeuralConfig};
pub use neural::{ModelParams, NetworkError, PolicyValueNet, Sample, StepReport, TrainingBatch};
