
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod input;
pub mod loss;
pub mod memory;
pub mod net;
pub mod network;

pub use self::checkpoint::{Checkpoint, Metadata};
pub use self::error::NetworkError;
pub use self::memory::{Sample, TrainingBatch};
pub use self::network::{ModelParams, PolicyValueNet, StepReport};
