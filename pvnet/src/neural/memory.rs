
use ndarray::{stack, Array1, Array2, Array3, Array4, ArrayView4, Axis};

use tch::{Device, Tensor};

use utils::error::*;

use super::error::NetworkError;
use super::input::*;

///
/// Represents a single self-play memory of (s, pi, z): the board image, 
/// the MCTS visit distribution over every cell, and the final result of 
/// the game from the perspective of the player to move in s.
///
#[derive(Clone, Debug)]
pub struct Sample 
{
    pub state: Array3<f32>,
    pub mcts_probs: Array1<f32>,
    pub winner: f32
}

///
/// A stacked batch of samples, ready to be fed to a training step.
///
#[derive(Clone, Debug)]
pub struct TrainingBatch 
{
    states: Array4<f32>,
    mcts_probs: Array2<f32>,
    winners: Array1<f32>
}

///
/// A training batch moved onto the network's device.
///
pub struct BatchTensors 
{
    pub states: Tensor,
    pub mcts_probs: Tensor,
    pub winners: Tensor
}

impl TrainingBatch 
{
    ///
    /// Assembles a batch from already-stacked components. The three components 
    /// must agree on the batch size, and the batch must not be empty.
    ///
    pub fn new (states: Array4<f32>, mcts_probs: Array2<f32>, winners: Array1<f32>) -> Result<TrainingBatch>
    {
        let (n_states, n_policies, n_winners) = (states.shape()[0], mcts_probs.shape()[0], winners.len());

        if n_states != n_policies || n_states != n_winners 
        {
            return Err(NetworkError::BatchMismatch { states: n_states, policies: n_policies, winners: n_winners }.into());
        }
        if n_states == 0 
        {
            return Err(NetworkError::EmptyBatch.into());
        }

        Ok(TrainingBatch { states, mcts_probs, winners })
    }

    ///
    /// Stacks individual samples, as drawn from a replay buffer, into a batch.
    ///
    pub fn from_samples (samples: & [Sample]) -> Result<TrainingBatch>
    {
        if samples.is_empty() 
        {
            return Err(NetworkError::EmptyBatch.into());
        }

        let states : Vec<_> = samples.iter().map(|s| s.state.view()).collect();
        let policies : Vec<_> = samples.iter().map(|s| s.mcts_probs.view()).collect();

        let states = stack(Axis(0), & states).context("Samples disagree on the board image shape.")?;
        let mcts_probs = stack(Axis(0), & policies).context("Samples disagree on the policy length.")?;
        let winners = samples.iter().map(|s| s.winner).collect::<Array1<f32>>();

        TrainingBatch::new(states, mcts_probs, winners)
    }

    pub fn len (& self) -> usize 
    {
        self.winners.len()
    }

    pub fn is_empty (& self) -> bool 
    {
        self.winners.is_empty()
    }

    pub fn states (& self) -> ArrayView4<f32>
    {
        self.states.view()
    }

    ///
    /// Validates the batch against the board dimensions and moves it onto the device.
    ///
    pub fn to_tensors (& self, width: i64, height: i64, device: Device) -> Result<BatchTensors>
    {
        let Input(states) = Input::from_batch(self.states.view(), width, height, device)?;

        let cells = (width * height) as usize;
        check_shape("MCTS probabilities", self.mcts_probs.shape(), & [self.len(), cells])?;

        let mcts_probs = to_tensor(self.mcts_probs.view(), device)?;
        let winners = to_tensor(self.winners.view(), device)?;

        Ok(BatchTensors { states, mcts_probs, winners })
    }
}

#[cfg(test)]
mod tests 
{
    use super::*;

    fn sample (width: usize, height: usize, winner: f32) -> Sample 
    {
        let cells = width * height;
        Sample 
        {
            state: Array3::from_elem((PLANES, width, height), winner),
            mcts_probs: Array1::from_elem(cells, 1.0 / cells as f32),
            winner
        }
    }

    #[test]
    fn samples_stack_in_order () 
    {
        let samples = vec![sample(3, 3, 1.0), sample(3, 3, -1.0), sample(3, 3, 0.0)];
        let batch = TrainingBatch::from_samples(& samples).unwrap();

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.states().shape(), & [3, 4, 3, 3]);
        assert_eq!(batch.states()[[1, 2, 0, 0]], -1.0);

        let tensors = batch.to_tensors(3, 3, Device::Cpu).unwrap();
        assert_eq!(tensors.mcts_probs.size(), vec![3, 9]);
        assert_eq!(tensors.winners.size(), vec![3]);
        assert_eq!(tensors.winners.double_value(& [1]), -1.0);
    }

    #[test]
    fn mismatched_components_are_rejected () 
    {
        let err = TrainingBatch::new(Array4::zeros((2, 4, 3, 3)), Array2::zeros((2, 9)), Array1::zeros(3)).unwrap_err();

        assert_eq!(err.downcast_ref::<NetworkError>(), Some(& NetworkError::BatchMismatch { states: 2, policies: 2, winners: 3 }));
    }

    #[test]
    fn empty_batches_are_rejected () 
    {
        let err = TrainingBatch::from_samples(& []).unwrap_err();
        assert_eq!(err.downcast_ref::<NetworkError>(), Some(& NetworkError::EmptyBatch));
    }

    #[test]
    fn ragged_samples_are_rejected () 
    {
        assert!(TrainingBatch::from_samples(& [sample(3, 3, 1.0), sample(4, 4, 1.0)]).is_err());
    }

    #[test]
    fn policy_width_must_match_board () 
    {
        let batch = TrainingBatch::from_samples(& [sample(3, 3, 1.0)]).unwrap();
        assert!(batch.to_tensors(3, 3, Device::Cpu).is_ok());

        let bad = TrainingBatch::new(Array4::zeros((1, 4, 3, 3)), Array2::zeros((1, 8)), Array1::zeros(1)).unwrap();
        assert!(bad.to_tensors(3, 3, Device::Cpu).is_err());
    }
}
