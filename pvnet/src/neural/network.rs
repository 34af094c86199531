
use std::collections::BTreeMap;
use std::path::Path;

use crate::board::Board;
use crate::config::*;

use ndarray::{Array1, Array2, ArrayView4};

use tch::{Device, Tensor};
use tch::nn::{Adam, Optimizer, OptimizerConfig, VarStore};

use utils::error::*;
use utils::log;

use super::checkpoint::*;
use super::error::NetworkError;
use super::input::*;
use super::loss::Loss;
use super::memory::*;
use super::net::Net;

///
/// Detached host copies of every trainable tensor, keyed by var store path.
///
pub type ModelParams = BTreeMap<String, Tensor>;

///
/// The monitoring values of a training step. `entropy` is the policy 
/// cross-entropy against the MCTS targets, not the entropy of the policy 
/// itself; the name is what training logs have always reported.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepReport 
{
    pub loss: f64,
    pub entropy: f64
}

impl From<& Loss> for StepReport 
{
    fn from (loss: & Loss) -> StepReport 
    {
        StepReport { loss: loss.total.double_value(& []), entropy: loss.policy.double_value(& []) }
    }
}

///
/// A network that functions simultaneously as a policy and value head.
///
/// The input shape is a [N, 4, width, height] stack of board images.
///
/// The policy output is a [N, width * height] probability vector over 
/// every cell. Occupied cells are not pre-masked in the raw output; 
/// `policy_value_fn` restricts it to the legal moves of a board.
///
/// The value output is a [N, 1] value ranging from -1.0 to 1.0, the 
/// network's prediction of the result for the player to move.
///
pub struct PolicyValueNet 
{
    config: NeuralConfig,
    vs: VarStore,
    net: Net,
    optimizer: Optimizer
}

impl PolicyValueNet 
{
    ///
    /// Builds the network and restores it from the configured model file if 
    /// a checkpoint exists there; otherwise the fresh random initialization 
    /// is kept. If `net_params` names another checkpoint, it is loaded 
    /// afterwards and takes precedence.
    ///
    pub fn new (config: & NeuralConfig, net_params: Option<& Path>) -> Result<PolicyValueNet>
    {
        let (width, height) = (config.board_width, config.board_height);
        if width <= 0 || height <= 0 
        {
            return Err(NetworkError::InvalidBoardSize { width, height }.into());
        }

        let vs = VarStore::new(config.device());
        let net = Net::new(& vs.root(), width, height);
        let optimizer = Adam::default().build(& vs, config.learning_rate).context("Failed to build the optimizer.")?;

        let mut network = PolicyValueNet { config: config.clone(), vs, net, optimizer };
        network.restore_model()?;

        if let Some(path) = net_params 
        {
            network.load_model(path)?;
        }

        Ok(network)
    }

    pub fn board_width (& self) -> i64 
    {
        self.config.board_width
    }

    pub fn board_height (& self) -> i64 
    {
        self.config.board_height
    }

    pub fn device (& self) -> Device 
    {
        self.vs.device()
    }

    ///
    /// For a batch of board images, returns the move probabilities and values.
    /// No gradients are tracked.
    ///
    pub fn forward (& self, states: & Tensor) -> (Tensor, Tensor)
    {
        tch::no_grad(|| self.net.probabilities(& states.to_device(self.device())))
    }

    ///
    /// The host-memory version of `forward`, with the batch shape checked 
    /// against the board. Returns [N, cells] probabilities and N values.
    ///
    pub fn policy_value (& self, states: ArrayView4<f32>) -> Result<(Array2<f32>, Array1<f32>)>
    {
        let Input(input) = Input::from_batch(states, self.board_width(), self.board_height(), self.device())?;
        let (probs, value) = self.forward(& input);

        Ok((to_array2(& probs)?, to_array1(& value)?))
    }

    ///
    /// Evaluates a single board. Returns (move, probability) pairs for the 
    /// board's legal moves, in the order the board lists them, together with 
    /// the value of the position.
    ///
    pub fn policy_value_fn<B: Board + ?Sized> (& self, board: & B) -> Result<(Vec<(usize, f32)>, f32)>
    {
        let legal = board.availables();
        let cells = self.config.cells() as usize;

        if let Some(& index) = legal.iter().find(|& & m| m >= cells)
        {
            return Err(NetworkError::IllegalMove { index, cells }.into());
        }

        let state = board.current_state();
        let Input(input) = Input::from_state(state.view(), self.board_width(), self.board_height(), self.device())?;
        let (probs, value) = self.forward(& input);

        let probs = to_array1(& probs)?;
        let act_probs = legal.iter().map(|& m| (m, probs[m])).collect();
        let value = to_array1(& value)?[0];

        Ok((act_probs, value))
    }

    ///
    /// Performs one optimizer update on the batch. With `show_loss`, also 
    /// returns the loss and policy cross-entropy measured before the update.
    ///
    pub fn train_step (& mut self, batch: & TrainingBatch, show_loss: bool) -> Result<Option<StepReport>>
    {
        let tensors = batch.to_tensors(self.board_width(), self.board_height(), self.device())?;
        let loss = self.loss(& tensors);

        self.optimizer.backward_step(& loss.total);

        if !show_loss 
        {
            return Ok(None);
        }

        let report = StepReport::from(& loss);
        log::debug!("Train step on {} samples: loss {:.4}, entropy {:.4}.", batch.len(), report.loss, report.entropy);
        Ok(Some(report))
    }

    ///
    /// Measures the objective on a batch without updating anything.
    ///
    pub fn evaluate (& self, batch: & TrainingBatch) -> Result<StepReport>
    {
        let tensors = batch.to_tensors(self.board_width(), self.board_height(), self.device())?;
        let loss = tch::no_grad(|| self.loss(& tensors));
        Ok(StepReport::from(& loss))
    }

    pub fn set_learning_rate (& mut self, learning_rate: f64)
    {
        self.optimizer.set_lr(learning_rate);
    }

    fn loss (& self, tensors: & BatchTensors) -> Loss 
    {
        let (logits, value) = self.net.forward(& tensors.states);
        let params = self.vs.variables();

        Loss::compute(& logits, & value, & tensors.mcts_probs, & tensors.winners, & params, self.config.l2_const)
    }

    ///
    /// Restores from the configured model file if a checkpoint is present 
    /// there. Returns whether one was.
    ///
    pub fn restore_model (& mut self) -> Result<bool>
    {
        let checkpoint = Checkpoint::new(& self.config.model_file);
        if !checkpoint.exists() 
        {
            log::info!("No checkpoint at '{}'; using freshly initialized parameters.", & self.config.model_file);
            return Ok(false);
        }

        let expected = self.metadata();
        checkpoint.restore(& mut self.vs, & expected)?;
        Ok(true)
    }

    ///
    /// Loads the checkpoint with the given base path, which must exist.
    ///
    pub fn load_model (& mut self, path: & Path) -> Result<()>
    {
        let expected = self.metadata();
        Checkpoint::new(path).restore(& mut self.vs, & expected)
    }

    ///
    /// Saves this model's parameters as a checkpoint with the given base path.
    ///
    pub fn save_model (& self, path: & Path) -> Result<()>
    {
        Checkpoint::new(path).save(& self.vs, & self.metadata())
    }

    ///
    /// Returns a copy of every trainable tensor, keyed by name.
    ///
    pub fn get_model_params (& self) -> ModelParams 
    {
        tch::no_grad(|| 
        {
            self.vs.variables()
                .into_iter()
                .filter(|(_, t)| t.requires_grad())
                .map(|(name, t)| (name, t.detach().to_device(Device::Cpu).copy()))
                .collect()
        })
    }

    ///
    /// Overwrites every trainable tensor from a mapping produced by 
    /// `get_model_params`. Nothing is written unless the names and shapes 
    /// all match.
    ///
    pub fn set_model_params (& mut self, params: & ModelParams) -> Result<()>
    {
        let mut vars : BTreeMap<String, Tensor> = self.vs.variables()
            .into_iter()
            .filter(|(_, t)| t.requires_grad())
            .collect();

        if let Some(extra) = params.keys().find(|name| !vars.contains_key(* name))
        {
            return Err(NetworkError::ParameterMismatch(format!("unexpected parameter '{}'", extra)).into());
        }

        for (name, var) in & vars 
        {
            let source = params.get(name).ok_or_else(|| NetworkError::ParameterMismatch(format!("parameter '{}' is missing", name)))?;
            if source.size() != var.size() 
            {
                let reason = format!("parameter '{}' has shape {:?}, expected {:?}", name, source.size(), var.size());
                return Err(NetworkError::ParameterMismatch(reason).into());
            }
        }

        tch::no_grad(|| 
        {
            for (name, var) in vars.iter_mut() 
            {
                var.copy_(& params[name].to_device(var.device()));
            }
        });

        Ok(())
    }

    fn metadata (& self) -> Metadata 
    {
        Metadata::describe(& self.vs, self.board_width(), self.board_height())
    }
}
