
use tch::Device;

use utils::{Serialize, Deserialize};

///
/// A configuration for the policy-value network.
///
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config 
{
    #[serde(default = "model_file")]
    pub model_file: String,

    #[serde(default = "board_width")]
    pub board_width: i64,

    #[serde(default = "board_height")]
    pub board_height: i64,

    #[serde(default = "l2_const")]
    pub l2_const: f64,

    #[serde(default = "learning_rate")]
    pub learning_rate: f64,

    #[serde(default = "cuda")]
    pub cuda: bool
}

impl Default for Config 
{
    fn default () -> Config 
    {
        Config 
        {
            model_file: model_file(),
            board_width: board_width(),
            board_height: board_height(),
            l2_const: l2_const(),
            learning_rate: learning_rate(),
            cuda: cuda()
        }
    }
}

impl Config 
{
    ///
    /// Returns the device the network lives on.
    ///
    pub fn device (& self) -> Device 
    {
        match self.cuda 
        {
            true  => Device::cuda_if_available(),
            false => Device::Cpu
        }
    }

    ///
    /// Returns the number of cells on the board, which is also the policy width.
    ///
    pub fn cells (& self) -> i64 
    {
        self.board_width * self.board_height
    }
}

fn model_file () -> String 
{
    "./model/tf_policy_8_8_5_model".to_owned()
}

fn board_width () -> i64 
{
    8
}

fn board_height () -> i64 
{
    8
}

fn l2_const () -> f64 
{
    1e-4
}

fn learning_rate () -> f64 
{
    1e-3
}

fn cuda () -> bool 
{
    true
}
