
use tch::{Kind, Reduction, Tensor};

///
/// The three terms of the training objective:
///
///   loss = (z - v)^2 + -pi^T log(p) + c ||theta||^2
///
/// `value` and `policy` are batch means; `l2` is already scaled by c.
///
pub struct Loss 
{
    pub total: Tensor,
    pub value: Tensor,
    pub policy: Tensor,
    pub l2: Tensor
}

impl Loss 
{
    ///
    /// Builds the objective for one batch. `logits` is [N, cells], `value` is 
    /// [N, 1], `mcts_probs` is [N, cells] and `winners` is [N]. Parameters whose 
    /// name contains "bias" are left out of the penalty.
    ///
    pub fn compute<'a, I> (logits: & Tensor, value: & Tensor, mcts_probs: & Tensor, winners: & Tensor, params: I, l2_const: f64) -> Loss 
        where I: IntoIterator<Item = (&'a String, &'a Tensor)>
    {
        let value_loss = value.view(-1).mse_loss(winners, Reduction::Mean);
        let policy_loss = cross_entropy(logits, mcts_probs);
        let l2 = l2_penalty(params) * l2_const;

        let total = & value_loss + & policy_loss + & l2;
        Loss { total, value: value_loss, policy: policy_loss, l2 }
    }
}

///
/// The batch mean of -sum(pi * log_softmax(logits)).
///
pub fn cross_entropy (logits: & Tensor, targets: & Tensor) -> Tensor 
{
    let batch = logits.size()[0] as f64;
    let log_probs = logits.log_softmax(-1, Kind::Float);
    -(targets * log_probs).sum(Kind::Float) / batch
}

///
/// Half the sum of squares over every non-bias parameter.
///
pub fn l2_penalty<'a, I> (params: I) -> Tensor 
    where I: IntoIterator<Item = (&'a String, &'a Tensor)>
{
    let squares : Vec<Tensor> = params
        .into_iter()
        .filter(|(name, _)| !name.to_lowercase().contains("bias"))
        .map(|(_, w)| w.square().sum(Kind::Float))
        .collect();

    Tensor::stack(& squares, 0).sum(Kind::Float) / 2.0
}

#[cfg(test)]
mod tests 
{
    use super::*;

    use std::collections::BTreeMap;

    fn close (t: & Tensor, expected: f64) -> bool 
    {
        (t.double_value(& []) - expected).abs() < 1e-5
    }

    #[test]
    fn penalty_skips_biases () 
    {
        let mut params = BTreeMap::new();
        params.insert("conv1.weight".to_owned(), Tensor::from_slice(& [1.0f32, 2.0]));
        params.insert("conv1.bias".to_owned(), Tensor::from_slice(& [100.0f32]));
        params.insert("value_fc2.Bias".to_owned(), Tensor::from_slice(& [100.0f32]));
        params.insert("policy_fc.weight".to_owned(), Tensor::from_slice(& [3.0f32]));

        assert!(close(& l2_penalty(& params), (1.0 + 4.0 + 9.0) / 2.0));
    }

    #[test]
    fn cross_entropy_matches_hand_computation () 
    {
        let logits = Tensor::from_slice(& [0.0f32, 0.0, 0.0, 0.0, 2.0f32.ln(), 0.0]).view([2, 3]);
        let targets = Tensor::from_slice(& [1.0f32, 0.0, 0.0, 0.0, 0.5, 0.5]).view([2, 3]);

        // Row 0: uniform over 3, target on one cell -> ln 3.
        // Row 1: p = [1/4, 1/2, 1/4] -> -(0.5 ln 0.5 + 0.5 ln 0.25).
        let row0 = 3.0f64.ln();
        let row1 = -(0.5 * 0.5f64.ln() + 0.5 * 0.25f64.ln());

        assert!(close(& cross_entropy(& logits, & targets), (row0 + row1) / 2.0));
    }

    #[test]
    fn total_is_sum_of_terms () 
    {
        let logits = Tensor::zeros([2, 4], (Kind::Float, tch::Device::Cpu));
        let targets = Tensor::full([2, 4], 0.25, (Kind::Float, tch::Device::Cpu));
        let value = Tensor::from_slice(& [0.5f32, -0.5]).view([2, 1]);
        let winners = Tensor::from_slice(& [1.0f32, 1.0]);

        let mut params = BTreeMap::new();
        params.insert("w.weight".to_owned(), Tensor::from_slice(& [10.0f32]));

        let loss = Loss::compute(& logits, & value, & targets, & winners, & params, 1e-2);

        assert!(close(& loss.value, (0.25 + 2.25) / 2.0));
        assert!(close(& loss.policy, 4.0f64.ln()));
        assert!(close(& loss.l2, 0.5));
        assert!(close(& loss.total, 1.25 + 4.0f64.ln() + 0.5));
    }
}
