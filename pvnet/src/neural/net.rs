
use tch::nn;
use tch::{Kind, Tensor};

///
/// The layers of the policy-value network.
///
/// A shared trunk of three 3x3 convolutions (32, 64 and 128 filters, 
/// "same" padding, ReLU) feeds two heads. The policy head narrows to 4 
/// filters, flattens and projects to one logit per board cell. The value 
/// head narrows to 2 filters, flattens, and passes through a 64-unit 
/// hidden layer to a single tanh unit.
///
#[derive(Debug)]
pub struct Net 
{
    conv1: nn::Conv2D,
    conv2: nn::Conv2D,
    conv3: nn::Conv2D,

    policy_conv: nn::Conv2D,
    policy_fc: nn::Linear,

    value_conv: nn::Conv2D,
    value_fc1: nn::Linear,
    value_fc2: nn::Linear,

    width: i64,
    height: i64
}

impl Net 
{
    ///
    /// Registers every layer under the given var store path.
    ///
    pub fn new (vs: & nn::Path, width: i64, height: i64) -> Net 
    {
        let same = nn::ConvConfig { padding: 1, ..Default::default() };
        let pointwise = nn::ConvConfig { padding: 0, ..Default::default() };
        let cells = width * height;

        Net 
        {
            conv1: nn::conv2d(vs / "conv1", 4, 32, 3, same),
            conv2: nn::conv2d(vs / "conv2", 32, 64, 3, same),
            conv3: nn::conv2d(vs / "conv3", 64, 128, 3, same),

            policy_conv: nn::conv2d(vs / "policy_conv", 128, 4, 1, pointwise),
            policy_fc: nn::linear(vs / "policy_fc", 4 * cells, cells, Default::default()),

            value_conv: nn::conv2d(vs / "value_conv", 128, 2, 1, pointwise),
            value_fc1: nn::linear(vs / "value_fc1", 2 * cells, 64, Default::default()),
            value_fc2: nn::linear(vs / "value_fc2", 64, 1, Default::default()),

            width,
            height
        }
    }

    ///
    /// Returns the policy logits [N, width * height] and the value [N, 1].
    ///
    pub fn forward (& self, xs: & Tensor) -> (Tensor, Tensor)
    {
        let trunk = xs
            .view([-1, 4, self.width, self.height])
            .apply(& self.conv1).relu()
            .apply(& self.conv2).relu()
            .apply(& self.conv3).relu();

        let logits = trunk
            .apply(& self.policy_conv).relu()
            .flat_view()
            .apply(& self.policy_fc);

        let value = trunk
            .apply(& self.value_conv).relu()
            .flat_view()
            .apply(& self.value_fc1).relu()
            .apply(& self.value_fc2).tanh();

        (logits, value)
    }

    ///
    /// Runs the network and normalizes the logits into move probabilities.
    ///
    pub fn probabilities (& self, xs: & Tensor) -> (Tensor, Tensor)
    {
        let (logits, value) = self.forward(xs);
        (logits.softmax(-1, Kind::Float), value)
    }
}

#[cfg(test)]
mod tests 
{
    use super::*;

    use tch::Device;

    fn build (width: i64, height: i64) -> (nn::VarStore, Net)
    {
        tch::manual_seed(7);
        let vs = nn::VarStore::new(Device::Cpu);
        let net = Net::new(& vs.root(), width, height);
        (vs, net)
    }

    #[test]
    fn heads_have_board_shaped_outputs () 
    {
        let (_vs, net) = build(6, 5);
        let xs = Tensor::rand([3, 4, 6, 5], (Kind::Float, Device::Cpu));

        let (logits, value) = net.forward(& xs);
        assert_eq!(logits.size(), vec![3, 30]);
        assert_eq!(value.size(), vec![3, 1]);
    }

    #[test]
    fn probabilities_are_normalized () 
    {
        let (_vs, net) = build(5, 5);
        let xs = Tensor::rand([4, 4, 5, 5], (Kind::Float, Device::Cpu)) * 3.0;

        let (probs, value) = tch::no_grad(|| net.probabilities(& xs));
        let sums = probs.sum_dim_intlist([-1i64].as_slice(), false, Kind::Float);

        for i in 0 .. 4 
        {
            assert!((sums.double_value(& [i]) - 1.0).abs() < 1e-5);
            let v = value.double_value(& [i, 0]);
            assert!(v >= -1.0 && v <= 1.0, "value {} out of range", v);
        }
        assert!(probs.min().double_value(& []) >= 0.0);
    }

    #[test]
    fn flat_inputs_are_reshaped () 
    {
        let (_vs, net) = build(4, 4);
        let xs = Tensor::rand([2, 4, 4, 4], (Kind::Float, Device::Cpu));

        let (a, _) = tch::no_grad(|| net.forward(& xs));
        let (b, _) = tch::no_grad(|| net.forward(& xs.view([2, -1])));
        assert!(a.equal(& b));
    }

    #[test]
    fn registers_weights_and_biases_per_layer () 
    {
        let (vs, _net) = build(3, 3);
        let mut names : Vec<String> = vs.variables().into_keys().collect();
        names.sort();

        assert_eq!(names.len(), 16);
        assert_eq!(names[0], "conv1.bias");
        assert_eq!(vs.variables()["policy_fc.weight"].size(), vec![9, 36]);
        assert_eq!(vs.variables()["value_fc1.weight"].size(), vec![64, 18]);
    }
}
