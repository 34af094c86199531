
use ndarray::Array3;

///
/// The view of a game position the network needs. Implemented by the 
/// game crate; the network only ever reads through it.
///
/// Moves are flattened board coordinates in `0 .. width * height`, and 
/// `current_state` is a `[4, width, height]` stack of feature planes 
/// describing the position from the perspective of the player to move.
///
pub trait Board 
{
    ///
    /// The legal moves in this position.
    ///
    fn availables (& self) -> & [usize];

    ///
    /// The feature planes of this position.
    ///
    fn current_state (& self) -> Array3<f32>;
}
