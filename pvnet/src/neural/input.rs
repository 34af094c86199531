
use ndarray::{Array1, Array2, ArrayView, ArrayView3, ArrayView4, Axis, Dimension};

use tch::{Device, Tensor};

use utils::error::*;

use super::error::NetworkError;

///
/// The number of feature planes in a board image.
///
pub const PLANES : usize = 4;

///
/// Represents a batch of board images converted to a network input of 
/// shape [batch, 4, width, height], living on the network's device.
///
pub struct Input (pub Tensor);

impl Input 
{
    ///
    /// Converts a batch of board images, validating the plane and board dimensions.
    ///
    pub fn from_batch (states: ArrayView4<f32>, width: i64, height: i64, device: Device) -> Result<Input>
    {
        let expected = [states.shape()[0], PLANES, width as usize, height as usize];
        check_shape("state batch", states.shape(), & expected)?;

        Ok(Input(to_tensor(states, device)?))
    }

    ///
    /// Converts a single board image into a batch of one.
    ///
    pub fn from_state (state: ArrayView3<f32>, width: i64, height: i64, device: Device) -> Result<Input>
    {
        let expected = [PLANES, width as usize, height as usize];
        check_shape("board state", state.shape(), & expected)?;

        let batch = state.insert_axis(Axis(0));
        Ok(Input(to_tensor(batch, device)?))
    }
}

///
/// Fails with a `ShapeMismatch` unless the shapes agree.
///
pub fn check_shape (what: &'static str, actual: & [usize], expected: & [usize]) -> Result<()>
{
    if actual != expected 
    {
        return Err(NetworkError::ShapeMismatch { what, expected: expected.to_vec(), actual: actual.to_vec() }.into());
    }
    Ok(())
}

///
/// Copies an array of any dimension into a tensor of the same shape.
///
pub fn to_tensor<D: Dimension> (array: ArrayView<f32, D>, device: Device) -> Result<Tensor>
{
    let shape : Vec<i64> = array.shape().iter().map(|& d| d as i64).collect();
    let contiguous = array.as_standard_layout();
    let data = contiguous.as_slice().ok_or_else(|| error!("Array is not contiguous after relayout."))?;

    Ok(Tensor::from_slice(data).view(shape.as_slice()).to_device(device))
}

///
/// Copies a [rows, cols] tensor back into host memory.
///
pub fn to_array2 (tensor: & Tensor) -> Result<Array2<f32>>
{
    let size = tensor.size();
    ensure!(size.len() == 2, "Expected a rank-2 tensor, found shape {:?}.", size);

    let data = host_values(tensor)?;
    let array = Array2::from_shape_vec((size[0] as usize, size[1] as usize), data)?;
    Ok(array)
}

///
/// Copies a tensor back into host memory as a flat vector, whatever its rank.
///
pub fn to_array1 (tensor: & Tensor) -> Result<Array1<f32>>
{
    Ok(Array1::from(host_values(tensor)?))
}

fn host_values (tensor: & Tensor) -> Result<Vec<f32>>
{
    let flat = tensor.to_device(Device::Cpu).contiguous().view(-1);
    let data = Vec::<f32>::try_from(& flat).context("Failed to copy tensor data to the host.")?;
    Ok(data)
}
