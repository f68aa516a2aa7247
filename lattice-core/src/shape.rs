use crate::error::LatticeError;

/// Dimensions of a [`Tensor3`](crate::tensor::Tensor3) as `(size_x, size_y, size_z)`
pub type Dims = (usize, usize, usize);

/// Get number of elements in tensor with these dims
/// (a product of it's dimensions).
///
/// # Errors
///
/// Errors if the product does not fit into usize.
pub fn numel(dims: Dims) -> Result<usize, LatticeError> {
    let (x, y, z) = dims;
    x.checked_mul(y)
        .and_then(|xy| xy.checked_mul(z))
        .ok_or_else(|| LatticeError::shape_error(format!("dims {dims:?} overflow usize")))
}

/// Number of filter positions along one spatial axis of a sliding window.
///
/// Computes `(input + 2 * pad - filter) / stride + 1` with floor division.
/// When `stride` does not divide the span evenly the trailing input
/// rows or columns are silently dropped, the result is never rounded up.
///
/// # Errors
///
/// Errors if stride is zero, if filter is zero or larger than the padded
/// input, or if the arithmetic overflows.
pub fn window_count(input: usize, filter: usize, stride: usize, pad: usize) -> Result<usize, LatticeError> {
    if stride == 0 {
        return Err(LatticeError::config_error("stride must be at least 1"));
    }
    if filter == 0 {
        return Err(LatticeError::config_error("filter size must be at least 1"));
    }
    let padded = pad
        .checked_mul(2)
        .and_then(|p| p.checked_add(input))
        .ok_or_else(|| LatticeError::shape_error(format!("padded extent {input} + 2 * {pad} overflows usize")))?;
    if filter > padded {
        return Err(LatticeError::config_error(format!(
            "filter size {filter} exceeds padded input extent {padded}"
        )));
    }
    Ok((padded - filter) / stride + 1)
}
