use crate::error::LatticeError;
use crate::scalar::Scalar;
use crate::shape::{self, Dims};
use rand::Rng;

/// Dense three dimensional array of a single element type.
///
/// Storage is one contiguous buffer of `size_x * size_y * size_z` elements
/// laid out with z varying fastest:
///
/// ```text
/// flat index = (x * size_y + y) * size_z + z
/// ```
///
/// Flattening a tensor "x-major, then y, then z" is therefore exactly its
/// storage order, and a `1 x 1 x n` tensor stores element `i` at `(0, 0, i)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor3<T> {
    dims: Dims,
    data: Vec<T>,
}

impl<T: Scalar> Default for Tensor3<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> Tensor3<T> {
    /// Empty tensor with dims `(0, 0, 0)`
    #[must_use]
    pub const fn new() -> Self {
        Self { dims: (0, 0, 0), data: Vec::new() }
    }

    /// Zero initialized tensor
    ///
    /// # Errors
    ///
    /// Errors if the number of elements overflows usize.
    pub fn zeros(size_x: usize, size_y: usize, size_z: usize) -> Result<Self, LatticeError> {
        let mut t = Self::new();
        t.reset(size_x, size_y, size_z)?;
        Ok(t)
    }

    /// Tensor from data in storage order
    ///
    /// # Errors
    ///
    /// Errors if `data.len()` is not the product of dims.
    pub fn from_vec(dims: Dims, data: Vec<T>) -> Result<Self, LatticeError> {
        let n = shape::numel(dims)?;
        if data.len() != n {
            return Err(LatticeError::shape_error(format!(
                "dims {dims:?} need {n} elements, got {}",
                data.len()
            )));
        }
        Ok(Self { dims, data })
    }

    /// Discards old storage and allocates new zeroed storage with given dims.
    ///
    /// # Errors
    ///
    /// Errors if the number of elements overflows usize,
    /// in which case the tensor is left untouched.
    pub fn reset(&mut self, size_x: usize, size_y: usize, size_z: usize) -> Result<(), LatticeError> {
        let dims = (size_x, size_y, size_z);
        let n = shape::numel(dims)?;
        self.data = vec![T::zero(); n];
        self.dims = dims;
        Ok(())
    }

    /// Dimensions as `(size_x, size_y, size_z)`
    #[must_use]
    pub const fn dims(&self) -> Dims {
        self.dims
    }

    /// Total number of elements
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Does this tensor hold no elements?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// DType of elements
    #[must_use]
    pub fn dtype(&self) -> crate::dtype::DType {
        T::dtype()
    }

    /// Flat storage index of `(x, y, z)`, without bounds checks
    #[must_use]
    pub const fn linear_index(&self, x: usize, y: usize, z: usize) -> usize {
        (x * self.dims.1 + y) * self.dims.2 + z
    }

    /// Is `(x, y)` inside of the first two dimensions?
    #[must_use]
    pub const fn is_in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.dims.0 && y < self.dims.1
    }

    fn checked_index(&self, x: usize, y: usize, z: usize) -> Result<usize, LatticeError> {
        if x < self.dims.0 && y < self.dims.1 && z < self.dims.2 {
            Ok(self.linear_index(x, y, z))
        } else {
            Err(LatticeError::IndexOutOfBounds { index: (x, y, z), dims: self.dims })
        }
    }

    /// Bounds checked read
    ///
    /// # Errors
    ///
    /// Errors if any coordinate is outside of its dimension.
    pub fn get(&self, x: usize, y: usize, z: usize) -> Result<T, LatticeError> {
        let i = self.checked_index(x, y, z)?;
        Ok(self.data[i])
    }

    /// Bounds checked mutable access
    ///
    /// # Errors
    ///
    /// Errors if any coordinate is outside of its dimension.
    pub fn get_mut(&mut self, x: usize, y: usize, z: usize) -> Result<&mut T, LatticeError> {
        let i = self.checked_index(x, y, z)?;
        Ok(&mut self.data[i])
    }

    /// Bounds checked write
    ///
    /// # Errors
    ///
    /// Errors if any coordinate is outside of its dimension.
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: T) -> Result<(), LatticeError> {
        *self.get_mut(x, y, z)? = value;
        Ok(())
    }

    /// Bounds checked read of the tensor as a flat sequence
    ///
    /// # Errors
    ///
    /// Errors if `index >= self.size()`.
    pub fn get_flat(&self, index: usize) -> Result<T, LatticeError> {
        self.data
            .get(index)
            .copied()
            .ok_or(LatticeError::FlatIndexOutOfBounds { index, len: self.data.len() })
    }

    /// Fast read for hot loops.
    ///
    /// Per axis bounds are only checked with debug assertions,
    /// an index past the end of storage still panics.
    #[must_use]
    pub fn at(&self, x: usize, y: usize, z: usize) -> T {
        debug_assert!(x < self.dims.0 && y < self.dims.1 && z < self.dims.2);
        self.data[self.linear_index(x, y, z)]
    }

    /// Fast mutable access for hot loops, see [`Tensor3::at`].
    pub fn at_mut(&mut self, x: usize, y: usize, z: usize) -> &mut T {
        debug_assert!(x < self.dims.0 && y < self.dims.1 && z < self.dims.2);
        let i = self.linear_index(x, y, z);
        &mut self.data[i]
    }

    /// Elements in storage order
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable elements in storage order
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Iterate over elements in storage order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    /// Set every element to value
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Set every element to zero, keeping dims
    pub fn zero(&mut self) {
        self.fill(T::zero());
    }

    /// Overwrite contents with values of other tensor of the same dims.
    ///
    /// # Errors
    ///
    /// Errors if dims differ.
    pub fn copy_from(&mut self, other: &Tensor3<T>) -> Result<(), LatticeError> {
        if self.dims != other.dims {
            return Err(LatticeError::shape_error(format!(
                "cannot copy tensor with dims {:?} into tensor with dims {:?}",
                other.dims, self.dims
            )));
        }
        self.data.copy_from_slice(&other.data);
        Ok(())
    }

    /// Fill with values drawn uniformly from `[low, high)`.
    pub fn fill_uniform<R: Rng + ?Sized>(&mut self, low: f64, high: f64, rng: &mut R) {
        for x in &mut self.data {
            *x = T::from_f64(rng.gen_range(low..high));
        }
    }
}

impl<T> core::ops::Index<usize> for Tensor3<T> {
    type Output = T;
    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}

impl<T> core::ops::IndexMut<usize> for Tensor3<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl<T: Scalar> core::fmt::Display for Tensor3<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let precision = f.precision().unwrap_or(3);
        let (sx, sy, sz) = self.dims;
        writeln!(f, "Tensor3<{}>({sx}, {sy}, {sz})", T::dtype())?;
        // One block per depth slice, one line per y row.
        for z in 0..sz {
            writeln!(f, "z = {z}")?;
            for y in 0..sy {
                for x in 0..sx {
                    if x > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{:.precision$}", self.at(x, y, z))?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
