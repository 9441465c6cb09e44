//! Element type conversions between float matrices.

use super::{MajorOrder, Matrix};
use crate::error::Result;
use crate::scalar::Scalar;

/// Largest magnitude below which every integer is exactly representable in `f32`.
const F32_EXACT_LIMIT: f64 = 16_777_216.0;

impl<T: Scalar> Matrix<T> {
    /// Builds a new matrix of the same extents and backend with elements
    /// `f(x)`, laid out in `order`.
    fn convert_into<U, F>(&self, order: MajorOrder, f: F) -> Result<Matrix<U>>
    where
        U: Scalar,
        F: Fn(T) -> U,
    {
        let values: Vec<U> = self.to_vec().into_iter().map(f).collect();
        let mut staged = Matrix::from_vec(&self.dims, self.order, values)?;
        staged.set_backend(self.backend);
        if order == self.order {
            return Ok(staged);
        }
        let mut out = Matrix::with_options(&self.dims, order, self.backend)?;
        out.copy(&staged.reordered(order))?;
        Ok(out)
    }
}

impl Matrix<f64> {
    /// Converts to single precision in the requested major order.
    ///
    /// Magnitudes at or above 2^24 may lose integer precision; a warning is
    /// logged once per conversion when any are present.
    ///
    /// # Errors
    ///
    /// [`crate::Error::AllocationFailed`] if the result cannot be allocated.
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_f32(&self, order: MajorOrder) -> Result<Matrix<f32>> {
        let lossy = self.to_vec().iter().filter(|x| x.abs() >= F32_EXACT_LIMIT).count();
        if lossy > 0 {
            tracing::warn!(lossy, size = self.size(), "f64 -> f32 conversion may lose precision");
        }
        self.convert_into(order, |x| x as f32)
    }
}

impl Matrix<f32> {
    /// Converts to double precision, keeping the major order. Exact.
    ///
    /// # Errors
    ///
    /// [`crate::Error::AllocationFailed`] if the result cannot be allocated.
    pub fn to_f64(&self) -> Result<Matrix<f64>> {
        self.convert_into(self.order, f64::from)
    }
}

#[cfg(test)]
mod tests {
    use crate::{MajorOrder, Matrix};

    #[test]
    fn to_f32_changes_order_but_keeps_positions() {
        let m = Matrix::from_vec(&[2, 3], MajorOrder::RowMajor, vec![1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let f = m.to_f32(MajorOrder::ColMajor).unwrap();
        assert_eq!(f.major_order(), MajorOrder::ColMajor);
        assert_eq!(f.dims(), &[2, 3]);
        assert_eq!(f.get(&[1, 2]).unwrap(), 6.0);
        assert_eq!(f.to_vec(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn to_f64_is_exact() {
        let m = Matrix::from_vec(&[3], MajorOrder::ColMajor, vec![0.1f32, -2.5, 1e30]).unwrap();
        let d = m.to_f64().unwrap();
        assert_eq!(d.to_vec(), vec![f64::from(0.1f32), -2.5, f64::from(1e30f32)]);
        assert_eq!(d.major_order(), MajorOrder::ColMajor);
    }
}
