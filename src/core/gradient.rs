use crate::types::{TerrainError, TerrainResult};
use ndarray::{Array2, ArrayView1, ArrayViewMut1, Axis};
use num_traits::Float;

/// Elevation gradients along both grid axes, in index space
///
/// `row` is the derivative along axis 0 (down the rows), `col` along axis 1.
/// Pixel spacing is not applied: a step of one cell counts as one unit.
#[derive(Debug, Clone)]
pub struct Gradients<T> {
    pub row: Array2<T>,
    pub col: Array2<T>,
}

/// Estimate gradients with second-order centered differences in the interior
/// and first-order one-sided differences on the edges.
///
/// Both axes need at least two samples.
pub fn compute_gradients<T: Float>(elevation: &Array2<T>) -> TerrainResult<Gradients<T>> {
    let (rows, cols) = elevation.dim();
    if rows < 2 || cols < 2 {
        return Err(TerrainError::Computation(format!(
            "Gradient undefined on a {}x{} grid: need at least 2 rows and 2 columns",
            rows, cols
        )));
    }

    let mut row = Array2::<T>::zeros((rows, cols));
    let mut col = Array2::<T>::zeros((rows, cols));

    for (src, dst) in elevation.axis_iter(Axis(1)).zip(row.axis_iter_mut(Axis(1))) {
        difference_1d(src, dst);
    }
    for (src, dst) in elevation.axis_iter(Axis(0)).zip(col.axis_iter_mut(Axis(0))) {
        difference_1d(src, dst);
    }

    Ok(Gradients { row, col })
}

/// Differentiate one lane. Caller guarantees `src.len() >= 2`.
fn difference_1d<T: Float>(src: ArrayView1<T>, mut dst: ArrayViewMut1<T>) {
    let n = src.len();
    let two = T::one() + T::one();

    dst[0] = src[1] - src[0];
    for i in 1..n - 1 {
        dst[i] = (src[i + 1] - src[i - 1]) / two;
    }
    dst[n - 1] = src[n - 1] - src[n - 2];
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_linear_ramp_along_columns() {
        let dem = array![[0.0, 1.0, 2.0], [0.0, 1.0, 2.0], [0.0, 1.0, 2.0]];
        let grads = compute_gradients(&dem).unwrap();

        assert!(grads.row.iter().all(|&v| v == 0.0));
        assert!(grads.col.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_edges_use_one_sided_differences() {
        // Quadratic along rows: 0, 1, 4, 9
        let dem = array![[0.0f64, 0.0], [1.0, 1.0], [4.0, 4.0], [9.0, 9.0]];
        let grads = compute_gradients(&dem).unwrap();

        assert_abs_diff_eq!(grads.row[[0, 0]], 1.0);
        assert_abs_diff_eq!(grads.row[[1, 0]], 2.0);
        assert_abs_diff_eq!(grads.row[[2, 0]], 4.0);
        assert_abs_diff_eq!(grads.row[[3, 0]], 5.0);
        assert!(grads.col.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_two_by_two_is_smallest_valid_grid() {
        let dem = array![[1.0f32, 3.0], [2.0, 6.0]];
        let grads = compute_gradients(&dem).unwrap();

        assert_eq!(grads.row, array![[1.0, 3.0], [1.0, 3.0]]);
        assert_eq!(grads.col, array![[2.0, 2.0], [4.0, 4.0]]);
    }

    #[test]
    fn test_degenerate_grids_are_rejected() {
        let single_row = Array2::<f64>::zeros((1, 5));
        let single_col = Array2::<f64>::zeros((5, 1));
        let empty = Array2::<f64>::zeros((0, 0));

        for dem in [single_row, single_col, empty] {
            assert!(matches!(compute_gradients(&dem), Err(TerrainError::Computation(_))));
        }
    }
}
