use hillside::core::{compute_gradients, TerrainDerivativeEngine};
use hillside::types::{ElevationGrid, GeoTransform, TerrainError};
use hillside::compute_derivatives;
use ndarray::{array, Array2};

fn grid(data: Array2<f64>) -> ElevationGrid {
    ElevationGrid::new(data, GeoTransform::from_origin(0.0, 0.0, 30.0, 30.0), "", None)
}

/// Deterministic rough terrain (LCG noise on top of a ridge)
fn rough_terrain(rows: usize, cols: usize, seed: u64) -> Array2<f64> {
    let mut state = seed;
    Array2::from_shape_fn((rows, cols), |(i, j)| {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let noise = (state >> 33) as f64 / (1u64 << 31) as f64;
        let ridge = 50.0 * ((i as f64) * 0.3).sin() * ((j as f64) * 0.2).cos();
        ridge + 20.0 * noise
    })
}

#[test]
fn test_output_dims_match_input() {
    for &(rows, cols) in &[(2, 2), (2, 9), (7, 3), (31, 17)] {
        let result = compute_derivatives(&grid(rough_terrain(rows, cols, 7))).unwrap();
        assert_eq!(result.slope().dim(), (rows, cols));
        assert_eq!(result.aspect().dim(), (rows, cols));
        assert_eq!(result.hillshade().dim(), (rows, cols));
    }
}

#[test]
fn test_degenerate_grids_fail() {
    for &(rows, cols) in &[(1, 1), (1, 10), (10, 1), (0, 5)] {
        let result = compute_derivatives(&grid(Array2::zeros((rows, cols))));
        assert!(
            matches!(result, Err(TerrainError::Computation(_))),
            "{}x{} grid should be rejected",
            rows,
            cols
        );
    }
}

#[test]
fn test_flat_grid_has_zero_slope_and_constant_shade() {
    let flat = Array2::from_elem((6, 6), 431.0);
    let gradients = compute_gradients(&flat).unwrap();
    assert!(gradients.row.iter().all(|&v| v == 0.0));
    assert!(gradients.col.iter().all(|&v| v == 0.0));

    let result = compute_derivatives(&grid(flat)).unwrap();
    let expected = (255.0 * (45f64.to_radians().sin() + 1.0) / 2.0).round() as u8;

    assert!(result.slope().iter().all(|&s| s == 0.0));
    assert!(result.hillshade().iter().all(|&h| h == expected));
}

#[test]
fn test_value_ranges_on_rough_terrain() {
    for seed in 1..5 {
        let result = compute_derivatives(&grid(rough_terrain(40, 25, seed))).unwrap();

        for &a in result.aspect().iter() {
            assert!((0.0..360.0).contains(&a), "aspect {} out of range", a);
        }
        for &s in result.slope().iter() {
            assert!((0.0..=90.0).contains(&s), "slope {} out of range", s);
        }
    }
}

#[test]
fn test_three_by_three_column_ramp() {
    let dem = array![[0.0, 1.0, 2.0], [0.0, 1.0, 2.0], [0.0, 1.0, 2.0]];

    let gradients = compute_gradients(&dem).unwrap();
    assert_eq!(gradients.row, Array2::<f64>::zeros((3, 3)));
    assert_eq!(gradients.col, Array2::<f64>::ones((3, 3)));

    let result = compute_derivatives(&grid(dem)).unwrap();
    let slope = result.slope()[[0, 0]];
    let aspect = result.aspect()[[0, 0]];
    assert!(result.slope().iter().all(|&s| s == slope));
    assert!(result.aspect().iter().all(|&a| a == aspect));
}

#[test]
fn test_nodata_is_not_masked() {
    let mut dem = Array2::from_elem((5, 5), 100.0);
    dem[[2, 2]] = -9999.0;
    let with_sentinel = ElevationGrid::new(dem, GeoTransform::default(), "", Some(-9999.0));

    let result = TerrainDerivativeEngine::standard()
        .compute_derivatives(&with_sentinel)
        .unwrap();

    // The sentinel drags its neighbours' slopes up
    assert!(result.slope()[[1, 2]] > 80.0);
    assert!(result.slope()[[2, 1]] > 80.0);
    assert_eq!(result.slope()[[0, 0]], 0.0);
}
