use rustdct::DctPlanner;
use transpose::transpose_inplace;

/// Two dimensional DCT-II of a square image, given as a row-major buffer of `dimension * dimension`
/// values. The output is also row-major, with the lowest frequencies in the top left corner.
pub fn perform_dct(mut pixels: Vec<f64>, dimension: usize) -> Vec<f64> {
    assert_eq!(
        pixels.len(),
        dimension * dimension,
        "dct input is not square: {} values for dimension {}",
        pixels.len(),
        dimension
    );

    let mut planner = DctPlanner::new();
    let dct = planner.plan_dct2(dimension);

    //rows
    pixels.chunks_exact_mut(dimension).for_each(|row| {
        dct.process_dct2(row);
    });

    //cols, by way of a transpose.
    let mut scratch = vec![0f64; dimension];
    transpose_inplace(&mut pixels, &mut scratch, dimension, dimension);
    pixels.chunks_exact_mut(dimension).for_each(|col| {
        dct.process_dct2(col);
    });
    transpose_inplace(&mut pixels, &mut scratch, dimension, dimension);

    pixels
}

/// Copy the `window` x `window` block from the top left corner of a square row-major buffer.
pub fn low_frequency_window(coeffs: &[f64], dimension: usize, window: usize) -> Vec<f64> {
    coeffs
        .chunks_exact(dimension)
        .take(window)
        .flat_map(|row| row[..window].iter().copied())
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_black_image_has_no_energy() {
        let coeffs = perform_dct(vec![0.0; 16 * 16], 16);
        assert!(coeffs.iter().all(|c| *c == 0.0));
    }

    #[test]
    fn test_flat_image_only_has_dc_component() {
        let coeffs = perform_dct(vec![100.0; 8 * 8], 8);
        assert!(coeffs[0] > 0.0);
        for c in &coeffs[1..] {
            assert!(c.abs() < 1e-6, "unexpected ac coefficient {c}");
        }
    }

    #[test]
    fn test_window_is_top_left() {
        let coeffs = (0..16).map(f64::from).collect::<Vec<_>>();
        assert_eq!(low_frequency_window(&coeffs, 4, 2), vec![0.0, 1.0, 4.0, 5.0]);
    }
}
