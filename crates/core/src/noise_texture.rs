//! White-noise input textures.

use crate::error::LicError;
use crate::grid::Grid;
use crate::precision::Real;
use crate::prng::Xorshift64;
use rayon::prelude::*;

/// Fills a `rows x cols` grid with uniform noise in `[0, 1]`.
///
/// Each row draws from its own derived stream, so rows can be generated in
/// parallel and the texture depends only on `(rows, cols, seed)`. Values are
/// drawn in `[0, 1)` and may round up to exactly 1 when narrowed to `f32`.
pub fn noise_texture<T: Real>(rows: usize, cols: usize, seed: u64) -> Result<Grid<T>, LicError> {
    let mut grid = Grid::filled(rows, cols, T::zero())?;
    grid.data_mut()
        .par_chunks_mut(cols)
        .enumerate()
        .for_each(|(row, line)| {
            let mut rng = Xorshift64::derive(seed, row as u64);
            line.iter_mut().for_each(|v| *v = T::cast_f64(rng.next_f64()));
        });
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_and_range() {
        let tex = noise_texture::<f32>(7, 13, 1).unwrap();
        assert_eq!(tex.shape(), (7, 13));
        assert!(tex.data().iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn same_seed_is_bit_identical() {
        let a = noise_texture::<f64>(16, 16, 99).unwrap();
        let b = noise_texture::<f64>(16, 16, 99).unwrap();
        assert!(a
            .data()
            .iter()
            .zip(b.data())
            .all(|(x, y)| x.to_bits() == y.to_bits()));
    }

    #[test]
    fn different_seeds_differ() {
        let a = noise_texture::<f64>(8, 8, 1).unwrap();
        let b = noise_texture::<f64>(8, 8, 2).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn single_is_rounded_double() {
        let d = noise_texture::<f64>(4, 5, 3).unwrap();
        let s = noise_texture::<f32>(4, 5, 3).unwrap();
        assert!(d.data().iter().zip(s.data()).all(|(&a, &b)| a as f32 == b));
    }

    #[test]
    fn zero_dimension_is_rejected() {
        assert!(noise_texture::<f64>(0, 5, 3).is_err());
    }
}
