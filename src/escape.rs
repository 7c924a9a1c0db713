// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time iteration.  A point `c` is iterated as `z = z² + c`
//! from `z = 0`; the number of steps it survives before its magnitude
//! passes 2 is its "velocity," and points that never escape within the
//! budget are presumed to be inside the set.

use num::Complex;

/// What happened to a single point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum IterationResult {
    /// The point escaped; carries the smoothed iteration count.
    Escaped(f64),
    /// The point survived every iteration.
    Interior,
}

impl IterationResult {
    /// True for points presumed to be in the set.
    pub fn is_interior(&self) -> bool {
        match self {
            IterationResult::Interior => true,
            IterationResult::Escaped(_) => false,
        }
    }
}

/// This is our classic iterator function, which either returns the
/// continuous iteration count at which the point escaped, or declares
/// it interior.
pub fn evaluate(point: Complex<f64>, max_iterations: usize) -> IterationResult {
    let mut z = Complex::new(0.0_f64, 0.0_f64);
    let mut counter = 0;
    while counter < max_iterations {
        z = z * z + point;
        counter += 1;
        if z.norm_sqr() > 4.0 {
            return IterationResult::Escaped(smooth(counter, z));
        }
    }
    IterationResult::Interior
}

/// Continuous refinement of the escape count: `n + 1 - log10(log2|z|)`.
/// The inner logarithm is only positive for `|z| > 1`; anything else
/// falls back to the raw count.
fn smooth(counter: usize, z: Complex<f64>) -> f64 {
    let modulus = z.norm();
    if modulus <= 1.0 {
        return counter as f64;
    }
    (counter as f64) + 1.0 - modulus.log2().log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_is_interior() {
        for n in 1..200 {
            assert_eq!(evaluate(Complex::new(0.0, 0.0), n), IterationResult::Interior);
        }
    }

    #[test]
    fn far_point_escapes_on_first_iteration() {
        let expected = 2.0 - (18.0_f64).sqrt().log2().log10();
        for n in &[1, 2, 100, 10_000] {
            match evaluate(Complex::new(3.0, 3.0), *n) {
                IterationResult::Escaped(v) => assert!((v - expected).abs() < 1e-12),
                IterationResult::Interior => panic!("3+3i must escape"),
            }
        }
    }

    #[test]
    fn main_cardioid_is_interior() {
        assert!(evaluate(Complex::new(-0.5, 0.0), 100).is_interior());
        assert!(evaluate(Complex::new(-1.0, 0.0), 1000).is_interior());
    }

    #[test]
    fn slower_points_count_higher() {
        let fast = evaluate(Complex::new(1.0, 1.0), 1000);
        let slow = evaluate(Complex::new(0.26, 0.0), 1000);
        match (fast, slow) {
            (IterationResult::Escaped(f), IterationResult::Escaped(s)) => assert!(s > f),
            other => panic!("both points should escape: {:?}", other),
        }
    }

    #[test]
    fn smoothing_falls_back_to_raw_count_inside_unit_circle() {
        assert_eq!(smooth(7, Complex::new(0.5, 0.5)), 7.0);
        assert_eq!(smooth(3, Complex::new(1.0, 0.0)), 3.0);
    }

    #[test]
    fn smoothing_uses_nested_logarithms() {
        let z = Complex::new(16.0, 0.0);
        // log2(16) = 4
        assert!((smooth(5, z) - (6.0 - 4.0_f64.log10())).abs() < 1e-12);
    }
}
