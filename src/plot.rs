/*
Copyright 2021 BlackRock, Inc.

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use crate::pwq::PiecewiseQuadratic;
use ndarray::Array1;
use std::f64;

// Fraction of the breakpoint span added on each side of the sample range.
const PAD_FRACTION: f64 = 0.1;

/// Samples `f` on `n` equally spaced points, returning parallel x and y
/// arrays for plotting. The x range always covers every finite breakpoint of
/// `f`, padded on both sides; values outside every piece's domain come back
/// as +inf, mirroring evaluation.
///
/// # Panics
/// * If `n < 2`.
///
/// # Example
/// ```
/// use pwq::plot::sample;
/// use pwq::pwq::PiecewiseQuadratic;
/// let f = PiecewiseQuadratic::indicator(0., 1.);
/// let (xs, ys) = sample(&f, 101);
/// assert_eq!(xs.len(), 101);
/// assert!(xs[0] < 0. && xs[100] > 1.);
/// // the padded flanks are out of domain
/// assert_eq!(ys[0], f64::INFINITY);
/// ```
pub fn sample(f: &PiecewiseQuadratic, n: usize) -> (Array1<f64>, Array1<f64>) {
    assert!(n >= 2, "Need at least two sample points.");
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for piece in &f.pieces {
        if piece.is_empty() {
            continue;
        }
        if piece.lb.is_finite() {
            lo = f64::min(lo, piece.lb);
            hi = f64::max(hi, piece.lb);
        }
        if piece.ub.is_finite() {
            lo = f64::min(lo, piece.ub);
            hi = f64::max(hi, piece.ub);
        }
    }
    let (lo, hi) = if lo > hi {
        // no finite breakpoints at all
        (-1., 1.)
    } else if lo == hi {
        (lo - 1., hi + 1.)
    } else {
        let pad = PAD_FRACTION * (hi - lo);
        (lo - pad, hi + pad)
    };
    let xs = Array1::linspace(lo, hi, n);
    let ys = xs.mapv(|x| f.eval(x));
    (xs, ys)
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::bq::BoundedQuadratic;

    #[test]
    fn test_sample_covers_breakpoints() {
        let f = PiecewiseQuadratic::new(vec![
            BoundedQuadratic::new(f64::NEG_INFINITY, -1., 0., -1., 0.),
            BoundedQuadratic::new(-1., 2., 1., 0., 0.),
            BoundedQuadratic::new(2., f64::INFINITY, 0., 4., -4.),
        ]);
        let (xs, ys) = sample(&f, 50);
        assert_eq!(xs.len(), 50);
        assert_eq!(ys.len(), 50);
        // range covers [-1, 2] with 10% padding on each side
        assert!(crate::tol::approx_eq(xs[0], -1.3));
        assert!(crate::tol::approx_eq(xs[49], 2.3));
        // everything is in some piece's domain, so no infinities
        assert!(ys.iter().all(|y| y.is_finite()));
    }

    #[test]
    fn test_sample_marks_gaps_infinite() {
        let f = PiecewiseQuadratic::new(vec![
            BoundedQuadratic::new(0., 1., 0., 0., 1.),
            BoundedQuadratic::new(2., 3., 0., 0., 2.),
        ]);
        let (xs, ys) = sample(&f, 301);
        let mut saw_gap = false;
        for (x, y) in xs.iter().zip(ys.iter()) {
            if *x > 1.1 && *x < 1.9 {
                assert_eq!(*y, f64::INFINITY);
                saw_gap = true;
            }
        }
        assert!(saw_gap);
    }

    #[test]
    fn test_sample_point_function() {
        let f = PiecewiseQuadratic::new(vec![BoundedQuadratic::new_point(3., 5.)]);
        let (xs, ys) = sample(&f, 11);
        assert_eq!(xs[0], 2.);
        assert_eq!(xs[10], 4.);
        // the midpoint lands exactly on the point's abscissa
        assert_eq!(ys[5], 5.);
    }

    #[test]
    fn test_sample_unbounded_function_defaults() {
        let f = PiecewiseQuadratic::new(vec![BoundedQuadratic::new_extended(1., 0., 0.)]);
        let (xs, ys) = sample(&f, 3);
        assert_eq!((xs[0], xs[2]), (-1., 1.));
        assert_eq!(ys[1], 0.);
    }

    #[test]
    fn test_sample_empty_function() {
        let f = PiecewiseQuadratic::new(vec![]);
        let (_, ys) = sample(&f, 5);
        assert!(ys.iter().all(|y| *y == f64::INFINITY));
    }

    #[test]
    #[should_panic(expected = "at least two")]
    fn test_sample_too_few_points() {
        sample(&PiecewiseQuadratic::indicator(0., 1.), 1);
    }
}
