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
use crate::tol;
use len_trait::Empty;
use std::f64;

/// Evaluates the proximal operator of `f` at `u` with parameter `rho`:
///
/// `prox_{f, rho}(u) = argmin_{x in dom(f)} f(x) + (rho / 2) (x - u)^2`.
///
/// On each piece, the derivative of the augmented objective is linear with
/// slope `2p + rho > 0`, so the piece absorbs targets `rho * u` in the band
/// `[(2p + rho) lb + q, (2p + rho) ub + q]`, and the bands are nondecreasing
/// left to right because `f` is convex. The sweep returns the kink `lb` when
/// the target falls between two bands, the interior stationary point when it
/// falls inside a band, and the overall right endpoint when it exceeds every
/// band. An empty `f` has no feasible point and yields NaN.
///
/// # Panics
/// * If `f` is not convex (callers convexify with `envelope` + `simplify`
///   first), or `rho` is not strictly positive, or `u` is NaN.
///
/// # Example
/// ```
/// use pwq::prox::prox;
/// use pwq::pwq::PiecewiseQuadratic;
/// // the prox of an indicator is the projection onto its interval
/// let f = PiecewiseQuadratic::indicator(0., 1.);
/// assert_eq!(prox(&f, 5., 1.), 1.);
/// assert_eq!(prox(&f, 0.5, 1.), 0.5);
/// ```
pub fn prox(f: &PiecewiseQuadratic, u: f64, rho: f64) -> f64 {
    assert!(!u.is_nan());
    assert!(rho > 0., "The proximal parameter must be strictly positive.");
    assert!(
        f.is_convex(),
        "The proximal operator requires a convex function."
    );
    if f.is_empty() {
        return f64::NAN;
    }

    let target = rho * u;
    let mut prev_band_ub = f64::NEG_INFINITY;
    for piece in &f.pieces {
        let slope = 2. * piece.p + rho;
        let band_lb = slope * piece.lb + piece.q;
        let band_ub = slope * piece.ub + piece.q;
        // between the previous band and this one: the kink is the argmin
        if tol::approx_ge(target, prev_band_ub) && tol::approx_le(target, band_lb) {
            return piece.lb;
        }
        if tol::approx_ge(target, band_lb) && tol::approx_le(target, band_ub) {
            return (target - piece.q) / slope;
        }
        prev_band_ub = band_ub;
    }
    // the target exceeds every band
    f.pieces.last().unwrap().ub
}
