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

use crate::bq::BoundedQuadratic;
use crate::interval::Interval;
use crate::tol;
use len_trait::{Empty, Len};
use num::traits::Zero;
use std::f64;
use std::fmt;
use std::ops::{Index, Mul, Neg};

/// A piecewise quadratic function: an ordered, finite sequence of
/// [`BoundedQuadratic`](../bq/struct.BoundedQuadratic.html) pieces. The pieces
/// carry no disjointness invariant; adjacent pieces may share endpoints,
/// overlap, or leave gaps.
#[derive(Debug, Clone)]
pub struct PiecewiseQuadratic {
    pub pieces: Vec<BoundedQuadratic>,
}

impl PiecewiseQuadratic {
    /// Initializes a new `PiecewiseQuadratic` from its pieces.
    ///
    /// # Example
    /// ```
    /// use pwq::bq::BoundedQuadratic;
    /// use pwq::pwq::PiecewiseQuadratic;
    /// // f(x) = |x|
    /// let left = BoundedQuadratic::new(f64::NEG_INFINITY, 0., 0., -1., 0.);
    /// let right = BoundedQuadratic::new(0., f64::INFINITY, 0., 1., 0.);
    /// let abs = PiecewiseQuadratic::new(vec![left, right]);
    /// ```
    pub fn new(pieces: Vec<BoundedQuadratic>) -> PiecewiseQuadratic {
        PiecewiseQuadratic { pieces }
    }

    /// Like `new`, but runs `simplify` on the assembled function.
    pub fn new_simplified(pieces: Vec<BoundedQuadratic>) -> PiecewiseQuadratic {
        PiecewiseQuadratic::new(pieces).simplify()
    }

    /// Initializes an empty `PiecewiseQuadratic` with room for `capacity` pieces.
    pub fn with_capacity(capacity: usize) -> PiecewiseQuadratic {
        PiecewiseQuadratic {
            pieces: Vec::with_capacity(capacity),
        }
    }

    /// The function that is 0 on [`lb`, `ub`] and +inf everywhere else.
    ///
    /// # Example
    /// ```
    /// use pwq::pwq::PiecewiseQuadratic;
    /// let indicator01 = PiecewiseQuadratic::indicator(0., 1.);
    /// assert_eq!(indicator01.eval(0.5), 0.);
    /// assert_eq!(indicator01.eval(2.), f64::INFINITY);
    /// ```
    pub fn indicator(lb: f64, ub: f64) -> PiecewiseQuadratic {
        PiecewiseQuadratic::new(vec![BoundedQuadratic::new(lb, ub, 0., 0., 0.)])
    }

    /// The smallest interval containing every piece's domain.
    pub fn domain(&self) -> Interval {
        if self.pieces.is_empty() {
            return Interval::new(f64::INFINITY, f64::NEG_INFINITY);
        }
        let mut lb = f64::INFINITY;
        let mut ub = f64::NEG_INFINITY;
        for f in &self.pieces {
            lb = f64::min(lb, f.lb);
            ub = f64::max(ub, f.ub);
        }
        Interval::new(lb, ub)
    }

    /// Returns true if the leftmost piece extends to -inf.
    pub fn extends_left(&self) -> bool {
        !self.is_empty() && self[0].lb == f64::NEG_INFINITY
    }

    /// Returns true if the rightmost piece extends to +inf.
    pub fn extends_right(&self) -> bool {
        !self.is_empty() && self[self.len() - 1].ub == f64::INFINITY
    }

    /// Evaluates `self` at `x` with first-match semantics: the value comes from
    /// the first piece in order whose domain contains `x`, or +inf when no
    /// piece does.
    ///
    /// Where pieces overlap, the intended "pointwise minimum" reading must be
    /// realized by the caller, either through `simplify` or by listing
    /// overlapping pieces in min-first order; evaluation alone does not sort
    /// this out.
    pub fn eval(&self, x: f64) -> f64 {
        assert!(!x.is_nan());
        for f in &self.pieces {
            if f.domain_contains(x) {
                return f.eval(x);
            }
        }
        f64::INFINITY
    }

    /// Minimizes `self` by minimizing each piece. Ties go to the earlier piece.
    ///
    /// # Example
    /// ```
    /// use pwq::bq::BoundedQuadratic;
    /// use pwq::pwq::PiecewiseQuadratic;
    /// let left = BoundedQuadratic::new(f64::NEG_INFINITY, 0., 0., -1., 0.);
    /// let right = BoundedQuadratic::new(0., f64::INFINITY, 0., 1., 0.);
    /// let abs = PiecewiseQuadratic::new(vec![left, right]);
    /// assert_eq!(abs.minimize(), (0., 0.));
    /// ```
    pub fn minimize(&self) -> (f64, f64) {
        let (mut best_x, mut best_val) = (f64::NAN, f64::INFINITY);
        for f in &self.pieces {
            let (x, val) = f.minimize();
            if tol::lt_eps(val, best_val) {
                best_x = x;
                best_val = val;
            }
        }
        (best_x, best_val)
    }

    /// Determines whether `self` is convex: every piece convex, every adjacent
    /// pair continuous at a shared breakpoint, and the one-sided derivatives
    /// nondecreasing across each join. An empty function is vacuously convex.
    pub fn is_convex(&self) -> bool {
        if !self.pieces.iter().all(BoundedQuadratic::is_convex) {
            return false;
        }
        for i in 1..self.len() {
            let left = &self[i - 1];
            let right = &self[i];
            if !left.continuous_and_overlapping(right) {
                return false;
            }
            let left_slope = left.eval_derivative(left.ub);
            let right_slope = right.eval_derivative(right.lb);
            if left_slope - right_slope > tol::EPS {
                return false;
            }
        }
        true
    }

    // Appends `cur` to `out`, repeatedly folding it into the accumulated tail
    // per the simplification rules until no rule applies.
    fn push_piece_simplified(out: &mut Vec<BoundedQuadratic>, cur: BoundedQuadratic) {
        if cur.is_empty() {
            return;
        }
        let mut cur = cur;
        while let Some(&prev) = out.last() {
            // redundant points at one abscissa: the smaller value survives
            if prev.is_point() && cur.is_point() && tol::approx_eq(prev.lb, cur.lb) {
                if cur.eval(cur.lb) < prev.eval(prev.lb) {
                    out.pop();
                    continue;
                }
                return;
            }
            let one_point = prev.is_point() != cur.is_point();
            // a point sitting on the adjacent curve is bookkeeping residue
            if one_point && prev.continuous_and_overlapping(&cur) {
                let keep = if prev.is_point() { cur } else { prev };
                cur = BoundedQuadratic::new(prev.lb, cur.ub, keep.p, keep.q, keep.r);
                out.pop();
                continue;
            }
            // two stretches of the same underlying quadratic
            if prev.same_coefficients(&cur) && tol::approx_eq(prev.ub, cur.lb) {
                let keep = if prev.is_point() { cur } else { prev };
                cur = BoundedQuadratic::new(prev.lb, cur.ub, keep.p, keep.q, keep.r);
                out.pop();
                continue;
            }
            // a point meeting a curve off the curve's value: the point is
            // residue either way, only the survivor's domain differs
            if one_point && tol::approx_eq(prev.ub, cur.lb) {
                if cur.is_point() {
                    return;
                }
                out.pop();
                continue;
            }
            break;
        }
        out.push(cur);
    }

    /// Structurally reduces `self`: drops empty pieces, collapses redundant
    /// point pieces onto their neighbors, and fuses adjacent stretches of the
    /// same quadratic. The result evaluates like `self` up to point
    /// redundancies at breakpoints.
    ///
    /// # Example
    /// ```
    /// use pwq::bq::BoundedQuadratic;
    /// use pwq::pwq::PiecewiseQuadratic;
    /// let f = BoundedQuadratic::new(-1., 0., 0., -1., 0.);
    /// let pt = BoundedQuadratic::new_point(0., 0.);
    /// let g = BoundedQuadratic::new(0., 1., 0., 1., 0.);
    /// let h = BoundedQuadratic::new(1., 2., 0., 1., 0.);
    /// let s = PiecewiseQuadratic::new(vec![f, pt, g, h]).simplify();
    /// assert_eq!(s.pieces.len(), 2);
    /// assert!(s[1].approx(&BoundedQuadratic::new(0., 2., 0., 1., 0.)));
    /// ```
    pub fn simplify(&self) -> PiecewiseQuadratic {
        let mut out = Vec::with_capacity(self.len());
        for &cur in &self.pieces {
            Self::push_piece_simplified(&mut out, cur);
        }
        PiecewiseQuadratic::new(out)
    }

    /// Pushes a piece onto the right end of the list. With `simplify_result`,
    /// the piece is folded into the tail per the simplification rules.
    pub fn push(&mut self, f: BoundedQuadratic, simplify_result: bool) {
        if simplify_result {
            Self::push_piece_simplified(&mut self.pieces, f);
        } else {
            self.pieces.push(f);
        }
    }

    /// Appends a slice of pieces; see `push`.
    pub fn append(&mut self, fs: &[BoundedQuadratic], simplify_result: bool) {
        for &f in fs {
            self.push(f, simplify_result);
        }
    }

    /// Piece-wise approximate equality.
    pub fn approx(&self, other: &PiecewiseQuadratic) -> bool {
        self.len() == other.len()
            && self
                .pieces
                .iter()
                .zip(other.pieces.iter())
                .all(|(f, g)| f.approx(g))
    }

    /// Multiplies every piece by `alpha`.
    pub fn mul_scalar(&self, alpha: f64) -> PiecewiseQuadratic {
        PiecewiseQuadratic::new(self.pieces.iter().map(|f| f.mul_scalar(alpha)).collect())
    }

    pub fn mul_scalar_in_place(&mut self, alpha: f64) {
        for f in &mut self.pieces {
            f.mul_scalar_in_place(alpha);
        }
    }

    /// Scales the argument of every piece; a negative `alpha` also reverses
    /// the piece order so the list stays sorted left to right.
    pub fn scale(&self, alpha: f64) -> PiecewiseQuadratic {
        let mut pieces: Vec<_> = self.pieces.iter().map(|f| f.scale(alpha)).collect();
        if alpha < 0. {
            pieces.reverse();
        }
        PiecewiseQuadratic::new(pieces)
    }

    pub fn scale_in_place(&mut self, alpha: f64) {
        for f in &mut self.pieces {
            f.scale_in_place(alpha);
        }
        if alpha < 0. {
            self.pieces.reverse();
        }
    }

    /// The perspective of every piece; a negative `alpha` reverses the order.
    pub fn perspective(&self, alpha: f64) -> PiecewiseQuadratic {
        let mut pieces: Vec<_> = self.pieces.iter().map(|f| f.perspective(alpha)).collect();
        if alpha < 0. {
            pieces.reverse();
        }
        PiecewiseQuadratic::new(pieces)
    }

    pub fn perspective_in_place(&mut self, alpha: f64) {
        for f in &mut self.pieces {
            f.perspective_in_place(alpha);
        }
        if alpha < 0. {
            self.pieces.reverse();
        }
    }

    /// Shifts every piece right by `delta`.
    pub fn shift(&self, delta: f64) -> PiecewiseQuadratic {
        PiecewiseQuadratic::new(self.pieces.iter().map(|f| f.shift(delta)).collect())
    }

    pub fn shift_in_place(&mut self, delta: f64) {
        for f in &mut self.pieces {
            f.shift_in_place(delta);
        }
    }

    /// Tilts every piece by slope `alpha`.
    pub fn tilt(&self, alpha: f64) -> PiecewiseQuadratic {
        PiecewiseQuadratic::new(self.pieces.iter().map(|f| f.tilt(alpha)).collect())
    }

    pub fn tilt_in_place(&mut self, alpha: f64) {
        for f in &mut self.pieces {
            f.tilt_in_place(alpha);
        }
    }

    /// Reflects the function across the y-axis, reversing the piece order.
    pub fn reverse(&self) -> PiecewiseQuadratic {
        let mut pieces: Vec<_> = self.pieces.iter().map(|f| f.reverse()).collect();
        pieces.reverse();
        PiecewiseQuadratic::new(pieces)
    }

    pub fn reverse_in_place(&mut self) {
        for f in &mut self.pieces {
            f.reverse_in_place();
        }
        self.pieces.reverse();
    }

    /// Restricts the function to `dom`, dropping pieces that fall outside it
    /// entirely.
    pub fn restrict_dom(&self, dom: &Interval) -> PiecewiseQuadratic {
        let mut pieces = Vec::with_capacity(self.len());
        for f in &self.pieces {
            let d = f.domain().intersect(dom);
            if !d.is_empty() {
                pieces.push(BoundedQuadratic::on_interval(d, f.p, f.q, f.r));
            }
        }
        PiecewiseQuadratic::new(pieces)
    }

    pub fn restrict_dom_in_place(&mut self, dom: &Interval) {
        *self = self.restrict_dom(dom);
    }
}

impl Empty for PiecewiseQuadratic {
    fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }
}

impl Len for PiecewiseQuadratic {
    fn len(&self) -> usize {
        self.pieces.len()
    }
}

impl Index<usize> for PiecewiseQuadratic {
    type Output = BoundedQuadratic;
    fn index(&self, index: usize) -> &Self::Output {
        &self.pieces[index]
    }
}

impl Mul<f64> for PiecewiseQuadratic {
    type Output = PiecewiseQuadratic;

    fn mul(self, alpha: f64) -> PiecewiseQuadratic {
        self.mul_scalar(alpha)
    }
}

impl Neg for PiecewiseQuadratic {
    type Output = PiecewiseQuadratic;

    /// Piece-wise negation; defined only when every piece is affine.
    ///
    /// # Panics
    /// * If any piece has a nonzero quadratic coefficient.
    fn neg(self) -> PiecewiseQuadratic {
        PiecewiseQuadratic::new(self.pieces.into_iter().map(|f| -f).collect())
    }
}

impl Zero for PiecewiseQuadratic {
    /// The additive identity: the function that is 0 on the whole real line.
    fn zero() -> Self {
        Self::indicator(f64::NEG_INFINITY, f64::INFINITY)
    }

    fn is_zero(&self) -> bool {
        self.len() == 1
            && self[0].lb == f64::NEG_INFINITY
            && self[0].ub == f64::INFINITY
            && tol::approx_eq(self[0].p, 0.)
            && tol::approx_eq(self[0].q, 0.)
            && tol::approx_eq(self[0].r, 0.)
    }
}

impl fmt::Display for PiecewiseQuadratic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PiecewiseQuadratic:")?;
        for piece in &self.pieces {
            writeln!(f, "\t{}", piece)?;
        }
        Ok(())
    }
}
