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

use crate::interval::Interval;
use crate::tol;
use std::f64;
use std::fmt;
use std::ops::{Add, Mul, Neg};

/// A bounded quadratic function f(x) = `p`x^2 + `q`x + `r` for x in [`lb`, `ub`],
/// and +inf everywhere else. The coefficients must be finite; the bounds may be
/// infinite but never NaN. The domain is empty iff `lb > ub` strictly.
///
/// Note: construct these through `BoundedQuadratic::new` (or one of the other
/// constructors) so the coefficient invariants are checked.
#[derive(Debug, Copy, Clone)]
pub struct BoundedQuadratic {
    pub lb: f64,
    pub ub: f64,
    pub p: f64,
    pub q: f64,
    pub r: f64,
}

impl BoundedQuadratic {
    /// Constructs a new `BoundedQuadratic` from bounds and coefficients.
    ///
    /// # Panics
    /// * If `p`, `q`, `r` are not all finite, or if either bound is NaN.
    ///
    /// # Example
    /// ```
    /// use pwq::bq::BoundedQuadratic;
    /// // f(x) = x^2 + x + 1 for x in [-1, 1]
    /// let quad = BoundedQuadratic::new(-1., 1., 1., 1., 1.);
    /// ```
    pub fn new(lb: f64, ub: f64, p: f64, q: f64, r: f64) -> BoundedQuadratic {
        assert!(
            p.is_finite() && q.is_finite() && r.is_finite(),
            "Quadratic, linear, and constant coefficients must be finite."
        );
        assert!(!lb.is_nan() && !ub.is_nan(), "Domain bounds cannot be NaN.");
        BoundedQuadratic { lb, ub, p, q, r }
    }

    /// Constructs a new `BoundedQuadratic` whose domain is the whole real line.
    pub fn new_extended(p: f64, q: f64, r: f64) -> BoundedQuadratic {
        BoundedQuadratic::new(f64::NEG_INFINITY, f64::INFINITY, p, q, r)
    }

    /// Constructs a new `BoundedQuadratic` on an explicit `Interval`.
    pub fn on_interval(dom: Interval, p: f64, q: f64, r: f64) -> BoundedQuadratic {
        BoundedQuadratic::new(dom.lb, dom.ub, p, q, r)
    }

    /// Constructs a new line from bounds, slope, and intercept.
    pub fn new_line(lb: f64, ub: f64, slope: f64, intercept: f64) -> BoundedQuadratic {
        BoundedQuadratic::new(lb, ub, 0., slope, intercept)
    }

    /// Constructs the unbounded line through two points.
    ///
    /// # Panics
    /// * If the two points have (approximately) identical x-values.
    ///
    /// # Example
    /// ```
    /// use pwq::bq::BoundedQuadratic;
    /// // f(x) = x for x in (-inf, inf)
    /// let line = BoundedQuadratic::new_line_from_points((0., 0.), (1., 1.));
    /// ```
    pub fn new_line_from_points(p1: (f64, f64), p2: (f64, f64)) -> BoundedQuadratic {
        let (x1, y1) = p1;
        let (x2, y2) = p2;
        assert!(
            !tol::approx_eq(x1, x2),
            "Can't create a line with infinite slope."
        );
        let slope = (y2 - y1) / (x2 - x1);
        let intercept = y1 - slope * x1;
        BoundedQuadratic::new_line(f64::NEG_INFINITY, f64::INFINITY, slope, intercept)
    }

    /// Constructs a `BoundedQuadratic` whose domain is the single point `x`,
    /// taking the value `y` there.
    pub fn new_point(x: f64, y: f64) -> BoundedQuadratic {
        BoundedQuadratic::new(x, x, 0., 0., y)
    }

    /// The domain of `self` as an `Interval`.
    pub fn domain(&self) -> Interval {
        Interval::new(self.lb, self.ub)
    }

    /// Determines whether the domain of `self` is empty.
    pub fn is_empty(&self) -> bool {
        self.domain().is_empty()
    }

    /// Determines whether the domain of `self` is exactly a point.
    pub fn is_point(&self) -> bool {
        self.domain().is_singleton()
    }

    /// Determines whether the domain of `self` is a point up to tolerance.
    pub fn is_almost_point(&self) -> bool {
        tol::approx_eq(self.lb, self.ub)
    }

    /// A `BoundedQuadratic` is convex iff its quadratic coefficient is nonnegative.
    pub fn is_convex(&self) -> bool {
        self.p >= 0.
    }

    /// Determines whether `self` is affine (zero quadratic coefficient).
    pub fn is_affine(&self) -> bool {
        tol::approx_eq(self.p, 0.)
    }

    /// Returns true if `x` is in the domain of `self`.
    pub fn domain_contains(&self, x: f64) -> bool {
        self.domain().contains(x)
    }

    /// Returns true if `x` is in the interior of the domain of `self`.
    pub fn interior_contains(&self, x: f64) -> bool {
        self.domain().interior_contains(x)
    }

    /// Approximate equality: all five fields within tolerance.
    pub fn approx(&self, other: &BoundedQuadratic) -> bool {
        self.same_coefficients(other) && self.domain().approx(&other.domain())
    }

    /// Returns true if the two functions agree coefficient-wise (domains ignored).
    pub fn same_coefficients(&self, other: &BoundedQuadratic) -> bool {
        tol::approx_eq(self.p, other.p)
            && tol::approx_eq(self.q, other.q)
            && tol::approx_eq(self.r, other.r)
    }

    /// Evaluates `self` at `x`, returning +inf if `x` is outside the domain.
    ///
    /// # Panics
    /// * If `x` is NaN.
    ///
    /// # Example
    /// ```
    /// use pwq::bq::BoundedQuadratic;
    /// let quad = BoundedQuadratic::new(-1., 1., 1., 1., 1.);
    /// assert_eq!(quad.eval(1.), 3.);
    /// assert_eq!(quad.eval(2.), f64::INFINITY);
    /// ```
    pub fn eval(&self, x: f64) -> f64 {
        assert!(!x.is_nan());
        if self.domain_contains(x) {
            self.value_at(x)
        } else {
            f64::INFINITY
        }
    }

    // Evaluates the defining polynomial without the domain check.
    fn value_at(&self, x: f64) -> f64 {
        self.p * x * x + self.q * x + self.r
    }

    /// Evaluates the derivative of `self` at `x`. Out-of-domain rule matches `eval`.
    pub fn eval_derivative(&self, x: f64) -> f64 {
        assert!(!x.is_nan());
        if self.domain_contains(x) {
            2. * self.p * x + self.q
        } else {
            f64::INFINITY
        }
    }

    /// Given f(x), returns f'(x) on the same domain.
    pub fn derivative(&self) -> BoundedQuadratic {
        BoundedQuadratic::new(self.lb, self.ub, 0., 2. * self.p, self.q)
    }

    /// Returns the unbounded tangent line to `self` at `x`.
    ///
    /// # Example
    /// ```
    /// use pwq::bq::BoundedQuadratic;
    /// let quad = BoundedQuadratic::new(-1., 1., 1., 0., 0.);
    /// // tangent to x^2 at 0.5 is x - 0.25
    /// let tangent = quad.get_tangent_at(0.5);
    /// assert!(tangent.approx(&BoundedQuadratic::new_extended(0., 1., -0.25)));
    /// ```
    pub fn get_tangent_at(&self, x: f64) -> BoundedQuadratic {
        let slope = 2. * self.p * x + self.q;
        let intercept = self.value_at(x) - slope * x;
        assert!(intercept.is_finite(), "Tangent intercept must be finite.");
        BoundedQuadratic::new_line(f64::NEG_INFINITY, f64::INFINITY, slope, intercept)
    }

    /// Returns `alpha * f`, the scalar multiple of `self`.
    pub fn mul_scalar(&self, alpha: f64) -> BoundedQuadratic {
        BoundedQuadratic::new(self.lb, self.ub, alpha * self.p, alpha * self.q, alpha * self.r)
    }

    pub fn mul_scalar_in_place(&mut self, alpha: f64) {
        self.p *= alpha;
        self.q *= alpha;
        self.r *= alpha;
    }

    // Rescales a domain by 1/alpha, swapping the bounds when alpha is negative.
    fn scaled_bounds(lb: f64, ub: f64, alpha: f64) -> (f64, f64) {
        if alpha < 0. {
            (ub / alpha, lb / alpha)
        } else {
            (lb / alpha, ub / alpha)
        }
    }

    /// Returns g(x) = f(`alpha` * x). The domain scales by 1/`alpha`.
    ///
    /// # Panics
    /// * If `alpha` is (approximately) 0.
    ///
    /// # Example
    /// ```
    /// use pwq::bq::BoundedQuadratic;
    /// // f(x) = x^2 + x on [2, 4]
    /// let f = BoundedQuadratic::new(2., 4., 1., 1., 0.);
    /// // f(2x) = 4x^2 + 2x on [1, 2]
    /// let g = f.scale(2.);
    /// assert!(g.approx(&BoundedQuadratic::new(1., 2., 4., 2., 0.)));
    /// ```
    pub fn scale(&self, alpha: f64) -> BoundedQuadratic {
        assert!(!tol::approx_eq(alpha, 0.), "Can't scale the argument by 0.");
        let (lb, ub) = Self::scaled_bounds(self.lb, self.ub, alpha);
        BoundedQuadratic::new(lb, ub, alpha * alpha * self.p, alpha * self.q, self.r)
    }

    pub fn scale_in_place(&mut self, alpha: f64) {
        assert!(!tol::approx_eq(alpha, 0.), "Can't scale the argument by 0.");
        let (lb, ub) = Self::scaled_bounds(self.lb, self.ub, alpha);
        self.lb = lb;
        self.ub = ub;
        self.p *= alpha * alpha;
        self.q *= alpha;
    }

    /// Returns the perspective function g(x) = `alpha` * f(x / `alpha`). The
    /// domain scales by `alpha`.
    ///
    /// # Panics
    /// * If `alpha` is (approximately) 0.
    pub fn perspective(&self, alpha: f64) -> BoundedQuadratic {
        assert!(
            !tol::approx_eq(alpha, 0.),
            "Can't take a perspective with parameter 0."
        );
        let (lb, ub) = Self::scaled_bounds(self.lb, self.ub, 1. / alpha);
        BoundedQuadratic::new(lb, ub, self.p / alpha, self.q, alpha * self.r)
    }

    pub fn perspective_in_place(&mut self, alpha: f64) {
        assert!(
            !tol::approx_eq(alpha, 0.),
            "Can't take a perspective with parameter 0."
        );
        let (lb, ub) = Self::scaled_bounds(self.lb, self.ub, 1. / alpha);
        self.lb = lb;
        self.ub = ub;
        self.p /= alpha;
        self.r *= alpha;
    }

    /// Returns g(x) = f(x - `delta`), i.e. `self` translated right by `delta`.
    ///
    /// # Example
    /// ```
    /// use pwq::bq::BoundedQuadratic;
    /// // shifting x^2 on [0, 1] right by 2 gives (x - 2)^2 on [2, 3]
    /// let f = BoundedQuadratic::new(0., 1., 1., 0., 0.);
    /// let g = f.shift(2.);
    /// assert!(g.approx(&BoundedQuadratic::new(2., 3., 1., -4., 4.)));
    /// ```
    pub fn shift(&self, delta: f64) -> BoundedQuadratic {
        BoundedQuadratic::new(
            self.lb + delta,
            self.ub + delta,
            self.p,
            self.q - 2. * self.p * delta,
            self.p * delta * delta - self.q * delta + self.r,
        )
    }

    pub fn shift_in_place(&mut self, delta: f64) {
        let (p, q, r) = (self.p, self.q, self.r);
        self.lb += delta;
        self.ub += delta;
        self.q = q - 2. * p * delta;
        self.r = p * delta * delta - q * delta + r;
    }

    /// Returns g(x) = f(x) + `alpha` * x, i.e. `self` tilted by slope `alpha`.
    pub fn tilt(&self, alpha: f64) -> BoundedQuadratic {
        BoundedQuadratic::new(self.lb, self.ub, self.p, self.q + alpha, self.r)
    }

    pub fn tilt_in_place(&mut self, alpha: f64) {
        self.q += alpha;
    }

    /// Returns g(x) = f(-x), the reflection of `self` across the y-axis.
    pub fn reverse(&self) -> BoundedQuadratic {
        BoundedQuadratic::new(-self.ub, -self.lb, self.p, -self.q, self.r)
    }

    pub fn reverse_in_place(&mut self) {
        let tmp = self.ub;
        self.ub = -self.lb;
        self.lb = -tmp;
        self.q = -self.q;
    }

    /// Restricts the domain of `self` to its intersection with `dom`.
    ///
    /// # Panics
    /// * If the restricted domain is empty (beyond tolerance).
    pub fn restrict_dom(&self, dom: &Interval) -> BoundedQuadratic {
        let new_dom = self.domain().intersect(dom);
        assert!(
            tol::approx_le(new_dom.lb, new_dom.ub),
            "Restriction must produce a non-empty domain."
        );
        BoundedQuadratic::on_interval(new_dom, self.p, self.q, self.r)
    }

    pub fn restrict_dom_in_place(&mut self, dom: &Interval) {
        let new_dom = self.domain().intersect(dom);
        assert!(
            tol::approx_le(new_dom.lb, new_dom.ub),
            "Restriction must produce a non-empty domain."
        );
        self.lb = new_dom.lb;
        self.ub = new_dom.ub;
    }

    /// Returns `self` with the same coefficients on the whole real line.
    pub fn extend_dom(&self) -> BoundedQuadratic {
        BoundedQuadratic::new_extended(self.p, self.q, self.r)
    }

    pub fn extend_dom_in_place(&mut self) {
        self.lb = f64::NEG_INFINITY;
        self.ub = f64::INFINITY;
    }

    /// Finds the (x, f(x)) pair minimizing `self`:
    ///
    /// * empty domain: `(NaN, inf)`;
    /// * strictly convex: the vertex clipped into the domain;
    /// * concave: the better finite endpoint, or `(NaN, -inf)` if unbounded;
    /// * sloped line: the downhill endpoint, or `(NaN, -inf)` if unbounded;
    /// * constant: a finite endpoint if one exists, otherwise x = 0.
    ///
    /// # Example
    /// ```
    /// use pwq::bq::BoundedQuadratic;
    /// let quad = BoundedQuadratic::new(-1., 1., 1., 0., 0.);
    /// assert_eq!(quad.minimize(), (0., 0.));
    /// ```
    pub fn minimize(&self) -> (f64, f64) {
        if self.is_empty() {
            return (f64::NAN, f64::INFINITY);
        }
        if self.is_point() {
            return (self.lb, self.value_at(self.lb));
        }
        let x_min = if tol::gt_eps(self.p, 0.) {
            tol::clip(-self.q / (2. * self.p), self.lb, self.ub)
        } else if tol::lt_eps(self.p, 0.) {
            // concave: the minimum sits at an endpoint
            if self.lb.is_finite() && self.ub.is_finite() {
                if self.value_at(self.lb) <= self.value_at(self.ub) {
                    self.lb
                } else {
                    self.ub
                }
            } else {
                f64::NAN
            }
        } else if tol::gt_eps(self.q, 0.) {
            if self.lb.is_finite() {
                self.lb
            } else {
                f64::NAN
            }
        } else if tol::lt_eps(self.q, 0.) {
            if self.ub.is_finite() {
                self.ub
            } else {
                f64::NAN
            }
        } else {
            // constant
            if self.lb.is_finite() {
                self.lb
            } else if self.ub.is_finite() {
                self.ub
            } else {
                0.
            }
        };
        if x_min.is_finite() {
            (x_min, self.value_at(x_min))
        } else {
            (x_min, f64::NEG_INFINITY)
        }
    }

    /// Determines whether `self`'s right endpoint coincides with `other`'s left
    /// endpoint, both in abscissa and in value.
    ///
    /// # Example
    /// ```
    /// use pwq::bq::BoundedQuadratic;
    /// let f = BoundedQuadratic::new(f64::NEG_INFINITY, 0., 0., -1., 0.);
    /// let g = BoundedQuadratic::new(0., f64::INFINITY, 1., 0., 0.);
    /// assert!(f.continuous_and_overlapping(&g));
    /// ```
    pub fn continuous_and_overlapping(&self, other: &BoundedQuadratic) -> bool {
        tol::approx_eq(self.ub, other.lb)
            && tol::approx_eq(self.eval(self.ub), other.eval(other.lb))
    }

    /// The order relation f <= g for an affine `self`: `self`'s domain must
    /// cover `other`'s exactly and `other - self` must be nonnegative (within
    /// tolerance) over it.
    ///
    /// # Panics
    /// * If `self` is not affine.
    pub fn is_below(&self, other: &BoundedQuadratic) -> bool {
        assert!(
            self.is_affine(),
            "The lower operand of an order comparison must be affine."
        );
        if !(self.lb <= other.lb && self.ub >= other.ub) {
            return false;
        }
        self.gap_above_is_nonnegative(other)
    }

    /// The tolerant order relation f <~ g for an affine `self`: domain cover
    /// within tolerance, minimum of the difference within tolerance of zero.
    ///
    /// # Panics
    /// * If `self` is not affine.
    pub fn approx_below(&self, other: &BoundedQuadratic) -> bool {
        assert!(
            self.is_affine(),
            "The lower operand of an order comparison must be affine."
        );
        if !self.domain().includes(&other.domain()) {
            return false;
        }
        self.gap_above_is_nonnegative(other)
    }

    // Minimum of (other - self) over other's domain, compared against zero.
    fn gap_above_is_nonnegative(&self, other: &BoundedQuadratic) -> bool {
        let diff = BoundedQuadratic::new(
            other.lb,
            other.ub,
            other.p - self.p,
            other.q - self.q,
            other.r - self.r,
        );
        let (_, min_val) = diff.minimize();
        tol::approx_ge(min_val, 0.)
    }

    // The common domain of a group of functions, or None if it is empty.
    fn common_domain(fs: &[BoundedQuadratic]) -> Option<Interval> {
        assert!(!fs.is_empty());
        let mut dom = fs[0].domain();
        for fi in &fs[1..] {
            dom = dom.intersect(&fi.domain());
        }
        if dom.is_empty() {
            None
        } else {
            Some(dom)
        }
    }

    /// Restricts a group of functions to their common domain. The returned flag
    /// is false when the common domain is empty, in which case the pieces are
    /// returned unrestricted and should not be interpreted.
    ///
    /// # Example
    /// ```
    /// use pwq::bq::BoundedQuadratic;
    /// let f = BoundedQuadratic::new(0., 10., 1., 2., 4.);
    /// let g = BoundedQuadratic::new(1., 9., 1., 2., 5.);
    /// let h = BoundedQuadratic::new(2., 8., 1., 2., 5.);
    /// let (restricted, is_valid) = BoundedQuadratic::intersect_pieces(&[f, g, h]);
    /// assert!(is_valid);
    /// assert!(restricted.iter().all(|f| f.lb == 2. && f.ub == 8.));
    /// ```
    pub fn intersect_pieces(fs: &[BoundedQuadratic]) -> (Vec<BoundedQuadratic>, bool) {
        match Self::common_domain(fs) {
            Some(dom) => {
                let restricted = fs
                    .iter()
                    .map(|f| BoundedQuadratic::on_interval(dom, f.p, f.q, f.r))
                    .collect();
                (restricted, true)
            }
            None => (fs.to_vec(), false),
        }
    }

    /// Sums a group of functions over their common domain. Returns `None` when
    /// the domains are disjoint.
    pub fn sum(summands: &[BoundedQuadratic]) -> Option<BoundedQuadratic> {
        let dom = Self::common_domain(summands)?;
        let mut p = 0.;
        let mut q = 0.;
        let mut r = 0.;
        for f in summands {
            p += f.p;
            q += f.q;
            r += f.r;
        }
        Some(BoundedQuadratic::on_interval(dom, p, q, r))
    }
}

impl Add for BoundedQuadratic {
    type Output = BoundedQuadratic;

    /// The sum of two bounded quadratics on the intersection of their domains.
    /// The resulting domain may be empty; callers inspect.
    fn add(self, other: BoundedQuadratic) -> BoundedQuadratic {
        let dom = self.domain().intersect(&other.domain());
        BoundedQuadratic::on_interval(dom, self.p + other.p, self.q + other.q, self.r + other.r)
    }
}

impl Add<f64> for BoundedQuadratic {
    type Output = BoundedQuadratic;

    fn add(self, a: f64) -> BoundedQuadratic {
        BoundedQuadratic::new(self.lb, self.ub, self.p, self.q, self.r + a)
    }
}

impl Mul<f64> for BoundedQuadratic {
    type Output = BoundedQuadratic;

    fn mul(self, alpha: f64) -> BoundedQuadratic {
        self.mul_scalar(alpha)
    }
}

impl Neg for BoundedQuadratic {
    type Output = BoundedQuadratic;

    /// Negation is only defined for affine functions (a negated quadratic
    /// piece would no longer be usable as a convex piece).
    ///
    /// # Panics
    /// * If `self` is not affine.
    fn neg(self) -> BoundedQuadratic {
        assert!(self.is_affine(), "Can only negate affine functions.");
        BoundedQuadratic::new(self.lb, self.ub, -self.p, -self.q, -self.r)
    }
}

impl PartialEq for BoundedQuadratic {
    fn eq(&self, other: &Self) -> bool {
        if self.is_point() && other.is_point() && tol::approx_eq(self.lb, other.lb) {
            tol::approx_eq(self.eval(self.lb), other.eval(other.lb))
        } else {
            self.approx(other)
        }
    }
}

impl fmt::Display for BoundedQuadratic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut expr = String::new();
        if !tol::approx_eq(self.p, 0.) {
            if self.p < 0. {
                expr.push_str("-");
            }
            if tol::approx_eq(self.p.abs(), 1.) {
                expr.push_str("x\u{b2}");
            } else {
                expr.push_str(&format!("{:.5}x\u{b2}", self.p.abs()));
            }
        }
        if !tol::approx_eq(self.q, 0.) {
            if !expr.is_empty() {
                expr.push_str(if self.q < 0. { " - " } else { " + " });
            } else if self.q < 0. {
                expr.push_str("-");
            }
            if tol::approx_eq(self.q.abs(), 1.) {
                expr.push_str("x");
            } else {
                expr.push_str(&format!("{:.5}x", self.q.abs()));
            }
        }
        if self.r != 0. {
            if !expr.is_empty() {
                expr.push_str(if self.r < 0. { " - " } else { " + " });
            } else if self.r < 0. {
                expr.push_str("-");
            }
            expr.push_str(&format!("{:.5}", self.r.abs()));
        }
        if expr.is_empty() {
            expr.push_str("0");
        }
        write!(
            f,
            "BoundedQuadratic: f(x) = {}, \u{2200}x \u{2208} {}",
            expr,
            self.domain()
        )
    }
}
