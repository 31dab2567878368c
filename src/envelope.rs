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
use crate::buffer::PieceBuffer;
use crate::interval::Interval;
use crate::pwq::PiecewiseQuadratic;
use crate::tol;
use len_trait::Len;
use std::f64;

/// Bridges an interior point of `f`'s domain to an interior point of `g`'s.
///
/// A common tangent line touching f at `xf` and g at `xg` satisfies four
/// equations (value and slope agreement at both points), which reduce to a
/// single quadratic in `xf`; each root then determines `xg`, the slope, and
/// the intercept in turn. A root is usable when both tangency points land
/// inside their pieces. Applies only when both pieces are strictly convex.
fn bridge_mm(
    f: &BoundedQuadratic,
    g: &BoundedQuadratic,
    bridge: &mut PieceBuffer,
) -> (bool, bool) {
    if f.p <= 0. || g.p <= 0. {
        return (false, false);
    }
    let a = f.p * f.p / g.p - f.p;
    let b = f.p * (f.q - g.q) / g.p;
    let c = f.r - g.r + (f.q - g.q) * (f.q - g.q) / (4. * g.p);
    let (x1, x2) = tol::solve_quad(a, b, c);
    for &root in &[x1, x2] {
        if !root.is_finite() {
            continue;
        }
        let cand_xg = (f.p / g.p) * root + (f.q - g.q) / (2. * g.p);
        if !f.domain_contains(root) || !g.domain_contains(cand_xg) {
            continue;
        }
        // tangency points just outside their pieces drift no further
        let xf = tol::clip(root, f.lb, f.ub);
        let xg = tol::clip(cand_xg, g.lb, g.ub);
        if !tol::approx_le(xf, xg) {
            continue;
        }
        let slope = 2. * f.p * xf + f.q;
        let intercept = -f.p * xf * xf + f.r;
        let left = f.restrict_dom(&Interval::new(f.lb, xf));
        let mid = BoundedQuadratic::new_line(xf, xg, slope, intercept);
        let right = g.restrict_dom(&Interval::new(xg, g.ub));
        if !left.is_point() {
            bridge.push(left);
        }
        bridge.push(mid);
        if !right.is_point() {
            bridge.push(right);
        }
        return (false, false);
    }
    (false, false)
}

/// Solves for the abscissae at which the tangent to `f` passes through
/// `point`. Same system as `bridge_mm` with the g-side slope equation
/// removed: tangency to f at `x` and passage through a known point leave a
/// quadratic in `x`.
fn tangent_roots_through(point: (f64, f64), f: &BoundedQuadratic) -> (f64, f64) {
    let (x, y) = point;
    let a = f.p;
    let b = -2. * f.p * x;
    let c = -f.r + y - f.q * x;
    tol::solve_quad(a, b, c)
}

/// Bridges an interior point of `f`'s domain to an endpoint of `g`'s domain:
/// the finite lower endpoint, the finite upper endpoint, or an affine tail
/// extending to +inf, in that order.
fn bridge_me(
    f: &BoundedQuadratic,
    g: &BoundedQuadratic,
    bridge: &mut PieceBuffer,
) -> (bool, bool) {
    // tangent from f into g's lower endpoint; g survives to the right
    if g.lb.is_finite() {
        let anchor = (g.lb, g.eval(g.lb));
        let (x1, x2) = tangent_roots_through(anchor, f);
        for &root in &[x1, x2] {
            if !root.is_finite() || !f.domain_contains(root) {
                continue;
            }
            let xf = tol::clip(root, f.lb, f.ub);
            let line = f.get_tangent_at(xf);
            if tol::approx_le(line.q, g.eval_derivative(g.lb)) && line.approx_below(g) {
                let left = f.restrict_dom(&Interval::new(f.lb, xf));
                if !left.is_point() {
                    bridge.push(left);
                }
                bridge.push(line.restrict_dom(&Interval::new(xf, g.lb)));
                if !g.is_point() {
                    bridge.push(*g);
                }
                return (false, false);
            }
        }
    }

    if g.ub.is_finite() {
        // tangent from f through g's upper endpoint; g's body is passed under
        // entirely, so the envelope ends at (g.ub, g(g.ub))
        let anchor = (g.ub, g.eval(g.ub));
        let (x1, x2) = tangent_roots_through(anchor, f);
        for &root in &[x1, x2] {
            if !root.is_finite() || !f.domain_contains(root) {
                continue;
            }
            let xf = tol::clip(root, f.lb, f.ub);
            let line = f.get_tangent_at(xf);
            if tol::approx_le(g.eval_derivative(g.ub), line.q) && line.approx_below(g) {
                let left = f.restrict_dom(&Interval::new(f.lb, xf));
                if !left.is_point() {
                    bridge.push(left);
                }
                bridge.push(line.restrict_dom(&Interval::new(xf, g.ub)));
                return (false, true);
            }
        }
    } else if g.is_affine() && !f.is_affine() {
        // g is an affine tail to +inf, so the tangent slope is known outright
        let xf = (g.q - f.q) / (2. * f.p);
        if f.domain_contains(xf) {
            let xf = tol::clip(xf, f.lb, f.ub);
            let line = f.get_tangent_at(xf);
            // same slope as g, so a single-point comparison settles the order
            if tol::approx_le(line.eval(g.lb), g.eval(g.lb)) {
                let left = f.restrict_dom(&Interval::new(f.lb, xf));
                if !left.is_point() {
                    bridge.push(left);
                }
                bridge.push(line.restrict_dom(&Interval::new(xf, f64::INFINITY)));
                return (false, false);
            }
        }
    }

    (false, false)
}

/// Bridges an endpoint of `f`'s domain to an endpoint of `g`'s domain by
/// trying the connecting chords. `full` gates the configurations that are
/// symmetric under reflection, which the mirrored second pass must not
/// re-examine.
fn bridge_ee(
    f: &BoundedQuadratic,
    g: &BoundedQuadratic,
    bridge: &mut PieceBuffer,
    full: bool,
) -> (bool, bool) {
    if full {
        if tol::approx_eq(f.ub, g.lb) {
            // upper of f meets lower of g with no gap
            if f.is_point() && g.is_point() {
                if tol::approx_ge(f.eval(f.ub), g.eval(g.lb)) {
                    bridge.push(*g);
                } else {
                    bridge.push(*f);
                }
                return (true, true);
            } else if f.is_point() && tol::approx_ge(f.eval(f.ub), g.eval(g.lb)) {
                bridge.push(*g);
                return (true, g.is_point());
            } else if g.is_point() && tol::approx_ge(g.eval(g.lb), f.eval(f.ub)) {
                bridge.push(*f);
                return (f.is_point(), true);
            } else if tol::approx_eq(f.eval(f.ub), g.eval(g.lb))
                && tol::approx_le(f.eval_derivative(f.ub), g.eval_derivative(g.lb))
            {
                // the pieces already join convexly
                bridge.push(*f);
                bridge.push(*g);
                return (f.is_point(), g.is_point());
            }
        } else {
            // upper of f to lower of g across a gap
            let chord = BoundedQuadratic::new_line_from_points(
                (f.ub, f.eval(f.ub)),
                (g.lb, g.eval(g.lb)),
            );
            if chord.approx_below(f) && chord.approx_below(g) {
                if !f.is_point() {
                    bridge.push(*f);
                }
                bridge.push(chord.restrict_dom(&Interval::new(f.ub, g.lb)));
                if !g.is_point() {
                    bridge.push(*g);
                }
                return (f.is_point(), g.is_point());
            }
        }

        // lower of f to upper of g: the chord swallows both pieces
        if f.lb.is_finite() && g.ub.is_finite() && !tol::approx_eq(f.lb, g.ub) {
            let chord = BoundedQuadratic::new_line_from_points(
                (f.lb, f.eval(f.lb)),
                (g.ub, g.eval(g.ub)),
            );
            if chord.approx_below(f) && chord.approx_below(g) {
                bridge.push(chord.restrict_dom(&Interval::new(f.lb, g.ub)));
                return (true, true);
            }
        }
    }

    // lower of f to an affine tail of g: a ray of g's slope replaces both
    if f.lb.is_finite() && g.ub.is_infinite() && g.is_affine() {
        let ray = BoundedQuadratic::new_extended(0., g.q, f.eval(f.lb) - g.q * f.lb);
        if tol::approx_le(ray.q, f.eval_derivative(f.lb))
            && tol::approx_le(ray.eval(g.lb), g.eval(g.lb))
        {
            bridge.push(ray.restrict_dom(&Interval::new(f.lb, g.ub)));
            return (true, false);
        }
    }

    // upper of f to the finite upper of g
    if g.ub.is_finite() && !tol::approx_eq(f.ub, g.ub) {
        let chord =
            BoundedQuadratic::new_line_from_points((f.ub, f.eval(f.ub)), (g.ub, g.eval(g.ub)));
        if tol::approx_le(f.eval_derivative(f.ub), chord.q) && chord.approx_below(g) {
            bridge.push(*f);
            bridge.push(chord.restrict_dom(&Interval::new(f.ub, g.ub)));
            return (f.is_point(), true);
        }
    }

    // upper of f to an affine tail of g
    if g.ub.is_infinite() && g.is_affine() {
        let ray = BoundedQuadratic::new_extended(0., g.q, f.eval(f.ub) - g.q * f.ub);
        if tol::approx_le(f.eval_derivative(f.ub), ray.q)
            && tol::approx_le(ray.eval(g.lb), g.eval(g.lb))
        {
            bridge.push(*f);
            bridge.push(ray.restrict_dom(&Interval::new(f.ub, f64::INFINITY)));
            return (f.is_point(), false);
        }
    }
    (false, false)
}

/// Computes the envelope of the adjacent pair (`f`, `g`) into `bridge`,
/// trying each bridge construction in turn: interior-to-interior tangents,
/// interior-to-endpoint tangents (in both orientations, the second via
/// reflection), then endpoint-to-endpoint chords (again both orientations).
/// Returns whether the constructed envelope touches the far left and far
/// right ends of the pair's joint domain; the caller back-pops on the left
/// signal.
///
/// # Panics
/// * If no construction applies; this indicates a numerical inconsistency
///   (or corrupt input) the caller cannot recover from.
fn bridge_pair(
    f: &BoundedQuadratic,
    g: &BoundedQuadratic,
    bridge: &mut PieceBuffer,
) -> (bool, bool) {
    assert!(
        tol::approx_le(f.ub, g.lb),
        "Bridged pieces must be ordered left to right."
    );

    let signal = bridge_mm(f, g, bridge);
    if !bridge.is_empty() {
        return signal;
    }

    let signal = bridge_me(f, g, bridge);
    if !bridge.is_empty() {
        return signal;
    }

    // reflect to probe g's interior against f's endpoints, then flip back
    let (rf, rg) = (f.reverse(), g.reverse());
    let (m_left, m_right) = bridge_me(&rg, &rf, bridge);
    if !bridge.is_empty() {
        bridge.reverse();
        return (m_right, m_left);
    }

    let signal = bridge_ee(f, g, bridge, true);
    if !bridge.is_empty() {
        return signal;
    }

    let (m_left, m_right) = bridge_ee(&rg, &rf, bridge, false);
    if !bridge.is_empty() {
        bridge.reverse();
        return (m_right, m_left);
    }

    panic!(
        "Numerical inconsistency: no envelope bridge applies between:\n{}\n{}",
        f, g
    );
}

/// Folds the next piece `g` into the partial envelope `out`. The rightmost
/// piece is popped and bridged against `g`; while the bridge keeps touching
/// the left edge of the popped piece, earlier pieces are popped and
/// re-bridged, unwinding as deep as the geometry demands.
fn append_piece(out: &mut PieceBuffer, g: &BoundedQuadratic, bridge: &mut PieceBuffer) {
    if out.is_empty() {
        out.push(*g);
        return;
    }
    assert!(
        tol::approx_le(out.last().unwrap().ub, g.lb),
        "Pieces must be appended in left-to-right order."
    );
    let mut at_left = true;
    while !out.is_empty() && at_left {
        bridge.clear();
        let popped = out.pop();
        let (left, _right) = bridge_pair(&popped, g, bridge);
        at_left = left;
    }
    out.append(bridge);
}

/// Computes the greatest convex minorant of `f`: the pointwise largest convex
/// function below `f` on its domain. Convex inputs come back unchanged;
/// `envelope` followed by `simplify` is the canonical form.
///
/// # Example
/// ```
/// use pwq::bq::BoundedQuadratic;
/// use pwq::pwq::PiecewiseQuadratic;
/// use pwq::envelope::envelope;
/// let line = BoundedQuadratic::new(f64::NEG_INFINITY, 0., 0., 1., 0.);
/// let constant = BoundedQuadratic::new(0., 3., 0., 0., 0.);
/// let env = envelope(&PiecewiseQuadratic::new(vec![line, constant]));
/// assert_eq!(env.pieces.len(), 1);
/// // the envelope slides the line down until it props up the constant's end
/// assert!(env.pieces[0].approx(&BoundedQuadratic::new(f64::NEG_INFINITY, 3., 0., 1., -3.)));
/// ```
pub fn envelope(f: &PiecewiseQuadratic) -> PiecewiseQuadratic {
    if f.is_convex() {
        return f.clone();
    }
    let simplified = f.simplify();
    let mut out = PieceBuffer::with_capacity(2 * simplified.len());
    let mut bridge = PieceBuffer::with_capacity(3);
    for piece in &simplified.pieces {
        append_piece(&mut out, piece, &mut bridge);
    }
    PiecewiseQuadratic::new(out.as_slice().to_vec()).simplify()
}

#[cfg(test)]
mod tests {

    use super::*;
    use len_trait::Empty;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn assert_minorant_at(env: &PiecewiseQuadratic, f: &PiecewiseQuadratic, x: f64) {
        let fx = f.eval(x);
        let ex = env.eval(x);
        assert!(
            ex <= fx + 1e-9,
            "envelope exceeds the function at {}: {} > {}",
            x,
            ex,
            fx
        );
    }

    #[test]
    fn test_envelope_of_convex_is_identity() {
        let left = BoundedQuadratic::new(f64::NEG_INFINITY, 0., 0., -1., 0.);
        let right = BoundedQuadratic::new(0., f64::INFINITY, 0., 1., 0.);
        let abs = PiecewiseQuadratic::new(vec![left, right]);
        let env = envelope(&abs);
        assert_eq!(env.len(), 2);
        assert!(env.approx(&abs));
    }

    #[test]
    fn test_envelope_kinked_three_piece() {
        // constant, then a line, then a parabola whose slope dips at the join:
        // the envelope replaces the line with a flatter tangent into the
        // parabola
        let c = BoundedQuadratic::new(0., 1., 0., 0., 0.);
        let l = BoundedQuadratic::new(1., 2., 0., 1., -1.);
        let q = BoundedQuadratic::new(2., f64::INFINITY, 1., -4., 5.);
        let env = envelope(&PiecewiseQuadratic::new(vec![c, l, q]));

        let z1 = 0.8284271247461898; // 2 sqrt(2) - 2
        let z2 = 2.414213562373095; // 1 + sqrt(2)
        assert_eq!(env.len(), 3);
        assert!(env[0].approx(&c));
        assert!(env[1].approx(&BoundedQuadratic::new(1., z2, 0., z1, -z1)));
        assert!(env[2].approx(&BoundedQuadratic::new(z2, f64::INFINITY, 1., -4., 5.)));
    }

    #[test]
    fn test_envelope_nonconvex_piecewise_affine() {
        // a V whose left arm undercuts everything: the envelope collapses to
        // the constant through the lowest value
        let a = BoundedQuadratic::new(-2., -1., 0., 1., -1.);
        let b = BoundedQuadratic::new(-1., 0., 0., 2., 0.);
        let c = BoundedQuadratic::new(0., f64::INFINITY, 0., 0., 0.);
        let env = envelope(&PiecewiseQuadratic::new(vec![a, b, c]));
        assert_eq!(env.len(), 1);
        assert!(env[0].approx(&BoundedQuadratic::new(-2., f64::INFINITY, 0., 0., -3.)));
    }

    #[test]
    fn test_envelope_line_and_constant() {
        let line = BoundedQuadratic::new(f64::NEG_INFINITY, 0., 0., 1., 0.);
        let constant = BoundedQuadratic::new(0., 3., 0., 0., 0.);
        let env = envelope(&PiecewiseQuadratic::new(vec![line, constant]));
        assert_eq!(env.len(), 1);
        assert!(env[0].approx(&BoundedQuadratic::new(f64::NEG_INFINITY, 3., 0., 1., -3.)));
    }

    #[test]
    fn test_envelope_gap_to_affine_tail() {
        // two affine pieces separated by a gap, the right one extending to
        // +inf with a steeper slope: the envelope extrapolates the tail's
        // slope back from the left piece's end
        let f = PiecewiseQuadratic::new(vec![
            BoundedQuadratic::new(1., 3., 0., 1., 1.),
            BoundedQuadratic::new(4., f64::INFINITY, 0., 2., 10.),
        ]);
        let env = envelope(&f);
        assert_eq!(env.len(), 2);
        assert!(env[0].approx(&BoundedQuadratic::new(1., 3., 0., 1., 1.)));
        assert!(env[1].approx(&BoundedQuadratic::new(3., f64::INFINITY, 0., 2., -2.)));
    }

    #[test]
    fn test_envelope_chord_swallows_descending_pair() {
        let f = PiecewiseQuadratic::new(vec![
            BoundedQuadratic::new(-1., 0., 0., 1., 1.),
            BoundedQuadratic::new(1., 3., 0., -1., 1.),
        ]);
        let env = envelope(&f);
        assert_eq!(env.len(), 1);
        // chord from (-1, 0) to (3, -2)
        let chord = BoundedQuadratic::new_line_from_points((-1., 0.), (3., -2.));
        assert!(env[0].approx(&chord.restrict_dom(&Interval::new(-1., 3.))));
    }

    #[test]
    fn test_envelope_interior_tangents_between_parabolas() {
        let f = BoundedQuadratic::new(-1., 2., 1., 0., 0.);
        let g = BoundedQuadratic::new(3., 7., 1., -8., 17.);
        let env = envelope(&PiecewiseQuadratic::new(vec![f, g]));
        assert_eq!(env.len(), 3);
        // common tangent touches f at 0.125 and g at 4.125
        assert!(env[1].approx(&BoundedQuadratic::new(0.125, 4.125, 0., 0.25, -0.015625)));
        assert!(env[0].approx(&f.restrict_dom(&Interval::new(-1., 0.125))));
        assert!(env[2].approx(&g.restrict_dom(&Interval::new(4.125, 7.))));
    }

    #[test]
    fn test_envelope_tangent_into_lower_endpoint() {
        let f = BoundedQuadratic::new(-2., 1., 0.5, 0., 0.);
        let g = BoundedQuadratic::new(1.5, 4., 0., 1., -3.5);
        let env = envelope(&PiecewiseQuadratic::new(vec![f, g]));
        assert_eq!(env.len(), 3);
        assert!(env[1].approx(&BoundedQuadratic::new(-1., 1.5, 0., -1., -0.5)));
        assert!(env[2].approx(&g));
    }

    #[test]
    fn test_envelope_tangent_into_infinite_tail() {
        let f = BoundedQuadratic::new(-1., 2., 0.5, 0., 0.);
        let g = BoundedQuadratic::new(3., f64::INFINITY, 0., 1., 1.);
        let env = envelope(&PiecewiseQuadratic::new(vec![f, g]));
        assert_eq!(env.len(), 2);
        assert!(env[0].approx(&BoundedQuadratic::new(-1., 1., 0.5, 0., 0.)));
        assert!(env[1].approx(&BoundedQuadratic::new(1., f64::INFINITY, 0., 1., -0.5)));
    }

    #[test]
    fn test_envelope_mirrored_tangent_from_infinite_left() {
        let f = BoundedQuadratic::new(f64::NEG_INFINITY, -2., 0., 1., 1.);
        let g = BoundedQuadratic::new(-1., 2., 0.5, 0., 0.);
        let env = envelope(&PiecewiseQuadratic::new(vec![f, g]));
        assert_eq!(env.len(), 2);
        assert!(env[0].approx(&BoundedQuadratic::new(f64::NEG_INFINITY, 1., 0., 1., -0.5)));
        assert!(env[1].approx(&BoundedQuadratic::new(1., 2., 0.5, 0., 0.)));
    }

    #[test]
    fn test_envelope_point_against_parabola() {
        let point = BoundedQuadratic::new_point(1., 0.);
        let quad = BoundedQuadratic::new(-6., 0., 0.5, 0., 2.);
        let env = envelope(&PiecewiseQuadratic::new(vec![quad, point]));
        assert_eq!(env.len(), 2);
        assert!(env[0].p > 0.);
        assert!(env[1].is_affine());
        // the tangent ends exactly at the point
        assert!(tol::approx_eq(env[1].ub, 1.));
        assert!(tol::approx_eq(env[1].eval(1.), 0.));
    }

    #[test]
    fn test_envelope_back_pops_through_shallow_pieces() {
        // a steep descending piece appended last forces the envelope to
        // unwind into the middle of the earlier pieces
        let f = BoundedQuadratic::new(-2., -1., 0., -1., 0.);
        let g = BoundedQuadratic::new(-1., 1., 0., -0.5, 0.5);
        let h = BoundedQuadratic::new(1., 3., 1., -2., 1.);
        let steep = BoundedQuadratic::new(4., 6., 0., 2., -10.);
        let env = envelope(&PiecewiseQuadratic::new(vec![f, g, h, steep]));
        assert_eq!(env.len(), 3);
        assert!(env[0].approx(&f));
        assert!(env[1].approx(&BoundedQuadratic::new(-1., 4., 0., -0.6, 0.4)));
        assert!(env[2].approx(&steep));
    }

    #[test]
    fn test_envelope_back_pops_to_leftmost() {
        let f = BoundedQuadratic::new(-2., -1., 0., -1., 0.);
        let g = BoundedQuadratic::new(-1., 1., 0., -0.5, 0.5);
        let h = BoundedQuadratic::new(1., 3., 1., -2., 1.);
        let steep = BoundedQuadratic::new(4., 6., 0., 2., -12.);
        let env = envelope(&PiecewiseQuadratic::new(vec![f, g, h, steep]));
        assert_eq!(env.len(), 2);
        assert!(env[0].approx(&BoundedQuadratic::new(-2., 4., 0., -1., 0.)));
        assert!(env[1].approx(&steep));
    }

    #[test]
    fn test_envelope_touches_rightmost_only() {
        let f = BoundedQuadratic::new(-2., -1., 0., -1., 0.);
        let g = BoundedQuadratic::new(-1., 1., 0., -0.5, 0.5);
        let h = BoundedQuadratic::new(1., 3., 1., -2., 1.);
        let gentle = BoundedQuadratic::new(4., 6., 0., 2., -4.);
        let env = envelope(&PiecewiseQuadratic::new(vec![f, g, h, gentle]));
        assert_eq!(env.len(), 5);
        assert!(env[0].approx(&f));
        assert!(env[1].approx(&g));
        let cut = 1.7639320225002102;
        assert!(env[2].approx(&h.restrict_dom(&Interval::new(1., cut))));
        assert!(env[3].approx(&BoundedQuadratic::new(
            cut,
            4.,
            0.,
            1.5278640450004204,
            -2.111456180001682,
        )));
        assert!(env[4].approx(&gentle));
    }

    #[test]
    fn test_envelope_concave_tail_replaced_by_chord() {
        // a concave piece past a parabola contributes only its far endpoint
        let f = BoundedQuadratic::new(0., 1., 1., 0., 0.);
        let g = BoundedQuadratic::new(1., 2., -1., 0., 3.);
        let env = envelope(&PiecewiseQuadratic::new(vec![f, g]));
        assert!(env.is_convex());
        for i in 0..=20 {
            let x = 2. * (i as f64) / 20.;
            assert_minorant_at(&env, &PiecewiseQuadratic::new(vec![f, g]), x);
        }
        // the chord must pass through the far endpoint (2, g(2))
        assert!(tol::approx_eq(env.eval(2.), -1.));
    }

    #[test]
    fn test_envelope_idempotent_and_convex_fixture() {
        let pieces = PiecewiseQuadratic::new(vec![
            BoundedQuadratic::new(-3., -1., 1., 2., 0.),
            BoundedQuadratic::new(-1., 0., 0., -1., 1.),
            BoundedQuadratic::new(0., 2., 0.5, 0., 0.5),
            BoundedQuadratic::new(2., f64::INFINITY, 0., 3., -2.),
        ]);
        let env = envelope(&pieces).simplify();
        assert!(env.is_convex());
        let again = envelope(&env).simplify();
        assert!(env.approx(&again));
    }

    #[test]
    fn test_envelope_minorant_and_reflection_properties() {
        let mut rng: StdRng = SeedableRng::seed_from_u64(7);
        for _ in 0..20 {
            let n = rng.gen_range(2, 5);
            let mut pieces = Vec::with_capacity(n);
            let mut lb = rng.gen_range(-4., -2.);
            for _ in 0..n {
                let width = rng.gen_range(0.5, 2.);
                let p = rng.gen_range(0., 2.);
                let q = rng.gen_range(-2., 2.);
                let r = rng.gen_range(-1., 1.);
                pieces.push(BoundedQuadratic::new(lb, lb + width, p, q, r));
                // occasionally leave a gap
                lb += width + if rng.gen_bool(0.3) { 0.5 } else { 0. };
            }
            let f = PiecewiseQuadratic::new(pieces);
            let env = envelope(&f);

            assert!(env.is_convex(), "not convex: {}", env);

            // pointwise minorant over a dense sample of the domain hull
            let dom = f.domain();
            for i in 0..=200 {
                let x = dom.lb + (dom.ub - dom.lb) * (i as f64) / 200.;
                assert_minorant_at(&env, &f, x);
            }

            // reflecting the input reflects the envelope
            let env_of_rev = envelope(&f.reverse()).simplify();
            let rev_of_env = env.reverse().simplify();
            assert!(
                env_of_rev.approx(&rev_of_env),
                "reflection mismatch:\n{}\n{}",
                env_of_rev,
                rev_of_env
            );
        }
    }

    #[test]
    fn test_envelope_tight_production_shapes() {
        // shapes with a shared quadratic coefficient and near-degenerate
        // breakpoints, the kind the sum engine hands over
        let p = 10.351752842693296;
        let f = PiecewiseQuadratic::new(vec![
            BoundedQuadratic::new(0., 0.0013798462966265416, p, 0.016231136312524996, 0.0022444606012840007),
            BoundedQuadratic::new(0.0013798462966265416, 0.0038939730235308346, p, -0.0266067015253128, 0.0023035702331800287),
            BoundedQuadratic::new(0.0038939730235308346, 0.007191571800214606, p, -0.015345440264051541, 0.0022597191856177446),
            BoundedQuadratic::new(0.007191571800214606, 0.01161175739449285, p, -0.1976877826063939, 0.0035710472327920117),
            BoundedQuadratic::new(0.01161175739449285, 0.014897662558493346, p, -0.17219228711089843, 0.003274999724445933),
            BoundedQuadratic::new(0.014897662558493346, 0.015903313249255063, p, -0.09381390873252002, 0.0021073450914829406),
            BoundedQuadratic::new(0.015903313249255063, 0.018206954947860392, p, -0.10183192675053805, 0.0022348581436616526),
            BoundedQuadratic::new(0.018206954947860392, 0.021960604619191918, p, -0.11003012494873629, 0.0023841223689098777),
            BoundedQuadratic::new(0.021960604619191918, 1.0000000000000002, p, 0.000456361537750218, -0.000042227676583542915),
        ]);
        let env = envelope(&f);
        assert!(!env.is_empty());
        assert!(env.is_convex());
        let dom = f.domain();
        for i in 0..=100 {
            let x = dom.lb + (dom.ub - dom.lb) * (i as f64) / 100.;
            assert_minorant_at(&env, &f, x);
        }
    }

    #[test]
    fn test_envelope_point_then_tail() {
        let f = BoundedQuadratic::new(
            0.019474629474713647,
            0.019474629474713647,
            0.15297931295392428,
            -0.0004090169426131135,
            0.000003273394578839177,
        );
        let g = BoundedQuadratic::new(
            0.019474629474713647,
            f64::INFINITY,
            0.15297931295392428,
            0.0015909830573868865,
            -0.000032675864370588114,
        );
        let env = envelope(&PiecewiseQuadratic::new(vec![f, g]));
        assert_eq!(env.len(), 2);
    }

    #[test]
    fn test_envelope_jump_discontinuity_bridged() {
        let f = BoundedQuadratic::new(
            0.07224140601304432,
            0.15671202612669424,
            0.,
            -2.0921004489764066,
            0.33141385344925617,
        );
        let g = BoundedQuadratic::new(
            0.15671202612669424,
            f64::INFINITY,
            34.41902720475843,
            -7.063663429176061,
            0.510821995618197,
        );
        let env = envelope(&PiecewiseQuadratic::new(vec![f, g]));
        assert_eq!(env.len(), 3);
        assert!(env.is_convex());
    }

    #[test]
    #[should_panic(expected = "left-to-right order")]
    fn test_envelope_rejects_unordered_pieces() {
        let f = BoundedQuadratic::new(0., 2., 0., -1., 0.);
        let g = BoundedQuadratic::new(1., 3., 0., 1., 0.);
        envelope(&PiecewiseQuadratic::new(vec![f, g]));
    }
}
