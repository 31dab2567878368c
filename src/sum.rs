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
use crate::pwq::PiecewiseQuadratic;
use len_trait::{Empty, Len};
use std::f64;
use std::ops::Add;

/// Preallocated per-input state for the merge-sum sweep: the active piece of
/// each input, its index, whether the input still has pieces left, and which
/// inputs step at the current breakpoint. Reusable across calls with the same
/// input count.
pub struct SumWorkspace {
    /// The cross section of pieces currently under the sweep line.
    pub active: Vec<BoundedQuadratic>,
    /// The index of each active piece within its input.
    pub cursor: Vec<usize>,
    /// Whether each input still has unvisited pieces.
    pub alive: Vec<bool>,
    /// Which inputs advance at the current minimal upper bound.
    pub step: Vec<bool>,
    /// The number of inputs this workspace accommodates.
    pub capacity: usize,
}

impl SumWorkspace {
    pub fn new(capacity: usize) -> SumWorkspace {
        SumWorkspace {
            active: vec![BoundedQuadratic::new_point(0., 0.); capacity],
            cursor: vec![0; capacity],
            alive: vec![false; capacity],
            step: vec![false; capacity],
            capacity,
        }
    }
}

/// Sums `fs` by sweeping their shared breakpoint schedule left to right. On
/// each subinterval where every input is defined, the output receives a piece
/// with the intersected domain and the summed coefficients; subintervals where
/// any input is undefined are skipped, so inputs with disjoint domains produce
/// an empty result.
///
/// The output is not re-simplified: abutting inputs leave zero-width residue
/// pieces that `simplify` removes.
///
/// # Panics
/// * If `fs` is empty, or the workspace capacity does not match its length.
///
/// # Example
/// ```
/// use pwq::bq::BoundedQuadratic;
/// use pwq::pwq::PiecewiseQuadratic;
/// use pwq::sum::{sum_pwq, SumWorkspace};
/// let f = PiecewiseQuadratic::indicator(0., 2.);
/// let g = PiecewiseQuadratic::new(vec![BoundedQuadratic::new(1., 3., 1., 0., 0.)]);
/// let mut work = SumWorkspace::new(2);
/// let s = sum_pwq(&mut work, &[&f, &g]);
/// assert_eq!(s.pieces.len(), 1);
/// assert!(s.pieces[0].approx(&BoundedQuadratic::new(1., 2., 1., 0., 0.)));
/// ```
#[allow(clippy::float_cmp)]
pub fn sum_pwq(work: &mut SumWorkspace, fs: &[&PiecewiseQuadratic]) -> PiecewiseQuadratic {
    let k = fs.len();
    assert!(k > 0, "Can't sum an empty collection of functions.");
    assert_eq!(
        work.capacity, k,
        "Workspace capacity must match the number of functions."
    );
    // an input with no pieces is +inf everywhere, so the sum has no domain
    if fs.iter().any(|f| f.is_empty()) {
        return PiecewiseQuadratic::new(vec![]);
    }

    for i in 0..k {
        work.active[i] = fs[i][0];
        work.cursor[i] = 0;
        work.alive[i] = true;
    }

    let mut out = PiecewiseQuadratic::with_capacity(fs.iter().map(|f| f.len()).sum());
    loop {
        // once any input is exhausted there is no joint domain left, so the
        // remaining sweep only drains cursors
        if work.alive[..k].iter().all(|&alive| alive) {
            if let Some(piece) = BoundedQuadratic::sum(&work.active[..k]) {
                out.push(piece, false);
            }
        }

        let mut min_ub = f64::INFINITY;
        let mut any_alive = false;
        for i in 0..k {
            if work.alive[i] {
                any_alive = true;
                min_ub = f64::min(min_ub, work.active[i].ub);
            }
        }
        if !any_alive {
            break;
        }

        // every input whose active piece ends exactly at the minimal upper
        // bound steps together; exact equality keeps shared breakpoints in
        // lockstep
        for i in 0..k {
            work.step[i] = work.alive[i] && work.active[i].ub == min_ub;
        }
        for i in 0..k {
            if work.step[i] {
                work.cursor[i] += 1;
                if work.cursor[i] == fs[i].len() {
                    work.alive[i] = false;
                } else {
                    work.active[i] = fs[i][work.cursor[i]];
                }
            }
        }
    }
    out
}

/// Sums `fs` with a freshly allocated workspace. See `sum_pwq`.
pub fn sum(fs: &[&PiecewiseQuadratic]) -> PiecewiseQuadratic {
    let mut work = SumWorkspace::new(fs.len());
    sum_pwq(&mut work, fs)
}

impl Add for PiecewiseQuadratic {
    type Output = PiecewiseQuadratic;

    fn add(self, other: PiecewiseQuadratic) -> PiecewiseQuadratic {
        sum(&[&self, &other])
    }
}

impl Add<BoundedQuadratic> for PiecewiseQuadratic {
    type Output = PiecewiseQuadratic;

    fn add(self, other: BoundedQuadratic) -> PiecewiseQuadratic {
        self + PiecewiseQuadratic::new(vec![other])
    }
}
