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

use std::f64;

/// The absolute tolerance governing every approximate comparison in the crate.
pub const EPS: f64 = 1e-12;

/// Approximate equality: exact equality (covers `±inf == ±inf`) or within `EPS`.
#[allow(clippy::float_cmp)]
pub fn approx_eq(x: f64, y: f64) -> bool {
    x == y || abs_diff_eq!(x, y, epsilon = EPS)
}

pub fn approx_le(x: f64, y: f64) -> bool {
    x <= y + EPS
}

pub fn approx_ge(x: f64, y: f64) -> bool {
    approx_le(y, x)
}

/// `x > y` by more than `EPS`.
pub fn gt_eps(x: f64, y: f64) -> bool {
    x - y > EPS
}

/// `x < y` by more than `EPS`.
pub fn lt_eps(x: f64, y: f64) -> bool {
    gt_eps(y, x)
}

pub fn clip(x: f64, lb: f64, ub: f64) -> f64 {
    f64::min(f64::max(x, lb), ub)
}

/// Returns an unordered pair of roots of `a x^2 + b x + c = 0`. Absent
/// roots come back as NaN:
///
/// * `a == 0 && b == 0` yields `(NaN, NaN)`;
/// * `a == 0` yields the single root `(-c / b, NaN)`;
/// * a discriminant below `-EPS` yields `(NaN, NaN)`; a slightly negative
///   one is treated as zero.
///
/// The two roots are paired in the numerically stable way: the larger-
/// magnitude numerator is divided out first and the second root is
/// recovered as `2c` over that numerator, so neither root suffers
/// catastrophic cancellation.
pub fn solve_quad(a: f64, b: f64, c: f64) -> (f64, f64) {
    if a == 0. && b == 0. {
        return (f64::NAN, f64::NAN);
    }
    if a == 0. {
        return (-c / b, f64::NAN);
    }
    let discriminant = b * b - 4. * a * c;
    if discriminant < -EPS {
        return (f64::NAN, f64::NAN);
    }
    let sqrt_discriminant = f64::max(discriminant, 0.).sqrt();
    let numerator = if b > 0. {
        -b - sqrt_discriminant
    } else {
        -b + sqrt_discriminant
    };
    (numerator / (2. * a), 2. * c / numerator)
}
