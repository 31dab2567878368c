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

//! Univariate piecewise-quadratic functions: bounded quadratic pieces,
//! ordered piece lists, merge-sums, greatest convex minorants, and
//! proximal operators. All computation is `f64` with a single shared
//! tolerance (see [`tol`]).

#[macro_use]
extern crate approx;

pub mod bq;
pub mod buffer;
pub mod envelope;
pub mod interval;
pub mod plot;
pub mod prox;
pub mod pwq;
pub mod sum;
pub mod tol;
