// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Relative-error quantiles sketch.
//!
//! The sketch summarises an unbounded stream of comparable items in bounded
//! memory. It maintains a hierarchy of compactors: each level buffers items
//! and, on overflow, promotes a randomly chosen half of its sorted tail one
//! level up with doubled weight. Rank and quantile queries run against a
//! weighted linearisation of the hierarchy built by [`ReqSketch::close`],
//! and their error scales with the true rank of the queried item rather
//! than with the stream length.
//!
//! The number of sections compacted at each overflow follows a binary
//! odometer driven by a per-level schedule counter: every second overflow
//! compacts one section, every fourth two, every eighth three, and so on.
//!
//! # References
//!
//! - Cormode, Karnin, Liberty, Thaler, Veselý, "Relative Error Streaming
//!   Quantiles".
//!
//! # Usage
//!
//! ```rust
//! # use streamsketches::req::ReqSketch;
//! let mut sketch = ReqSketch::<i64>::new(4, 100).unwrap();
//! for i in 1..=100 {
//!     sketch.insert(i).unwrap();
//! }
//! sketch.close().unwrap();
//! assert_eq!(sketch.total_weight(), 100.0);
//! let median = &sketch.quantiles(2)[0];
//! assert_eq!(median.quantile_index, 1);
//! ```

mod compactor;
mod serialization;
mod sketch;
mod sorted_view;

pub use self::sketch::ReqSketch;
pub use self::sorted_view::Quantile;
pub use self::sorted_view::WeightedElement;
