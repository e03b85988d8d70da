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

//! Streaming sketches for rank and quantile estimation.
//!
//! The crate currently provides one sketch family:
//!
//! - [`req`]: a relative-error quantiles sketch built on a hierarchy of
//!   compactors. Rank estimates carry error proportional to the true rank of
//!   the queried item rather than uniform additive error over the stream.
//!
//! # Usage
//!
//! ```rust
//! # use streamsketches::req::ReqSketch;
//! let mut sketch = ReqSketch::<i64>::new(16, 1024).unwrap();
//! for i in 1..=100 {
//!     sketch.insert(i).unwrap();
//! }
//! sketch.close().unwrap();
//! assert_eq!(sketch.total_weight(), 100.0);
//! ```

pub mod common;
pub mod error;
pub mod req;

pub(crate) mod codec;
