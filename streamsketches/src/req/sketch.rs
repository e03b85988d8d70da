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

use std::cmp::Ordering;
use std::fmt;

use super::compactor::Compactor;
use super::serialization;
use super::sorted_view::Quantile;
use super::sorted_view::WeightedElement;
use super::sorted_view::WeightedView;
use crate::codec::SketchReader;
use crate::codec::SketchWriter;
use crate::common::RandomSource;
use crate::common::XorShift64;
use crate::error::Error;

/// Trait implemented by item types supported by [`ReqSketch`].
pub(crate) trait ReqItem: Clone {
    /// Compare two items under a total order.
    fn cmp(a: &Self, b: &Self) -> Ordering;

    /// Returns true if the item is NaN.
    fn is_nan(_value: &Self) -> bool {
        false
    }

    /// Serialized size in bytes.
    fn serialized_size(value: &Self) -> usize;

    /// Serialize a single item into the buffer.
    fn serialize(value: &Self, bytes: &mut SketchWriter);

    /// Deserialize a single item from the input.
    fn deserialize(input: &mut SketchReader<'_>) -> Result<Self, Error>;
}

/// Relative-error quantiles sketch.
///
/// See the [req module level documentation](crate::req) for more.
#[allow(private_bounds)]
pub struct ReqSketch<T: ReqItem> {
    k: u64,
    n: u64,
    compactors: Vec<Compactor<T>>,
    view: Option<WeightedView<T>>,
    random: Box<dyn RandomSource>,
}

#[allow(private_bounds)]
impl<T: ReqItem> ReqSketch<T> {
    /// Creates a new sketch with section size `k` and stream-length hint `n`.
    ///
    /// `k` must be a positive even integer and `n` at least `k`. The hint
    /// sizes the per-level buffers; exceeding it during ingestion is fine.
    pub fn new(k: u64, n: u64) -> Result<Self, Error> {
        Self::with_random_source(k, n, Box::new(XorShift64::default()))
    }

    /// Creates a new sketch drawing its compaction coin flips from `random`.
    ///
    /// With a deterministic source, repeated runs over the same input produce
    /// bit-identical sketches.
    pub fn with_random_source(
        k: u64,
        n: u64,
        random: Box<dyn RandomSource>,
    ) -> Result<Self, Error> {
        validate_config(k, n)?;
        Ok(Self {
            k,
            n,
            compactors: vec![Compactor::new(k, n, 0)],
            view: None,
            random,
        })
    }

    /// Returns the configured section size.
    pub fn k(&self) -> u64 {
        self.k
    }

    /// Returns the configured stream-length hint.
    pub fn n(&self) -> u64 {
        self.n
    }

    /// Returns the highest allocated hierarchy level.
    pub fn depth(&self) -> u64 {
        (self.compactors.len() - 1) as u64
    }

    /// Returns the number of hierarchy levels.
    pub fn num_levels(&self) -> usize {
        self.compactors.len()
    }

    /// Returns the number of retained items across all levels.
    pub fn num_retained(&self) -> usize {
        self.compactors.iter().map(Compactor::len).sum()
    }

    /// Returns true if the sketch retains no items.
    pub fn is_empty(&self) -> bool {
        self.num_retained() == 0
    }

    /// Returns true once [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.view.is_some()
    }

    /// Ingests one item from the stream.
    ///
    /// NaN values are ignored for floating-point types.
    pub fn insert(&mut self, item: T) -> Result<(), Error> {
        self.insert_at_level(item, 0)
    }

    /// Inserts `item` at hierarchy level `h`.
    ///
    /// Level `depth() + 1` is created on demand; any higher target is an
    /// [`InvalidLevel`](crate::error::ErrorKind::InvalidLevel) error, since
    /// levels are kept dense.
    pub fn insert_at_level(&mut self, item: T, h: u64) -> Result<(), Error> {
        if self.view.is_some() {
            return Err(Error::closed("insert"));
        }
        if T::is_nan(&item) {
            return Ok(());
        }
        self.insert_inner(item, h)
    }

    fn insert_inner(&mut self, item: T, h: u64) -> Result<(), Error> {
        let num_levels = self.compactors.len() as u64;
        if h > num_levels {
            return Err(Error::invalid_level(h, num_levels));
        }
        if h == num_levels {
            self.compactors.push(Compactor::new(self.k, self.n, h));
        }

        let random = self.random.as_mut();
        let promoted = self.compactors[h as usize].insert(item, random);
        for item in promoted {
            self.insert_inner(item, h + 1)?;
        }
        Ok(())
    }

    /// Finalises the sketch: items in level `h` are assigned weight `2^h` and
    /// linearised into a weighted sequence sorted by item.
    ///
    /// After closing, only queries are valid; a second close is an error.
    pub fn close(&mut self) -> Result<(), Error> {
        if self.view.is_some() {
            return Err(Error::closed("close"));
        }
        self.view = Some(WeightedView::build(&self.compactors));
        Ok(())
    }

    /// Returns the estimated number of inserted values strictly less than
    /// `item`.
    ///
    /// The result lies in `[0, total_weight]` and is monotone in the query.
    /// Before [`close`](Self::close) the estimate is `0.0`.
    pub fn estimate_rank(&self, item: &T) -> f64 {
        self.view
            .as_ref()
            .map_or(0.0, |view| view.estimate_rank(item))
    }

    /// Returns up to `q - 1` boundary items partitioning the stream into
    /// approximately equi-weight buckets.
    ///
    /// Before [`close`](Self::close) the result is empty.
    ///
    /// # Panics
    ///
    /// Panics if `q < 2`.
    pub fn quantiles(&self, q: u32) -> Vec<Quantile<T>> {
        assert!(q >= 2, "q must be at least 2, got {q}");
        self.view.as_ref().map_or_else(Vec::new, |view| view.quantiles(q))
    }

    /// Returns the sum of weights of the linearisation, equal to the number
    /// of inserted items. `0.0` before [`close`](Self::close).
    pub fn total_weight(&self) -> f64 {
        self.view.as_ref().map_or(0.0, WeightedView::total_weight)
    }

    /// Returns the weighted linearisation, ascending by item. Empty before
    /// [`close`](Self::close).
    pub fn weighted_elements(&self) -> &[WeightedElement<T>] {
        self.view.as_ref().map_or(&[], WeightedView::elements)
    }

    /// Serializes the ingest state to bytes.
    ///
    /// The weighted linearisation is not part of the format; call
    /// [`close`](Self::close) again after reloading.
    pub fn serialize(&self) -> Vec<u8> {
        serialization::serialize(self.k, self.n, &self.compactors)
    }

    /// Deserializes a sketch from bytes. The restored sketch is open and
    /// accepts further inserts.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        let decoded = serialization::deserialize::<T>(bytes)?;
        let mut compactors = Vec::with_capacity(decoded.levels.len());
        for (h, level) in decoded.levels.into_iter().enumerate() {
            compactors.push(Compactor::from_parts(
                decoded.k,
                decoded.n,
                h as u64,
                level.c,
                level.buffer,
            ));
        }
        Ok(Self {
            k: decoded.k,
            n: decoded.n,
            compactors,
            view: None,
            random: Box::new(XorShift64::default()),
        })
    }
}

impl<T: ReqItem + fmt::Debug> fmt::Debug for ReqSketch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqSketch")
            .field("k", &self.k)
            .field("n", &self.n)
            .field("depth", &self.depth())
            .field("num_retained", &self.num_retained())
            .field("closed", &self.is_closed())
            .finish()
    }
}

pub(super) fn validate_config(k: u64, n: u64) -> Result<(), Error> {
    if k == 0 || k % 2 != 0 {
        return Err(Error::config_invalid(format!(
            "k must be a positive even integer, got {k}"
        )));
    }
    if n < k {
        return Err(Error::config_invalid(format!(
            "n must be at least k, got n {n} with k {k}"
        )));
    }
    Ok(())
}

impl ReqItem for f32 {
    fn cmp(a: &Self, b: &Self) -> Ordering {
        a.partial_cmp(b).unwrap_or(Ordering::Greater)
    }

    fn is_nan(value: &Self) -> bool {
        value.is_nan()
    }

    fn serialized_size(_value: &Self) -> usize {
        4
    }

    fn serialize(value: &Self, bytes: &mut SketchWriter) {
        bytes.write_f32_le(*value);
    }

    fn deserialize(input: &mut SketchReader<'_>) -> Result<Self, Error> {
        input
            .read_f32_le()
            .map_err(|_| Error::insufficient_data("f32"))
    }
}

impl ReqItem for f64 {
    fn cmp(a: &Self, b: &Self) -> Ordering {
        a.partial_cmp(b).unwrap_or(Ordering::Greater)
    }

    fn is_nan(value: &Self) -> bool {
        value.is_nan()
    }

    fn serialized_size(_value: &Self) -> usize {
        8
    }

    fn serialize(value: &Self, bytes: &mut SketchWriter) {
        bytes.write_f64_le(*value);
    }

    fn deserialize(input: &mut SketchReader<'_>) -> Result<Self, Error> {
        input
            .read_f64_le()
            .map_err(|_| Error::insufficient_data("f64"))
    }
}

impl ReqItem for i64 {
    fn cmp(a: &Self, b: &Self) -> Ordering {
        a.cmp(b)
    }

    fn serialized_size(_value: &Self) -> usize {
        8
    }

    fn serialize(value: &Self, bytes: &mut SketchWriter) {
        bytes.write_i64_le(*value);
    }

    fn deserialize(input: &mut SketchReader<'_>) -> Result<Self, Error> {
        input
            .read_i64_le()
            .map_err(|_| Error::insufficient_data("i64"))
    }
}

impl ReqItem for u64 {
    fn cmp(a: &Self, b: &Self) -> Ordering {
        a.cmp(b)
    }

    fn serialized_size(_value: &Self) -> usize {
        8
    }

    fn serialize(value: &Self, bytes: &mut SketchWriter) {
        bytes.write_u64_le(*value);
    }

    fn deserialize(input: &mut SketchReader<'_>) -> Result<Self, Error> {
        input
            .read_u64_le()
            .map_err(|_| Error::insufficient_data("u64"))
    }
}

impl ReqItem for String {
    fn cmp(a: &Self, b: &Self) -> Ordering {
        a.cmp(b)
    }

    fn serialized_size(value: &Self) -> usize {
        4 + value.len()
    }

    fn serialize(value: &Self, bytes: &mut SketchWriter) {
        bytes.write_u32_le(value.len() as u32);
        bytes.write(value.as_bytes());
    }

    fn deserialize(input: &mut SketchReader<'_>) -> Result<Self, Error> {
        let len = input
            .read_u32_le()
            .map_err(|_| Error::insufficient_data("string_len"))? as usize;
        let mut buf = vec![0u8; len];
        input
            .read_exact(&mut buf)
            .map_err(|_| Error::insufficient_data("string_bytes"))?;
        String::from_utf8(buf).map_err(|_| Error::deserial("invalid utf-8 string"))
    }
}
