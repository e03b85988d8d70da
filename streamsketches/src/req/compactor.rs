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

use super::sketch::ReqItem;
use crate::common::RandomSource;

/// One level of the compaction hierarchy.
///
/// The buffer accepts items until it reaches `max_buffer_size`. A full buffer
/// is compacted before the next append: a schedule-driven number of `k`-item
/// sections is taken from the sorted tail, one of the two parity cosets of the
/// tail is kept for promotion to the next level, and the other is discarded.
/// Each promoted item stands in for one adjacent pair of the sorted tail,
/// which is why promoted items carry twice the weight one level up.
#[derive(Debug, Clone)]
pub(crate) struct Compactor<T> {
    k: u64,
    h: u64,
    max_buffer_size: usize,
    c: u64,
    buffer: Vec<T>,
}

impl<T: ReqItem> Compactor<T> {
    pub fn new(k: u64, n: u64, h: u64) -> Self {
        Self {
            k,
            h,
            max_buffer_size: max_buffer_size(k, n),
            c: 0,
            buffer: Vec::new(),
        }
    }

    /// Rebuilds a compactor from persisted state. `max_buffer_size` is
    /// re-derived from `(k, n)`.
    pub fn from_parts(k: u64, n: u64, h: u64, c: u64, buffer: Vec<T>) -> Self {
        let max_buffer_size = max_buffer_size(k, n);
        debug_assert!(buffer.len() <= max_buffer_size);
        Self {
            k,
            h,
            max_buffer_size,
            c,
            buffer,
        }
    }

    pub fn level(&self) -> u64 {
        self.h
    }

    pub fn schedule(&self) -> u64 {
        self.c
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn max_buffer_size(&self) -> usize {
        self.max_buffer_size
    }

    pub fn items(&self) -> &[T] {
        &self.buffer
    }

    /// Appends one item, compacting first if the buffer is full. Returns the
    /// items promoted to the next level (usually none).
    pub fn insert(&mut self, item: T, random: &mut dyn RandomSource) -> Vec<T> {
        let mut promoted = Vec::new();
        if self.buffer.len() == self.max_buffer_size {
            promoted = self.compact(random);
        }
        self.buffer.push(item);
        promoted
    }

    fn compact(&mut self, random: &mut dyn RandomSource) -> Vec<T> {
        let sections_to_compact = u64::from(self.c.trailing_ones()) + 1;
        // The odometer schedule can prescribe more sections than the buffer
        // holds; the cap compacts everything and is not an error.
        let elements_to_compact =
            ((sections_to_compact * self.k) as usize).min(self.max_buffer_size);
        let split = self.max_buffer_size - elements_to_compact;

        // Only the tail needs to be in order: adjacent sorted positions are
        // the units of coset selection. Items below the split stay unordered.
        if split > 0 {
            self.buffer.select_nth_unstable_by(split, T::cmp);
        }
        self.buffer[split..].sort_unstable_by(T::cmp);

        let parity = coset_start(split, random.next_bool()) - split;
        let tail = self.buffer.split_off(split);
        let promoted: Vec<T> = tail
            .into_iter()
            .enumerate()
            .filter_map(|(idx, item)| if idx % 2 == parity { Some(item) } else { None })
            .collect();

        // Release the tail's backing storage so the buffer regrows from the
        // post-compaction length instead of holding peak capacity.
        self.buffer.shrink_to_fit();
        self.c += 1;
        promoted
    }

    #[cfg(test)]
    pub fn set_schedule(&mut self, c: u64) {
        self.c = c;
    }
}

/// First absolute index of the coset selected by the coin.
///
/// An `even` coin selects the even-indexed absolute positions of the tail,
/// an odd coin the odd-indexed ones. The start adjusts for the parity of
/// `split` so that both cosets are reachable with probability one half.
fn coset_start(split: usize, even: bool) -> usize {
    if (split % 2 == 0) == even {
        split
    } else {
        split + 1
    }
}

/// Shared buffer capacity for every compactor of a sketch: `2 * k * m` with
/// `m = ceil(log2(n / k))`, floored at one.
pub(crate) fn max_buffer_size(k: u64, n: u64) -> usize {
    (2 * k * growth_exponent(k, n)) as usize
}

fn growth_exponent(k: u64, n: u64) -> u64 {
    let ratio = n.div_ceil(k);
    u64::from(ratio.next_power_of_two().trailing_zeros()).max(1)
}
