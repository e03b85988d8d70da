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

use super::compactor::Compactor;
use super::sketch::ReqItem;

/// One surviving item and its contribution to the estimated distribution.
///
/// Items from level `h` carry weight `2^h`. Equal items from different levels
/// are retained as separate entries with their own weights.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedElement<T> {
    item: T,
    weight: f64,
    cumulative_weight: f64,
}

impl<T> WeightedElement<T> {
    /// The retained item.
    pub fn item(&self) -> &T {
        &self.item
    }

    /// The weight of this entry.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Sum of weights up to and including this entry.
    pub fn cumulative_weight(&self) -> f64 {
        self.cumulative_weight
    }
}

/// Boundary point of an approximately equi-weight partition of the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantile<T> {
    /// One-based index of the boundary, strictly increasing across the result.
    pub quantile_index: u32,
    /// The item at which the boundary was crossed.
    pub item: T,
    /// Cumulative weight up to and including `item`.
    pub cumulative_weight: f64,
}

/// Weighted linearisation of a closed sketch, ascending by item.
#[derive(Debug, Clone)]
pub(crate) struct WeightedView<T> {
    elements: Vec<WeightedElement<T>>,
    total_weight: f64,
}

impl<T: ReqItem> WeightedView<T> {
    pub fn build(compactors: &[Compactor<T>]) -> Self {
        let num_retained: usize = compactors.iter().map(|compactor| compactor.len()).sum();
        let mut elements = Vec::with_capacity(num_retained);

        for compactor in compactors {
            let weight = (1u64 << compactor.level()) as f64;
            for item in compactor.items() {
                elements.push(WeightedElement {
                    item: item.clone(),
                    weight,
                    cumulative_weight: 0.0,
                });
            }
        }

        // Stable, so equal items keep their level order.
        elements.sort_by(|a, b| T::cmp(&a.item, &b.item));
        let mut total_weight = 0.0;
        for element in &mut elements {
            total_weight += element.weight;
            element.cumulative_weight = total_weight;
        }

        Self {
            elements,
            total_weight,
        }
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    pub fn elements(&self) -> &[WeightedElement<T>] {
        &self.elements
    }

    /// Estimated number of inserted values strictly less than `item`.
    pub fn estimate_rank(&self, item: &T) -> f64 {
        let idx = lower_bound(&self.elements, item);
        if idx == 0 {
            return 0.0;
        }
        self.elements[idx - 1].cumulative_weight
    }

    /// Walks the linearisation once, emitting a boundary whenever the running
    /// weight fraction crosses the next multiple of `1 / q`.
    pub fn quantiles(&self, q: u32) -> Vec<Quantile<T>> {
        let mut quantiles = Vec::with_capacity(q.saturating_sub(1) as usize);
        let mut next = 1u32;
        for element in &self.elements {
            if next == q {
                break;
            }
            if element.cumulative_weight / self.total_weight >= f64::from(next) / f64::from(q) {
                quantiles.push(Quantile {
                    quantile_index: next,
                    item: element.item.clone(),
                    cumulative_weight: element.cumulative_weight,
                });
                next += 1;
            }
        }
        quantiles
    }
}

fn lower_bound<T: ReqItem>(elements: &[WeightedElement<T>], item: &T) -> usize {
    let mut left = 0usize;
    let mut right = elements.len();
    while left < right {
        let mid = left + (right - left) / 2;
        if T::cmp(&elements[mid].item, item) == Ordering::Less {
            left = mid + 1;
        } else {
            right = mid;
        }
    }
    left
}
