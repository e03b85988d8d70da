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

use googletest::assert_that;
use googletest::prelude::near;
use streamsketches::common::XorShift64;
use streamsketches::error::ErrorKind;
use streamsketches::req::ReqSketch;

fn seeded_sketch(k: u64, n: u64, seed: u64) -> ReqSketch<i64> {
    ReqSketch::with_random_source(k, n, Box::new(XorShift64::seeded(seed))).unwrap()
}

#[test]
fn test_invalid_config() {
    assert_eq!(
        ReqSketch::<i64>::new(0, 100).unwrap_err().kind(),
        ErrorKind::ConfigInvalid
    );
    assert_eq!(
        ReqSketch::<i64>::new(3, 100).unwrap_err().kind(),
        ErrorKind::ConfigInvalid
    );
    assert_eq!(
        ReqSketch::<i64>::new(16, 8).unwrap_err().kind(),
        ErrorKind::ConfigInvalid
    );
}

#[test]
fn test_initial_state() {
    let sketch = ReqSketch::<i64>::new(2, 8).unwrap();
    assert_eq!(sketch.k(), 2);
    assert_eq!(sketch.n(), 8);
    assert_eq!(sketch.depth(), 0);
    assert_eq!(sketch.num_levels(), 1);
    assert_eq!(sketch.total_weight(), 0.0);
    assert!(sketch.is_empty());
    assert!(!sketch.is_closed());
}

#[test]
fn test_insert_under_capacity() {
    let mut sketch = ReqSketch::<i64>::new(16, 1024).unwrap();
    for i in [1, 2, 3] {
        sketch.insert(i).unwrap();
    }
    assert_eq!(sketch.depth(), 0);
    assert_eq!(sketch.num_retained(), 3);
    // Weights only exist once the sketch is closed.
    assert_eq!(sketch.total_weight(), 0.0);
}

#[test]
fn test_explicit_level_creates_compactor() {
    let mut sketch = ReqSketch::<String>::new(2, 8).unwrap();
    sketch.insert("a".to_string()).unwrap();
    sketch.insert("b".to_string()).unwrap();
    sketch.insert("c".to_string()).unwrap();
    assert_eq!(sketch.depth(), 0);

    sketch.insert_at_level("d".to_string(), 1).unwrap();
    assert_eq!(sketch.depth(), 1);
    assert_eq!(sketch.num_levels(), 2);
}

#[test]
fn test_skipping_levels_is_rejected() {
    let mut sketch = ReqSketch::<i64>::new(2, 8).unwrap();
    let err = sketch.insert_at_level(1, 5).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidLevel);
    // No gap was created.
    assert_eq!(sketch.depth(), 0);
}

#[test]
fn test_promotion_creates_level() {
    let mut sketch = seeded_sketch(2, 8, 11);
    // The buffer holds eight items; the ninth insert forces a compaction
    // whose promoted item lands on a freshly created level one.
    for i in 0..=8 {
        sketch.insert(i).unwrap();
    }
    assert_eq!(sketch.depth(), 1);
    assert_eq!(sketch.num_retained(), 8);
}

#[test]
fn test_weight_is_conserved_exactly() {
    let mut sketch = seeded_sketch(4, 100, 5);
    for i in 1..=100 {
        sketch.insert(i).unwrap();
    }
    sketch.close().unwrap();
    assert_eq!(sketch.total_weight(), 100.0);
}

#[test]
fn test_rank_and_median_window() {
    let mut sketch = seeded_sketch(4, 100, 17);
    for i in 1..=100 {
        sketch.insert(i).unwrap();
    }
    sketch.close().unwrap();
    assert_eq!(sketch.total_weight(), 100.0);

    let rank = sketch.estimate_rank(&51);
    assert_that!(rank, near(50.0, 15.0));

    let quantiles = sketch.quantiles(2);
    assert_eq!(quantiles.len(), 1);
    assert_eq!(quantiles[0].quantile_index, 1);
    assert!(quantiles[0].item >= 35 && quantiles[0].item <= 65);
}

#[test]
fn test_deep_hierarchy() {
    let mut sketch = seeded_sketch(2, 8, 23);
    for i in 1..=1000 {
        sketch.insert(i).unwrap();
    }
    assert!(sketch.depth() > 1);

    sketch.close().unwrap();
    assert_eq!(sketch.total_weight(), 1000.0);
}

#[test]
fn test_close_twice_is_rejected() {
    let mut sketch = ReqSketch::<i64>::new(2, 8).unwrap();
    sketch.insert(1).unwrap();
    sketch.close().unwrap();
    let err = sketch.close().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SketchClosed);
}

#[test]
fn test_insert_after_close_is_rejected() {
    let mut sketch = ReqSketch::<i64>::new(2, 8).unwrap();
    sketch.insert(1).unwrap();
    sketch.close().unwrap();
    let err = sketch.insert(2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SketchClosed);
}

#[test]
fn test_queries_before_close_are_empty() {
    let mut sketch = ReqSketch::<i64>::new(2, 8).unwrap();
    sketch.insert(1).unwrap();
    assert_eq!(sketch.estimate_rank(&10), 0.0);
    assert!(sketch.quantiles(4).is_empty());
    assert_eq!(sketch.total_weight(), 0.0);
    assert!(sketch.weighted_elements().is_empty());
}

#[test]
#[should_panic(expected = "q must be at least 2")]
fn test_quantiles_q_too_small_panics() {
    let mut sketch = ReqSketch::<i64>::new(2, 8).unwrap();
    sketch.insert(1).unwrap();
    sketch.close().unwrap();
    let _ = sketch.quantiles(1);
}

#[test]
fn test_rank_excludes_equal_items() {
    let mut sketch = ReqSketch::<i64>::new(16, 1024).unwrap();
    for i in [1, 2, 2, 2, 3] {
        sketch.insert(i).unwrap();
    }
    sketch.close().unwrap();
    assert_eq!(sketch.estimate_rank(&0), 0.0);
    assert_eq!(sketch.estimate_rank(&1), 0.0);
    assert_eq!(sketch.estimate_rank(&2), 1.0);
    assert_eq!(sketch.estimate_rank(&3), 4.0);
    assert_eq!(sketch.estimate_rank(&4), 5.0);
}

#[test]
fn test_linearisation_is_sorted() {
    let mut sketch = seeded_sketch(2, 8, 31);
    for i in 0..300 {
        sketch.insert((i * 37) % 100).unwrap();
    }
    sketch.close().unwrap();

    let elements = sketch.weighted_elements();
    assert!(!elements.is_empty());
    for pair in elements.windows(2) {
        assert!(pair[0].item() <= pair[1].item());
        assert!(pair[0].cumulative_weight() < pair[1].cumulative_weight());
    }
    let last = elements.last().unwrap();
    assert_eq!(last.cumulative_weight(), sketch.total_weight());
}

#[test]
fn test_rank_is_monotone() {
    let mut sketch = seeded_sketch(8, 1000, 41);
    for i in 0..1000u64 {
        sketch.insert((i.wrapping_mul(2654435761) % 1000) as i64).unwrap();
    }
    sketch.close().unwrap();

    let total = sketch.total_weight();
    let mut previous = 0.0;
    for probe in (0..=1000).step_by(10) {
        let rank = sketch.estimate_rank(&probe);
        assert!(rank >= previous, "rank regressed at probe {probe}");
        assert!(rank >= 0.0 && rank <= total);
        previous = rank;
    }
}

#[test]
fn test_quantiles_are_monotone() {
    let mut sketch = seeded_sketch(4, 500, 43);
    for i in 1..=500 {
        sketch.insert(i).unwrap();
    }
    sketch.close().unwrap();

    let quantiles = sketch.quantiles(10);
    assert_eq!(quantiles.len(), 9);
    for pair in quantiles.windows(2) {
        assert!(pair[0].quantile_index < pair[1].quantile_index);
        assert!(pair[0].item <= pair[1].item);
        assert!(pair[0].cumulative_weight < pair[1].cumulative_weight);
    }
    for quantile in &quantiles {
        assert!(quantile.cumulative_weight <= sketch.total_weight());
    }
}

#[test]
fn test_fixed_coin_runs_are_identical() {
    let mut first = seeded_sketch(2, 8, 99);
    let mut second = seeded_sketch(2, 8, 99);
    for i in 0..500 {
        first.insert(i).unwrap();
        second.insert(i).unwrap();
    }
    assert_eq!(first.serialize(), second.serialize());

    first.close().unwrap();
    second.close().unwrap();
    assert_eq!(first.weighted_elements(), second.weighted_elements());
    for probe in [0, 100, 250, 499] {
        assert_eq!(first.estimate_rank(&probe), second.estimate_rank(&probe));
    }
}

#[test]
fn test_nan_inputs_are_ignored() {
    let mut sketch = ReqSketch::<f64>::new(16, 1024).unwrap();
    sketch.insert(f64::NAN).unwrap();
    assert!(sketch.is_empty());

    sketch.insert(1.0).unwrap();
    sketch.insert(f64::NAN).unwrap();
    sketch.close().unwrap();
    assert_eq!(sketch.total_weight(), 1.0);
}

#[test]
fn test_rank_error_stays_proportional() {
    let mut sketch = seeded_sketch(32, 10_000, 12345);
    for i in 0..10_000 {
        sketch.insert(i).unwrap();
    }
    sketch.close().unwrap();
    assert_eq!(sketch.total_weight(), 10_000.0);

    // Statistical check: the estimates sit well inside a generous window
    // around the true ranks of a sorted stream.
    for rank in [1000i64, 2500, 5000, 7500, 9000] {
        let estimate = sketch.estimate_rank(&rank);
        assert_that!(estimate, near(rank as f64, 500.0));
    }
}
