// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::{
    sync::{Arc, Barrier},
    thread,
};

use assert2::check;
use rand::{Rng, SeedableRng, seq::IndexedRandom};
use rand_chacha::ChaCha8Rng;
use viewstats::{
    Aggregation, AggregationData, Attachments, Measure, TagKey, TagSet, View, ViewError,
    ViewRegistry, UNIT_DIMENSIONLESS,
};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("viewstats=trace")
        .with_test_writer()
        .try_init();
}

#[test]
fn register_unregister_parity() {
    init_logging();
    let measures = [
        Measure::int64("ifoo", "iFOO", "iBar"),
        Measure::float64("ffoo", "fFOO", "fBar"),
    ];
    let aggregations = [
        Aggregation::Count,
        Aggregation::Sum,
        Aggregation::distribution([1.0, 2.0, 4.0, 8.0, 16.0]),
    ];
    for _ in 0..10 {
        for m in &measures {
            for agg in &aggregations {
                let view = View::new(m, agg.clone()).with_name("Lookup here");
                check!(viewstats::register(&[view.clone()]) == Ok(()));
                viewstats::unregister(&[view]);
            }
        }
    }
    check!(viewstats::find("Lookup here").is_none());
}

#[test]
fn register_after_measurement() {
    let m = Measure::int64("register_after_measurement", "", UNIT_DIMENSIONLESS);
    let mm = m.m(1.0);
    viewstats::record(&TagSet::new(), &[mm.clone()], &Attachments::new());

    let view = View::new(&m, Aggregation::Count);
    viewstats::register(&[view]).unwrap();
    check!(viewstats::retrieve_data("register_after_measurement").unwrap().is_empty());

    viewstats::record(&TagSet::new(), &[mm], &Attachments::new());
    check!(!viewstats::retrieve_data("register_after_measurement").unwrap().is_empty());
}

#[test]
fn registered_bounds_are_normalized() {
    let m = Measure::int64("normalized_bounds", "", "");
    viewstats::register(&[View::new(&m, Aggregation::distribution([2.0, 0.0, 1.0]))]).unwrap();
    let view = viewstats::find("normalized_bounds").unwrap();
    check!(
        view.aggregation
            == Aggregation::Distribution {
                bounds: vec![1.0, 2.0]
            }
    );

    let m = Measure::int64("negative_bounds", "", "");
    let err = viewstats::register(&[View::new(&m, Aggregation::distribution([-1.0, 2.0]))]);
    check!(let Err(ViewError::NegativeBucketBounds { .. }) = err);
    check!(viewstats::find("negative_bounds").is_none());
}

#[test]
fn view_keys_are_sorted() {
    let registry = ViewRegistry::new();
    let keys = ["a", "c", "b"].map(|k| TagKey::new(k).unwrap());
    let m = Measure::int64("sorted_keys", "", UNIT_DIMENSIONLESS);
    registry
        .register(&[View::new(&m, Aggregation::Count).with_tag_keys(keys)])
        .unwrap();
    let view = registry.find("sorted_keys").unwrap();
    let names: Vec<_> = view.tag_keys.iter().map(|k| k.name()).collect();
    check!(names == ["a", "b", "c"]);
}

#[test]
fn concurrent_producers_share_rows() {
    init_logging();
    const THREADS: usize = 8;
    const PER_THREAD: usize = 5_000;

    let registry = ViewRegistry::new();
    let m = Measure::int64("concurrent", "", UNIT_DIMENSIONLESS);
    let shard = TagKey::new("shard").unwrap();
    registry
        .register(&[
            View::new(&m, Aggregation::Count)
                .with_name("concurrent_count")
                .with_tag_keys([shard.clone()]),
            View::new(&m, Aggregation::distribution([10.0, 100.0]))
                .with_name("concurrent_dist")
                .with_tag_keys([shard.clone()]),
        ])
        .unwrap();

    let shards = ["a", "b", "c"];
    let barrier = Arc::new(Barrier::new(THREADS));
    let per_shard: Vec<Vec<usize>> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let registry = registry.clone();
                let barrier = barrier.clone();
                let shard = shard.clone();
                let m = m.clone();
                s.spawn(move || {
                    let mut rng = ChaCha8Rng::seed_from_u64(t as u64);
                    let mut counts = vec![0; shards.len()];
                    barrier.wait();
                    for _ in 0..PER_THREAD {
                        let which = rng.random_range(0..shards.len());
                        let mut tags = TagSet::new();
                        tags.insert(&shard, shards[which]).unwrap();
                        let value = *[1.0, 50.0, 500.0].choose(&mut rng).unwrap();
                        registry.record(&tags, &[m.m(value)], &Attachments::new());
                        counts[which] += 1;
                    }
                    counts
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let expected: Vec<i64> = (0..shards.len())
        .map(|i| per_shard.iter().map(|c| c[i] as i64).sum())
        .collect();

    let rows = registry.retrieve_data("concurrent_count").unwrap();
    check!(rows.len() == shards.len());
    for (row, want) in rows.iter().zip(&expected) {
        let AggregationData::Count(c) = &row.data else {
            panic!("expected a count, got {:?}", row.data);
        };
        check!(c.value == *want);
    }

    let rows = registry.retrieve_data("concurrent_dist").unwrap();
    check!(rows.len() == shards.len());
    for (row, want) in rows.iter().zip(&expected) {
        let AggregationData::Distribution(d) = &row.data else {
            panic!("expected a distribution, got {:?}", row.data);
        };
        check!(d.count == *want);
        check!(d.count_per_bucket.iter().sum::<i64>() == *want);
    }
}

#[test]
fn snapshot_while_recording() {
    let registry = ViewRegistry::new();
    let m = Measure::float64("snapshot_while_recording", "", UNIT_DIMENSIONLESS);
    registry.register(&[View::new(&m, Aggregation::Sum)]).unwrap();

    thread::scope(|s| {
        let producer = s.spawn(|| {
            for _ in 0..10_000 {
                registry.record(&TagSet::new(), &[m.m(1.0)], &Attachments::new());
            }
        });
        let mut last = 0.0;
        while !producer.is_finished() {
            for data in registry.snapshot() {
                for row in data.rows {
                    let AggregationData::Sum(sum) = row.data else {
                        continue;
                    };
                    // sums only grow
                    check!(sum.value >= last);
                    last = sum.value;
                }
            }
        }
    });

    let rows = registry.retrieve_data("snapshot_while_recording").unwrap();
    let AggregationData::Sum(sum) = &rows[0].data else {
        panic!("expected a sum, got {:?}", rows[0].data);
    };
    check!(sum.value == 10_000.0);
}
