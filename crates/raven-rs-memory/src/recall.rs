//! Similarity ranking of stored memories against a query vector.

use crate::model::{MemoryRecord, ScoredMemory};
use log::debug;
use std::cmp::Ordering;

/// Ranking strategy used by the orchestrator to pick relevant memories.
///
/// The default scans every record. An index-backed nearest-neighbour
/// implementation can be swapped in behind the same contract.
pub trait MemoryRanker: Send + Sync {
    /// Return at most `count` records most similar to `query`, best first,
    /// never including a record whose vector is bit-identical to `query`.
    fn rank(&self, query: &[f64], records: &[MemoryRecord], count: usize) -> Vec<MemoryRecord>;
}

/// Full re-scan of the log on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearScanRanker;

impl MemoryRanker for LinearScanRanker {
    fn rank(&self, query: &[f64], records: &[MemoryRecord], count: usize) -> Vec<MemoryRecord> {
        fetch_memories(query, records, count)
    }
}

/// Cosine similarity of two vectors.
///
/// Returns 0 for zero-norm, non-finite, or dimension-mismatched input instead
/// of a numeric error. The result is clamped to [-1, 1].
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let mag_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    let denom = mag_a * mag_b;
    if denom == 0.0 || !denom.is_finite() || !dot.is_finite() {
        return 0.0;
    }
    (dot / denom).clamp(-1.0, 1.0)
}

/// Score every record against `query`, skipping exact self-matches.
///
/// Output keeps the input order.
pub fn score_memories(query: &[f64], records: &[MemoryRecord]) -> Vec<ScoredMemory> {
    records
        .iter()
        .filter(|record| !is_same_vector(record.vector(), query))
        .map(|record| ScoredMemory {
            score: cosine_similarity(record.vector(), query),
            record: record.clone(),
        })
        .collect()
}

/// Top-`count` records by similarity to `query`.
///
/// Ties fall back to chronological order. Fewer than `count` candidates
/// returns all of them.
pub fn fetch_memories(query: &[f64], records: &[MemoryRecord], count: usize) -> Vec<MemoryRecord> {
    let mut scored = score_memories(query, records);
    let excluded = records.len() - scored.len();
    scored.sort_by(|a, b| {
        b.score.total_cmp(&a.score).then_with(|| {
            a.record
                .timestamp()
                .partial_cmp(&b.record.timestamp())
                .unwrap_or(Ordering::Equal)
        })
    });
    scored.truncate(count);
    debug!(
        "ranked memories (candidates={}, excluded_self={}, returned={})",
        records.len(),
        excluded,
        scored.len()
    );
    scored.into_iter().map(ScoredMemory::into_record).collect()
}

/// Bit-for-bit vector equality.
fn is_same_vector(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
}

#[cfg(test)]
mod tests {
    use super::{LinearScanRanker, MemoryRanker, cosine_similarity, fetch_memories, score_memories};
    use crate::{MemoryRecord, Speaker};
    use pretty_assertions::assert_eq;

    fn record(message: &str, vector: Vec<f64>, time: f64) -> MemoryRecord {
        MemoryRecord::at(Speaker::User, message, vector, time)
    }

    fn messages(records: &[MemoryRecord]) -> Vec<&str> {
        records.iter().map(MemoryRecord::message).collect()
    }

    #[test]
    fn cosine_of_parallel_orthogonal_and_opposite_vectors() {
        assert!((cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]) - 1.0).abs() < 1e-12);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 1.0], &[-1.0, -1.0]) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn cosine_is_symmetric_and_bounded() {
        let pairs = [
            (vec![0.3, -0.7, 0.2], vec![0.9, 0.1, -0.4]),
            (vec![1e-3, 5.0, -2.5], vec![-7.0, 0.25, 3.0]),
            (vec![0.1, 0.1, 0.1], vec![0.1, 0.1, 0.1000001]),
        ];
        for (a, b) in pairs {
            let ab = cosine_similarity(&a, &b);
            let ba = cosine_similarity(&b, &a);
            assert_eq!(ab.to_bits(), ba.to_bits());
            assert!((-1.0..=1.0).contains(&ab));
        }
    }

    #[test]
    fn cosine_degenerate_inputs_score_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[f64::NAN, 1.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn returns_best_matches_in_score_order() {
        let query = vec![1.0, 0.0];
        // cosine 0.2, 0.9 and 0.5 against the query
        let low = record("low", vec![0.2, (1.0f64 - 0.04).sqrt()], 1.0);
        let high = record("high", vec![0.9, (1.0f64 - 0.81).sqrt()], 2.0);
        let mid = record("mid", vec![0.5, (1.0f64 - 0.25).sqrt()], 3.0);
        let log = vec![low, high, mid];

        let top = fetch_memories(&query, &log, 2);

        assert_eq!(messages(&top), vec!["high", "mid"]);
    }

    #[test]
    fn excludes_bit_identical_query_vector() {
        let query = vec![0.6, 0.8];
        let log = vec![
            record("self", query.clone(), 5.0),
            record("other", vec![0.8, 0.6], 1.0),
        ];

        let top = fetch_memories(&query, &log, 10);

        assert_eq!(messages(&top), vec!["other"]);
        assert!(top.iter().all(|r| r.vector() != query.as_slice()));
    }

    #[test]
    fn near_identical_vector_is_not_excluded() {
        let query = vec![0.6, 0.8];
        let log = vec![record("close", vec![0.6, 0.800_000_001], 1.0)];
        assert_eq!(fetch_memories(&query, &log, 1).len(), 1);
    }

    #[test]
    fn never_pads_or_errors_when_undersized() {
        let query = vec![1.0, 0.0];
        assert!(fetch_memories(&query, &[], 5).is_empty());

        let log = vec![record("a", vec![1.0, 1.0], 1.0), record("b", vec![0.0, 1.0], 2.0)];
        assert_eq!(fetch_memories(&query, &log, 5).len(), 2);
        assert!(fetch_memories(&query, &log, 0).is_empty());
    }

    #[test]
    fn ties_resolve_chronologically_and_reruns_are_stable() {
        let query = vec![1.0, 0.0];
        let log = vec![
            record("later", vec![1.0, 1.0], 30.0),
            record("earliest", vec![1.0, 1.0], 10.0),
            record("middle", vec![1.0, 1.0], 20.0),
        ];

        let first = fetch_memories(&query, &log, 3);
        let second = fetch_memories(&query, &log, 3);

        assert_eq!(messages(&first), vec!["earliest", "middle", "later"]);
        assert_eq!(first, second);
    }

    #[test]
    fn scoring_keeps_input_order_and_drops_self() {
        let query = vec![0.0, 1.0];
        let log = vec![
            record("x", vec![1.0, 0.0], 1.0),
            record("self", vec![0.0, 1.0], 2.0),
            record("y", vec![0.0, 2.0], 3.0),
        ];
        let scored = score_memories(&query, &log);
        assert_eq!(scored.len(), 2);
        assert_eq!(scored[0].record.message(), "x");
        assert_eq!(scored[0].score, 0.0);
        assert_eq!(scored[1].record.message(), "y");
        assert!((scored[1].score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn linear_scan_ranker_matches_fetch() {
        let query = vec![1.0, 0.5];
        let log = vec![
            record("a", vec![1.0, 0.0], 1.0),
            record("b", vec![0.0, 1.0], 2.0),
        ];
        assert_eq!(
            LinearScanRanker.rank(&query, &log, 1),
            fetch_memories(&query, &log, 1)
        );
    }
}
