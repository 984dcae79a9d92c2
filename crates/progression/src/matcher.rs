//! Nearest-neighbour matching of whole progressions against a candidate
//! pool.
//!
//! Distances are taken over the full matrix (every frame, every pitch
//! class), not per frame. There is no index structure: each query is
//! compared against every pool entry.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::frame::FrameMatrix;
use crate::{Error, Result};

/// Distance between two frame matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Metric {
    /// Sum of absolute differences
    #[default]
    #[serde(alias = "l1")]
    L1,
    /// Euclidean distance over the flattened matrix
    #[serde(alias = "l2")]
    L2,
}

impl Metric {
    pub fn distance(self, a: &FrameMatrix, b: &FrameMatrix) -> Result<f64> {
        a.ensure_same_len(b)?;
        let diffs = a.values().zip(b.values()).map(|(x, y)| x - y);
        let d = match self {
            Metric::L1 => diffs.map(f64::abs).sum(),
            Metric::L2 => diffs.map(|d| d * d).sum::<f64>().sqrt(),
        };
        Ok(d)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::L1 => write!(f, "L1"),
            Metric::L2 => write!(f, "L2"),
        }
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "l1" | "L1" => Ok(Metric::L1),
            "l2" | "L2" => Ok(Metric::L2),
            other => Err(Error::InvalidConfig(format!("unknown metric: {}", other))),
        }
    }
}

/// Distance between two matrices under `metric`.
pub fn distance(a: &FrameMatrix, b: &FrameMatrix, metric: Metric) -> Result<f64> {
    metric.distance(a, b)
}

/// Best match for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub best_index: usize,
    pub distance: f64,
    /// Pool indices of the closest entries, nearest first
    pub top: Vec<usize>,
}

/// Matches a query matrix against a borrowed pool.
#[derive(Debug, Clone)]
pub struct CandidateMatcher<'a> {
    pool: &'a [FrameMatrix],
    metric: Metric,
}

impl<'a> CandidateMatcher<'a> {
    pub fn new(pool: &'a [FrameMatrix], metric: Metric) -> Result<Self> {
        if pool.is_empty() {
            return Err(Error::EmptyPool);
        }
        Ok(Self { pool, metric })
    }

    pub fn pool(&self) -> &'a [FrameMatrix] {
        self.pool
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Every pool entry as `(index, distance)`, nearest first. Equal
    /// distances keep pool order.
    pub fn rank(&self, query: &FrameMatrix) -> Result<Vec<(usize, f64)>> {
        let mut ranked = self
            .pool
            .iter()
            .enumerate()
            .map(|(i, candidate)| -> Result<(usize, f64)> {
                Ok((i, self.metric.distance(query, candidate)?))
            })
            .collect::<Result<Vec<_>>>()?;
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
        Ok(ranked)
    }

    /// Closest entry plus the `top_n` closest indices. `top_n` is clamped
    /// to the pool size.
    pub fn nearest(&self, query: &FrameMatrix, top_n: usize) -> Result<Candidate> {
        let ranked = self.rank(query)?;
        let (best_index, distance) = ranked[0];
        let top = ranked.iter().take(top_n).map(|(i, _)| *i).collect();
        Ok(Candidate {
            best_index,
            distance,
            top,
        })
    }

    pub fn top_indices(&self, query: &FrameMatrix, top_n: usize) -> Result<Vec<usize>> {
        Ok(self
            .rank(query)?
            .into_iter()
            .take(top_n)
            .map(|(i, _)| i)
            .collect())
    }
}

/// Result of matching a batch of queries.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestMatches {
    /// Copy of the closest pool entry for each query
    pub matched: Vec<FrameMatrix>,
    /// Top-N pool indices for each query, nearest first
    pub best_indices: Vec<Vec<usize>>,
    /// Distance to the closest entry for each query
    pub distances: Vec<f64>,
}

impl NearestMatches {
    pub fn len(&self) -> usize {
        self.matched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }

    /// Distinct pool indices across every query's top-N choices.
    pub fn unique_indices(&self) -> usize {
        unique_index_count(&self.best_indices.concat())
    }
}

/// Snap every query onto its closest pool entry.
pub fn find_nearest(
    queries: &[FrameMatrix],
    pool: &[FrameMatrix],
    metric: Metric,
    top_n: usize,
) -> Result<NearestMatches> {
    let matcher = CandidateMatcher::new(pool, metric)?;

    let mut matches = NearestMatches {
        matched: Vec::with_capacity(queries.len()),
        best_indices: Vec::with_capacity(queries.len()),
        distances: Vec::with_capacity(queries.len()),
    };

    for (i, query) in queries.iter().enumerate() {
        let candidate = matcher.nearest(query, top_n)?;
        debug!(
            query = i,
            best = candidate.best_index,
            distance = candidate.distance,
            "matched query"
        );
        matches.matched.push(pool[candidate.best_index].clone());
        matches.best_indices.push(candidate.top);
        matches.distances.push(candidate.distance);
    }

    info!(
        queries = queries.len(),
        pool = pool.len(),
        %metric,
        unique = matches.unique_indices(),
        "nearest-neighbour matching done"
    );

    Ok(matches)
}

/// Top-N index sets under L1, without copying matched matrices.
pub fn find_nearest_labels_only(
    queries: &[FrameMatrix],
    pool: &[FrameMatrix],
    top_n: usize,
) -> Result<Vec<Vec<usize>>> {
    let matcher = CandidateMatcher::new(pool, Metric::L1)?;
    queries
        .iter()
        .map(|query| matcher.top_indices(query, top_n))
        .collect()
}

/// Number of distinct pool indices in a list of choices.
pub fn unique_index_count(indices: &[usize]) -> usize {
    indices.iter().collect::<HashSet<_>>().len()
}
