//! Isolation forest.
//!
//! Scores rows by how easily random axis-aligned partitioning separates
//! them from the rest of the batch: shorter average path length means more
//! anomalous. Scores are normalized to 0.0 - 1.0 with 0.5 as the midpoint
//! for inliers. The RNG is seeded so a given batch always scores the same.

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees in the ensemble
    pub trees: usize,

    /// Rows sampled per tree (capped at the batch size)
    pub subsample: usize,

    /// RNG seed, fixed for reproducible scoring
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            trees: 100,
            subsample: 256,
            seed: 42,
        }
    }
}

enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

pub struct IsolationForest {
    trees: Vec<Node>,
    sample_size: usize,
}

impl IsolationForest {
    /// Fit a fresh forest on a batch. No cross-batch reuse.
    pub fn fit(data: &Array2<f64>, config: &ForestConfig) -> Self {
        let nrows = data.nrows();
        let sample_size = config.subsample.min(nrows).max(1);
        let height_limit = (sample_size as f64).log2().ceil().max(0.0) as usize;
        let mut rng = StdRng::seed_from_u64(config.seed);

        let trees = (0..config.trees)
            .map(|_| {
                let indices: Vec<usize> = if sample_size < nrows {
                    sample(&mut rng, nrows, sample_size).into_vec()
                } else {
                    (0..nrows).collect()
                };
                build_node(data, indices, 0, height_limit, &mut rng)
            })
            .collect();

        Self { trees, sample_size }
    }

    /// Anomaly score for one row, 0.0 - 1.0.
    pub fn score(&self, row: ArrayView1<f64>) -> f64 {
        let denom = average_path_length(self.sample_size);
        if denom <= 0.0 || self.trees.is_empty() {
            return 0.5;
        }
        let total: f64 = self.trees.iter().map(|tree| path_length(tree, row)).sum();
        let mean_path = total / self.trees.len() as f64;
        2f64.powf(-mean_path / denom)
    }

    /// Score every row of a batch, in row order.
    pub fn score_all(&self, data: &Array2<f64>) -> Vec<f64> {
        data.rows().into_iter().map(|row| self.score(row)).collect()
    }
}

fn build_node(
    data: &Array2<f64>,
    indices: Vec<usize>,
    depth: usize,
    height_limit: usize,
    rng: &mut StdRng,
) -> Node {
    if depth >= height_limit || indices.len() <= 1 {
        return Node::Leaf {
            size: indices.len(),
        };
    }

    // Splittable features: min < max over the rows reaching this node
    let mut candidates: Vec<(usize, f64, f64)> = Vec::new();
    for feature in 0..data.ncols() {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &idx in &indices {
            let v = data[[idx, feature]];
            min = min.min(v);
            max = max.max(v);
        }
        if max > min {
            candidates.push((feature, min, max));
        }
    }
    if candidates.is_empty() {
        // All remaining rows identical
        return Node::Leaf {
            size: indices.len(),
        };
    }

    let (feature, min, max) = candidates[rng.gen_range(0..candidates.len())];
    let threshold = rng.gen_range(min..max);

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .into_iter()
        .partition(|&idx| data[[idx, feature]] < threshold);

    Node::Split {
        feature,
        threshold,
        left: Box::new(build_node(data, left_idx, depth + 1, height_limit, rng)),
        right: Box::new(build_node(data, right_idx, depth + 1, height_limit, rng)),
    }
}

fn path_length(node: &Node, row: ArrayView1<f64>) -> f64 {
    let mut depth = 0.0;
    let mut current = node;
    loop {
        match current {
            Node::Leaf { size } => return depth + average_path_length(*size),
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                current = if row[*feature] < *threshold { left } else { right };
                depth += 1.0;
            }
        }
    }
}

/// Expected path length of an unsuccessful BST search over n points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}
