//! K-means segmentation of the numeric columns.
//!
//! Columns are standardised first so that no feature dominates the Euclidean
//! distance purely because of its scale. Centroids are seeded with k-means++
//! from a fixed seed, and the best of several restarts (lowest inertia) wins,
//! so the same table always yields the same clusters.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use super::stats::{mean, population_std};
use crate::data::model::NumericSubset;

pub const MIN_ROWS: usize = 10;
pub const N_CLUSTERS: usize = 3;
const SEED: u64 = 42;
const N_INIT: usize = 10;
const MAX_ITER: usize = 300;
const TOLERANCE: f64 = 1e-4;
const TOP_FEATURES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub name: String,
    pub importance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    /// 1-based cluster id.
    pub id: usize,
    pub size: usize,
    /// Per-feature share of the centroid's offset from the global centroid.
    pub features: Vec<FeatureImportance>,
    pub description: String,
}

/// Segment complete rows into three clusters and describe what sets each apart.
pub fn cluster_rows(numeric: &NumericSubset) -> Vec<Cluster> {
    if numeric.n_columns() < 2 || numeric.n_rows() < MIN_ROWS {
        return Vec::new();
    }

    let rows = numeric.complete_rows();
    if rows.len() < MIN_ROWS {
        debug!(
            "clustering skipped: only {} of {} rows are complete",
            rows.len(),
            numeric.n_rows()
        );
        return Vec::new();
    }

    let scaled = standardize(&rows, numeric.n_columns());
    let model = KMeans::fit(&scaled, N_CLUSTERS, SEED);
    let global = column_means(&scaled, numeric.n_columns());

    let mut sizes = vec![0usize; N_CLUSTERS];
    for &label in &model.labels {
        sizes[label] += 1;
    }

    model
        .centroids
        .iter()
        .enumerate()
        .map(|(i, centroid)| {
            let features = importances(centroid, &global, &numeric.names);
            let id = i + 1;
            let size = sizes[i];

            let mut ranked: Vec<&FeatureImportance> = features.iter().collect();
            ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
            let feature_desc = ranked
                .iter()
                .take(TOP_FEATURES)
                .map(|f| format!("{} ({:.2})", f.name, f.importance))
                .collect::<Vec<_>>()
                .join(", ");

            Cluster {
                id,
                size,
                features,
                description: format!(
                    "Cluster {id} contains {size} records and is characterized by {feature_desc}."
                ),
            }
        })
        .collect()
}

/// Absolute centroid offset per feature, normalised to sum to one.
fn importances(centroid: &[f64], global: &[f64], names: &[String]) -> Vec<FeatureImportance> {
    let distances: Vec<f64> = centroid
        .iter()
        .zip(global)
        .map(|(c, g)| (c - g).abs())
        .collect();
    let total: f64 = distances.iter().sum();
    let uniform = 1.0 / distances.len() as f64;

    names
        .iter()
        .zip(&distances)
        .map(|(name, d)| FeatureImportance {
            name: name.clone(),
            importance: if total > 0.0 { d / total } else { uniform },
        })
        .collect()
}

/// Zero mean, unit variance per column. Constant columns are only centred.
fn standardize(rows: &[Vec<f64>], n_features: usize) -> Vec<Vec<f64>> {
    let params: Vec<(f64, f64)> = (0..n_features)
        .map(|j| {
            let column: Vec<f64> = rows.iter().map(|r| r[j]).collect();
            let m = mean(&column).unwrap_or(0.0);
            let s = population_std(&column).unwrap_or(0.0);
            (m, if s > 0.0 { s } else { 1.0 })
        })
        .collect();

    rows.iter()
        .map(|row| {
            row.iter()
                .zip(&params)
                .map(|(v, (m, s))| (v - m) / s)
                .collect()
        })
        .collect()
}

fn column_means(rows: &[Vec<f64>], n_features: usize) -> Vec<f64> {
    let n = rows.len().max(1) as f64;
    let mut sums = vec![0.0; n_features];
    for row in rows {
        for (s, v) in sums.iter_mut().zip(row) {
            *s += v;
        }
    }
    sums.into_iter().map(|s| s / n).collect()
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

// ---------------------------------------------------------------------------
// Lloyd's k-means with k-means++ seeding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct KMeans {
    centroids: Vec<Vec<f64>>,
    labels: Vec<usize>,
    inertia: f64,
}

impl KMeans {
    /// Best of `N_INIT` seeded runs. `data` must be non-empty.
    fn fit(data: &[Vec<f64>], k: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut best: Option<KMeans> = None;
        for _ in 0..N_INIT {
            let run = Self::run(data, k, &mut rng);
            if best.as_ref().map_or(true, |b| run.inertia < b.inertia) {
                best = Some(run);
            }
        }
        best.unwrap_or_else(|| Self::run(data, k, &mut rng))
    }

    fn run(data: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Self {
        let mut centroids = Self::init_plus_plus(data, k, rng);
        let mut labels = vec![0usize; data.len()];
        let mut prev_inertia = f64::INFINITY;

        for _ in 0..MAX_ITER {
            let mut changed = false;
            for (i, point) in data.iter().enumerate() {
                let nearest = Self::nearest(point, &centroids);
                if nearest != labels[i] {
                    labels[i] = nearest;
                    changed = true;
                }
            }

            Self::update_centroids(data, &labels, &mut centroids);
            let inertia = Self::inertia(data, &labels, &centroids);
            if !changed || (prev_inertia - inertia).abs() < TOLERANCE {
                break;
            }
            prev_inertia = inertia;
        }

        let inertia = Self::inertia(data, &labels, &centroids);
        KMeans {
            centroids,
            labels,
            inertia,
        }
    }

    fn init_plus_plus(data: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
        let mut centroids = Vec::with_capacity(k);
        centroids.push(data[rng.gen_range(0..data.len())].clone());

        while centroids.len() < k {
            let weights: Vec<f64> = data
                .iter()
                .map(|p| {
                    centroids
                        .iter()
                        .map(|c| squared_distance(p, c))
                        .fold(f64::INFINITY, f64::min)
                })
                .collect();
            let total: f64 = weights.iter().sum();

            let pick = if total > 0.0 {
                let mut target = rng.gen::<f64>() * total;
                weights
                    .iter()
                    .position(|w| {
                        target -= w;
                        target <= 0.0
                    })
                    .unwrap_or(data.len() - 1)
            } else {
                // every point already sits on a centroid
                rng.gen_range(0..data.len())
            };
            centroids.push(data[pick].clone());
        }
        centroids
    }

    fn nearest(point: &[f64], centroids: &[Vec<f64>]) -> usize {
        centroids
            .iter()
            .enumerate()
            .map(|(j, c)| (j, squared_distance(point, c)))
            .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
            .0
    }

    /// Empty clusters keep their previous centroid.
    fn update_centroids(data: &[Vec<f64>], labels: &[usize], centroids: &mut [Vec<f64>]) {
        let dims = centroids.first().map_or(0, Vec::len);
        let mut sums = vec![vec![0.0; dims]; centroids.len()];
        let mut counts = vec![0usize; centroids.len()];
        for (point, &label) in data.iter().zip(labels) {
            counts[label] += 1;
            for (s, v) in sums[label].iter_mut().zip(point) {
                *s += v;
            }
        }
        for ((centroid, sum), count) in centroids.iter_mut().zip(sums).zip(counts) {
            if count > 0 {
                *centroid = sum.into_iter().map(|s| s / count as f64).collect();
            }
        }
    }

    fn inertia(data: &[Vec<f64>], labels: &[usize], centroids: &[Vec<f64>]) -> f64 {
        data.iter()
            .zip(labels)
            .map(|(p, &l)| squared_distance(p, &centroids[l]))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subset(columns: &[(&str, Vec<f64>)]) -> NumericSubset {
        NumericSubset {
            names: columns.iter().map(|(n, _)| n.to_string()).collect(),
            values: columns
                .iter()
                .map(|(_, v)| v.iter().copied().map(Some).collect())
                .collect(),
            n_rows: columns.first().map_or(0, |(_, v)| v.len()),
        }
    }

    /// Three well separated blobs of 5 points each.
    fn blobs() -> NumericSubset {
        let centers = [(0.0, 0.0, 1.0), (10.0, 0.0, 1.0), (0.0, 10.0, 1.0)];
        let jitter = [-0.2, -0.1, 0.0, 0.1, 0.2];
        let mut a = Vec::new();
        let mut b = Vec::new();
        let mut c = Vec::new();
        for (ca, cb, cc) in centers {
            for j in jitter {
                a.push(ca + j);
                b.push(cb - j);
                c.push(cc + j / 10.0);
            }
        }
        subset(&[("a", a), ("b", b), ("c", c)])
    }

    #[test]
    fn finds_three_separated_groups() {
        let clusters = cluster_rows(&blobs());
        assert_eq!(clusters.len(), 3);
        let mut sizes: Vec<usize> = clusters.iter().map(|c| c.size).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![5, 5, 5]);
        assert_eq!(
            clusters.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn importances_sum_to_one() {
        for cluster in cluster_rows(&blobs()) {
            assert_eq!(cluster.features.len(), 3);
            let total: f64 = cluster.features.iter().map(|f| f.importance).sum();
            assert!((total - 1.0).abs() < 1e-6);
            assert!(cluster.description.starts_with(&format!("Cluster {}", cluster.id)));
        }
    }

    #[test]
    fn deterministic_across_runs() {
        assert_eq!(cluster_rows(&blobs()), cluster_rows(&blobs()));
    }

    #[test]
    fn uniform_importance_when_centroid_matches_global() {
        let names = vec!["a".to_string(), "b".to_string()];
        let imp = importances(&[0.0, 0.0], &[0.0, 0.0], &names);
        assert_eq!(imp[0].importance, 0.5);
        assert_eq!(imp[1].importance, 0.5);
    }

    #[test]
    fn needs_two_columns_and_ten_rows() {
        let one_col = subset(&[("a", (0..20).map(f64::from).collect())]);
        assert!(cluster_rows(&one_col).is_empty());

        let short = subset(&[("a", vec![1.0; 9]), ("b", vec![2.0; 9])]);
        assert!(cluster_rows(&short).is_empty());
    }

    #[test]
    fn incomplete_rows_are_left_out() {
        let mut numeric = blobs();
        numeric.values[0][0] = None;
        numeric.values[1][5] = None;
        let clusters = cluster_rows(&numeric);
        let total: usize = clusters.iter().map(|c| c.size).sum();
        assert_eq!(total, 13);
    }
}
