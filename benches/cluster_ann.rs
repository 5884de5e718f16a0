//! ANN benchmark: synthetic Gaussian clusters, squared-L2.
//! Measures build time (sequential vs parallel), Recall@k, top-1 cluster
//! accuracy, QPS, and prints a column-normalized confusion matrix.
//!
//! Usage: cargo bench --bench cluster_ann

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use smallworld::hnsw::distance::l2_sq;
use smallworld::HnswIndex;
use std::time::Instant;

const DIM: usize = 128;
const CLUSTERS: usize = 6;
const PER_CLUSTER: usize = 2_000;
const QUERIES_PER_CLUSTER: usize = 50;
const K: usize = 15;
const SIGMA: f32 = 0.004;
const MIN_CENTER_DIST: f32 = 8.0;
const SEED: u64 = 42;
const THREADS: usize = 8;

fn well_separated_centers(rng: &mut StdRng) -> Vec<Vec<f32>> {
    let mut centers: Vec<Vec<f32>> = Vec::with_capacity(CLUSTERS);
    while centers.len() < CLUSTERS {
        let candidate: Vec<f32> = (0..DIM).map(|_| rng.random::<f32>() * 20.0 - 10.0).collect();
        if !centers
            .iter()
            .any(|c| l2_sq(&candidate, c).sqrt() < MIN_CENTER_DIST)
        {
            centers.push(candidate);
        }
    }
    centers
}

fn sample_near(center: &[f32], rng: &mut StdRng) -> Vec<f32> {
    center
        .iter()
        .map(|&c| {
            let u1 = 1.0 - rng.random::<f32>();
            let u2: f32 = rng.random();
            let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos();
            c + z * SIGMA
        })
        .collect()
}

fn exact_knn(data: &[Vec<f32>], query: &[f32], k: usize) -> Vec<u32> {
    let mut scored: Vec<(f32, u32)> = data
        .iter()
        .enumerate()
        .map(|(i, v)| (l2_sq(query, v), i as u32))
        .collect();
    scored.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));
    scored.into_iter().take(k).map(|(_, id)| id).collect()
}

fn recall_at_k(approx: &[u32], truth: &[u32]) -> f64 {
    let truth_set: std::collections::HashSet<u32> = truth.iter().copied().collect();
    approx.iter().filter(|id| truth_set.contains(id)).count() as f64 / truth.len() as f64
}

fn print_confusion(confusion: &[Vec<usize>]) {
    println!("\nNormalized confusion matrix (rows = predicted, cols = true)\n");
    print!("    ");
    for j in 0..confusion.len() {
        print!("    T{j} ");
    }
    println!();
    for (i, row) in confusion.iter().enumerate() {
        print!("P{i} ");
        for j in 0..row.len() {
            let column_total: usize = confusion.iter().map(|r| r[j]).sum();
            let v = if column_total > 0 {
                row[j] as f64 / column_total as f64
            } else {
                0.0
            };
            print!("{v:6.2} ");
        }
        println!();
    }
    println!();
}

fn main() {
    println!("=== ANN benchmark: {CLUSTERS} Gaussian clusters, dim {DIM}, L2 ===\n");

    let mut rng = StdRng::seed_from_u64(SEED);
    let centers = well_separated_centers(&mut rng);

    let mut data = Vec::with_capacity(CLUSTERS * PER_CLUSTER);
    let mut labels = Vec::with_capacity(CLUSTERS * PER_CLUSTER);
    for (c, center) in centers.iter().enumerate() {
        for _ in 0..PER_CLUSTER {
            data.push(sample_near(center, &mut rng));
            labels.push(c);
        }
    }
    let mut queries = Vec::new();
    let mut query_labels = Vec::new();
    for (c, center) in centers.iter().enumerate() {
        for _ in 0..QUERIES_PER_CLUSTER {
            queries.push(sample_near(center, &mut rng));
            query_labels.push(c);
        }
    }
    println!(
        "{} base vectors, {} queries",
        data.len(),
        queries.len()
    );

    // Sequential build
    let index = HnswIndex::with_default_config(DIM).expect("valid config");
    let t0 = Instant::now();
    for v in &data {
        index.insert(v).expect("insert");
    }
    println!("Sequential build: {:.2}s", t0.elapsed().as_secs_f64());

    // Parallel build
    let par_index = HnswIndex::with_default_config(DIM).expect("valid config");
    let t0 = Instant::now();
    par_index.insert_batch(&data, THREADS).expect("batch insert");
    println!(
        "Parallel build ({THREADS} threads): {:.2}s",
        t0.elapsed().as_secs_f64()
    );

    // Ground truth (not timed)
    let truths: Vec<Vec<u32>> = queries.iter().map(|q| exact_knn(&data, q, K)).collect();

    for (name, idx) in [("sequential", &index), ("parallel", &par_index)] {
        let mut recall = 0.0;
        let mut top1_correct = 0usize;
        let mut confusion = vec![vec![0usize; CLUSTERS]; CLUSTERS];

        let t0 = Instant::now();
        let results: Vec<Vec<u32>> = queries
            .iter()
            .map(|q| idx.search(q, K).expect("search"))
            .collect();
        let elapsed = t0.elapsed().as_secs_f64();

        for ((approx, truth), &true_c) in results.iter().zip(&truths).zip(&query_labels) {
            recall += recall_at_k(approx, truth);
            if approx.first() == truth.first() {
                top1_correct += 1;
            }
            let mut votes = vec![0usize; CLUSTERS];
            for &id in approx {
                votes[labels[id as usize]] += 1;
            }
            let predicted = votes
                .iter()
                .enumerate()
                .max_by_key(|&(_, &count)| count)
                .map(|(c, _)| c)
                .unwrap_or(0);
            confusion[predicted][true_c] += 1;
        }

        let n = queries.len() as f64;
        println!("\n--- {name} index ---");
        println!("Recall@{K}:      {:.4}", recall / n);
        println!("Top-1 accuracy: {:.4}", top1_correct as f64 / n);
        println!("QPS:            {:.0}", n / elapsed);
        println!("Avg latency:    {:.1}us", elapsed / n * 1e6);
        print_confusion(&confusion);
    }
}
