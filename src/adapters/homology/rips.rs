//! Built-in Vietoris–Rips persistent homology backend.
//!
//! Builds the Rips filtration over a point cloud (vertices at 0, edges at
//! their euclidean length, triangles at their longest edge) and reduces the
//! Z/2 boundary matrix with the standard column algorithm. Supports
//! homology dimensions 0 and 1: H0 classes are born at 0 and die on the
//! minimum-spanning-tree edges, H1 classes are born on cycle-creating edges
//! and die on triangles. Zero-persistence pairs are dropped; essential
//! classes are reported with infinite death.
//!
//! Column count grows with the cube of the point count when triangles are
//! included; intended for the modest trajectory lengths this engine
//! produces. A heavier external backend can replace it through the port.

use anyhow::{bail, Result};
use std::collections::HashMap;

use crate::domain::ports::HomologyBackend;

/// Rips-filtration backend over euclidean distance.
#[derive(Debug, Default)]
pub struct VietorisRips;

/// One simplex in filtration order.
struct Simplex {
    /// Vertex indices, ascending; length 1, 2, or 3.
    vertices: Vec<usize>,
    filtration: f64,
}

impl Simplex {
    fn dimension(&self) -> usize {
        self.vertices.len() - 1
    }
}

impl HomologyBackend for VietorisRips {
    fn name(&self) -> &str {
        "vietoris-rips"
    }

    fn compute(&self, points: &[Vec<f32>], max_dimension: usize) -> Result<Vec<Vec<(f64, f64)>>> {
        if points.is_empty() {
            bail!("empty point cloud");
        }
        if max_dimension > 1 {
            bail!("vietoris-rips backend supports max_dimension <= 1, got {max_dimension}");
        }
        let width = points[0].len();
        if points.iter().any(|p| p.len() != width) {
            bail!("points must share one dimensionality");
        }

        let simplices = build_filtration(points, max_dimension);
        let pairs = reduce(&simplices);

        let mut diagram: Vec<Vec<(f64, f64)>> = vec![Vec::new(); max_dimension + 1];
        for (creator, destroyer) in pairs {
            let simplex = &simplices[creator];
            if simplex.dimension() > max_dimension {
                continue;
            }
            let birth = simplex.filtration;
            let death = match destroyer {
                Some(col) => simplices[col].filtration,
                None => f64::INFINITY,
            };
            if death > birth {
                diagram[simplex.dimension()].push((birth, death));
            }
        }
        for generators in &mut diagram {
            generators.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        }
        Ok(diagram)
    }
}

fn euclidean(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = f64::from(x - y);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// All simplices of the filtration, sorted by (filtration, dimension).
fn build_filtration(points: &[Vec<f32>], max_dimension: usize) -> Vec<Simplex> {
    let n = points.len();
    let mut distance = vec![vec![0.0f64; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = euclidean(&points[i], &points[j]);
            distance[i][j] = d;
            distance[j][i] = d;
        }
    }

    let mut simplices = Vec::new();
    for i in 0..n {
        simplices.push(Simplex {
            vertices: vec![i],
            filtration: 0.0,
        });
    }
    for i in 0..n {
        for j in (i + 1)..n {
            simplices.push(Simplex {
                vertices: vec![i, j],
                filtration: distance[i][j],
            });
        }
    }
    if max_dimension >= 1 {
        // Triangles kill loops; needed to bound H1 deaths.
        for i in 0..n {
            for j in (i + 1)..n {
                for k in (j + 1)..n {
                    let filtration = distance[i][j].max(distance[i][k]).max(distance[j][k]);
                    simplices.push(Simplex {
                        vertices: vec![i, j, k],
                        filtration,
                    });
                }
            }
        }
    }

    simplices.sort_by(|a, b| {
        a.filtration
            .partial_cmp(&b.filtration)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.dimension().cmp(&b.dimension()))
            .then_with(|| a.vertices.cmp(&b.vertices))
    });
    simplices
}

/// Standard boundary-matrix reduction over Z/2.
///
/// Returns, for each creator column, the column that destroys it (`None`
/// for essential classes).
fn reduce(simplices: &[Simplex]) -> Vec<(usize, Option<usize>)> {
    let index_of: HashMap<&[usize], usize> = simplices
        .iter()
        .enumerate()
        .map(|(idx, s)| (s.vertices.as_slice(), idx))
        .collect();

    // Boundary columns as ascending row-index lists.
    let mut columns: Vec<Vec<usize>> = simplices
        .iter()
        .map(|s| {
            let mut rows: Vec<usize> = match s.vertices.len() {
                1 => Vec::new(),
                _ => faces(&s.vertices)
                    .iter()
                    .map(|face| index_of[face.as_slice()])
                    .collect(),
            };
            rows.sort_unstable();
            rows
        })
        .collect();

    let mut low_to_col: HashMap<usize, usize> = HashMap::new();
    let mut destroyer_of: HashMap<usize, usize> = HashMap::new();

    for j in 0..columns.len() {
        loop {
            let Some(&low) = columns[j].last() else {
                break;
            };
            match low_to_col.get(&low).copied() {
                Some(k) => {
                    let merged = symmetric_difference(&columns[j], &columns[k]);
                    columns[j] = merged;
                }
                None => {
                    low_to_col.insert(low, j);
                    destroyer_of.insert(low, j);
                    break;
                }
            }
        }
    }

    // A column with empty reduced boundary creates a class; it dies at the
    // column whose pivot it became, if any.
    columns
        .iter()
        .enumerate()
        .filter(|(_, col)| col.is_empty())
        .map(|(j, _)| (j, destroyer_of.get(&j).copied()))
        .collect()
}

fn faces(vertices: &[usize]) -> Vec<Vec<usize>> {
    (0..vertices.len())
        .map(|skip| {
            vertices
                .iter()
                .enumerate()
                .filter(|&(idx, _)| idx != skip)
                .map(|(_, &v)| v)
                .collect()
        })
        .collect()
}

/// Z/2 column addition: XOR of two ascending row lists.
fn symmetric_difference(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}
