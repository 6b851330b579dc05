// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Edge-to-wire stitching
//!
//! Reassembles the unordered edges produced by a plane cut into wires
//! (polylines). Endpoints are welded into shared vertices, then the edge graph
//! is walked: open chains first, starting at odd-degree vertices, then closed
//! loops.

use crate::cut::Edge;
use crate::error::{Error, Result};
use nalgebra::Point3;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// Connected sequence of edges
#[derive(Debug, Clone, PartialEq)]
pub struct Wire {
    /// Ordered vertices. For closed wires the first point is not repeated.
    pub points: Vec<Point3<f64>>,
    /// Whether the last point connects back to the first
    pub closed: bool,
}

impl Wire {
    /// Number of edges in the wire
    pub fn edge_count(&self) -> usize {
        match (self.points.len(), self.closed) {
            (0, _) | (1, _) => 0,
            (n, true) => n,
            (n, false) => n - 1,
        }
    }

    /// Total length of the wire
    pub fn length(&self) -> f64 {
        let open: f64 = self
            .points
            .windows(2)
            .map(|w| (w[1] - w[0]).norm())
            .sum();
        match (self.closed, self.points.first(), self.points.last()) {
            (true, Some(first), Some(last)) => open + (first - last).norm(),
            _ => open,
        }
    }
}

/// Merges nearby endpoints into shared vertex ids
struct VertexWelder {
    tolerance: f64,
    shared: bool,
    points: Vec<Point3<f64>>,
    exact: FxHashMap<[u64; 3], usize>,
    grid: FxHashMap<(i64, i64, i64), SmallVec<[usize; 4]>>,
}

impl VertexWelder {
    fn new(tolerance: f64, shared: bool) -> Self {
        Self {
            tolerance,
            shared,
            points: Vec::new(),
            exact: FxHashMap::default(),
            grid: FxHashMap::default(),
        }
    }

    #[inline]
    fn exact_key(p: &Point3<f64>) -> [u64; 3] {
        // + 0.0 folds -0.0 into 0.0
        [
            (p.x + 0.0).to_bits(),
            (p.y + 0.0).to_bits(),
            (p.z + 0.0).to_bits(),
        ]
    }

    #[inline]
    fn cell(&self, p: &Point3<f64>) -> (i64, i64, i64) {
        (
            (p.x / self.tolerance).floor() as i64,
            (p.y / self.tolerance).floor() as i64,
            (p.z / self.tolerance).floor() as i64,
        )
    }

    fn insert(&mut self, p: Point3<f64>) -> usize {
        if self.shared {
            let key = Self::exact_key(&p);
            if let Some(&id) = self.exact.get(&key) {
                return id;
            }
            let id = self.points.len();
            self.points.push(p);
            self.exact.insert(key, id);
            return id;
        }

        let (cx, cy, cz) = self.cell(&p);
        let mut best: Option<(usize, f64)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(ids) = self.grid.get(&(cx + dx, cy + dy, cz + dz)) {
                        for &id in ids {
                            let dist = (self.points[id] - p).norm();
                            if dist <= self.tolerance && best.map_or(true, |(_, d)| dist < d) {
                                best = Some((id, dist));
                            }
                        }
                    }
                }
            }
        }

        if let Some((id, _)) = best {
            return id;
        }

        let id = self.points.len();
        self.points.push(p);
        self.grid.entry((cx, cy, cz)).or_default().push(id);
        id
    }
}

/// Connect unordered edges into wires.
///
/// With `shared = true` only bit-identical endpoints are connected, otherwise
/// endpoints closer than `tolerance` are merged. Duplicate edges are kept once
/// and edges that collapse to a single vertex are dropped.
pub fn connect_edges_to_wires(edges: &[Edge], tolerance: f64, shared: bool) -> Result<Vec<Wire>> {
    if !shared && !(tolerance.is_finite() && tolerance > 0.0) {
        return Err(Error::InvalidTolerance(tolerance));
    }
    if edges.is_empty() {
        return Ok(Vec::new());
    }

    let mut welder = VertexWelder::new(tolerance, shared);
    let mut seen: FxHashSet<(usize, usize)> = FxHashSet::default();
    let mut graph_edges: Vec<(usize, usize)> = Vec::with_capacity(edges.len());

    for edge in edges {
        let a = welder.insert(edge.start);
        let b = welder.insert(edge.end);
        if a == b {
            continue;
        }
        if seen.insert((a.min(b), a.max(b))) {
            graph_edges.push((a, b));
        }
    }

    let vertex_count = welder.points.len();
    let mut adjacency: Vec<SmallVec<[usize; 4]>> = vec![SmallVec::new(); vertex_count];
    for (i, &(a, b)) in graph_edges.iter().enumerate() {
        adjacency[a].push(i);
        adjacency[b].push(i);
    }

    let mut used = vec![false; graph_edges.len()];
    let mut wires = Vec::new();

    // Open chains start at dangling or branching (odd-degree) vertices
    for vertex in 0..vertex_count {
        if adjacency[vertex].len() % 2 == 0 {
            continue;
        }
        while let Some(first) = next_unused(&adjacency[vertex], &used) {
            wires.push(walk(first, vertex, &graph_edges, &adjacency, &mut used, &welder.points));
        }
    }

    // Whatever remains forms loops
    for i in 0..graph_edges.len() {
        if !used[i] {
            let start = graph_edges[i].0;
            wires.push(walk(i, start, &graph_edges, &adjacency, &mut used, &welder.points));
        }
    }

    Ok(wires)
}

#[inline]
fn next_unused(incident: &[usize], used: &[bool]) -> Option<usize> {
    incident.iter().copied().find(|&e| !used[e])
}

/// Walk the edge graph from `start` along `first` until no unused edge is left
fn walk(
    first: usize,
    start: usize,
    graph_edges: &[(usize, usize)],
    adjacency: &[SmallVec<[usize; 4]>],
    used: &mut [bool],
    points: &[Point3<f64>],
) -> Wire {
    let mut chain = vec![start];
    let mut current = start;
    let mut edge = Some(first);
    let mut closed = false;

    while let Some(e) = edge {
        used[e] = true;
        let (a, b) = graph_edges[e];
        let next = if a == current { b } else { a };
        if next == start {
            closed = true;
            break;
        }
        chain.push(next);
        current = next;
        edge = next_unused(&adjacency[current], used);
    }

    Wire {
        points: chain.into_iter().map(|id| points[id]).collect(),
        closed,
    }
}
