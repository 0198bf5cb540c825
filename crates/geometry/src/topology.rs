//! Connectivity derived from a triangle index buffer.

use std::collections::HashMap;

use crate::raycast::triangle_indices;

/// Undirected edge key with the smaller index first
fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a < b { (a, b) } else { (b, a) }
}

/// Edges used by exactly one triangle.
pub fn boundary_edges(indices: &[u32]) -> Vec<(usize, usize)> {
    let mut counts: HashMap<(usize, usize), u32> = HashMap::new();
    for tri in 0..indices.len() / 3 {
        let [a, b, c] = triangle_indices(indices, tri);
        for (x, y) in [(a, b), (b, c), (c, a)] {
            *counts.entry(edge_key(x, y)).or_default() += 1;
        }
    }
    let mut edges: Vec<(usize, usize)> = counts
        .into_iter()
        .filter_map(|(edge, count)| (count == 1).then_some(edge))
        .collect();
    edges.sort_unstable();
    edges
}

/// Vertex neighbours through the given edges.
pub fn adjacency_from_edges(vertex_count: usize, edges: &[(usize, usize)]) -> Vec<Vec<usize>> {
    let mut adjacency = vec![Vec::new(); vertex_count];
    for &(a, b) in edges {
        if a < vertex_count && b < vertex_count {
            adjacency[a].push(b);
            adjacency[b].push(a);
        }
    }
    adjacency
}

/// Vertex neighbours through triangle edges.
pub fn vertex_adjacency(vertex_count: usize, indices: &[u32]) -> Vec<Vec<usize>> {
    let mut edges = Vec::with_capacity(indices.len());
    for tri in 0..indices.len() / 3 {
        let [a, b, c] = triangle_indices(indices, tri);
        edges.extend([edge_key(a, b), edge_key(b, c), edge_key(c, a)]);
    }
    edges.sort_unstable();
    edges.dedup();
    adjacency_from_edges(vertex_count, &edges)
}

/// Every vertex reachable from `seeds` through `adjacency`, seeds included.
pub fn flood_fill(adjacency: &[Vec<usize>], seeds: impl IntoIterator<Item = usize>) -> Vec<bool> {
    let mut reached = vec![false; adjacency.len()];
    let mut stack: Vec<usize> = Vec::new();
    for seed in seeds {
        if seed < reached.len() && !reached[seed] {
            reached[seed] = true;
            stack.push(seed);
        }
    }
    while let Some(v) = stack.pop() {
        for &next in &adjacency[v] {
            if !reached[next] {
                reached[next] = true;
                stack.push(next);
            }
        }
    }
    reached
}

#[cfg(test)]
mod tests {
    use super::*;

    // Two triangles forming a quad: 0-1-2, 0-2-3
    const QUAD: [u32; 6] = [0, 1, 2, 0, 2, 3];

    #[test]
    fn test_quad_boundary_excludes_diagonal() {
        let edges = boundary_edges(&QUAD);
        assert_eq!(edges, vec![(0, 1), (0, 3), (1, 2), (2, 3)]);
    }

    #[test]
    fn test_flood_fill_stops_at_components() {
        // Quad plus a detached triangle
        let indices = [0, 1, 2, 0, 2, 3, 4, 5, 6];
        let adjacency = vertex_adjacency(7, &indices);
        let reached = flood_fill(&adjacency, [1]);
        assert_eq!(reached, vec![true, true, true, true, false, false, false]);
    }
}
