//! Selection tests.
//!
//! Every test adds `strength` (scaled by whatever influence the test computes)
//! to the weight of each vertex it hits, clamped to [0, 1]. A negative
//! strength deselects. Screen-space tests work in normalized device
//! coordinates of `view_proj * transform`.

use glam::{Vec2, Vec3};

use crate::raycast::{raycast_transformed, triangle_indices};
use crate::topology::{adjacency_from_edges, boundary_edges, flood_fill, vertex_adjacency};
use crate::types::{BrushDab, ModelData, ScreenQuery, SelectionSummary};

fn add_weight(selection: &mut [f32], index: usize, amount: f32) {
    if let Some(w) = selection.get_mut(index) {
        *w = (*w + amount).clamp(0.0, 1.0);
    }
}

/// Project every vertex into NDC, skipping vertices behind the camera or
/// (optionally) facing away from it.
fn visible_ndc(model: &ModelData<'_>, query: &ScreenQuery) -> Vec<(usize, Vec3)> {
    let mvp = query.view_proj * model.transform;
    (0..model.vertex_count())
        .filter_map(|i| {
            let clip = mvp * model.points[i].extend(1.0);
            if clip.w <= 0.0 {
                return None;
            }
            if query.front_face_only {
                let to_camera = query.camera_position - model.world_point(i);
                if model.world_normal(i).dot(to_camera) <= 0.0 {
                    return None;
                }
            }
            Some((i, clip.truncate() / clip.w))
        })
        .collect()
}

fn in_rect(p: Vec3, min: Vec2, max: Vec2) -> bool {
    p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
}

/// Even-odd point in polygon test.
fn in_polygon(p: Vec2, polygon: &[Vec2]) -> bool {
    let mut inside = false;
    let mut j = polygon.len().wrapping_sub(1);
    for (i, &a) in polygon.iter().enumerate() {
        let b = polygon[j];
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Select the vertex inside the NDC rectangle nearest to the viewer.
pub fn select_single(
    model: &mut ModelData<'_>,
    query: &ScreenQuery,
    min: Vec2,
    max: Vec2,
    strength: f32,
) -> usize {
    let nearest = visible_ndc(model, query)
        .into_iter()
        .filter(|(_, ndc)| in_rect(*ndc, min, max))
        .min_by(|a, b| a.1.z.total_cmp(&b.1.z));
    match nearest {
        Some((i, _)) => {
            add_weight(model.selection, i, strength);
            1
        }
        None => 0,
    }
}

/// Select every vertex inside the NDC rectangle.
pub fn select_rect(
    model: &mut ModelData<'_>,
    query: &ScreenQuery,
    min: Vec2,
    max: Vec2,
    strength: f32,
) -> usize {
    let hits: Vec<usize> = visible_ndc(model, query)
        .into_iter()
        .filter_map(|(i, ndc)| in_rect(ndc, min, max).then_some(i))
        .collect();
    for &i in &hits {
        add_weight(model.selection, i, strength);
    }
    hits.len()
}

/// Select every vertex inside an NDC polygon.
pub fn select_lasso(
    model: &mut ModelData<'_>,
    query: &ScreenQuery,
    lasso: &[Vec2],
    strength: f32,
) -> usize {
    if lasso.len() < 3 {
        return 0;
    }
    let hits: Vec<usize> = visible_ndc(model, query)
        .into_iter()
        .filter_map(|(i, ndc)| in_polygon(ndc.truncate(), lasso).then_some(i))
        .collect();
    for &i in &hits {
        add_weight(model.selection, i, strength);
    }
    hits.len()
}

/// Soft selection under a brush dab.
pub fn select_brush(model: &mut ModelData<'_>, dab: &BrushDab<'_>) -> usize {
    let mut touched = 0;
    for i in 0..model.vertex_count() {
        let distance = model.world_point(i).distance(dab.position);
        if distance > dab.radius {
            continue;
        }
        add_weight(model.selection, i, dab.falloff(distance) * dab.strength);
        touched += 1;
    }
    touched
}

/// Select the three vertices of the triangle a world-space ray hits first.
pub fn select_triangle(
    model: &mut ModelData<'_>,
    origin: Vec3,
    direction: Vec3,
    strength: f32,
) -> usize {
    let Some((tri, _, _)) =
        raycast_transformed(model.indices, model.points, model.transform, origin, direction)
    else {
        return 0;
    };
    let corners = triangle_indices(model.indices, tri);
    for i in corners {
        add_weight(model.selection, i, strength);
    }
    corners.len()
}

fn apply_to_flags(model: &mut ModelData<'_>, flags: &[bool], strength: f32, clear: bool) -> usize {
    if clear {
        model.selection.fill(0.0);
    }
    let mut touched = 0;
    for (i, _) in flags.iter().enumerate().filter(|(_, f)| **f) {
        add_weight(model.selection, i, strength);
        touched += 1;
    }
    touched
}

fn selected_vertices(model: &ModelData<'_>) -> Vec<usize> {
    (0..model.vertex_count())
        .filter(|&i| model.selection_weight(i) > 0.0)
        .collect()
}

/// Select boundary vertices. With `mask`, only boundary vertices sharing a
/// triangle with an already selected vertex.
pub fn select_edge(model: &mut ModelData<'_>, strength: f32, clear: bool, mask: bool) -> usize {
    let count = model.vertex_count();
    let mut flags = vec![false; count];
    for (a, b) in boundary_edges(model.indices) {
        for v in [a, b] {
            if v < count {
                flags[v] = true;
            }
        }
    }

    if mask {
        let mut near_selection = vec![false; count];
        for tri in 0..model.triangle_count() {
            let corners = triangle_indices(model.indices, tri);
            if corners.iter().any(|&v| model.selection_weight(v) > 0.0) {
                for v in corners {
                    if v < count {
                        near_selection[v] = true;
                    }
                }
            }
        }
        for (flag, near) in flags.iter_mut().zip(near_selection) {
            *flag &= near;
        }
    }

    apply_to_flags(model, &flags, strength, clear)
}

/// Select whole boundary loops. With `mask`, only loops that already contain
/// a selected vertex.
pub fn select_hole(model: &mut ModelData<'_>, strength: f32, clear: bool, mask: bool) -> usize {
    let count = model.vertex_count();
    let edges = boundary_edges(model.indices);
    let flags = if mask {
        let adjacency = adjacency_from_edges(count, &edges);
        let seeds: Vec<usize> = selected_vertices(model)
            .into_iter()
            .filter(|&v| !adjacency[v].is_empty())
            .collect();
        flood_fill(&adjacency, seeds)
    } else {
        let mut flags = vec![false; count];
        for (a, b) in edges {
            for v in [a, b] {
                if v < count {
                    flags[v] = true;
                }
            }
        }
        flags
    };
    apply_to_flags(model, &flags, strength, clear)
}

/// Grow the selection to every vertex connected to it through triangles.
pub fn select_connected(model: &mut ModelData<'_>, strength: f32, clear: bool) -> usize {
    let adjacency = vertex_adjacency(model.vertex_count(), model.indices);
    let reached = flood_fill(&adjacency, selected_vertices(model));
    apply_to_flags(model, &reached, strength, clear)
}

/// Count, weighted centroid and weighted average normal of the selection,
/// all in world space.
pub fn update_selection(model: &ModelData<'_>) -> SelectionSummary {
    let mut summary = SelectionSummary::default();
    let mut total = 0.0;
    for i in 0..model.vertex_count() {
        let w = model.selection_weight(i);
        if w <= 0.0 {
            continue;
        }
        summary.count += 1;
        summary.position += model.world_point(i) * w;
        summary.normal += model.world_normal(i) * w;
        total += w;
    }
    if total > 0.0 {
        summary.position /= total;
        summary.normal = summary.normal.normalize_or_zero();
    }
    summary
}
