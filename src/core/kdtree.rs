// Copyright @yucwang 2026

use crate::math::aabb::{ AABB, BoundsBuilder };
use crate::math::constants::{ EPSILON, Float };
use crate::math::ray::Ray3f;

use std::cmp::Ordering;
use std::fmt;

const TRAVERSAL_COST: Float = 1.0;
const INTERSECTION_COST: Float = 80.0;
const EMPTY_SIDE_BONUS: Float = 0.5;
const MAX_LEAF_ENTRIES: usize = 2;

/// A primitive's bounds plus the caller's id for it.
#[derive(Debug, Copy, Clone)]
pub struct IndexEntry {
    pub bounds: AABB,
    pub primitive: usize,
}

/// Closest primitive reported by `KdTree::find_nearest`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct IndexHit {
    pub primitive: usize,
    pub distance: Float,
}

#[derive(Debug, Clone)]
enum KdNode {
    // The left child is always stored right after its parent.
    Branch { axis: usize, location: Float, right: usize },
    Leaf { start: usize, count: usize },
}

/// Per-thread traversal scratch: pending (node, node bounds) pairs.
#[derive(Debug, Default)]
pub struct SearchCache {
    stack: Vec<(usize, AABB)>,
}

impl SearchCache {
    pub fn new() -> Self {
        Self { stack: Vec::with_capacity(64) }
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }
}

/// Collects entries for a `KdTree`. Single threaded; `finalize` consumes it.
#[derive(Debug, Default)]
pub struct KdTreeBuilder {
    entries: Vec<IndexEntry>,
    bounds: BoundsBuilder,
}

impl KdTreeBuilder {
    pub fn new() -> Self {
        Self { entries: Vec::new(), bounds: BoundsBuilder::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: Vec::with_capacity(capacity), bounds: BoundsBuilder::new() }
    }

    pub fn add_entry(&mut self, bounds: AABB, primitive: usize) {
        self.bounds.expand_by_aabb(&bounds);
        self.entries.push(IndexEntry { bounds, primitive });
    }

    pub fn add_entries<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (AABB, usize)>,
    {
        for (bounds, primitive) in entries {
            self.add_entry(bounds, primitive);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn finalize(self) -> KdTree {
        let mut tree = KdTree {
            entries: self.entries,
            nodes: Vec::new(),
            leaf_entries: Vec::new(),
            bounds: self.bounds.build(),
            depth: 0,
        };
        if let Some(root_bounds) = tree.bounds {
            tree.build(root_bounds);
            log::info!("KdTree built: {} entries, {} nodes, {} leaf refs, depth {}.",
                       tree.entries.len(), tree.nodes.len(), tree.leaf_entries.len(), tree.depth);
        }
        tree
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum EdgeKind {
    Start,
    End,
}

#[derive(Debug, Copy, Clone)]
struct Edge {
    location: Float,
    kind: EdgeKind,
}

#[derive(Debug, Copy, Clone)]
enum ParentLink {
    Root,
    Left,
    Right(usize),
}

struct BuildFrame {
    entries: Vec<usize>,
    bounds: AABB,
    depth: usize,
    link: ParentLink,
}

/// Static kd-tree over bounding boxes, split with the surface area heuristic.
///
/// Nodes live in one depth-first array. Entries that straddle a split plane
/// are referenced from both sides, so a primitive can sit in several leaves.
#[derive(Debug)]
pub struct KdTree {
    entries: Vec<IndexEntry>,
    nodes: Vec<KdNode>,
    leaf_entries: Vec<usize>,
    bounds: Option<AABB>,
    depth: usize,
}

impl KdTree {
    pub fn max_depth_for(entry_count: usize) -> usize {
        if entry_count == 0 {
            return 0;
        }
        (25.0 + 1.3 * (entry_count as Float).ln()).round() as usize
    }

    pub fn bounds(&self) -> Option<AABB> {
        self.bounds
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n, KdNode::Leaf { .. })).count()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    fn build(&mut self, root_bounds: AABB) {
        let max_depth = Self::max_depth_for(self.entries.len());
        let mut edges: Vec<Edge> = Vec::with_capacity(self.entries.len() * 2);
        let mut stack = vec![BuildFrame {
            entries: (0..self.entries.len()).collect(),
            bounds: root_bounds,
            depth: 0,
            link: ParentLink::Root,
        }];

        while let Some(frame) = stack.pop() {
            let node_index = self.nodes.len();
            self.depth = self.depth.max(frame.depth);

            let split = if frame.entries.len() <= MAX_LEAF_ENTRIES || frame.depth >= max_depth {
                None
            } else {
                self.find_split(&frame.entries, &frame.bounds, &mut edges)
            };

            match split {
                None => {
                    let start = self.leaf_entries.len();
                    self.leaf_entries.extend_from_slice(&frame.entries);
                    self.nodes.push(KdNode::Leaf { start, count: frame.entries.len() });
                }
                Some((axis, location)) => {
                    let (below_bounds, above_bounds) = frame.bounds.split(axis, location);
                    let (below, above) = self.partition(&frame.entries, axis, location);
                    self.nodes.push(KdNode::Branch { axis, location, right: 0 });

                    // Left is pushed last so it is built next, right after its parent.
                    stack.push(BuildFrame {
                        entries: above,
                        bounds: above_bounds,
                        depth: frame.depth + 1,
                        link: ParentLink::Right(node_index),
                    });
                    stack.push(BuildFrame {
                        entries: below,
                        bounds: below_bounds,
                        depth: frame.depth + 1,
                        link: ParentLink::Left,
                    });
                }
            }

            if let ParentLink::Right(parent) = frame.link {
                if let KdNode::Branch { right, .. } = &mut self.nodes[parent] {
                    *right = node_index;
                }
            }
        }
    }

    // Cheapest SAH split along the node's longest axis, if it beats a leaf.
    fn find_split(&self, entries: &[usize], bounds: &AABB, edges: &mut Vec<Edge>) -> Option<(usize, Float)> {
        let axis = bounds.split_axis();
        let outer_area = bounds.surface_area();
        if outer_area <= 0.0 {
            return None;
        }

        edges.clear();
        for &e in entries {
            let entry_bounds = &self.entries[e].bounds;
            edges.push(Edge { location: entry_bounds.p_min[axis], kind: EdgeKind::Start });
            edges.push(Edge { location: entry_bounds.p_max[axis], kind: EdgeKind::End });
        }
        edges.sort_by(|a, b| {
            a.location.partial_cmp(&b.location)
                .unwrap_or(Ordering::Equal)
                .then(a.kind.cmp(&b.kind))
        });

        let total = entries.len();
        let mut below = 0usize;
        let mut above = total;
        let mut best: Option<(Float, Float)> = None;

        for edge in edges.iter() {
            if edge.kind == EdgeKind::End {
                above -= 1;
            }

            if bounds.contains_location(edge.location, axis) {
                let (below_bounds, above_bounds) = bounds.split(axis, edge.location);
                let below_prob = below_bounds.surface_area() / outer_area;
                let above_prob = above_bounds.surface_area() / outer_area;
                let bonus = if below == 0 || above == 0 { EMPTY_SIDE_BONUS } else { 0.0 };
                let cost = TRAVERSAL_COST
                    + (1.0 - bonus) * (below_prob * below as Float * INTERSECTION_COST
                                       + above_prob * above as Float * INTERSECTION_COST);

                if best.map_or(true, |(best_cost, _)| cost < best_cost) {
                    best = Some((cost, edge.location));
                }
            }

            if edge.kind == EdgeKind::Start {
                below += 1;
            }
        }

        let unsplit_cost = INTERSECTION_COST * total as Float;
        match best {
            Some((cost, location)) if cost < unsplit_cost => Some((axis, location)),
            _ => None,
        }
    }

    fn partition(&self, entries: &[usize], axis: usize, location: Float) -> (Vec<usize>, Vec<usize>) {
        let mut below = Vec::with_capacity(entries.len());
        let mut above = Vec::with_capacity(entries.len());
        for &e in entries {
            let b = &self.entries[e].bounds;
            if location > b.p_min[axis] && location < b.p_max[axis] {
                below.push(e);
                above.push(e);
            } else if b.p_max[axis] <= location {
                below.push(e);
            } else {
                above.push(e);
            }
        }
        (below, above)
    }

    /// Nearest primitive along `ray`, or `None`.
    ///
    /// `primitive_test(ray, primitive)` returns the hit distance for one
    /// primitive. A hit only counts inside the part of the primitive's bounds
    /// that overlaps the leaf being visited, which keeps duplicated entries
    /// from ending the search in the wrong cell.
    pub fn find_nearest<F>(&self, ray: &Ray3f, cache: &mut SearchCache, mut primitive_test: F) -> Option<IndexHit>
    where
        F: FnMut(&Ray3f, usize) -> Option<Float>,
    {
        cache.clear();
        let root_bounds = match self.bounds {
            Some(bounds) if !self.nodes.is_empty() => bounds,
            _ => return None,
        };
        if !root_bounds.ray_intersect(ray) {
            return None;
        }
        cache.stack.push((0, root_bounds));

        let origin = ray.origin();
        let dir = ray.dir();

        while let Some((node_index, cell)) = cache.stack.pop() {
            match self.nodes[node_index] {
                KdNode::Branch { axis, location, right } => {
                    let (below_bounds, above_bounds) = cell.split(axis, location);
                    let below = (node_index + 1, below_bounds);
                    let above = (right, above_bounds);

                    let below_first = dir[axis] >= 0.0 || below_bounds.contains_point(&origin);
                    let (near, far) = if below_first { (below, above) } else { (above, below) };

                    if far.1.ray_intersect(ray) {
                        cache.stack.push(far);
                    }
                    if near.1.ray_intersect(ray) {
                        cache.stack.push(near);
                    }
                }
                KdNode::Leaf { start, count } => {
                    let mut best: Option<IndexHit> = None;
                    for &e in &self.leaf_entries[start..start + count] {
                        let entry = &self.entries[e];
                        let overlap = entry.bounds.intersection(&cell);
                        if !overlap.ray_intersect(ray) {
                            continue;
                        }
                        if let Some(distance) = primitive_test(ray, entry.primitive) {
                            if !ray.test_segment(distance) {
                                continue;
                            }
                            if best.map_or(false, |b| b.distance <= distance) {
                                continue;
                            }
                            if overlap.contains_or_touches(&ray.at(distance), EPSILON) {
                                best = Some(IndexHit { primitive: entry.primitive, distance });
                            }
                        }
                    }
                    if best.is_some() {
                        return best;
                    }
                }
            }
        }

        None
    }
}

impl fmt::Display for KdTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![(0usize, 0usize)];
        if self.nodes.is_empty() {
            stack.clear();
        }
        while let Some((node_index, depth)) = stack.pop() {
            let indent = depth * 2;
            match &self.nodes[node_index] {
                KdNode::Branch { axis, location, right } => {
                    writeln!(f, "{:indent$}Axis: {} Location: {}", "", axis, location, indent = indent)?;
                    stack.push((*right, depth + 1));
                    stack.push((node_index + 1, depth + 1));
                }
                KdNode::Leaf { start, count } => {
                    writeln!(f, "{:indent$}Leaf", "", indent = indent)?;
                    for &e in &self.leaf_entries[*start..*start + *count] {
                        writeln!(f, "{:indent$}PrimitiveId: {}", "", self.entries[e].primitive, indent = indent + 2)?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ KdNode, KdTree, KdTreeBuilder, SearchCache };
    use crate::core::rng::LcgRng;
    use crate::core::shape::Shape;
    use crate::math::aabb::AABB;
    use crate::math::constants::{ Float, Vector3f };
    use crate::math::ray::Ray3f;
    use crate::shapes::sphere::Sphere;

    fn box_hit(b: &AABB, ray: &Ray3f) -> Option<Float> {
        b.ray_intersect_range(ray).map(|(t0, _)| t0)
    }

    // Disjoint boxes, one per cell of a 10^3 grid, each jittered inside its cell.
    fn random_boxes(n: usize, rng: &mut LcgRng) -> Vec<AABB> {
        (0..n).map(|i| {
            let cell = Vector3f::new((i % 10) as Float, ((i / 10) % 10) as Float, (i / 100) as Float);
            let size = Vector3f::new(rng.next_range(0.05, 0.45), rng.next_range(0.05, 0.45), rng.next_range(0.05, 0.45));
            let offset = Vector3f::new(rng.next_range(0.0, 0.5), rng.next_range(0.0, 0.5), rng.next_range(0.0, 0.5));
            let min = cell + offset;
            AABB::new(min, min + size)
        }).collect()
    }

    fn random_ray(rng: &mut LcgRng) -> Ray3f {
        let origin = Vector3f::new(rng.next_range(-3.0, 13.0), rng.next_range(-3.0, 13.0), rng.next_range(-3.0, 8.0));
        let target = Vector3f::new(rng.next_range(0.0, 10.0), rng.next_range(0.0, 10.0), rng.next_range(0.0, 5.0));
        Ray3f::new(origin, target - origin, None, None)
    }

    fn check_layout(tree: &KdTree) {
        for (i, node) in tree.nodes.iter().enumerate() {
            if let KdNode::Branch { right, .. } = node {
                assert!(*right > i + 1, "right child of {} must come after its left subtree", i);
                assert!(*right < tree.nodes.len());
            }
        }
    }

    #[test]
    fn test_matches_linear_scan() {
        let mut rng = LcgRng::new(42);
        for &n in &[0usize, 1, 2, 50, 500] {
            let boxes = random_boxes(n, &mut rng);
            let mut builder = KdTreeBuilder::with_capacity(n);
            builder.add_entries(boxes.iter().enumerate().map(|(i, b)| (*b, i)));
            let tree = builder.finalize();
            check_layout(&tree);
            assert!(tree.depth() <= KdTree::max_depth_for(n));

            let mut cache = SearchCache::new();
            for _ in 0..400 {
                let ray = random_ray(&mut rng);
                let mut expected: Option<(usize, Float)> = None;
                let mut runner_up = Float::INFINITY;
                for (i, b) in boxes.iter().enumerate() {
                    if let Some(t) = box_hit(b, &ray) {
                        match expected {
                            Some((_, best)) if t >= best => runner_up = runner_up.min(t),
                            Some((_, best)) => {
                                runner_up = best;
                                expected = Some((i, t));
                            }
                            None => expected = Some((i, t)),
                        }
                    }
                }

                let found = tree.find_nearest(&ray, &mut cache, |r, id| box_hit(&boxes[id], r));
                match (expected, found) {
                    (None, None) => {}
                    (Some((id, t)), Some(hit)) => {
                        assert!((hit.distance - t).abs() < 1e-3, "n={} distance {} vs {}", n, hit.distance, t);
                        // Ties within the tolerance may resolve to either box.
                        if runner_up - t > 1e-3 {
                            assert_eq!(hit.primitive, id, "n={} distance {}", n, t);
                        }
                    }
                    (e, f) => panic!("n={} linear scan {:?} but index {:?}", n, e, f),
                }
            }
        }
    }

    #[test]
    fn test_two_spheres_far_one_reported() {
        let rad = 0.1;
        let spheres = vec![
            Sphere::new(Vector3f::new(0.0, 1.0, 1.0), rad),
            Sphere::new(Vector3f::new(0.0, 1.0, -1.0), rad),
        ];
        let mut builder = KdTreeBuilder::new();
        for (i, s) in spheres.iter().enumerate() {
            builder.add_entry(s.bounding_box(), i);
        }
        let tree = builder.finalize();
        let mut cache = SearchCache::new();

        let ray0 = Ray3f::new(Vector3f::new(0.0, 1.0, -2.0), Vector3f::new(0.0, 0.0, 1.0), None, None);
        let hit0 = tree.find_nearest(&ray0, &mut cache, |r, id| spheres[id].ray_intersection(r)).unwrap();
        assert!((hit0.distance - 0.9).abs() < 1e-5);
        assert_eq!(hit0.primitive, 1);

        let ray1 = Ray3f::new(Vector3f::new(0.0, 1.0, 2.0), Vector3f::new(0.0, 0.0, -1.0), None, None);
        let hit1 = tree.find_nearest(&ray1, &mut cache, |r, id| spheres[id].ray_intersection(r)).unwrap();
        assert!((hit1.distance - 0.9).abs() < 1e-5);
        assert_eq!(hit1.primitive, 0);
    }

    #[test]
    fn test_empty_index_reports_no_hit() {
        let tree = KdTreeBuilder::new().finalize();
        assert_eq!(tree.node_count(), 0);
        assert!(tree.bounds().is_none());
        let mut cache = SearchCache::new();
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, None);
        assert!(tree.find_nearest(&ray, &mut cache, |_, _| Some(1.0)).is_none());
    }

    #[test]
    fn test_small_sets_stay_in_one_leaf() {
        let mut builder = KdTreeBuilder::new();
        builder.add_entry(AABB::new(Vector3f::new(0.0, 0.0, 0.0), Vector3f::new(1.0, 1.0, 1.0)), 7);
        builder.add_entry(AABB::new(Vector3f::new(4.0, 0.0, 0.0), Vector3f::new(5.0, 1.0, 1.0)), 9);
        let tree = builder.finalize();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.leaf_count(), 1);
        let dump = format!("{}", tree);
        assert!(dump.contains("PrimitiveId: 7"));
        assert!(dump.contains("PrimitiveId: 9"));
    }

    #[test]
    fn test_straddling_entries_go_both_ways() {
        let mut builder = KdTreeBuilder::new();
        for i in 0..16 {
            let x = i as Float;
            builder.add_entry(AABB::new(Vector3f::new(x, 0.0, 0.0), Vector3f::new(x + 0.5, 1.0, 1.0)), i);
        }
        // A long entry crossing every other box along x.
        builder.add_entry(AABB::new(Vector3f::new(-0.5, 2.0, 0.0), Vector3f::new(16.0, 2.5, 1.0)), 100);
        let tree = builder.finalize();
        check_layout(&tree);
        assert!(tree.leaf_count() > 1);

        let refs = tree.leaf_entries.iter().filter(|&&e| tree.entries[e].primitive == 100).count();
        assert!(refs > 1);

        let dump = format!("{}", tree);
        assert!(dump.starts_with("Axis: 0"));
    }
}
