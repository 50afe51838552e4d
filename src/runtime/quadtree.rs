use eframe::egui::{Pos2, Rect, pos2, vec2};
use serde::Serialize;
use tracing::{debug, warn};

use crate::atlas::PositionedIdea;

pub const DEFAULT_CAPACITY: usize = 10;
pub const DEFAULT_MAX_DEPTH: usize = 12;

/// Axis-aligned node bounds, inclusive on every edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadBounds {
    pub min: Pos2,
    pub max: Pos2,
}

impl QuadBounds {
    pub fn new(min: Pos2, max: Pos2) -> Self {
        Self {
            min: pos2(min.x.min(max.x), min.y.min(max.y)),
            max: pos2(min.x.max(max.x), min.y.max(max.y)),
        }
    }

    pub fn from_rect(rect: Rect) -> Self {
        Self::new(rect.min, rect.max)
    }

    /// Square bounds around `points`, padded by `padding` on every side.
    pub fn from_points(points: impl IntoIterator<Item = Pos2>, padding: f32) -> Option<Self> {
        let mut min = pos2(f32::INFINITY, f32::INFINITY);
        let mut max = pos2(f32::NEG_INFINITY, f32::NEG_INFINITY);

        for point in points {
            if !point.x.is_finite() || !point.y.is_finite() {
                continue;
            }
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
        }

        if !min.x.is_finite() || !min.y.is_finite() || !max.x.is_finite() || !max.y.is_finite() {
            return None;
        }

        let center = pos2((min.x + max.x) * 0.5, (min.y + max.y) * 0.5);
        let span_x = (max.x - min.x).max(1.0);
        let span_y = (max.y - min.y).max(1.0);
        let half_extent = (span_x.max(span_y) * 0.5) + padding.max(1.0);

        Some(Self::new(
            center - vec2(half_extent, half_extent),
            center + vec2(half_extent, half_extent),
        ))
    }

    pub fn rect(self) -> Rect {
        Rect::from_min_max(self.min, self.max)
    }

    pub fn contains(self, point: Pos2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    pub fn intersects(self, rect: Rect) -> bool {
        self.min.x <= rect.max.x
            && self.max.x >= rect.min.x
            && self.min.y <= rect.max.y
            && self.max.y >= rect.min.y
    }

    fn midpoint(self) -> Pos2 {
        pos2((self.min.x + self.max.x) * 0.5, (self.min.y + self.max.y) * 0.5)
    }

    fn child(self, quadrant: usize) -> Self {
        let mid = self.midpoint();
        match quadrant {
            0 => Self::new(self.min, mid),
            1 => Self::new(pos2(mid.x, self.min.y), pos2(self.max.x, mid.y)),
            2 => Self::new(pos2(self.min.x, mid.y), pos2(mid.x, self.max.y)),
            _ => Self::new(mid, self.max),
        }
    }

    fn quadrant_for(self, point: Pos2) -> usize {
        let mid = self.midpoint();
        let right = point.x >= mid.x;
        let lower = point.y >= mid.y;
        match (right, lower) {
            (false, false) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (true, true) => 3,
        }
    }

    /// Squared distance from `point` to the closest point of the bounds (0 inside).
    pub fn distance_sq_to(self, point: Pos2) -> f32 {
        let dx = point.x.clamp(self.min.x, self.max.x) - point.x;
        let dy = point.y.clamp(self.min.y, self.max.y) - point.y;
        (dx * dx) + (dy * dy)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadEntry {
    pub index: usize,
    pub position: Pos2,
}

struct QuadNode {
    bounds: QuadBounds,
    depth: usize,
    entries: Vec<QuadEntry>,
    children: Option<Box<[QuadNode; 4]>>,
}

/// A node as seen from outside the tree, for overlays and invariant checks.
#[derive(Clone, Copy, Debug)]
pub struct QuadNodeView<'a> {
    pub bounds: QuadBounds,
    pub depth: usize,
    pub entries: &'a [QuadEntry],
    pub child_count: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadtreeCell {
    pub bounds: QuadBounds,
    pub depth: usize,
    pub is_leaf: bool,
    pub points: usize,
}

impl QuadNode {
    fn new(bounds: QuadBounds, depth: usize) -> Self {
        Self {
            bounds,
            depth,
            entries: Vec::new(),
            children: None,
        }
    }

    fn insert(&mut self, entry: QuadEntry, capacity: usize, max_depth: usize) -> bool {
        if !self.bounds.contains(entry.position) {
            return false;
        }

        if let Some(children) = self.children.as_mut() {
            let quadrant = self.bounds.quadrant_for(entry.position);
            return children[quadrant].insert(entry, capacity, max_depth);
        }

        self.entries.push(entry);
        if self.entries.len() > capacity && self.depth < max_depth {
            self.subdivide(capacity, max_depth);
        }
        true
    }

    fn subdivide(&mut self, capacity: usize, max_depth: usize) {
        let bounds = self.bounds;
        let depth = self.depth;
        let mut children = Box::new(std::array::from_fn::<_, 4, _>(|quadrant| {
            QuadNode::new(bounds.child(quadrant), depth + 1)
        }));

        for entry in self.entries.drain(..) {
            let quadrant = bounds.quadrant_for(entry.position);
            children[quadrant].insert(entry, capacity, max_depth);
        }
        self.children = Some(children);
    }

    fn query_radius(&self, center: Pos2, radius_sq: f32, out: &mut Vec<QuadEntry>) {
        if self.bounds.distance_sq_to(center) > radius_sq {
            return;
        }

        match self.children.as_deref() {
            Some(children) => {
                for child in children {
                    child.query_radius(center, radius_sq, out);
                }
            }
            None => out.extend(
                self.entries
                    .iter()
                    .filter(|entry| entry.position.distance_sq(center) <= radius_sq),
            ),
        }
    }

    fn query_rect(&self, rect: Rect, out: &mut Vec<QuadEntry>) {
        if !self.bounds.intersects(rect) {
            return;
        }

        match self.children.as_deref() {
            Some(children) => {
                for child in children {
                    child.query_rect(rect, out);
                }
            }
            None => out.extend(
                self.entries
                    .iter()
                    .filter(|entry| rect.contains(entry.position)),
            ),
        }
    }

    fn visit<'a>(&'a self, visitor: &mut impl FnMut(QuadNodeView<'a>)) {
        visitor(QuadNodeView {
            bounds: self.bounds,
            depth: self.depth,
            entries: &self.entries,
            child_count: self.children.as_ref().map_or(0, |children| children.len()),
        });

        if let Some(children) = self.children.as_deref() {
            for child in children {
                child.visit(visitor);
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct QuadtreeStats {
    pub points: usize,
    pub nodes: usize,
    pub leaves: usize,
    pub depth: usize,
    pub largest_leaf: usize,
}

/// Region quadtree over idea positions. Insert-only; rebuild it when the dataset changes.
pub struct Quadtree {
    root: QuadNode,
    capacity: usize,
    max_depth: usize,
    len: usize,
}

impl Quadtree {
    pub fn new(bounds: QuadBounds, capacity: usize) -> Self {
        Self::with_max_depth(bounds, capacity, DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(bounds: QuadBounds, capacity: usize, max_depth: usize) -> Self {
        Self {
            root: QuadNode::new(bounds, 0),
            capacity: capacity.max(1),
            max_depth,
            len: 0,
        }
    }

    /// Indexes every idea by its dataset position. Ideas outside `bounds` are skipped.
    pub fn build(ideas: &[PositionedIdea], bounds: QuadBounds, capacity: usize) -> Self {
        let mut tree = Self::new(bounds, capacity);
        tree.insert_ideas(ideas);
        tree
    }

    /// Inserts `ideas` keyed by their slice index; returns how many were rejected.
    pub fn insert_ideas(&mut self, ideas: &[PositionedIdea]) -> usize {
        let mut rejected = 0usize;
        for (index, idea) in ideas.iter().enumerate() {
            if !self.insert(index, idea.position()) {
                rejected += 1;
            }
        }

        if rejected > 0 {
            warn!(rejected, "ideas outside the index bounds were not indexed");
        }
        debug!(points = self.len, capacity = self.capacity, "built quadtree");
        rejected
    }

    /// Returns false, leaving the tree untouched, when `position` lies outside the root.
    pub fn insert(&mut self, index: usize, position: Pos2) -> bool {
        let inserted =
            self.root
                .insert(QuadEntry { index, position }, self.capacity, self.max_depth);
        if inserted {
            self.len += 1;
        }
        inserted
    }

    pub fn query_radius(&self, center: Pos2, radius: f32) -> Vec<QuadEntry> {
        let mut out = Vec::new();
        if radius >= 0.0 {
            self.root.query_radius(center, radius * radius, &mut out);
        }
        out
    }

    pub fn query_rect(&self, rect: Rect) -> Vec<QuadEntry> {
        let mut out = Vec::new();
        self.root.query_rect(rect, &mut out);
        out
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bounds(&self) -> QuadBounds {
        self.root.bounds
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn visit<'a>(&'a self, mut visitor: impl FnMut(QuadNodeView<'a>)) {
        self.root.visit(&mut visitor);
    }

    pub fn cells(&self) -> Vec<QuadtreeCell> {
        let mut cells = Vec::new();
        self.visit(|node| {
            cells.push(QuadtreeCell {
                bounds: node.bounds,
                depth: node.depth,
                is_leaf: node.child_count == 0,
                points: node.entries.len(),
            });
        });
        cells
    }

    pub fn stats(&self) -> QuadtreeStats {
        let mut stats = QuadtreeStats {
            points: self.len,
            ..QuadtreeStats::default()
        };
        self.visit(|node| {
            stats.nodes += 1;
            stats.depth = stats.depth.max(node.depth);
            if node.child_count == 0 {
                stats.leaves += 1;
                stats.largest_leaf = stats.largest_leaf.max(node.entries.len());
            }
        });
        stats
    }
}
