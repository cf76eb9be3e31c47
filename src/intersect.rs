//! Orthogonal segment intersection counting.
//!
//! Every branch is one axis-aligned drawable segment (node coordinate →
//! segment-end coordinate). Collinear overlaps are counted per shared-axis
//! group with a binary search over sorted span starts; perpendicular
//! crossings with a left-to-right sweep over a direction-doubled event set.

use itertools::Itertools;

use crate::arena::GeometryArena;
use crate::util::search::lower_bound;

/// Axis-aligned span: `at` is the shared coordinate (y for horizontals,
/// x for verticals), `start`/`end` the normalized extent on the varying axis.
#[derive(Debug, Clone, Copy)]
struct Span {
    at: f64,
    start: f64,
    end: f64,
}

/// Count all segment intersections in the laid-out tree.
///
/// Total = collinear overlaps among horizontals + collinear overlaps among
/// verticals + horizontal/vertical crossings.
pub fn count_intersections(arena: &GeometryArena) -> usize {
    let (horizontals, verticals) = drawable_spans(arena);
    collinear_overlaps(horizontals.clone())
        + collinear_overlaps(verticals.clone())
        + sweep_crossings(&horizontals, &verticals)
}

/// Extract one span per real node: branch origin to the segment-end marker.
/// Zero-length branches draw nothing and are skipped.
fn drawable_spans(arena: &GeometryArena) -> (Vec<Span>, Vec<Span>) {
    let mut horizontals = Vec::new();
    let mut verticals = Vec::new();

    for (_, node) in arena.iter() {
        if node.hidden || node.length <= 0.0 {
            continue;
        }
        let tip = node
            .children
            .iter()
            .rev()
            .filter_map(|&c| arena.get_node(c))
            .find(|c| c.hidden);
        let Some(tip) = tip else { continue };

        let a = node.coordinates;
        let b = tip.coordinates;
        if a.y == b.y {
            horizontals.push(Span {
                at: a.y,
                start: a.x.min(b.x),
                end: a.x.max(b.x),
            });
        } else {
            verticals.push(Span {
                at: a.x,
                start: a.y.min(b.y),
                end: a.y.max(b.y),
            });
        }
    }

    (horizontals, verticals)
}

/// Count overlapping pairs among same-orientation spans.
///
/// Spans sharing their `at` coordinate form a group; within a group, sorted
/// by start, each span overlaps the later spans whose start falls inside its
/// half-open extent `[start, end)`. Touch-at-endpoint is not an overlap;
/// coincident starts are.
fn collinear_overlaps(mut spans: Vec<Span>) -> usize {
    spans.sort_by(|l, r| l.at.total_cmp(&r.at).then(l.start.total_cmp(&r.start)));

    let mut count = 0;
    for (_, group) in &spans.iter().chunk_by(|s| s.at.to_bits()) {
        let group: Vec<&Span> = group.collect();
        for i in 0..group.len() {
            let tail = group.len() - i - 1;
            let within = lower_bound(tail, |k| group[i + 1 + k].start < group[i].end);
            count += within;
        }
    }
    count
}

/// Sweep event: the doubled segment forms collapse to open/close markers for
/// horizontals and a single counted visit per vertical (the reversed vertical
/// form is the skipped duplicate).
#[derive(Debug, Clone, Copy)]
enum Event {
    /// Horizontal left endpoint reached: open at y.
    Open(f64),
    /// Horizontal right endpoint (reversed form) reached: close at y.
    Close(f64),
    /// Vertical at x: count open horizontals with y strictly inside (lo, hi).
    Count { lo: f64, hi: f64 },
}

impl Event {
    /// Tie order at equal x: closes, then verticals, then opens — touching
    /// endpoints (parent/child T-junctions) must not register as crossings.
    fn rank(self) -> u8 {
        match self {
            Event::Close(_) => 0,
            Event::Count { .. } => 1,
            Event::Open(_) => 2,
        }
    }
}

/// Count horizontal/vertical crossings with a left-to-right sweep.
fn sweep_crossings(horizontals: &[Span], verticals: &[Span]) -> usize {
    let mut events: Vec<(f64, Event)> = Vec::with_capacity(2 * horizontals.len() + verticals.len());
    for h in horizontals {
        events.push((h.start, Event::Open(h.at)));
        events.push((h.end, Event::Close(h.at)));
    }
    for v in verticals {
        events.push((
            v.at,
            Event::Count {
                lo: v.start,
                hi: v.end,
            },
        ));
    }
    events.sort_by(|l, r| l.0.total_cmp(&r.0).then(l.1.rank().cmp(&r.1.rank())));

    // Open horizontal y-values as a sorted multiset.
    let mut open: Vec<f64> = Vec::new();
    let mut count = 0;

    for (_, event) in events {
        match event {
            Event::Open(y) => {
                let pos = lower_bound(open.len(), |i| open[i] < y);
                open.insert(pos, y);
            }
            Event::Close(y) => {
                let pos = lower_bound(open.len(), |i| open[i] < y);
                if open.get(pos) == Some(&y) {
                    open.remove(pos);
                }
            }
            Event::Count { lo, hi } => {
                let below_hi = lower_bound(open.len(), |i| open[i] < hi);
                let through_lo = lower_bound(open.len(), |i| open[i] <= lo);
                count += below_hi.saturating_sub(through_lo);
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(at: f64, start: f64, end: f64) -> Span {
        Span { at, start, end }
    }

    #[test]
    fn given_crossing_segments_when_sweeping_then_one_crossing() {
        // Horizontal through the vertical's interior
        let h = vec![span(0.0, -10.0, 10.0)];
        let v = vec![span(0.0, -5.0, 5.0)];
        assert_eq!(sweep_crossings(&h, &v), 1);
    }

    #[test]
    fn given_t_junction_when_sweeping_then_no_crossing() {
        // Horizontal starts exactly on the vertical: touching, not crossing
        let h = vec![span(0.0, 0.0, 10.0)];
        let v = vec![span(0.0, -5.0, 5.0)];
        assert_eq!(sweep_crossings(&h, &v), 0);

        // Vertical ends exactly on the horizontal
        let h = vec![span(0.0, -10.0, 10.0)];
        let v = vec![span(3.0, 0.0, 5.0)];
        assert_eq!(sweep_crossings(&h, &v), 0);
    }

    #[test]
    fn given_disjoint_segments_when_sweeping_then_no_crossing() {
        let h = vec![span(0.0, 0.0, 10.0)];
        let v = vec![span(20.0, -5.0, 5.0)];
        assert_eq!(sweep_crossings(&h, &v), 0);
    }

    #[test]
    fn given_collinear_spans_when_counting_then_half_open_semantics() {
        // Overlapping interiors count
        assert_eq!(collinear_overlaps(vec![span(0.0, 0.0, 10.0), span(0.0, 5.0, 15.0)]), 1);
        // Touch at endpoint does not
        assert_eq!(collinear_overlaps(vec![span(0.0, 0.0, 10.0), span(0.0, 10.0, 20.0)]), 0);
        // Coincident starts do
        assert_eq!(collinear_overlaps(vec![span(0.0, 0.0, 10.0), span(0.0, 0.0, 5.0)]), 1);
        // Different groups never interact
        assert_eq!(collinear_overlaps(vec![span(0.0, 0.0, 10.0), span(1.0, 0.0, 10.0)]), 0);
    }

    #[test]
    fn given_three_stacked_spans_when_counting_then_all_pairs() {
        let spans = vec![
            span(0.0, 0.0, 10.0),
            span(0.0, 2.0, 12.0),
            span(0.0, 4.0, 14.0),
        ];
        assert_eq!(collinear_overlaps(spans), 3);
    }
}
