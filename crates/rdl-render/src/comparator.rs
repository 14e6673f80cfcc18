//! Comparators
//!
//! [`SortKeyComparator`] orders group instances by their evaluated sort
//! keys. Levels are chained: each level wraps the comparator of the level
//! before it and only compares its own key when the base reports equality.
//! A missing (Nothing) key sorts after a present one whatever the direction.
//!
//! [`spatial_order`] lays out free-floating items: an item is on a later
//! row only when it starts below the bottom of the band above it; items on
//! one row are ordered left to right.

use std::cmp::Ordering;

use rdl_eval::sort_compare;
use rdl_model::{Position, SortDirection};
use rdl_types::ReportValue;

/// Evaluated sort keys of one group instance, one per level
pub type SortKey = Vec<ReportValue>;

/// Chained multi-level comparator
#[derive(Debug, Clone, Default)]
pub struct SortKeyComparator {
    base: Option<Box<SortKeyComparator>>,
    level: usize,
    direction: SortDirection,
}

impl SortKeyComparator {
    /// Comparator for a list of sort directions, first level outermost
    pub fn chain(directions: impl IntoIterator<Item = SortDirection>) -> Option<Self> {
        directions
            .into_iter()
            .fold(None, |base: Option<Self>, direction| {
                Some(match base {
                    Some(base) => base.then(direction),
                    None => Self::level(0, direction),
                })
            })
    }

    fn level(level: usize, direction: SortDirection) -> Self {
        Self {
            base: None,
            level,
            direction,
        }
    }

    /// Wrap `self` with one more level
    pub fn then(self, direction: SortDirection) -> Self {
        let level = self.level + 1;
        Self {
            base: Some(Box::new(self)),
            level,
            direction,
        }
    }

    pub fn levels(&self) -> usize {
        self.level + 1
    }

    pub fn compare(&self, a: &[ReportValue], b: &[ReportValue]) -> Ordering {
        let base = self
            .base
            .as_ref()
            .map_or(Ordering::Equal, |base| base.compare(a, b));
        if base != Ordering::Equal {
            return base;
        }
        compare_field(a.get(self.level), b.get(self.level), self.direction)
    }
}

/// Compare one sort field. Nothing sorts last in both directions.
pub fn compare_field(
    a: Option<&ReportValue>,
    b: Option<&ReportValue>,
    direction: SortDirection,
) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ordering = sort_compare(a, b);
            match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        }
    }
}

/// Stable sort of `items` by their keys
pub fn sort_by_keys<T>(items: &mut [(SortKey, T)], comparator: &SortKeyComparator) {
    items.sort_by(|(a, _), (b, _)| comparator.compare(a, b));
}

/// Indices of `positions` in layout order, plus the row band of each
///
/// Bands are formed by sweeping the items in `top` order: an item joins the
/// current band unless it starts strictly below the band's lowest bottom
/// edge. Within a band items are ordered by `left`.
pub fn spatial_bands(positions: &[Position]) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..positions.len()).collect();
    order.sort_by(|&a, &b| {
        positions[a]
            .top
            .total_cmp(&positions[b].top)
            .then(positions[a].left.total_cmp(&positions[b].left))
    });

    let mut bands: Vec<Vec<usize>> = Vec::new();
    let mut band_bottom = f64::NEG_INFINITY;
    for index in order {
        let position = &positions[index];
        match bands.last_mut() {
            Some(band) if position.top <= band_bottom => {
                band.push(index);
                band_bottom = band_bottom.max(position.bottom());
            }
            _ => {
                bands.push(vec![index]);
                band_bottom = position.bottom();
            }
        }
    }

    for band in &mut bands {
        band.sort_by(|&a, &b| positions[a].left.total_cmp(&positions[b].left));
    }
    bands
}

/// Indices of `positions` in layout order
pub fn spatial_order(positions: &[Position]) -> Vec<usize> {
    spatial_bands(positions).into_iter().flatten().collect()
}
