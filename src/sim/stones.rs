use super::grid::{Cell, Grid};
use crate::config::StoneConfig;
use rand::{seq::IndexedRandom, Rng};
use std::collections::HashSet;

/// Chance of including an interior footprint cell of a stone that is at
/// least 3×3
const INTERIOR_CHANCE: f64 = 0.9;

/// Chance of including any other footprint cell
const EDGE_CHANCE: f64 = 0.5;

/// Fewest cells a stone group may consist of
const MIN_GROUP_CELLS: usize = 2;

/// One obstacle: a cluster of cells grown from an anchor cell.  The anchor
/// is always a member of `cells`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct StoneGroup {
    anchor: Cell,
    cells: Vec<Cell>,
}

impl StoneGroup {
    pub(crate) fn anchor(&self) -> Cell {
        self.anchor
    }

    pub(crate) fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

/// All of a round's obstacles.  Generated once at the start of a round and
/// never modified afterwards.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct StoneField {
    groups: Vec<StoneGroup>,
    cells: HashSet<Cell>,
}

impl StoneField {
    /// Place between `params.min_count` and `params.max_count` stone groups
    /// on `grid`, keeping clear of the cells in `reserved`.  Groups that
    /// cannot be placed within the retry budget are left out.
    pub(crate) fn generate<R: Rng + ?Sized>(
        rng: &mut R,
        grid: Grid,
        params: &StoneConfig,
        reserved: &HashSet<Cell>,
    ) -> StoneField {
        let wanted = rng.random_range(params.min_count..=params.max_count);
        let mut field = StoneField::default();
        let mut forbidden = reserved.clone();
        for _ in 0..wanted {
            match generate_group(rng, grid, &forbidden, &field.groups, params) {
                Some(group) => {
                    log::debug!(
                        "Placed {}-cell stone group anchored at {:?}",
                        group.cells().len(),
                        group.anchor()
                    );
                    forbidden.extend(group.cells.iter().copied());
                    field.push(group);
                }
                None => log::debug!("Stone group could not be placed; skipping it"),
            }
        }
        if field.groups.len() < wanted {
            log::info!(
                "Placed {} of {} requested stone groups",
                field.groups.len(),
                wanted
            );
        }
        field
    }

    /// Build a field from explicit `(anchor, cells)` groups.  The anchor is
    /// added to its group's cells if missing.
    #[cfg(test)]
    pub(crate) fn from_groups<I>(groups: I) -> StoneField
    where
        I: IntoIterator<Item = (Cell, Vec<Cell>)>,
    {
        let mut field = StoneField::default();
        for (anchor, mut cells) in groups {
            if !cells.contains(&anchor) {
                cells.insert(0, anchor);
            }
            field.push(StoneGroup { anchor, cells });
        }
        field
    }

    fn push(&mut self, group: StoneGroup) {
        self.cells.extend(group.cells.iter().copied());
        self.groups.push(group);
    }

    pub(crate) fn contains(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    pub(crate) fn cells(&self) -> &HashSet<Cell> {
        &self.cells
    }

    pub(crate) fn groups(&self) -> &[StoneGroup] {
        &self.groups
    }
}

/// Try to grow one stone group on `grid`.
///
/// A footprint size is drawn first; then up to `params.placement_attempts`
/// anchors are drawn from the cells not in `forbidden`.  An anchor closer
/// than `params.min_distance` (wrap-aware Chebyshev) to the anchor of any of
/// `existing` is rejected.  Footprint cells are then kept at random, with
/// the first two always kept, and forbidden cells always skipped.  Returns
/// `None` if no attempt yields at least two cells.
pub(crate) fn generate_group<R: Rng + ?Sized>(
    rng: &mut R,
    grid: Grid,
    forbidden: &HashSet<Cell>,
    existing: &[StoneGroup],
    params: &StoneConfig,
) -> Option<StoneGroup> {
    let width = rng.random_range(params.min_size..=params.max_size);
    let height = rng.random_range(params.min_size..=params.max_size);
    let available = grid
        .cells()
        .filter(|c| !forbidden.contains(c))
        .collect::<Vec<_>>();
    if available.len() < usize::from(width) * usize::from(height) {
        return None;
    }
    let large = width >= 3 && height >= 3;
    for _ in 0..params.placement_attempts {
        let &anchor = available.choose(rng)?;
        if existing
            .iter()
            .any(|g| grid.chebyshev_distance(g.anchor, anchor) < params.min_distance)
        {
            continue;
        }
        let mut cells = Vec::new();
        for dx in 0..width {
            for dy in 0..height {
                let interior = 0 < dx && dx < width - 1 && 0 < dy && dy < height - 1;
                let chance = if large && interior {
                    INTERIOR_CHANCE
                } else {
                    EDGE_CHANCE
                };
                if cells.len() < MIN_GROUP_CELLS || rng.random_bool(chance) {
                    let cell = grid.wrap(
                        i32::from(anchor.col) + i32::from(dx),
                        i32::from(anchor.row) + i32::from(dy),
                    );
                    if !forbidden.contains(&cell) && !cells.contains(&cell) {
                        cells.push(cell);
                    }
                }
            }
        }
        if cells.len() >= MIN_GROUP_CELLS {
            return Some(StoneGroup { anchor, cells });
        }
    }
    None
}
