use std::collections::BTreeMap;

/// Sparse per-cell selection overlay.
///
/// Cells hold a small tag value: 0 means unselected (never stored),
/// 1 a positive selection, 2 a negative one. Click input cycles 0 → 1 →
/// 2 → 0.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SelectionStore {
    cells: BTreeMap<(i64, i64), u8>,
}

pub const SELECTION_POSITIVE: u8 = 1;
pub const SELECTION_NEGATIVE: u8 = 2;
const SELECTION_STATES: u8 = 3;

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, x: i64, y: i64) -> u8 {
        self.cells.get(&(x, y)).copied().unwrap_or(0)
    }

    pub fn set(&mut self, x: i64, y: i64, value: u8) {
        if value == 0 {
            // No need to store empty cells.
            self.cells.remove(&(x, y));
        } else {
            self.cells.insert((x, y), value);
        }
    }

    /// Click behavior: advance the cell to the next state.
    pub fn cycle(&mut self, x: i64, y: i64) -> u8 {
        let next = (self.get(x, y) + 1) % SELECTION_STATES;
        self.set(x, y, next);
        next
    }

    /// All cells holding `value`, in deterministic key order.
    pub fn cells_with(&self, value: u8) -> Vec<[i64; 2]> {
        self.cells
            .iter()
            .filter(|(_, v)| **v == value)
            .map(|(&(x, y), _)| [x, y])
            .collect()
    }

    pub fn set_all(&mut self, value: u8, cells: &[[i64; 2]]) {
        for &[x, y] in cells {
            self.set(x, y, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = ((i64, i64), u8)> + '_ {
        self.cells.iter().map(|(&k, &v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }
}
