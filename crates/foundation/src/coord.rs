/// Fragment-grid coordinate.
///
/// A fragment is a square tile of generated imagery addressed by signed
/// integer grid coordinates. Equality is structural on both components;
/// `packed()` provides a canonical 64-bit key for hosts that want a flat
/// integer key instead of a composite one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FragmentPos {
    pub fx: i32,
    pub fy: i32,
}

impl FragmentPos {
    pub fn new(fx: i32, fy: i32) -> Self {
        Self { fx, fy }
    }

    /// Packs both components into one `u64`: high 32 bits are `fx`,
    /// low 32 bits are `fy`, each reinterpreted as `u32`.
    pub fn packed(self) -> u64 {
        ((self.fx as u32 as u64) << 32) | (self.fy as u32 as u64)
    }

    pub fn from_packed(key: u64) -> Self {
        Self {
            fx: (key >> 32) as u32 as i32,
            fy: key as u32 as i32,
        }
    }
}

impl std::fmt::Display for FragmentPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.fx, self.fy)
    }
}

/// Sub-fragment "block" coordinate. One fragment spans `frag_size` blocks
/// per axis at the base resolution.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockPos {
    pub x: i64,
    pub y: i64,
}

impl BlockPos {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}
