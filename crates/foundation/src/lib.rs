pub mod coord;
pub mod time;

// Foundation crate: small, well-tested primitives only.
pub use coord::*;
pub use time::*;
