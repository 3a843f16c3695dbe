pub mod engine;
pub mod store;
pub mod tile;
pub mod world_cache;

pub use engine::*;
pub use store::*;
pub use tile::*;
pub use world_cache::*;
