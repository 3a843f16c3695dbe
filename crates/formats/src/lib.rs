pub mod pretty;
pub mod selection;

pub use pretty::*;
pub use selection::*;
