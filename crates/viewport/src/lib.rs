pub mod camera;
pub mod renderer;
pub mod selection;
pub mod viewer;
pub mod visible;

pub use camera::*;
pub use renderer::*;
pub use selection::*;
pub use viewer::*;
pub use visible::*;
