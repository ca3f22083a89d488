mod build;
mod load;
mod nest;
mod types;

pub use build::*;
pub use load::*;
pub use nest::*;
pub use types::*;
