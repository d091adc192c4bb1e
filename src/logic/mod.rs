pub mod fold;
pub mod operations;

pub use fold::*;
pub use operations::*;
