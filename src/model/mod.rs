pub mod aggregate;
pub mod bounded;
pub mod common;
pub mod entities;
pub mod row;

pub use aggregate::*;
pub use bounded::*;
pub use common::*;
pub use entities::*;
pub use row::*;
