pub mod error;
pub mod frame;
pub mod header;

pub use error::*;
pub use frame::*;
pub use header::*;
