pub mod commands;
pub mod error;
pub mod session;

pub use commands::*;
pub use error::*;
pub use session::*;
