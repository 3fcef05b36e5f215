pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod markov;
pub mod plot;
pub mod stats;

pub use classify::*;
pub use config::*;
pub use engine::*;
pub use error::*;
pub use export::*;
pub use markov::*;
pub use plot::*;
pub use stats::*;
