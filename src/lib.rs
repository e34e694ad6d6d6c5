pub mod error;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod stats;
pub mod types;

pub use error::{Result, SlcspError};
