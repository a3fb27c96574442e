pub mod automation;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod io;
pub mod paths;
pub mod remote;
pub mod rewrite;
pub mod tag;
pub mod validate;

pub use error::{FixidsError, Result};
