//! CLI command implementations

pub mod building;
pub mod calc;
pub mod completions;
pub mod init;
pub mod point;
pub mod rings;
pub mod session;
pub mod utils;
pub mod validate;
pub mod weather;
