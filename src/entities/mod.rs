//! Entity type definitions

pub mod session;

pub use session::TestSession;
