//! BDT: Plain-text Blower Door Toolkit
//!
//! A Unix-style toolkit for recording blower-door airtightness tests as plain
//! text files under git version control, and for turning raw fan-pressure
//! readings into standardized leakage metrics and code-compliance verdicts.

pub mod cli;
pub mod core;
pub mod entities;
pub mod yaml;
