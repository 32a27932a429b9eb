//! # Bang Board Tools
//!
//! Command-line tools for development:
//! - Board generation previews
//! - Move and attack set inspection
//! - Headless replay of scripted rounds through the action scheduler

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod replay;
pub mod scenario;
pub mod summary;
