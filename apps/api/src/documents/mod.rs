//! CV / cover-letter document generation.

pub mod handlers;
pub mod renderer;
