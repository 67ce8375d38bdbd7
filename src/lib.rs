//! Lyrics canonicalization library - shared modules for the CLI.

pub mod dataset;
pub mod error;
pub mod fetch;
pub mod game;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod progress;
pub mod safety;
