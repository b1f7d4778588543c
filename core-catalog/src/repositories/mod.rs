//! Repository layer for single-document meme access
//!
//! Reads and writes of individual records go through [`MemeRepository`];
//! listing and sampling live in [`crate::query`].

pub mod meme;

pub use meme::{MemeRepository, StoreMemeRepository};
