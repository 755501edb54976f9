// src/core/mod.rs

pub mod engine;
pub mod playback;
pub mod tracker;
pub mod types;
