//! Segmentation of long-form archive recordings into tagged clips.

pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod features;
pub mod metadata;
pub mod pipeline;
pub mod segmentation;
pub mod table;
pub mod types;

pub use error::{SplitError, SplitResult};
