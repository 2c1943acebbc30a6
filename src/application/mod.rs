//! Application services: alignment, playback tracking and view lifecycle.

pub mod align;
pub mod error;
pub mod playback;
pub mod segments;
pub mod view;
