//! Read-along highlighting: align timed narration segments with article text
//! and track which segment is being narrated.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub(crate) mod util;
