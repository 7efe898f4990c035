//! # Rendering Module
//!
//! Text rendering for the terminal front-end.

pub mod display;
pub mod ui;

pub use display::*;
pub use ui::*;
