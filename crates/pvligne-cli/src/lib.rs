//! PV en Ligne CLI Library
//!
//! Terminal rendition of the minutes action form, with `@mention`
//! autocomplete on the fields that opt in.

pub mod app;
pub mod autocomplete;
pub mod config;
pub mod tui;
pub mod ui;
