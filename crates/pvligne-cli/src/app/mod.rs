//! Form state.

mod state;

pub use state::{App, Field, FieldSpec, MINUTES_FORM, Preview};
