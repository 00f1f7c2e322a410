//! Terminal output
//!
//! Interactive terminals get `cliclack` log lines, spinners and an
//! `indicatif` build progress bar; CI gets plain, greppable lines with the
//! full build tool output.

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{intro, key_value, outro_success, section, step_error, step_ok};
pub use progress::{BuildProgress, TaskSpinner};
