//! formkit command-line interface.
//!
//! Commands:
//! - `formkit validate <form> --values <file>`: validate values, print cleaned values or errors
//! - `formkit defaults <form> [--initial <file>]`: print derived default values
//! - `formkit sections <form>`: print field names grouped by section
//! - `formkit custom list|add|remove <entity> ...`: manage stored custom fields
//! - `formkit normalize-image <in> <out>`: re-encode an image as a bounded JPEG
//! - `formkit submit <form> --entity <type> --values <file>`: run the engine, print the payload
//!
//! Exit codes:
//! - 0: Success
//! - 1: Error
//! - 2: Values failed validation

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands, CustomAction};
pub use commands::{run, Outcome, VALIDATION_FAILED_EXIT_CODE};
