//! Command-line interface module.

mod args;
pub mod apply;
pub mod scan;
pub mod serve;
pub mod show;
pub mod watch;

pub use args::{Cli, Commands};

use anyhow::Result;
use serde::Serialize;

/// Print `value` as JSON on stdout.
fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let formatted = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{formatted}");
    Ok(())
}
