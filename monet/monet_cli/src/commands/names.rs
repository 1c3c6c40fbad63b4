//! Name and header commands
//!
//! These work on capability names alone and never touch a cache.

use std::process::ExitCode;

use anyhow::Result;
use monet_core::is_valid_capability;
use monet_runtime::Monetization;

/// Implementation of the validate command.
///
/// Prints one line per name and fails if any name is invalid.
pub fn execute_validate(names: &[String]) -> ExitCode {
    let mut all_valid = true;
    for name in names {
        if is_valid_capability(name) {
            println!("{}: valid", name);
        } else {
            println!("{}: invalid", name);
            all_valid = false;
        }
    }

    if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Implementation of the header command
pub fn execute_header(allow: &[String], deny: &[String]) -> Result<()> {
    let monetization = Monetization::new();
    let preferences = monetization.preferences();
    for pattern in allow {
        preferences.allow(pattern)?;
    }
    for pattern in deny {
        preferences.deny(pattern)?;
    }

    println!("{}", monetization.accept_header());
    Ok(())
}
