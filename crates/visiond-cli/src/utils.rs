// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Maverick Contributors

use crate::error::CliError;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::flag;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Install signal handlers for graceful shutdown on Ctrl+C or SIGTERM
///
/// The returned flag is set once either signal arrives; the supervisor
/// polls it between sleeps.
pub fn install_signal_handler() -> Result<Arc<AtomicBool>, CliError> {
    let term = Arc::new(AtomicBool::new(false));

    for signal in [SIGINT, SIGTERM] {
        flag::register(signal, Arc::clone(&term))
            .map_err(|e| CliError::General(format!("Failed to register signal handler: {}", e)))?;
    }

    log::debug!("Installed SIGINT/SIGTERM handlers");
    Ok(term)
}
