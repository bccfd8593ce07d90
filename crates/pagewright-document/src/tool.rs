// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Blocking invocation of external command-line tools.
//
// No timeout is applied: a tool that hangs blocks the caller.

use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Output};

use pagewright_core::error::{PagewrightError, Result};
use tracing::{debug, trace};

/// Run `program` with `args` to completion, capturing stdout and stderr.
///
/// Fails only when the process cannot be spawned; a nonzero exit status is
/// returned to the caller inside [`Output`] so each operation can map it to
/// its own error variant.
pub(crate) fn run<I, S>(program: &Path, args: I) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command.args(args);
    trace!(?command, "Spawning external tool");

    let output = command.output().map_err(|err| PagewrightError::ToolLaunch {
        tool: program.display().to_string(),
        reason: err.to_string(),
    })?;

    debug!(
        tool = %program.display(),
        status = %output.status,
        stdout_bytes = output.stdout.len(),
        stderr_bytes = output.stderr.len(),
        "External tool finished"
    );
    Ok(output)
}

/// Short human-readable reason for a failed run: exit status plus the
/// trimmed stderr, if any.
pub(crate) fn failure_reason(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        format!("exited with {}: {}", output.status, stderr)
    }
}
