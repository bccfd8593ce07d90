// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Dependency prober — checks that the external executables the document
// operations shell out to are reachable, without running any of them.

use std::path::{Path, PathBuf};

use pagewright_core::error::{PagewrightError, Result};
use pagewright_core::{Dependency, HostPlatform, ToolConfig};
use tracing::{debug, info, instrument, warn};

/// Outcome of probing for every required executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyReport {
    /// Dependencies that could not be found, in probe order.
    pub missing: Vec<Dependency>,
    /// Platform the install hint was chosen for.
    pub platform: HostPlatform,
}

impl DependencyReport {
    pub fn is_ready(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn is_available(&self, dependency: Dependency) -> bool {
        !self.missing.contains(&dependency)
    }

    pub fn install_hint(&self) -> &'static str {
        self.platform.install_hint()
    }

    /// Convert into a `Result`, failing with every missing dependency listed.
    pub fn into_result(self) -> Result<()> {
        if self.is_ready() {
            return Ok(());
        }
        Err(PagewrightError::MissingDependency {
            missing: self.missing.iter().map(|dep| dep.label().to_string()).collect(),
            hint: self.install_hint().to_string(),
        })
    }
}

/// Probe the default executables on the search path.
pub fn probe_dependencies() -> DependencyReport {
    probe_with_config(&ToolConfig::default())
}

/// Probe the executables named by `config`. Every dependency is checked
/// before the report is returned.
#[instrument(skip_all)]
pub fn probe_with_config(config: &ToolConfig) -> DependencyReport {
    let mut missing = Vec::new();
    for dependency in Dependency::ALL {
        let program = config.executable(dependency);
        match find_executable(program) {
            Some(found) => debug!(%dependency, path = %found.display(), "Dependency found"),
            None => {
                warn!(%dependency, program = %program.display(), "Dependency missing");
                missing.push(dependency);
            }
        }
    }

    let report = DependencyReport {
        missing,
        platform: HostPlatform::current(),
    };
    info!(ready = report.is_ready(), missing = report.missing.len(), "Dependency probe complete");
    report
}

/// Fail with [`PagewrightError::MissingDependency`] unless every default
/// executable is available.
pub fn check_system_dependencies() -> Result<()> {
    probe_dependencies().into_result()
}

/// Resolve `program` the way a shell would: a path with a directory
/// component is checked directly, a bare name is looked up on `PATH`.
pub fn find_executable(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 {
        return is_executable(program).then(|| program.to_path_buf());
    }

    let search_path = std::env::var_os("PATH")?;
    std::env::split_paths(&search_path)
        .flat_map(|dir| candidates(&dir.join(program)))
        .find(|candidate| is_executable(candidate))
}

#[cfg(windows)]
fn candidates(base: &Path) -> Vec<PathBuf> {
    let mut names = vec![base.to_path_buf()];
    if base.extension().is_none() {
        names.push(base.with_extension("exe"));
    }
    names
}

#[cfg(not(windows))]
fn candidates(base: &Path) -> Vec<PathBuf> {
    vec![base.to_path_buf()]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_tools_are_all_reported() {
        let config = ToolConfig {
            pdftotext: PathBuf::from("/nonexistent/pdftotext"),
            pdftoppm: PathBuf::from("/nonexistent/pdftoppm"),
            tesseract: PathBuf::from("/nonexistent/tesseract"),
            ..ToolConfig::default()
        };
        let report = probe_with_config(&config);
        assert_eq!(report.missing, Dependency::ALL.to_vec());
        assert!(!report.is_ready());

        match report.into_result().unwrap_err() {
            PagewrightError::MissingDependency { missing, hint } => {
                assert_eq!(missing.len(), 3);
                assert_eq!(missing[0], "pdftotext (poppler/poppler-utils)");
                assert_eq!(hint, HostPlatform::current().install_hint());
            }
            other => panic!("unexpected error variant: {other}"),
        }
    }

    #[test]
    fn ready_report_converts_to_ok() {
        let report = DependencyReport {
            missing: Vec::new(),
            platform: HostPlatform::Linux,
        };
        assert!(report.is_available(Dependency::Tesseract));
        assert!(report.into_result().is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn explicit_paths_are_checked_directly() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("fake-tesseract");
        std::fs::write(&tool, "#!/bin/sh\n").unwrap();

        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o644)).unwrap();
        assert!(find_executable(&tool).is_none(), "non-executable file must not count");

        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(find_executable(&tool), Some(tool.clone()));
    }

    #[cfg(unix)]
    #[test]
    fn bare_names_use_search_path() {
        assert!(find_executable(Path::new("sh")).is_some());
        assert!(find_executable(Path::new("pagewright-no-such-tool")).is_none());
    }
}
