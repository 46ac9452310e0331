//! Artifact and build output locations
//!
//! Everything a run produces lives under `<project>/.owl/`:
//! - `report/` for the generated report
//! - `<platform>/baseline`, `<platform>/latest`, `<platform>/diff` for screenshots

use std::io;
use std::path::{Path, PathBuf};

use crate::platform::Platform;

/// Name of the artifact directory in the project root
const ARTIFACT_DIR: &str = ".owl";

/// Screenshot directories kept per platform
pub const SCREENSHOT_KINDS: [&str; 3] = ["baseline", "latest", "diff"];

/// Root of all run artifacts
pub fn artifact_dir(project_root: &Path) -> PathBuf {
    project_root.join(ARTIFACT_DIR)
}

/// Directory the report is written to
pub fn report_dir(project_root: &Path) -> PathBuf {
    artifact_dir(project_root).join("report")
}

/// Screenshot directory of one kind for a platform
pub fn screenshot_dir(project_root: &Path, platform: Platform, kind: &str) -> PathBuf {
    artifact_dir(project_root).join(platform.as_str()).join(kind)
}

/// Default directory of the simulator build for a configuration
pub fn ios_products_dir(project_root: &Path, configuration: &str) -> PathBuf {
    project_root
        .join("ios/build/Build/Products")
        .join(format!("{}-iphonesimulator", configuration))
}

/// Default release APK location
pub fn android_apk_path(project_root: &Path) -> PathBuf {
    project_root.join("android/app/build/outputs/apk/release/app-release.apk")
}

/// Remove a directory tree if it exists
pub fn remove_dir_if_exists(path: &Path) -> io::Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
