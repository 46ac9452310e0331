//! iOS simulator bootstrap via `xcrun simctl`

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::common::config::{Config, IosConfig};
use crate::common::{paths, Error, Result};

use super::shell::{require_tool, Step};
use super::{Bootstrapper, Platform};

/// Status bar time shown during the run
const SIMULATOR_TIME: &str = "9:41";

/// Where Xcode's PlistBuddy lives on macOS
const PLIST_BUDDY: &str = "/usr/libexec/PlistBuddy";

pub struct IosBootstrapper {
    project_root: PathBuf,
}

impl IosBootstrapper {
    pub fn new(project_root: PathBuf) -> Self {
        Self { project_root }
    }

    /// Directory holding the `.app` bundle, and the bundle's file name
    fn app_location(&self, ios: &IosConfig) -> Result<(PathBuf, String)> {
        if let Some(binary) = &ios.binary_path {
            let dir = binary
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.project_root.clone());
            let name = binary
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    Error::bootstrap(
                        Platform::Ios,
                        format!("invalid binaryPath '{}'", binary.display()),
                    )
                })?;
            let dir = if dir.is_relative() {
                self.project_root.join(dir)
            } else {
                dir
            };
            return Ok((dir, name));
        }

        let scheme = ios.scheme.as_deref().ok_or_else(|| {
            Error::bootstrap(Platform::Ios, "either 'binaryPath' or 'scheme' is required")
        })?;
        Ok((
            paths::ios_products_dir(&self.project_root, &ios.configuration),
            format!("{}.app", scheme),
        ))
    }
}

fn ios_section(config: &Config) -> Result<&IosConfig> {
    config
        .ios
        .as_ref()
        .ok_or_else(|| Error::Config("missing 'ios' section".to_string()))
}

#[async_trait]
impl Bootstrapper for IosBootstrapper {
    fn platform(&self) -> Platform {
        Platform::Ios
    }

    async fn bootstrap(&self, config: &Config) -> Result<()> {
        let ios = ios_section(config)?;
        let fail = |e: std::io::Error| Error::bootstrap(Platform::Ios, e.to_string());
        let debug = config.debug;
        let device = ios.device.as_str();

        require_tool("xcrun").map_err(fail)?;

        let (cwd, app) = self.app_location(ios)?;
        let plist = cwd.join(&app).join("Info.plist");
        let plist = plist.to_string_lossy().into_owned();

        let bundle_id = Step::new(PLIST_BUDDY, &["-c", "Print CFBundleIdentifier", plist.as_str()])
            .capture()
            .await
            .map_err(fail)?;
        tracing::info!("Found bundle id: {}", bundle_id);

        Step::new(
            "xcrun",
            &["simctl", "status_bar", device, "override", "--time", SIMULATOR_TIME],
        )
        .run(debug)
        .await
        .map_err(fail)?;

        Step::new("xcrun", &["simctl", "install", device, app.as_str()])
            .cwd(&cwd)
            .run(debug)
            .await
            .map_err(fail)?;

        Step::new("xcrun", &["simctl", "launch", device, bundle_id.as_str()])
            .run(debug)
            .await
            .map_err(fail)?;

        // Cycling the appearance settles the home indicator's colour
        for appearance in ["dark", "light"] {
            Step::new("xcrun", &["simctl", "ui", device, "appearance", appearance])
                .run(debug)
                .await
                .map_err(fail)?;
        }

        Ok(())
    }

    async fn restore(&self, config: &Config) -> Result<()> {
        let ios = ios_section(config)?;

        Step::new("xcrun", &["simctl", "status_bar", ios.device.as_str(), "clear"])
            .run(config.debug)
            .await
            .map_err(|e| Error::restore(Platform::Ios, e.to_string()))?;

        tracing::info!("Restored status bar time");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ios(binary_path: Option<&str>, scheme: Option<&str>) -> IosConfig {
        IosConfig {
            device: "iPhone 15 Pro".to_string(),
            scheme: scheme.map(String::from),
            configuration: "Release".to_string(),
            binary_path: binary_path.map(PathBuf::from),
        }
    }

    #[test]
    fn test_app_location_from_scheme() {
        let boot = IosBootstrapper::new(PathBuf::from("/project"));
        let (dir, app) = boot.app_location(&ios(None, Some("MyApp"))).unwrap();
        assert_eq!(
            dir,
            PathBuf::from("/project/ios/build/Build/Products/Release-iphonesimulator")
        );
        assert_eq!(app, "MyApp.app");
    }

    #[test]
    fn test_app_location_from_binary_path() {
        let boot = IosBootstrapper::new(PathBuf::from("/project"));
        let (dir, app) = boot
            .app_location(&ios(Some("build/Custom.app"), Some("Ignored")))
            .unwrap();
        assert_eq!(dir, PathBuf::from("/project/build"));
        assert_eq!(app, "Custom.app");
    }

    #[test]
    fn test_app_location_requires_scheme_or_binary() {
        let boot = IosBootstrapper::new(PathBuf::from("/project"));
        assert!(matches!(
            boot.app_location(&ios(None, None)),
            Err(Error::BootstrapFailure { .. })
        ));
    }
}
