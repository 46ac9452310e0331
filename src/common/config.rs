//! Run configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::platform::Platform;

use super::{Error, Result};

/// Default name of the configuration file in the project root
pub const DEFAULT_CONFIG_FILE: &str = "owl.config.json";

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// iOS simulator settings
    #[serde(default)]
    pub ios: Option<IosConfig>,

    /// Android emulator settings
    #[serde(default)]
    pub android: Option<AndroidConfig>,

    /// Verbose output from every phase and shell step
    #[serde(default)]
    pub debug: bool,

    /// Generate a report once the run finishes
    #[serde(default)]
    pub report: bool,

    /// Bridge settings
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Test-execution engine settings
    #[serde(default)]
    pub tests: TestsConfig,
}

/// iOS simulator configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct IosConfig {
    /// Simulator name or UDID passed to `xcrun simctl`
    pub device: String,

    /// Xcode scheme, used to locate `<scheme>.app` when no binary path is given
    #[serde(default)]
    pub scheme: Option<String>,

    /// Build configuration
    #[serde(default = "default_ios_configuration")]
    pub configuration: String,

    /// Path to a prebuilt `.app` bundle
    #[serde(default)]
    pub binary_path: Option<PathBuf>,
}

fn default_ios_configuration() -> String {
    "Debug".to_string()
}

/// Android emulator configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AndroidConfig {
    /// Application package name used to launch the app
    pub package_name: String,

    /// Path to a prebuilt APK
    #[serde(default)]
    pub binary_path: Option<PathBuf>,
}

/// Bridge process settings
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Local port the bridge listens on
    #[serde(default = "default_bridge_port")]
    pub port: u16,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            port: default_bridge_port(),
        }
    }
}

fn default_bridge_port() -> u16 {
    8123
}

impl BridgeConfig {
    /// Address test code and the app connect to
    pub fn address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }
}

/// Test-execution engine settings
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TestsConfig {
    /// Shell command that runs the test suite
    #[serde(default = "default_test_command")]
    pub command: String,
}

impl Default for TestsConfig {
    fn default() -> Self {
        Self {
            command: default_test_command(),
        }
    }
}

// Serial so that only one action is ever in flight per app.
fn default_test_command() -> String {
    "cargo test -- --test-threads=1".to_string()
}

impl Config {
    /// Load configuration from a file
    ///
    /// `.toml` files are parsed as TOML, everything else as JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        if is_toml {
            toml::from_str(&content).map_err(|e| Error::ConfigParse(e.to_string()))
        } else {
            serde_json::from_str(&content).map_err(|e| Error::ConfigParse(e.to_string()))
        }
    }

    /// Check that the configuration can drive a run on `platform`
    pub fn validate(&self, platform: Platform) -> Result<()> {
        match platform {
            Platform::Ios => {
                let ios = self
                    .ios
                    .as_ref()
                    .ok_or_else(|| Error::Config("missing 'ios' section".to_string()))?;
                if ios.device.trim().is_empty() {
                    return Err(Error::Config("'ios.device' must not be empty".to_string()));
                }
                if ios.binary_path.is_none() && ios.scheme.is_none() {
                    return Err(Error::Config(
                        "'ios' requires either 'binaryPath' or 'scheme'".to_string(),
                    ));
                }
            }
            Platform::Android => {
                let android = self
                    .android
                    .as_ref()
                    .ok_or_else(|| Error::Config("missing 'android' section".to_string()))?;
                if android.package_name.trim().is_empty() {
                    return Err(Error::Config(
                        "'android.packageName' must not be empty".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Simulator identifier handed to the test engine, if any
    pub fn device_id(&self, platform: Platform) -> Option<&str> {
        match platform {
            Platform::Ios => self.ios.as_ref().map(|ios| ios.device.as_str()),
            Platform::Android => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_json_with_defaults() {
        let file = write_config(
            ".json",
            r#"{ "ios": { "device": "iPhone 15", "scheme": "App" }, "report": true }"#,
        );
        let config = Config::load(file.path()).unwrap();

        let ios = config.ios.as_ref().unwrap();
        assert_eq!(ios.device, "iPhone 15");
        assert_eq!(ios.configuration, "Debug");
        assert!(config.report);
        assert!(!config.debug);
        assert_eq!(config.bridge.port, 8123);
        assert_eq!(config.tests.command, "cargo test -- --test-threads=1");
        assert!(config.validate(Platform::Ios).is_ok());
    }

    #[test]
    fn test_load_toml() {
        let file = write_config(
            ".toml",
            "debug = true\n[android]\npackageName = \"com.example\"\n[bridge]\nport = 9000\n",
        );
        let config = Config::load(file.path()).unwrap();

        assert!(config.debug);
        assert_eq!(config.android.as_ref().unwrap().package_name, "com.example");
        assert_eq!(config.bridge.address(), "127.0.0.1:9000");
        assert!(config.validate(Platform::Android).is_ok());
    }

    #[test]
    fn test_missing_platform_section() {
        let config = Config::default();
        assert!(matches!(config.validate(Platform::Ios), Err(Error::Config(_))));
        assert!(matches!(
            config.validate(Platform::Android),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_ios_requires_binary_or_scheme() {
        let file = write_config(".json", r#"{ "ios": { "device": "iPhone 15" } }"#);
        let config = Config::load(file.path()).unwrap();
        assert!(config.validate(Platform::Ios).is_err());
    }

    #[test]
    fn test_invalid_file() {
        let file = write_config(".json", "{ not json");
        assert!(matches!(
            Config::load(file.path()),
            Err(Error::ConfigParse(_))
        ));
        assert!(matches!(
            Config::load(Path::new("/nonexistent/owl.config.json")),
            Err(Error::FileRead { .. })
        ));
    }
}
