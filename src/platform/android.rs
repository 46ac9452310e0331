//! Android emulator bootstrap via `adb` and SystemUI demo mode

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

use crate::common::config::{AndroidConfig, Config};
use crate::common::{paths, Error, Result};

use super::shell::{require_tool, Step};
use super::{Bootstrapper, Platform};

const DEMO_BROADCAST: &str = "com.android.systemui.demo";

/// Demo mode commands applied after entering demo mode, in order
const DEMO_OVERRIDES: &[(&str, &[&str])] = &[
    ("clock", &["-e", "hhmm", "0941"]),
    ("network", &["-e", "wifi", "show", "-e", "level", "4"]),
    ("bars", &["-e", "mode", "translucent"]),
    ("battery", &["-e", "level", "100"]),
];

/// Time given to SystemUI to redraw the status bar
const STATUS_BAR_SETTLE: Duration = Duration::from_millis(500);

pub struct AndroidBootstrapper {
    project_root: PathBuf,
}

impl AndroidBootstrapper {
    pub fn new(project_root: PathBuf) -> Self {
        Self { project_root }
    }

    fn apk_path(&self, android: &AndroidConfig) -> PathBuf {
        match &android.binary_path {
            Some(path) if path.is_relative() => self.project_root.join(path),
            Some(path) => path.clone(),
            None => paths::android_apk_path(&self.project_root),
        }
    }
}

/// `adb shell am broadcast` arguments for one demo mode command
fn demo_command<'a>(command: &'a str, extra: &[&'a str]) -> Vec<&'a str> {
    let mut args = vec![
        "shell", "am", "broadcast", "-a", DEMO_BROADCAST, "-e", "command", command,
    ];
    args.extend_from_slice(extra);
    args
}

fn android_section(config: &Config) -> Result<&AndroidConfig> {
    config
        .android
        .as_ref()
        .ok_or_else(|| Error::Config("missing 'android' section".to_string()))
}

#[async_trait]
impl Bootstrapper for AndroidBootstrapper {
    fn platform(&self) -> Platform {
        Platform::Android
    }

    async fn bootstrap(&self, config: &Config) -> Result<()> {
        let android = android_section(config)?;
        let fail = |e: std::io::Error| Error::bootstrap(Platform::Android, e.to_string());
        let debug = config.debug;

        require_tool("adb").map_err(fail)?;

        let apk = self.apk_path(android);
        let apk = apk.to_string_lossy().into_owned();
        Step::new("adb", &["install", "-r", apk.as_str()])
            .run(debug)
            .await
            .map_err(fail)?;

        Step::new(
            "adb",
            &["shell", "settings", "put", "global", "sysui_demo_allowed", "1"],
        )
        .run(debug)
        .await
        .map_err(fail)?;

        Step::new("adb", &demo_command("enter", &[]))
            .run(debug)
            .await
            .map_err(fail)?;

        for (command, extra) in DEMO_OVERRIDES {
            Step::new("adb", &demo_command(command, extra))
                .run(debug)
                .await
                .map_err(fail)?;
        }

        tokio::time::sleep(STATUS_BAR_SETTLE).await;

        Step::new(
            "adb",
            &[
                "shell",
                "monkey",
                "-p",
                android.package_name.as_str(),
                "-c",
                "android.intent.category.LAUNCHER",
                "1",
            ],
        )
        .run(debug)
        .await
        .map_err(fail)?;

        Ok(())
    }

    async fn restore(&self, config: &Config) -> Result<()> {
        Step::new("adb", &demo_command("exit", &[]))
            .run(config.debug)
            .await
            .map_err(|e| Error::restore(Platform::Android, e.to_string()))?;

        tracing::info!("Exited emulator demo mode");
        Ok(())
    }
}
