//! Tap injection through `adb shell input tap`.
//!
//! A burst of N taps is sent as a single `adb shell` invocation whose remote
//! command chains N `input tap X Y` calls with `;`.

use std::process::Stdio;

use async_trait::async_trait;
use tapreplay_core::ScaledPoint;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::application::replay_taps::{InjectionError, TapSink};

/// Injects taps on an Android device through `adb`.
#[derive(Debug, Clone)]
pub struct AdbTapSink {
    adb_path: String,
    serial: Option<String>,
}

impl AdbTapSink {
    pub fn new(adb_path: impl Into<String>, serial: Option<String>) -> Self {
        Self {
            adb_path: adb_path.into(),
            serial,
        }
    }

    /// Arguments passed to `adb` for one injection.
    pub fn tap_args(&self, point: ScaledPoint, repeat: u32) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(serial) = &self.serial {
            args.push("-s".to_string());
            args.push(serial.clone());
        }
        args.push("shell".to_string());
        args.push(tap_script(point, repeat));
        args
    }
}

/// `input tap X Y; input tap X Y; ...`, `repeat` times.
fn tap_script(point: ScaledPoint, repeat: u32) -> String {
    let single = format!("input tap {} {}", point.x, point.y);
    vec![single; repeat as usize].join("; ")
}

#[async_trait]
impl TapSink for AdbTapSink {
    async fn tap(&self, point: ScaledPoint, repeat: u32) -> Result<(), InjectionError> {
        if repeat == 0 {
            trace!("zero-repeat tap at {point} skipped");
            return Ok(());
        }

        let args = self.tap_args(point, repeat);
        debug!(repeat, "adb input tap at {point}");

        let output = Command::new(&self.adb_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| InjectionError::Spawn {
                program: self.adb_path.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(InjectionError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
