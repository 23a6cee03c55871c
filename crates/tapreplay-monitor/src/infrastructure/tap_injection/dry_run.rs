//! A sink that only logs.  Backs `--dry-run`, which is handy for checking the
//! scaling and gesture detection against a live device without touching it.

use async_trait::async_trait;
use tapreplay_core::ScaledPoint;
use tracing::info;

use crate::application::replay_taps::{InjectionError, TapSink};

#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunTapSink;

impl DryRunTapSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TapSink for DryRunTapSink {
    async fn tap(&self, point: ScaledPoint, repeat: u32) -> Result<(), InjectionError> {
        info!(repeat, "dry run: would tap at {point}");
        Ok(())
    }
}
