// MediaServe - Content-Addressed Media Catalogue
// Copyright (C) 2025 MediaServe Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! Background rescan scheduler
//!
//! One long-lived task reruns the scanner on a fixed interval and
//! publishes each successful snapshot. A failed pass is logged and the
//! previous snapshot stays untouched. At most one scan is in flight:
//! the loop awaits each pass, and ticks that fire while a pass is still
//! running are skipped rather than queued.
//!
//! Shutdown is cooperative: cancelling the token stops the loop, and a
//! pass still running at that point is abandoned without publishing.

use crate::scan::Scanner;
use mediaserve_index::MediaIndex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Periodic background rescanning of the storage tree
#[derive(Debug)]
pub struct RescanScheduler;

impl RescanScheduler {
    /// Spawn the rescan loop
    ///
    /// Returns `None` when `interval` is zero (rescanning disabled). The
    /// first rescan fires one full interval after spawning; the initial
    /// scan at startup is the caller's responsibility.
    pub fn spawn(
        scanner: Arc<Scanner>,
        index: Arc<MediaIndex>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Option<JoinHandle<()>> {
        if interval.is_zero() {
            info!("background rescanning disabled");
            return None;
        }

        info!(interval_secs = interval.as_secs(), "background rescanning enabled");
        Some(tokio::spawn(Self::run(scanner, index, interval, cancel)))
    }

    async fn run(
        scanner: Arc<Scanner>,
        index: Arc<MediaIndex>,
        interval: Duration,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(interval);
        // Ticks that pile up behind a slow scan are dropped, keeping at
        // most one scan in flight
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick of tokio's interval completes immediately;
        // consume it so the loop waits a full interval before rescanning
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("rescan scheduler stopping");
                    return;
                }
                _ = ticker.tick() => {}
            }

            let scan = Arc::clone(&scanner).scan_off_thread();
            tokio::select! {
                _ = cancel.cancelled() => {
                    // Abandon the in-flight pass; nothing partial is
                    // ever published
                    info!("shutdown during scan, abandoning pass");
                    return;
                }
                result = scan => match result {
                    Ok(snapshot) => {
                        let items = snapshot.len();
                        index.publish(snapshot).await;
                        info!(items, "rescan published");
                    }
                    Err(e) => {
                        warn!(error = %e, "rescan failed, retaining previous snapshot");
                    }
                },
            }
        }
    }
}
