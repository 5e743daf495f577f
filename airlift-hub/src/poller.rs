//! Background reachability polling loop.
//!
//! On a fixed interval, the poller takes the registry's worklist of online
//! users, probes each one's peer-service port in turn, and records the
//! verdicts. One sweep produces at most one presence broadcast — only when
//! some flag actually flipped — so idle cycles stay silent on the wire.
//!
//! Probes run sequentially and outside any registry lock; a sweep over
//! unreachable targets therefore costs time, never availability.

use std::sync::Arc;
use std::time::Duration;

use crate::hub::HubState;
use crate::probe::Prober;

/// Default interval between sweeps.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Spawns the recurring sweep task.
///
/// The returned handle can be used to stop polling; the task itself runs
/// until aborted. Slow sweeps delay the next tick instead of bursting.
pub fn spawn(state: Arc<HubState>, prober: Prober, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            sweep(&state, &prober).await;
        }
    })
}

/// Runs one probe cycle over every online user with a known address.
///
/// Broadcasts a presence update after the cycle iff any reachability flag
/// changed.
pub async fn sweep(state: &HubState, prober: &Prober) {
    let targets = state.registry.probe_targets().await;
    if targets.is_empty() {
        return;
    }
    tracing::debug!(targets = targets.len(), "starting reachability sweep");

    let mut changed = false;
    for (user_id, addr) in targets {
        let reachable = prober.probe(addr).await;
        if state.registry.set_reachability(&user_id, reachable).await {
            tracing::info!(user_id = %user_id, reachable, "reachability changed");
            changed = true;
        }
    }

    if changed {
        state.broadcast_presence().await;
    }
}
