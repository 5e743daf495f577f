//! TCP reachability probe against a user's fixed peer-service port.
//!
//! Reachability is a yes/no verdict: did a bounded TCP connect to the
//! user's last-known address succeed right now. The probe carries no
//! payload and keeps nothing open — a successful connection is dropped the
//! moment it is established, and a timed-out attempt drops the pending
//! connect future along with its socket.

use std::net::IpAddr;
use std::time::Duration;

use tokio::net::TcpStream;

/// Default TCP port the peer file service listens on.
pub const DEFAULT_PROBE_PORT: u16 = 6112;

/// Default per-probe connect bound.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Bounded TCP connect prober.
#[derive(Debug, Clone)]
pub struct Prober {
    port: u16,
    timeout: Duration,
}

impl Default for Prober {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_PORT, DEFAULT_PROBE_TIMEOUT)
    }
}

impl Prober {
    /// Creates a prober for the given port and connect timeout.
    #[must_use]
    pub const fn new(port: u16, timeout: Duration) -> Self {
        Self { port, timeout }
    }

    /// Attempts one bounded connect; `true` iff the port accepted.
    ///
    /// Refusals, unreachable networks, and timeouts all fold to `false`
    /// (logged at debug) — the poller treats every failure mode the same
    /// and never aborts a sweep over one bad target.
    pub async fn probe(&self, addr: IpAddr) -> bool {
        match tokio::time::timeout(self.timeout, TcpStream::connect((addr, self.port))).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                tracing::debug!(addr = %addr, port = self.port, error = %e, "probe connect failed");
                false
            }
            Err(_) => {
                tracing::debug!(
                    addr = %addr,
                    port = self.port,
                    timeout = ?self.timeout,
                    "probe timed out"
                );
                false
            }
        }
    }
}
