//! Client configuration.

use std::time::Duration;

/// Configuration for one reservation-server connection.
///
/// Reply timeouts are tiered by operation criticality: quick yes/no
/// checks wait 5s, booking submissions 10s, and the multi-line weekly
/// view 30s.
///
/// # Example
///
/// ```rust
/// use rrc_client::config::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig {
///     server_addr: "reservation.example.ac.kr:4100".to_string(),
///     reserve_timeout: Duration::from_secs(15),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Host:port of the reservation server.
    pub server_addr: String,

    /// Maximum time to wait for the TCP connect.
    pub connect_timeout: Duration,

    /// Reply timeout for room-status and count checks.
    pub status_timeout: Duration,

    /// Reply timeout for reserve/change/cancel submissions.
    pub reserve_timeout: Duration,

    /// Reply timeout for the weekly-view stream (whole stream).
    pub weekly_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:4100".to_string(),
            connect_timeout: Duration::from_secs(5),
            status_timeout: Duration::from_secs(5),
            reserve_timeout: Duration::from_secs(10),
            weekly_timeout: Duration::from_secs(30),
        }
    }
}
