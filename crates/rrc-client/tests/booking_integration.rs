//! Integration tests for the booking engine over a real TCP connection.
//!
//! Each test spawns a scripted fake reservation server on a loopback
//! port, connects a session to it, and drives the public API end to
//! end: cache refresh, weekly loading, and the booking workflow.
//!
//! Tests CAN use `.unwrap()` and `.expect()` - the panic-free policy
//! applies to production code, which these tests exercise through
//! assertions.

use std::future::Future;
use std::sync::Arc;
use std::sync::RwLock;
use std::time::Duration;

use chrono::NaiveDate;
use rrc_client::{
    load_week, ClassroomCache, ClientConfig, ReservationWorkflow, Session, SharedAvailability,
};
use rrc_client::workflow::BookingForm;
use rrc_core::{UserIdentity, WeeklyAvailability};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;

// ============================================================================
// Constants
// ============================================================================

/// How long a server script waits to prove no further request arrives.
const SILENCE_WINDOW: Duration = Duration::from_millis(300);

/// Grace period keeping the scripted connection open after the last
/// reply, so the client reads it before EOF.
const LINGER: Duration = Duration::from_millis(200);

// ============================================================================
// Test Helpers
// ============================================================================

/// One accepted connection on the fake server, with line helpers.
struct ServerConn {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl ServerConn {
    /// Reads the next request line, without its terminator.
    async fn recv(&mut self) -> String {
        let mut line = String::new();
        self.reader.read_line(&mut line).await.expect("read request");
        line.trim_end().to_string()
    }

    /// Sends one reply line.
    async fn send(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.expect("write reply");
        self.writer.write_all(b"\n").await.expect("write terminator");
    }

    /// Asserts the client sends nothing for [`SILENCE_WINDOW`].
    async fn expect_silence(&mut self) {
        let mut line = String::new();
        let read = tokio::time::timeout(SILENCE_WINDOW, self.reader.read_line(&mut line)).await;
        assert!(read.is_err(), "unexpected request: {line:?}");
    }

    async fn linger(self) {
        tokio::time::sleep(LINGER).await;
    }
}

/// A fake reservation server accepting exactly one connection and
/// running the given script against it.
struct FakeServer {
    addr: String,
    script: tokio::task::JoinHandle<()>,
}

impl FakeServer {
    async fn spawn<F, Fut>(script: F) -> Self
    where
        F: FnOnce(ServerConn) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind loopback");
        let addr = listener.local_addr().expect("local addr").to_string();
        let script = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let (read_half, write_half) = stream.into_split();
            script(ServerConn {
                reader: BufReader::new(read_half),
                writer: write_half,
            })
            .await;
        });
        Self { addr, script }
    }

    /// Connects a fresh student session to this server.
    async fn session(&self) -> Arc<Session> {
        let config = ClientConfig {
            server_addr: self.addr.clone(),
            ..Default::default()
        };
        let session = Arc::new(Session::new(
            UserIdentity::new("s20260101", "홍길동", "student"),
            config,
        ));
        session.connect().await.expect("connect to fake server");
        session
    }

    /// Waits for the script to run to completion, surfacing its panics.
    async fn finish(self) {
        self.script.await.expect("server script");
    }
}

/// Booking form fixture with sensible defaults.
struct TestForm {
    room: String,
    start: String,
    end: String,
    headcount: u32,
}

impl Default for TestForm {
    fn default() -> Self {
        Self {
            room: "301".to_string(),
            start: "1교시".to_string(),
            end: "2교시".to_string(),
            headcount: 4,
        }
    }
}

impl BookingForm for TestForm {
    fn selected_room(&self) -> String {
        self.room.clone()
    }
    fn selected_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2030, 1, 1)
    }
    fn date_label(&self) -> String {
        "2030-01-01".to_string()
    }
    fn day_name(&self) -> String {
        "화".to_string()
    }
    fn start_label(&self) -> String {
        self.start.clone()
    }
    fn end_label(&self) -> String {
        self.end.clone()
    }
    fn purpose(&self) -> String {
        "스터디".to_string()
    }
    fn headcount(&self) -> u32 {
        self.headcount
    }
}

fn empty_week() -> SharedAvailability {
    Arc::new(RwLock::new(WeeklyAvailability::default()))
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_refresh_then_book_end_to_end() {
    let server = FakeServer::spawn(|mut conn| async move {
        // Cache refresh: both lists
        assert_eq!(conn.recv().await, "GET_CLASSROOMS");
        conn.send("CLASSROOMS,301,LECTURE,30").await;
        assert_eq!(conn.recv().await, "GET_LABS");
        conn.send("LABS,910,LAB,20").await;

        // Booking: status check plus one request per period
        assert_eq!(conn.recv().await, "CHECK_ROOM_STATUS,301호");
        conn.send("AVAILABLE").await;
        assert_eq!(
            conn.recv().await,
            "RESERVE_REQUEST,홍길동,301호,2030-01-01,화,1,스터디,student,4"
        );
        conn.send("RESERVE_SUCCESS").await;
        assert_eq!(
            conn.recv().await,
            "RESERVE_REQUEST,홍길동,301호,2030-01-01,화,2,스터디,student,4"
        );
        conn.send("RESERVE_SUCCESS").await;
        conn.linger().await;
    })
    .await;

    let session = server.session().await;
    let cache = Arc::new(ClassroomCache::new());
    assert!(cache.refresh_from_server(&session).await);
    assert!(cache.check_capacity("301", 4));

    let flow = ReservationWorkflow::new(session.clone(), cache, empty_week());
    let outcome = flow.submit(&TestForm::default()).await;
    assert!(outcome.is_booked(), "{}", outcome.message());

    server.finish().await;
}

#[tokio::test]
async fn test_conflict_mid_sequence_skips_remaining_periods() {
    let server = FakeServer::spawn(|mut conn| async move {
        assert_eq!(conn.recv().await, "GET_CLASSROOMS");
        conn.send("CLASSROOMS,301,LECTURE,30").await;
        assert_eq!(conn.recv().await, "GET_LABS");
        conn.send("LABS").await;

        assert_eq!(conn.recv().await, "CHECK_ROOM_STATUS,301호");
        conn.send("AVAILABLE").await;

        // Period 1 books, period 2 conflicts, period 3 must never arrive
        assert!(conn.recv().await.contains(",1,"));
        conn.send("RESERVE_SUCCESS").await;
        assert!(conn.recv().await.contains(",2,"));
        conn.send("RESERVE_CONFLICT").await;
        conn.expect_silence().await;
    })
    .await;

    let session = server.session().await;
    let cache = Arc::new(ClassroomCache::new());
    assert!(cache.refresh_from_server(&session).await);

    // A 3-hour attempt needs a non-student ceiling
    let flow = ReservationWorkflow::new(session.clone(), cache, empty_week())
        .with_time_limit(|_| 3);
    let form = TestForm {
        end: "3교시".to_string(),
        ..Default::default()
    };
    let outcome = flow.submit(&form).await;
    assert!(!outcome.is_booked());
    assert!(outcome.message().contains("2교시"));

    server.finish().await;
}

#[tokio::test]
async fn test_stray_success_triggers_exactly_one_retry() {
    let server = FakeServer::spawn(|mut conn| async move {
        assert_eq!(conn.recv().await, "CHECK_ROOM_STATUS,301호");
        conn.send("SUCCESS").await;
        assert_eq!(conn.recv().await, "CHECK_ROOM_STATUS,301호");
        conn.send("AVAILABLE").await;
        conn.expect_silence().await;
    })
    .await;

    let session = server.session().await;
    assert!(rrc_client::ops::check_room_status(&session, "301").await);

    server.finish().await;
}

#[tokio::test]
async fn test_weekly_window_feeds_local_conflict_check() {
    let server = FakeServer::spawn(|mut conn| async move {
        assert_eq!(
            conn.recv().await,
            "VIEW_WEEKLY_RESERVATION,301호,2029-12-31,2030-01-06"
        );
        conn.send("2030-01-01,화,2,예약됨").await;
        conn.send("END_OF_RESERVATION").await;

        assert_eq!(conn.recv().await, "GET_CLASSROOMS");
        conn.send("CLASSROOMS,301,LECTURE,30").await;
        assert_eq!(conn.recv().await, "GET_LABS");
        conn.send("LABS").await;

        // The booking dies on the cached conflict right after the
        // status check; no RESERVE_REQUEST may follow
        assert_eq!(conn.recv().await, "CHECK_ROOM_STATUS,301호");
        conn.send("AVAILABLE").await;
        conn.expect_silence().await;
    })
    .await;

    let session = server.session().await;
    let window = load_week(&session, "301", "2029-12-31", "2030-01-06")
        .await
        .expect("load week");
    assert_eq!(window.len(), 1);
    let week: SharedAvailability = Arc::new(RwLock::new(window));

    let cache = Arc::new(ClassroomCache::new());
    assert!(cache.refresh_from_server(&session).await);

    let flow = ReservationWorkflow::new(session.clone(), cache, week);
    let outcome = flow.submit(&TestForm::default()).await;
    assert!(!outcome.is_booked());
    assert!(outcome.message().contains("2교시"));

    server.finish().await;
}

#[tokio::test]
async fn test_notifications_reach_handler_without_disturbing_exchanges() {
    let server = FakeServer::spawn(|mut conn| async move {
        // Unsolicited push before any request
        conn.send("NOTIFICATION,APPROVED,예약이 승인되었습니다,301호,2030-01-01,화,1교시")
            .await;

        assert_eq!(conn.recv().await, "CHECK_ROOM_STATUS,301호");
        // Another push racing the reply
        conn.send("NOTIFICATION,CANCELLED,예약이 취소되었습니다,302호,2030-01-02,수,3교시")
            .await;
        conn.send("UNAVAILABLE").await;
        conn.linger().await;
    })
    .await;

    let session = server.session().await;
    let handle = session.dispatcher().await.expect("live dispatcher");

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    handle
        .set_notification_handler(move |notification| {
            let _ = tx.send(notification);
        })
        .await
        .expect("register handler");

    // The status check must see the reply, never a notification
    assert!(!rrc_client::ops::check_room_status(&session, "301").await);

    // The first push may race handler registration and be dropped; the
    // second one must arrive
    let cancelled = loop {
        let pushed = rx.recv().await.expect("push delivery");
        if pushed.room == "302호" {
            break pushed;
        }
    };
    assert_eq!(cancelled.message, "예약이 취소되었습니다");

    server.finish().await;
}

#[tokio::test]
async fn test_disconnect_fails_open_on_status_closed_on_capacity() {
    let session = Arc::new(Session::new(
        UserIdentity::new("s20260101", "홍길동", "student"),
        ClientConfig::default(),
    ));

    // Never connected: status checks fail open, capacity fails closed
    assert!(rrc_client::ops::check_room_status(&session, "301").await);
    let cache = ClassroomCache::new();
    assert!(!cache.refresh_from_server(&session).await);
    assert!(!cache.check_capacity("301", 1));
}
