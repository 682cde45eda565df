//! Booking workflow - the fixed-order validation/submission pipeline.
//!
//! `submit` is the only entry point and always runs the same sequence:
//! collect, basic checks, date, time, capacity, extra checks, then the
//! network submission. A later check is never reached once an earlier
//! one fails, and every abort path produces exactly one user-facing
//! message.
//!
//! Variation points are plain composition: a time-limit rule, a
//! capacity-message formatter, and a list of extra checks, all supplied
//! at construction.

use std::sync::Arc;

use chrono::{Days, Local, NaiveDate};
use tracing::{debug, warn};

use rrc_core::{Period, ReservationData, SlotKey, STUDENT_ROLE};
use rrc_protocol::{Command, Reply};

use crate::cache::ClassroomCache;
use crate::loader::SharedAvailability;
use crate::ops;
use crate::session::Session;

/// Typed getters the booking view supplies.
///
/// The workflow never reads widgets directly; it pulls one immutable
/// snapshot of the user's selections through this trait.
pub trait BookingForm: Send + Sync {
    fn selected_room(&self) -> String;
    /// Parsed calendar date, `None` while nothing is picked.
    fn selected_date(&self) -> Option<NaiveDate>;
    /// Date exactly as displayed ("2026-09-01").
    fn date_label(&self) -> String;
    /// Day-of-week name ("월", "화", ...).
    fn day_name(&self) -> String;
    /// Start period label ("1교시").
    fn start_label(&self) -> String;
    /// End period label (inclusive).
    fn end_label(&self) -> String;
    fn purpose(&self) -> String;
    fn headcount(&self) -> u32;
}

/// Maximum booking duration in hours for a given role token.
pub type TimeLimitRule = fn(role: &str) -> u8;

/// Formats the over-capacity message from requested, allowed, and raw
/// capacity.
pub type CapacityMessageFn = fn(requested: u32, allowed: u32, capacity: u32) -> String;

/// Room-specific rule evaluated after the built-in checks.
pub type ExtraCheck = Box<dyn Fn(&ReservationData) -> Result<(), String> + Send + Sync>;

/// Students book at most 2 hours, everyone else 3. The role comparison
/// is exact-match, not case-insensitive.
pub fn default_time_limit(role: &str) -> u8 {
    if role == STUDENT_ROLE {
        2
    } else {
        3
    }
}

fn default_capacity_message(requested: u32, allowed: u32, capacity: u32) -> String {
    format!("수용 가능 인원을 초과했습니다. (요청 {requested}명, 허용 {allowed}명, 정원 {capacity}명)")
}

/// Result of one booking attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Booked { message: String },
    Rejected { message: String },
}

impl SubmitOutcome {
    fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    pub fn is_booked(&self) -> bool {
        matches!(self, Self::Booked { .. })
    }

    /// The user-facing message for this outcome.
    pub fn message(&self) -> &str {
        match self {
            Self::Booked { message } | Self::Rejected { message } => message,
        }
    }
}

/// Orchestrates one booking attempt end to end.
pub struct ReservationWorkflow {
    session: Arc<Session>,
    cache: Arc<ClassroomCache>,
    week: SharedAvailability,
    time_limit: TimeLimitRule,
    capacity_message: CapacityMessageFn,
    extra_checks: Vec<ExtraCheck>,
}

impl ReservationWorkflow {
    pub fn new(
        session: Arc<Session>,
        cache: Arc<ClassroomCache>,
        week: SharedAvailability,
    ) -> Self {
        Self {
            session,
            cache,
            week,
            time_limit: default_time_limit,
            capacity_message: default_capacity_message,
            extra_checks: Vec::new(),
        }
    }

    /// Replaces the role-based duration ceiling.
    pub fn with_time_limit(mut self, rule: TimeLimitRule) -> Self {
        self.time_limit = rule;
        self
    }

    /// Replaces the over-capacity message formatter.
    pub fn with_capacity_message(mut self, format: CapacityMessageFn) -> Self {
        self.capacity_message = format;
        self
    }

    /// Appends a room-specific rule, evaluated in registration order
    /// after capacity.
    pub fn with_extra_check(
        mut self,
        check: impl Fn(&ReservationData) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.extra_checks.push(Box::new(check));
        self
    }

    /// Runs the whole pipeline for one attempt.
    pub async fn submit(&self, form: &dyn BookingForm) -> SubmitOutcome {
        let data = match self.collect(form) {
            Ok(data) => data,
            Err(message) => return SubmitOutcome::rejected(message),
        };
        if let Err(message) = self.validate_date(&data) {
            return SubmitOutcome::rejected(message);
        }
        if let Err(message) = self.validate_time(&data) {
            return SubmitOutcome::rejected(message);
        }
        if let Err(message) = self.validate_capacity(&data) {
            return SubmitOutcome::rejected(message);
        }
        for check in &self.extra_checks {
            if let Err(message) = check(&data) {
                return SubmitOutcome::rejected(message);
            }
        }
        self.submit_to_server(&data).await
    }

    /// Builds the immutable attempt from the form's getters.
    ///
    /// An unset date and an empty purpose are the two basic-validation
    /// failures; both abort before any parsing or network I/O.
    fn collect(&self, form: &dyn BookingForm) -> Result<ReservationData, String> {
        let Some(date) = form.selected_date() else {
            return Err("예약 날짜를 선택해 주세요.".to_string());
        };
        let purpose = form.purpose();
        if purpose.trim().is_empty() {
            return Err("사용 목적을 입력해 주세요.".to_string());
        }
        let start = Period::from_label(&form.start_label())
            .map_err(|_| "교시를 올바르게 선택해 주세요.".to_string())?;
        let end = Period::from_label(&form.end_label())
            .map_err(|_| "교시를 올바르게 선택해 주세요.".to_string())?;

        let identity = self.session.identity();
        Ok(ReservationData::new(
            &form.date_label(),
            date,
            &identity.display_name,
            &form.selected_room(),
            &form.day_name(),
            start,
            end,
            purpose.trim(),
            form.headcount(),
            &identity.role,
        ))
    }

    /// The selected date must be at least tomorrow.
    fn validate_date(&self, data: &ReservationData) -> Result<(), String> {
        let tomorrow = Local::now()
            .date_naive()
            .checked_add_days(Days::new(1))
            .unwrap_or_else(|| Local::now().date_naive());
        if data.date < tomorrow {
            return Err(format!("예약은 {tomorrow}부터 가능합니다."));
        }
        Ok(())
    }

    fn validate_time(&self, data: &ReservationData) -> Result<(), String> {
        if data.start > data.end {
            return Err("시작 교시가 종료 교시보다 늦을 수 없습니다.".to_string());
        }
        let limit = (self.time_limit)(&data.role);
        let duration = data.duration();
        if duration > limit {
            return Err(format!(
                "예약은 최대 {limit}시간까지 가능합니다. (요청 {duration}시간)"
            ));
        }
        Ok(())
    }

    fn validate_capacity(&self, data: &ReservationData) -> Result<(), String> {
        let Some(record) = self.cache.get(&data.room) else {
            return Err("강의실 정보를 확인할 수 없습니다.".to_string());
        };
        if data.headcount > record.allowed_capacity() {
            return Err((self.capacity_message)(
                data.headcount,
                record.allowed_capacity(),
                record.capacity,
            ));
        }
        Ok(())
    }

    /// Re-checks availability, pre-checks the cached week for local
    /// conflicts, then books one period at a time.
    ///
    /// The whole sequence holds the session's exchange lock so no other
    /// caller's traffic interleaves with it. On the first failed period
    /// the attempt stops; periods booked before the failure stay booked,
    /// no compensating rollback is issued.
    async fn submit_to_server(&self, data: &ReservationData) -> SubmitOutcome {
        let Ok(handle) = self.session.dispatcher().await else {
            return SubmitOutcome::rejected("서버에 연결되어 있지 않습니다.");
        };
        let _guard = self.session.lock_exchanges().await;

        let status_timeout = self.session.config().status_timeout;
        if !ops::check_room_status_on(&handle, &data.room, status_timeout).await {
            return SubmitOutcome::rejected("해당 강의실은 현재 예약할 수 없습니다.");
        }

        if let Some(period) = self.local_conflict(data) {
            return SubmitOutcome::rejected(format!("{period}은(는) 이미 예약되어 있습니다."));
        }

        let reserve_timeout = self.session.config().reserve_timeout;
        for period in data.periods() {
            let command = Command::reserve_request(data, period);
            match handle.exchange(&command, reserve_timeout).await {
                Ok(Reply::ReserveSuccess) => {
                    debug!(room = %data.room, period = %period, "Period booked");
                }
                Ok(Reply::ReserveConflict) => {
                    return SubmitOutcome::rejected(format!(
                        "{period}은(는) 이미 예약되어 접수되지 않았습니다."
                    ));
                }
                Ok(Reply::CapacityExceeded { max }) => {
                    let message = match max {
                        Some(max) => format!("정원 초과로 예약할 수 없습니다. (최대 {max}명)"),
                        None => "정원 초과로 예약할 수 없습니다.".to_string(),
                    };
                    return SubmitOutcome::rejected(message);
                }
                Ok(other) => {
                    warn!(room = %data.room, period = %period, reply = ?other, "Reservation refused");
                    return SubmitOutcome::rejected(format!("{period} 예약에 실패했습니다."));
                }
                Err(e) => {
                    warn!(room = %data.room, period = %period, error = %e, "No reply to reservation");
                    return SubmitOutcome::rejected(format!("{period} 예약 요청에 응답이 없습니다."));
                }
            }
        }

        SubmitOutcome::Booked {
            message: "예약 요청이 완료되었습니다.".to_string(),
        }
    }

    /// First period already taken in the cached weekly window, if the
    /// window covers this attempt's room.
    fn local_conflict(&self, data: &ReservationData) -> Option<Period> {
        let week = match self.week.read() {
            Ok(week) => week,
            Err(_) => {
                warn!("Weekly view lock poisoned; skipping local conflict check");
                return None;
            }
        };
        if week.room != data.room {
            return None;
        }
        data.periods()
            .find(|period| week.is_booked(&SlotKey::new(&data.date_label, &data.day, *period)))
    }
}
