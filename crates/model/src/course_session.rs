use bson::oid::ObjectId;
use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::{decimal::Decimal, errors::ConstraintError};

const SECONDS_PER_HUNDREDTH_DAY: i64 = 864;
const HOURS_PER_DAY: i64 = 24;
// digits=(6, 2)
const MAX_DURATION_HUNDREDTHS: i64 = 999_999;

/// Advisory result of the seat check. Never blocks a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatWarning {
    pub title: &'static str,
    pub message: &'static str,
}

pub const NEGATIVE_SEATS: SeatWarning = SeatWarning {
    title: "Incorrect 'seats' value",
    message: "The number of available seats may not be negative",
};

pub const TOO_MANY_ATTENDEES: SeatWarning = SeatWarning {
    title: "Too many attendees",
    message: "Increase seats or remove excess attendees",
};

/// A scheduled occurrence of a course.
///
/// `duration` is the only stored source for the schedule. `end_date` is a
/// persisted view kept in sync by every setter, `hours` is derived on read.
/// `taken_seats` and `attendees_count` are persisted views of `seats` and
/// `attendees`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CourseSession {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub course_id: ObjectId,
    pub name: String,
    #[serde(default)]
    start_date: Option<NaiveDate>,
    #[serde(default)]
    duration: Decimal,
    #[serde(default)]
    seats: i32,
    #[serde(default = "default_active")]
    active: bool,
    #[serde(default)]
    instructor: Option<ObjectId>,
    #[serde(default)]
    attendees: Vec<ObjectId>,
    #[serde(default)]
    taken_seats: f64,
    #[serde(default)]
    end_date: Option<NaiveDate>,
    #[serde(default)]
    attendees_count: u32,
    #[serde(default)]
    pub version: u64,
}

fn default_active() -> bool {
    true
}

impl CourseSession {
    pub fn new(course_id: ObjectId, name: String, start_date: NaiveDate) -> CourseSession {
        let mut session = CourseSession {
            id: ObjectId::new(),
            course_id,
            name,
            start_date: Some(start_date),
            duration: Decimal::zero(),
            seats: 0,
            active: true,
            instructor: None,
            attendees: Vec::new(),
            taken_seats: 0.0,
            end_date: None,
            attendees_count: 0,
            version: 0,
        };
        session.recompute();
        session
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn duration(&self) -> Decimal {
        self.duration
    }

    pub fn seats(&self) -> i32 {
        self.seats
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn instructor(&self) -> Option<ObjectId> {
        self.instructor
    }

    pub fn attendees(&self) -> &[ObjectId] {
        &self.attendees
    }

    pub fn taken_seats(&self) -> f64 {
        self.taken_seats
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub fn hours(&self) -> Decimal {
        hours(self.duration)
    }

    pub fn attendees_count(&self) -> u32 {
        self.attendees_count
    }

    pub fn set_start_date(&mut self, start_date: Option<NaiveDate>) {
        self.start_date = start_date;
        self.recompute();
    }

    pub fn set_duration(&mut self, duration: Decimal) {
        self.duration = clamp_duration(duration);
        self.recompute();
    }

    /// Back-solves `duration` from an end date. Without both dates the
    /// duration is left alone and the stored end date is re-derived.
    pub fn set_end_date(&mut self, end_date: Option<NaiveDate>) {
        if let (Some(start), Some(end)) = (self.start_date, end_date) {
            self.duration = clamp_duration(duration_from_end_date(start, end));
        }
        self.recompute();
    }

    pub fn set_hours(&mut self, hours: Decimal) {
        self.duration = clamp_duration(duration_from_hours(hours));
        self.recompute();
    }

    pub fn set_seats(&mut self, seats: i32) -> Option<SeatWarning> {
        self.seats = seats;
        self.recompute();
        self.check_seats()
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn set_instructor(&mut self, instructor: Option<ObjectId>) {
        self.instructor = instructor;
    }

    /// Union with the current attendees. Already subscribed ids are skipped.
    pub fn add_attendees(&mut self, attendees: &[ObjectId]) -> Option<SeatWarning> {
        for attendee in attendees {
            if !self.attendees.contains(attendee) {
                self.attendees.push(*attendee);
            }
        }
        self.recompute();
        self.check_seats()
    }

    pub fn remove_attendee(&mut self, attendee: ObjectId) -> Option<SeatWarning> {
        self.attendees.retain(|id| *id != attendee);
        self.recompute();
        self.check_seats()
    }

    /// Interactive seat check: flips `active` and reports why.
    pub fn check_seats(&mut self) -> Option<SeatWarning> {
        let warning = if self.seats < 0 {
            Some(NEGATIVE_SEATS)
        } else if (self.seats as i64) < self.attendees.len() as i64 {
            Some(TOO_MANY_ATTENDEES)
        } else {
            None
        };
        self.active = warning.is_none();
        warning
    }

    /// Commit time check. The session needs a name and the instructor must
    /// not sit among the attendees.
    pub fn check(&self) -> Result<(), ConstraintError> {
        if self.name.trim().is_empty() {
            return Err(ConstraintError::EmptyName);
        }
        match self.instructor {
            Some(instructor) if self.attendees.contains(&instructor) => {
                Err(ConstraintError::InstructorIsAttendee {
                    session_id: self.id,
                    instructor,
                })
            }
            _ => Ok(()),
        }
    }

    /// Re-derives every persisted view from its sources.
    fn recompute(&mut self) {
        self.attendees_count = self.attendees.len() as u32;
        self.taken_seats = taken_seats(self.attendees.len(), self.seats);
        self.end_date = end_date(self.start_date, self.duration);
    }
}

/// A single field write coming from an editor.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEdit {
    Name(String),
    StartDate(Option<NaiveDate>),
    Duration(Decimal),
    EndDate(Option<NaiveDate>),
    Hours(Decimal),
    Seats(i32),
    Active(bool),
    Instructor(Option<ObjectId>),
    AddAttendees(Vec<ObjectId>),
    RemoveAttendee(ObjectId),
}

impl SessionEdit {
    /// Partners the write points at.
    pub fn partners(&self) -> Vec<ObjectId> {
        match self {
            SessionEdit::Instructor(Some(instructor)) => vec![*instructor],
            SessionEdit::AddAttendees(attendees) => attendees.clone(),
            _ => Vec::new(),
        }
    }

    /// Applies the write. Edits of `seats` or `attendees` also run the
    /// advisory seat check.
    pub fn apply(self, session: &mut CourseSession) -> Option<SeatWarning> {
        match self {
            SessionEdit::Name(name) => {
                session.name = name;
                None
            }
            SessionEdit::StartDate(start_date) => {
                session.set_start_date(start_date);
                None
            }
            SessionEdit::Duration(duration) => {
                session.set_duration(duration);
                None
            }
            SessionEdit::EndDate(end_date) => {
                session.set_end_date(end_date);
                None
            }
            SessionEdit::Hours(hours) => {
                session.set_hours(hours);
                None
            }
            SessionEdit::Seats(seats) => session.set_seats(seats),
            SessionEdit::Active(active) => {
                session.set_active(active);
                None
            }
            SessionEdit::Instructor(instructor) => {
                session.set_instructor(instructor);
                None
            }
            SessionEdit::AddAttendees(attendees) => session.add_attendees(&attendees),
            SessionEdit::RemoveAttendee(attendee) => session.remove_attendee(attendee),
        }
    }
}

/// Limits a duration to the stored precision, `-9999.99..=9999.99` days.
pub fn clamp_duration(duration: Decimal) -> Decimal {
    duration.clamp(
        Decimal::from_hundredths(-MAX_DURATION_HUNDREDTHS),
        Decimal::from_hundredths(MAX_DURATION_HUNDREDTHS),
    )
}

/// Percentage of seats taken. Zero seats means zero, not a division.
pub fn taken_seats(attendees: usize, seats: i32) -> f64 {
    if seats == 0 {
        0.0
    } else {
        100.0 * attendees as f64 / seats as f64
    }
}

/// Last day covered by the session, counting the start day as day one.
/// A missing start or zero duration yields the start date unchanged.
pub fn end_date(start_date: Option<NaiveDate>, duration: Decimal) -> Option<NaiveDate> {
    let start = start_date?;
    if duration.is_zero() {
        return Some(start);
    }
    let end = duration
        .hundredths()
        .checked_mul(SECONDS_PER_HUNDREDTH_DAY)
        .and_then(|seconds| seconds.checked_sub(1))
        .and_then(Duration::try_seconds)
        .and_then(|span| start.and_time(NaiveTime::MIN).checked_add_signed(span))
        .map(|end| end.date())
        .unwrap_or(start);
    Some(end)
}

pub fn duration_from_end_date(start_date: NaiveDate, end_date: NaiveDate) -> Decimal {
    Decimal::int((end_date - start_date).num_days() + 1)
}

pub fn hours(duration: Decimal) -> Decimal {
    duration * Decimal::int(HOURS_PER_DAY)
}

pub fn duration_from_hours(hours: Decimal) -> Decimal {
    hours / Decimal::int(HOURS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn session() -> CourseSession {
        CourseSession::new(ObjectId::new(), "Morning".to_string(), date(2024, 3, 4))
    }

    #[test]
    fn test_new_session_defaults() {
        let session = session();
        assert!(session.is_active());
        assert_eq!(session.end_date(), Some(date(2024, 3, 4)));
        assert_eq!(session.hours(), Decimal::zero());
        assert_eq!(session.attendees_count(), 0);
        assert_eq!(session.taken_seats(), 0.0);
    }

    #[test]
    fn test_taken_seats_zero_seats() {
        let mut session = session();
        session.add_attendees(&[ObjectId::new(), ObjectId::new()]);
        assert_eq!(session.seats(), 0);
        assert_eq!(session.taken_seats(), 0.0);
        assert_eq!(taken_seats(10, 0), 0.0);
    }

    #[test]
    fn test_taken_seats_ratio() {
        let mut session = session();
        session.set_seats(4);
        session.add_attendees(&[ObjectId::new()]);
        assert_eq!(session.taken_seats(), 25.0);
        session.add_attendees(&[ObjectId::new(), ObjectId::new()]);
        assert_eq!(session.taken_seats(), 75.0);
        session.set_seats(3);
        assert_eq!(session.taken_seats(), 100.0);
        assert_eq!(taken_seats(1, -2), -50.0);
    }

    #[test]
    fn test_end_date_inclusive_days() {
        // 2024-03-04 is a Monday.
        let mut session = session();
        session.set_duration(Decimal::int(5));
        assert_eq!(session.end_date(), Some(date(2024, 3, 8)));

        session.set_duration(Decimal::int(1));
        assert_eq!(session.end_date(), Some(date(2024, 3, 4)));

        session.set_duration(Decimal::from(0.5));
        assert_eq!(session.end_date(), Some(date(2024, 3, 4)));

        session.set_duration(Decimal::from(1.5));
        assert_eq!(session.end_date(), Some(date(2024, 3, 5)));
    }

    #[test]
    fn test_end_date_without_sources() {
        assert_eq!(end_date(None, Decimal::int(3)), None);
        assert_eq!(end_date(Some(date(2024, 1, 1)), Decimal::zero()), Some(date(2024, 1, 1)));

        let mut session = session();
        session.set_duration(Decimal::int(3));
        session.set_start_date(None);
        assert_eq!(session.end_date(), None);
        session.set_end_date(Some(date(2024, 5, 1)));
        assert_eq!(session.duration(), Decimal::int(3));
        assert_eq!(session.end_date(), None);
    }

    #[test]
    fn test_end_date_round_trip() {
        for days in [1, 2, 5, 14, 31, 365] {
            let mut session = session();
            session.set_duration(Decimal::int(days));
            let end = session.end_date();
            session.set_end_date(end);
            assert_eq!(session.duration(), Decimal::int(days));
        }
    }

    #[test]
    fn test_set_end_date_recomputes_duration() {
        let mut session = session();
        session.set_end_date(Some(date(2024, 3, 10)));
        assert_eq!(session.duration(), Decimal::int(7));
        assert_eq!(session.hours(), Decimal::int(168));
        assert_eq!(session.end_date(), Some(date(2024, 3, 10)));
    }

    #[test]
    fn test_hours_follow_duration() {
        let mut session = session();
        session.set_duration(Decimal::from(2.5));
        assert_eq!(session.hours(), Decimal::int(60));

        session.set_hours(Decimal::int(36));
        assert_eq!(session.duration(), Decimal::from(1.5));
        assert_eq!(session.hours(), session.duration() * Decimal::int(24));
        assert_eq!(session.end_date(), Some(date(2024, 3, 5)));

        session.set_hours(Decimal::int(1));
        assert_eq!(session.duration(), Decimal::from(0.04));
        assert_eq!(session.hours(), session.duration() * Decimal::int(24));
    }

    #[test]
    fn test_negative_seats_warns() {
        let mut session = session();
        let warning = session.set_seats(-1);
        assert_eq!(warning, Some(NEGATIVE_SEATS));
        assert_eq!(warning.unwrap().title, "Incorrect 'seats' value");
        assert!(!session.is_active());
        assert_eq!(session.seats(), -1);
    }

    #[test]
    fn test_too_many_attendees_warns() {
        let mut session = session();
        assert_eq!(session.set_seats(1), None);
        let warning = session.add_attendees(&[ObjectId::new(), ObjectId::new()]);
        assert_eq!(warning, Some(TOO_MANY_ATTENDEES));
        assert!(!session.is_active());

        assert_eq!(session.set_seats(2), None);
        assert!(session.is_active());
    }

    #[test]
    fn test_remove_attendee_clears_warning() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        let mut session = session();
        session.set_seats(1);
        assert!(session.add_attendees(&[a, b]).is_some());
        assert_eq!(session.remove_attendee(b), None);
        assert!(session.is_active());
        assert_eq!(session.attendees(), &[a]);
        assert_eq!(session.attendees_count(), 1);
    }

    #[test]
    fn test_instructor_cannot_attend() {
        let instructor = ObjectId::new();
        let mut session = session();
        session.set_instructor(Some(instructor));
        session.add_attendees(&[ObjectId::new(), instructor]);
        assert!(matches!(
            session.check(),
            Err(ConstraintError::InstructorIsAttendee { instructor: id, .. }) if id == instructor
        ));

        session.remove_attendee(instructor);
        assert_eq!(session.check(), Ok(()));
    }

    #[test]
    fn test_add_attendees_is_union() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        let mut session = session();
        session.add_attendees(&[a]);
        session.add_attendees(&[a, b, b]);
        assert_eq!(session.attendees(), &[a, b]);
        assert_eq!(session.attendees_count(), 2);
    }

    #[test]
    fn test_edit_apply() {
        let mut session = session();
        assert_eq!(SessionEdit::Seats(-3).apply(&mut session), Some(NEGATIVE_SEATS));
        assert_eq!(SessionEdit::Seats(3).apply(&mut session), None);
        assert!(session.is_active());

        assert_eq!(SessionEdit::Hours(Decimal::int(48)).apply(&mut session), None);
        assert_eq!(session.duration(), Decimal::int(2));
        assert_eq!(session.end_date(), Some(date(2024, 3, 5)));

        SessionEdit::Name("Evening".to_string()).apply(&mut session);
        assert_eq!(session.name, "Evening");
    }

    #[test]
    fn test_edit_partners() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_eq!(SessionEdit::Instructor(Some(a)).partners(), vec![a]);
        assert!(SessionEdit::Instructor(None).partners().is_empty());
        assert_eq!(SessionEdit::AddAttendees(vec![a, b]).partners(), vec![a, b]);
        assert!(SessionEdit::RemoveAttendee(a).partners().is_empty());
        assert!(SessionEdit::Seats(4).partners().is_empty());
    }

    #[test]
    fn test_duration_limited_to_stored_precision() {
        let mut session = session();
        session.set_duration(Decimal::from(1e17));
        assert_eq!(session.duration(), Decimal::from(9999.99));
        assert_eq!(session.end_date(), Some(date(2051, 7, 20)));
        assert_eq!(session.hours(), Decimal::from(239_999.76));

        session.set_duration(Decimal::from(-1e17));
        assert_eq!(session.duration(), Decimal::from(-9999.99));

        session.set_hours(Decimal::from_hundredths(i64::MAX));
        assert_eq!(session.duration(), Decimal::from(9999.99));

        session.set_duration(Decimal::from(9999.99));
        assert_eq!(session.duration(), Decimal::from(9999.99));
        session.set_duration(Decimal::from(10_000.0));
        assert_eq!(session.duration(), Decimal::from(9999.99));
    }

    #[test]
    fn test_end_date_saturates_on_overflow() {
        let start = date(2024, 3, 4);
        assert_eq!(end_date(Some(start), Decimal::from_hundredths(i64::MAX)), Some(start));
        assert_eq!(end_date(Some(start), Decimal::from_hundredths(i64::MIN)), Some(start));
    }

    #[test]
    fn test_session_name_required() {
        let unnamed = CourseSession::new(ObjectId::new(), String::new(), date(2024, 3, 4));
        assert_eq!(unnamed.check(), Err(ConstraintError::EmptyName));

        let mut session = session();
        assert_eq!(session.check(), Ok(()));
        SessionEdit::Name(String::new()).apply(&mut session);
        assert_eq!(session.check(), Err(ConstraintError::EmptyName));
        SessionEdit::Name("  ".to_string()).apply(&mut session);
        assert_eq!(session.check(), Err(ConstraintError::EmptyName));
    }
}
