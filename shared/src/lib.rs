use chrono::{Datelike, Local, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A concrete calendar date.
///
/// Always normalizable to an ISO `YYYY-MM-DD` string; two days are equal
/// exactly when their ISO strings are equal. Serialized as that string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CalendarDay {
    date: NaiveDate,
}

impl CalendarDay {
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }

    /// Build a day from its components, `None` when the date does not exist
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self::new)
    }

    /// Parse an ISO `YYYY-MM-DD` string (a trailing time part is ignored)
    pub fn parse_iso(value: &str) -> Result<Self, CalendarDayError> {
        let date_part = value.split('T').next().unwrap_or(value).trim();
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            .map(Self::new)
            .map_err(|_| CalendarDayError::InvalidFormat(value.to_string()))
    }

    /// The local calendar day right now
    pub fn today() -> Self {
        Self::new(Local::now().date_naive())
    }

    pub fn iso_string(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn day(&self) -> u32 {
        self.date.day()
    }

    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }

    /// Shift by a signed number of days, saturating at chrono's date range
    pub fn add_days(&self, days: i64) -> Self {
        let shifted = self
            .date
            .checked_add_signed(chrono::Duration::days(days))
            .unwrap_or(self.date);
        Self::new(shifted)
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.iso_string())
    }
}

impl TryFrom<String> for CalendarDay {
    type Error = CalendarDayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_iso(&value)
    }
}

impl From<CalendarDay> for String {
    fn from(day: CalendarDay) -> Self {
        day.iso_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarDayError {
    InvalidFormat(String),
}

impl fmt::Display for CalendarDayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarDayError::InvalidFormat(value) => {
                write!(f, "Invalid calendar day '{}', expected YYYY-MM-DD", value)
            }
        }
    }
}

impl std::error::Error for CalendarDayError {}

/// Get the number of days in a given month and year
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Check if a year is a leap year
pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// The month currently shown by a calendar header (month/year only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayedMonth {
    pub year: i32,
    pub month: u32,
}

impl DisplayedMonth {
    /// The month containing `day`
    pub fn containing(day: CalendarDay) -> Self {
        Self {
            year: day.year(),
            month: day.month(),
        }
    }

    /// The month before this one; January steps back into December
    pub fn previous(&self) -> Self {
        if self.month <= 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// The month after this one; December steps forward into January
    pub fn next(&self) -> Self {
        if self.month >= 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn days_in_month(&self) -> u32 {
        days_in_month(self.year, self.month)
    }

    /// Day `day_of_month` of this month (1-based), `None` when out of range
    pub fn day(&self, day_of_month: u32) -> Option<CalendarDay> {
        CalendarDay::from_ymd(self.year, self.month, day_of_month)
    }

    /// Same day-of-month as `day`, clamped to the length of this month
    pub fn clamped_day(&self, day_of_month: u32) -> Option<CalendarDay> {
        self.day(day_of_month.clamp(1, self.days_in_month()))
    }

    pub fn contains(&self, day: &CalendarDay) -> bool {
        day.year() == self.year && day.month() == self.month
    }
}

impl Default for DisplayedMonth {
    fn default() -> Self {
        Self::containing(CalendarDay::today())
    }
}

/// One entry of the horizontally scrollable day strip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStripItem {
    pub day: CalendarDay,
    /// Capitalised short weekday name, e.g. "Seg"
    pub weekday_label: String,
    pub day_number: u32,
    pub is_selected: bool,
    pub is_today: bool,
}

/// A scheduled appointment, joined with client and professional names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub client_id: String,
    pub professional_id: String,
    pub date: CalendarDay,
    /// Time of day as stored by the backend ("HH:MM" or "HH:MM:SS")
    pub time: String,
    pub note: String,
    pub client_name: Option<String>,
    pub professional_name: Option<String>,
}

impl Appointment {
    /// "HH:MM" label used by the list rows
    pub fn time_label(&self) -> &str {
        self.time.get(..5).unwrap_or(&self.time)
    }

    /// Parsed time of day, `None` when the stored value is not a valid time
    pub fn time_of_day(&self) -> Option<NaiveTime> {
        parse_time_of_day(&self.time)
    }
}

/// Parse "HH:MM" or "HH:MM:SS"
pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

/// Payload for inserting a new appointment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub client_id: String,
    pub professional_id: String,
    pub date: CalendarDay,
    /// "HH:MM"
    pub time: String,
    pub note: String,
}

/// A salon client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Digits only
    pub phone: String,
    /// ISO 8601 date format (YYYY-MM-DD); empty when unknown
    pub birth_date: String,
}

/// Client fields as written to the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDraft {
    pub name: String,
    pub email: String,
    /// Digits only
    pub phone: String,
    /// ISO 8601 date format (YYYY-MM-DD)
    pub birth_date: String,
}

/// A staff member's profile; `id` is the auth user id
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub photo_url: Option<String>,
    pub role: Option<String>,
    pub phone: Option<String>,
}

/// Editable profile fields
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
    pub photo_url: String,
    pub role: String,
    pub phone: String,
}

/// The authenticated user as reported by the auth collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

/// An authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user: AuthUser,
}

/// Row-change event kinds a realtime subscription can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeEvent {
    #[serde(rename = "*")]
    All,
    #[serde(rename = "INSERT")]
    Insert,
    #[serde(rename = "UPDATE")]
    Update,
    #[serde(rename = "DELETE")]
    Delete,
}

impl ChangeEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeEvent::All => "*",
            ChangeEvent::Insert => "INSERT",
            ChangeEvent::Update => "UPDATE",
            ChangeEvent::Delete => "DELETE",
        }
    }

    /// Whether a subscription for `self` receives an `actual` change
    pub fn accepts(&self, actual: ChangeEvent) -> bool {
        *self == ChangeEvent::All || *self == actual
    }
}

/// Scope of a change subscription: one table, one event kind, one
/// equality filter on a single column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeFilter {
    pub schema: String,
    pub table: String,
    pub event: ChangeEvent,
    pub column: String,
    pub value: String,
}

impl ChangeFilter {
    pub fn equals(table: &str, column: &str, value: &str) -> Self {
        Self {
            schema: "public".to_string(),
            table: table.to_string(),
            event: ChangeEvent::All,
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    /// Filter expression in PostgREST syntax, e.g. `profissional_id=eq.42`
    pub fn expression(&self) -> String {
        format!("{}=eq.{}", self.column, self.value)
    }
}

/// A single row change delivered by a subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeNotification {
    pub table: String,
    pub event: ChangeEvent,
    pub record: serde_json::Value,
    pub old_record: serde_json::Value,
}

/// Where the app should land after checking the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    Login,
    Home,
}

/// One-shot message shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(title: &str, message: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new("Erro", message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new("Sucesso", message)
    }

    /// Untitled alert carrying only a message
    pub fn notice(message: impl Into<String>) -> Self {
        Self::new("", message)
    }
}
