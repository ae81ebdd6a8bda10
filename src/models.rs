use crate::errors::StoreError;
use crate::reconcile::Mutation;
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const MAX_TITLE_LEN: usize = 200;

/// A calendar day with no time-of-day component, written as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Day(NaiveDate);

#[derive(Debug, thiserror::Error)]
#[error("invalid calendar day: {0:?}")]
pub struct InvalidDay(pub String);

impl Day {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// The current day in the local time zone.
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }

    /// Accepts `YYYY-MM-DD`, or an RFC 3339 timestamp which is moved to local time
    /// and truncated to its day.
    pub fn parse(value: &str) -> Result<Self, InvalidDay> {
        let value = value.trim();
        if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            return Ok(Self(date));
        }
        DateTime::parse_from_rfc3339(value)
            .map(|stamp| Self(stamp.with_timezone(&Local).date_naive()))
            .map_err(|_| InvalidDay(value.to_string()))
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for Day {
    type Err = InvalidDay;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Day {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Day {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitId(pub u64);

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn parse(value: &str) -> Result<Self, StoreError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(StoreError::Invalid("user id must not be empty".into()));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub user_id: UserId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub habit_id: HabitId,
    pub user_id: UserId,
    pub completed_at: Day,
}

/// The persisted document holding both collections.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct StoreData {
    pub next_habit_id: u64,
    pub habits: Vec<Habit>,
    pub habit_completions: Vec<Completion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HabitForm {
    #[serde(default)]
    pub title: String,
}

/// A creation request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHabit {
    title: String,
}

impl NewHabit {
    pub fn title(&self) -> &str {
        &self.title
    }
}

impl HabitForm {
    pub fn validate(&self) -> Result<NewHabit, StoreError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(StoreError::Invalid("title must not be empty".into()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(StoreError::Invalid(format!(
                "title must be at most {MAX_TITLE_LEN} characters"
            )));
        }
        Ok(NewHabit {
            title: title.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToggleRequest {
    #[serde(default)]
    pub date: Option<Day>,
}

/// A calendar selection moving from `previous` to `selected`.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectionChange {
    #[serde(default)]
    pub previous: Vec<Day>,
    #[serde(default)]
    pub selected: Vec<Day>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitCardView {
    pub id: HabitId,
    pub title: String,
    pub completed_dates: Vec<Day>,
    pub completed_today: bool,
}

#[derive(Debug, Serialize)]
pub struct HabitsResponse {
    pub habits: Vec<HabitCardView>,
}

#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub card: HabitCardView,
    pub mutations: Vec<Mutation>,
    /// The calendar selection after reconciling the change, before re-seeding from
    /// `card.completed_dates`.
    pub selection: Vec<Day>,
}
