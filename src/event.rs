use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kind of repository activity reported by the feed.
///
/// The feed only sends `PUSH`, `PULL_REQUEST` and `MERGE`, but anything else
/// is kept as `Unknown` so one odd record can't fail a whole response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    Push,
    PullRequest,
    Merge,
    Unknown(String),
}

impl Action {
    pub fn from_wire(raw: &str) -> Action {
        match raw {
            "PUSH" => Action::Push,
            "PULL_REQUEST" => Action::PullRequest,
            "MERGE" => Action::Merge,
            other => Action::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Action::Push => "PUSH",
            Action::PullRequest => "PULL_REQUEST",
            Action::Merge => "MERGE",
            Action::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Action::from_wire(&raw))
    }
}

/// One activity record as the server sent it. Never mutated after receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub request_id: String,
    pub author: String,
    pub action: Action,
    #[serde(default)]
    pub from_branch: Option<String>,
    pub to_branch: String,
    /// Already formatted by the server; shown as-is.
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Envelope returned by `GET /events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventsResponse {
    pub status: ResponseStatus,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl EventsResponse {
    pub fn success(events: Vec<Event>) -> Self {
        Self {
            status: ResponseStatus::Success,
            count: events.len(),
            events,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            count: 0,
            events: Vec::new(),
            message: Some(message.into()),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Unknown event filter: {value} (expected PUSH, PULL_REQUEST, MERGE or all)")]
pub struct FilterParseError {
    pub value: String,
}

/// Which actions the backend is asked to return.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    All,
    Action(Action),
}

impl Filter {
    /// Selection order used by the filter bar.
    pub const CYCLE: [Filter; 4] = [
        Filter::All,
        Filter::Action(Action::Push),
        Filter::Action(Action::PullRequest),
        Filter::Action(Action::Merge),
    ];

    /// Value for the `action` query parameter, `None` for all events.
    pub fn query_value(&self) -> Option<&str> {
        match self {
            Filter::All => None,
            Filter::Action(action) => Some(action.as_str()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Filter::All => "All Events",
            Filter::Action(Action::Push) => "Push Events",
            Filter::Action(Action::PullRequest) => "Pull Requests",
            Filter::Action(Action::Merge) => "Merges",
            Filter::Action(Action::Unknown(raw)) => raw,
        }
    }

    fn position(&self) -> usize {
        Self::CYCLE.iter().position(|f| f == self).unwrap_or(0)
    }

    pub fn next(&self) -> Filter {
        Self::CYCLE[(self.position() + 1) % Self::CYCLE.len()].clone()
    }

    pub fn previous(&self) -> Filter {
        let len = Self::CYCLE.len();
        Self::CYCLE[(self.position() + len - 1) % len].clone()
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query_value().unwrap_or(""))
    }
}

impl FromStr for Filter {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(Filter::All);
        }

        match Action::from_wire(&trimmed.to_ascii_uppercase()) {
            Action::Unknown(_) => Err(FilterParseError {
                value: s.to_string(),
            }),
            action => Ok(Filter::Action(action)),
        }
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.query_value().unwrap_or(""))
    }
}

impl<'de> Deserialize<'de> for Filter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
