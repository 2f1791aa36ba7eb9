//! User context: the six categorical answers a user gives before stage 1.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of categorical context fields
pub const CONTEXT_FIELDS: usize = 6;

/// One of the categorical fields that describe a user's context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextField {
    Gender,
    Season,
    Time,
    Impression,
    Activity,
    Weather,
}

impl ContextField {
    /// All fields in encoding order
    pub const ALL: [ContextField; CONTEXT_FIELDS] = [
        ContextField::Gender,
        ContextField::Season,
        ContextField::Time,
        ContextField::Impression,
        ContextField::Activity,
        ContextField::Weather,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ContextField::Gender => "gender",
            ContextField::Season => "season",
            ContextField::Time => "time",
            ContextField::Impression => "impression",
            ContextField::Activity => "activity",
            ContextField::Weather => "weather",
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for ContextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw user context as received from the caller
///
/// Every field is optional on the wire so that a missing field surfaces as
/// [`Error::InvalidContext`] instead of a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default, alias = "season_tags")]
    pub season: Option<String>,
    #[serde(default, alias = "time_tags")]
    pub time: Option<String>,
    #[serde(default, alias = "desired_impression")]
    pub impression: Option<String>,
    #[serde(default)]
    pub activity: Option<String>,
    #[serde(default)]
    pub weather: Option<String>,
}

impl UserContext {
    /// Build a fully populated context
    pub fn new(
        gender: impl Into<String>,
        season: impl Into<String>,
        time: impl Into<String>,
        impression: impl Into<String>,
        activity: impl Into<String>,
        weather: impl Into<String>,
    ) -> Self {
        Self {
            gender: Some(gender.into()),
            season: Some(season.into()),
            time: Some(time.into()),
            impression: Some(impression.into()),
            activity: Some(activity.into()),
            weather: Some(weather.into()),
        }
    }

    pub fn get(&self, field: ContextField) -> Option<&str> {
        let value = match field {
            ContextField::Gender => &self.gender,
            ContextField::Season => &self.season,
            ContextField::Time => &self.time,
            ContextField::Impression => &self.impression,
            ContextField::Activity => &self.activity,
            ContextField::Weather => &self.weather,
        };
        value.as_deref()
    }

    /// Normalized values in encoding order
    ///
    /// Values are trimmed and lowercased. A missing or blank field is an
    /// [`Error::InvalidContext`]; an unknown value is not checked here.
    pub fn values(&self) -> Result<[String; CONTEXT_FIELDS]> {
        let mut values: [String; CONTEXT_FIELDS] = Default::default();
        for field in ContextField::ALL {
            let normalized = self
                .get(field)
                .map(normalize_category)
                .filter(|v| !v.is_empty())
                .ok_or(Error::InvalidContext(field))?;
            values[field.index()] = normalized;
        }
        Ok(values)
    }
}

/// Trim and lowercase a categorical value
pub fn normalize_category(value: &str) -> String {
    value.trim().to_lowercase()
}
