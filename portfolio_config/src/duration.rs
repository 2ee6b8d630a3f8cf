use std::{ops::Deref, str::FromStr};

use serde::Deserialize;
use thiserror::Error;

/// A duration written as whitespace separated parts like `"1m 30s"` or
/// `"250ms"`. Supported units are `ms`, `s`, `m`, `h` and `d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Duration(pub std::time::Duration);

impl From<Duration> for std::time::Duration {
    fn from(value: Duration) -> Self {
        value.0
    }
}

impl Deref for Duration {
    type Target = std::time::Duration;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid duration part {0:?}")]
pub struct InvalidDuration(String);

impl FromStr for Duration {
    type Err = InvalidDuration;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_whitespace()
            .map(|part| parse_part(part).ok_or_else(|| InvalidDuration(part.into())))
            .sum::<Result<std::time::Duration, _>>()
            .map(Self)
    }
}

fn parse_part(part: &str) -> Option<std::time::Duration> {
    let split = part.find(|c: char| !c.is_ascii_digit())?;
    let (value, unit) = part.split_at(split);
    let value = value.parse::<u64>().ok()?;
    let millis = match unit {
        "ms" => 1,
        "s" => 1000,
        "m" => 60 * 1000,
        "h" => 60 * 60 * 1000,
        "d" => 24 * 60 * 60 * 1000,
        _ => return None,
    };
    value
        .checked_mul(millis)
        .map(std::time::Duration::from_millis)
}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}
