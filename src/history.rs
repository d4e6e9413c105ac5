use crate::booking::ShiftType;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::macros::{date, format_description, time};
use time::{Date, Time};

use std::path::Path;

time::serde::format_description!(calendar_date, Date, "[year]-[month]-[day]");
time::serde::format_description!(clock_time, Time, "[hour]:[minute]");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Completed,
    Ongoing,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Completed => "completed",
            BookingStatus::Ongoing => "ongoing",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    pub id: String,
    pub house: String,
    #[serde(with = "calendar_date")]
    pub date: Date,
    pub shift_type: ShiftType,
    #[serde(with = "clock_time")]
    pub start_time: Time,
    #[serde(with = "clock_time")]
    pub drop_time: Time,
    pub status: BookingStatus,
}

impl BookingRecord {
    pub fn can_cancel(&self) -> bool {
        self.status == BookingStatus::Ongoing
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusBadge {
    pub icon: &'static str,
    pub class: &'static str,
}

/// Icon and style for a status; nothing for statuses we do not recognise.
pub fn status_badge(status: BookingStatus) -> Option<StatusBadge> {
    match status {
        BookingStatus::Completed => Some(StatusBadge {
            icon: "\u{2714}",
            class: "status-completed",
        }),
        BookingStatus::Cancelled => Some(StatusBadge {
            icon: "\u{2716}",
            class: "status-cancelled",
        }),
        BookingStatus::Ongoing => Some(StatusBadge {
            icon: "\u{23F1}",
            class: "status-ongoing",
        }),
        BookingStatus::Unknown => None,
    }
}

pub fn format_date(date: Date) -> String {
    date.format(format_description!(
        "[month repr:short] [day padding:none], [year]"
    ))
    .unwrap_or_else(|_| date.to_string())
}

pub fn format_time(time: Time) -> String {
    time.format(format_description!(
        "[hour repr:12 padding:none]:[minute] [period]"
    ))
    .unwrap_or_else(|_| time.to_string())
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to read history file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse history file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Deserialize)]
struct HistoryFile {
    #[serde(default)]
    bookings: Vec<BookingRecord>,
}

pub fn load_records(path: &Path) -> Result<Vec<BookingRecord>, HistoryError> {
    let contents = std::fs::read_to_string(path)?;
    parse_records(&contents)
}

pub fn parse_records(contents: &str) -> Result<Vec<BookingRecord>, HistoryError> {
    let file: HistoryFile = toml::from_str(contents)?;
    Ok(file.bookings)
}

pub fn sample_records() -> Vec<BookingRecord> {
    vec![
        BookingRecord {
            id: "1".to_string(),
            house: "House A".to_string(),
            date: date!(2024 - 03 - 15),
            shift_type: ShiftType::Morning,
            start_time: time!(09:00),
            drop_time: time!(17:00),
            status: BookingStatus::Completed,
        },
        BookingRecord {
            id: "2".to_string(),
            house: "House B".to_string(),
            date: date!(2024 - 03 - 16),
            shift_type: ShiftType::Afternoon,
            start_time: time!(13:00),
            drop_time: time!(21:00),
            status: BookingStatus::Ongoing,
        },
    ]
}
