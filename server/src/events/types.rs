//! Event Request/Response Types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sortie_common::ValidationReport;
use uuid::Uuid;

use crate::db::{EventChanges, EventRow, NewEvent};

/// Parse an event date: RFC 3339, or `YYYY-MM-DD` read as midnight UTC.
pub fn parse_event_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn check_capacity(report: &mut ValidationReport, number: Option<i32>) {
    if number.is_some_and(|n| n < 1) {
        report.add(
            "participantsNumber",
            "Participants number must be at least 1",
        );
    }
}

fn check_date(report: &mut ValidationReport, raw: &str) -> Option<DateTime<Utc>> {
    let parsed = parse_event_date(raw);
    if parsed.is_none() {
        report.add("date", "Date is invalid");
    }
    parsed
}

/// Create event request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    pub description: String,
    pub category: String,
    pub date: String,
    pub period: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub participants_number: Option<i32>,
    #[serde(default)]
    pub coordinates: Vec<f64>,
    pub status: Option<bool>,
}

impl CreateEventRequest {
    /// Check typed fields and build the row to insert.
    pub fn into_new_event(self, owner_id: Uuid) -> Result<NewEvent, ValidationReport> {
        let mut report = ValidationReport::new();
        let date = check_date(&mut report, &self.date);
        check_capacity(&mut report, self.participants_number);

        let Some(date) = date.filter(|_| report.is_valid) else {
            return Err(report);
        };

        Ok(NewEvent {
            title: self.title,
            description: self.description,
            category: self.category,
            date,
            period: self.period,
            time: self.time,
            location: self.location,
            owner_id,
            participants_number: self.participants_number,
            coordinates: self.coordinates,
            status: self.status,
        })
    }
}

/// Edit event request. Absent or blank fields keep their stored value.
///
/// There is no owner field: ownership never changes through an edit.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub period: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub participants_number: Option<i32>,
    pub coordinates: Option<Vec<f64>>,
    pub status: Option<bool>,
}

impl EditEventRequest {
    pub fn into_changes(self) -> Result<EventChanges, ValidationReport> {
        let mut report = ValidationReport::new();
        let date = self.date.as_deref().and_then(|raw| check_date(&mut report, raw));
        check_capacity(&mut report, self.participants_number);
        report.into_result()?;

        Ok(EventChanges {
            title: self.title,
            description: self.description,
            category: self.category,
            date,
            period: self.period,
            time: self.time,
            location: self.location,
            participants_number: self.participants_number,
            coordinates: self.coordinates,
            status: self.status,
        })
    }
}

/// Target of an owner's validate/unvalidate.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberTarget {
    pub user_id: Uuid,
}

/// Event response with both membership lists.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub date: DateTime<Utc>,
    pub period: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub owner: Uuid,
    pub participants_number: Option<i32>,
    pub participants: Vec<Uuid>,
    pub waiting_list: Vec<Uuid>,
    pub coordinates: Vec<f64>,
    pub status: Option<bool>,
    pub warnings: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EventRow> for EventResponse {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            category: row.category,
            date: row.date,
            period: row.period,
            time: row.time,
            location: row.location,
            owner: row.owner_id,
            participants_number: row.participants_number,
            participants: row.participants,
            waiting_list: row.waiting_list,
            coordinates: row.coordinates,
            status: row.status,
            warnings: row.warnings,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};
    use serde_json::json;
    use sortie_common::parse_payload;

    use super::*;

    fn payload(value: serde_json::Value) -> sortie_common::Payload {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_parse_plain_date() {
        let date = parse_event_date("2026-07-14").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2026, 7, 14));
        assert_eq!(date.hour(), 0);
    }

    #[test]
    fn test_parse_rfc3339_date() {
        let date = parse_event_date("2026-07-14T20:30:00+02:00").unwrap();
        assert_eq!(date.hour(), 18);
    }

    #[test]
    fn test_parse_garbage_date() {
        assert!(parse_event_date("next friday").is_none());
        assert!(parse_event_date("2026-13-40").is_none());
    }

    #[test]
    fn test_create_rejects_bad_fields() {
        let body: CreateEventRequest = parse_payload(payload(json!({
            "title": "Match",
            "description": "Five-a-side",
            "category": "sport",
            "date": "tomorrow",
            "participantsNumber": 0,
        })))
        .unwrap();

        let report = body.into_new_event(Uuid::now_v7()).unwrap_err();
        assert!(report.has("date"));
        assert!(report.has("participantsNumber"));
    }

    #[test]
    fn test_create_builds_row() {
        let owner = Uuid::now_v7();
        let body: CreateEventRequest = parse_payload(payload(json!({
            "title": "Match",
            "description": "Five-a-side",
            "category": "sport",
            "date": "2026-07-14",
            "participantsNumber": 10,
            "coordinates": [48.85, 2.35],
        })))
        .unwrap();

        let event = body.into_new_event(owner).unwrap();
        assert_eq!(event.owner_id, owner);
        assert_eq!(event.participants_number, Some(10));
        assert_eq!(event.coordinates, vec![48.85, 2.35]);
        assert_eq!(event.period, None);
    }

    #[test]
    fn test_edit_date_only() {
        let body: EditEventRequest = parse_payload(payload(json!({
            "title": "",
            "date": "2026-08-01",
            "owner": Uuid::now_v7(),
        })))
        .unwrap();

        let changes = body.into_changes().unwrap();
        assert_eq!(changes.date, parse_event_date("2026-08-01"));
        assert_eq!(
            EventChanges {
                date: None,
                ..changes
            },
            EventChanges::default()
        );
    }
}
