//! Response validation and message formatting.

use common::protocol::{HomeworkRecord, HomeworkStatus, PollResult, NO_NEW_STATUSES};
use serde_json::Value;
use tracing::debug;

use crate::error::{Malformed, PollError};

/// Check the structure of a decoded response body.
pub fn check_response(body: Value) -> Result<PollResult, PollError> {
    let Value::Object(mut map) = body else {
        return Err(Malformed::NotAnObject.into());
    };

    let homeworks = match map.remove("homeworks") {
        None => return Err(Malformed::MissingHomeworks.into()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(Malformed::HomeworksNotList.into()),
    };

    let current_date = map.get("current_date").and_then(Value::as_u64);
    debug!(count = homeworks.len(), ?current_date, "Response validated");

    Ok(PollResult {
        homeworks,
        current_date,
    })
}

/// Extract a typed record from one raw homework entry.
pub fn parse_homework(homework: &Value) -> Result<HomeworkRecord, PollError> {
    let homework_name = homework
        .get("homework_name")
        .and_then(Value::as_str)
        .ok_or(PollError::MissingField {
            field: "homework_name",
        })?;

    let raw_status = homework.get("status").and_then(Value::as_str);
    let status = raw_status
        .and_then(|s| s.parse::<HomeworkStatus>().ok())
        .ok_or_else(|| PollError::UnknownStatus {
            status: raw_status.map(str::to_string),
        })?;

    Ok(HomeworkRecord {
        homework_name: homework_name.to_string(),
        status,
    })
}

/// Notification text for a single homework entry.
pub fn parse_status(homework: &Value) -> Result<String, PollError> {
    parse_homework(homework).map(|record| record.message())
}

/// Notification text for a whole response: the newest homework, or the
/// "no new statuses" sentence when the list is empty.
pub fn status_message(result: &PollResult) -> Result<String, PollError> {
    match result.homeworks.first() {
        Some(homework) => parse_status(homework),
        None => Ok(NO_NEW_STATUSES.to_string()),
    }
}

/// Text reported to the user when a cycle fails.
pub fn failure_message(err: &PollError) -> String {
    format!("Произошёл сбой. Ошибка: {}", err)
}
