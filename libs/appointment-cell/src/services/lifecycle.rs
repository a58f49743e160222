use chrono::{DateTime, Days, Utc};

use crate::models::TherapistAppointment;

/// Midnight UTC at the start of the day after `now`.
pub fn start_of_tomorrow(now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive();
    today
        .checked_add_days(Days::new(1))
        .unwrap_or(today)
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(now)
}

/// Anything before tomorrow counts as past, including later today.
pub fn is_in_past(time: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    time < start_of_tomorrow(now)
}

/// Whether an appointment still belongs in a professional's working list.
pub fn is_upcoming(appointment: &TherapistAppointment, now: DateTime<Utc>) -> bool {
    !appointment.complete && !is_in_past(appointment.end_time, now)
}
