use time::{
    OffsetDateTime, PrimitiveDateTime, UtcOffset, format_description::BorrowedFormatItem,
    macros::format_description,
};
use time_tz::{Offset, TimeZone};

pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// Date-time format used by the records API, e.g. "2025-10-26T14:30:00" or
/// "2025-10-26T14:30:00.123456". The API reports UTC wall-clock time without
/// an offset.
const API_DATE_TIME_FORMAT: &[BorrowedFormatItem] = format_description!(
    version = 2,
    "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
);

/// Date format for table rows, e.g. "26 Oct 2025".
const DISPLAY_DATE_FORMAT: &[BorrowedFormatItem] =
    format_description!("[day padding:none] [month repr:short] [year]");

/// Parse a date-time string from the records API and format the date it falls
/// on in the timezone given by `local_offset`.
///
/// Returns `None` if `raw` is not a date-time the API could have produced.
pub fn format_local_date(raw: &str, local_offset: UtcOffset) -> Option<String> {
    let parsed = PrimitiveDateTime::parse(raw, API_DATE_TIME_FORMAT).ok()?;
    let local = parsed.assume_utc().to_offset(local_offset);

    local.date().format(DISPLAY_DATE_FORMAT).ok()
}
