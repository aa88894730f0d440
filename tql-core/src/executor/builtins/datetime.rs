//! DateTime builtin functions.
//!
//! DATEFORMAT(format, date[, options]) renders a date with the classic
//! single-letter format characters (`Y-m-d H:i:s`). `date` is a date string
//! or a numeric timestamp in seconds; options are matched
//! case-insensitively: `ms` marks a millisecond timestamp and `utc` renders
//! a timestamp in UTC instead of local time. Unparsable dates yield "?".

use chrono::{
    DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc,
};
use serde_json::Value;

use crate::error::{TqlError, TqlResult};
use crate::executor::helpers::{value_to_f64, value_to_string};

/// Call a datetime function. Returns None if function not found.
pub fn call(name: &str, args: &[Value]) -> TqlResult<Option<Value>> {
    let result = match name {
        "DATEFORMAT" => {
            if args.len() < 2 {
                return Err(TqlError::ArityOrType(
                    "DATEFORMAT requires 2-3 arguments".to_string(),
                ));
            }
            let format = value_to_string(&args[0]);
            let options = args.get(2).map(value_to_string).unwrap_or_default();
            let text = match parse_datetime(&args[1], &options) {
                Some(dt) => format_date(&dt, &format),
                None => "?".to_string(),
            };
            Some(Value::String(text))
        }
        _ => None,
    };
    Ok(result)
}

fn parse_datetime(v: &Value, options: &str) -> Option<DateTime<FixedOffset>> {
    let options = options.to_lowercase();
    if let Some(ts) = value_to_f64(v) {
        let seconds = if options.contains("ms") {
            (ts / 1000.0).trunc() as i64
        } else {
            ts.trunc() as i64
        };
        let utc = DateTime::<Utc>::from_timestamp(seconds, 0)?;
        return Some(if options.contains("utc") {
            utc.fixed_offset()
        } else {
            utc.with_timezone(&Local).fixed_offset()
        });
    }
    match v {
        Value::String(s) => parse_date_string(s.trim()),
        _ => None,
    }
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%m/%d/%Y", "%Y/%m/%d"];

/// Parse a date string. Strings without offset are local time.
fn parse_date_string(s: &str) -> Option<DateTime<FixedOffset>> {
    if s.is_empty() {
        return None;
    }
    match s.to_lowercase().as_str() {
        "now" => return Some(Local::now().fixed_offset()),
        "today" => {
            let midnight = Local::now().date_naive().and_hms_opt(0, 0, 0)?;
            return localize(midnight);
        }
        _ => {}
    }

    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_rfc2822(s))
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%z"))
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z"))
        .ok()
        .or_else(|| {
            NAIVE_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .or_else(|| {
                    DATE_FORMATS
                        .iter()
                        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
                .and_then(localize)
        })
}

fn localize(naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
}

const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

fn english_suffix(day: u32) -> &'static str {
    match day {
        11..=13 => "th",
        _ => match day % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(31)
}

fn offset_text(seconds: i32, colon: bool) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let abs = seconds.abs();
    if colon {
        format!("{}{:02}:{:02}", sign, abs / 3600, abs % 3600 / 60)
    } else {
        format!("{}{:02}{:02}", sign, abs / 3600, abs % 3600 / 60)
    }
}

/// Render `dt` with single-letter format characters. A backslash escapes the
/// following character; unknown letters are copied verbatim.
pub fn format_date(dt: &DateTime<FixedOffset>, format: &str) -> String {
    let mut out = String::new();
    let mut chars = format.chars();
    let offset = dt.offset().local_minus_utc();
    let hour12 = match dt.hour() % 12 {
        0 => 12,
        h => h,
    };

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            // Day
            'd' => out.push_str(&format!("{:02}", dt.day())),
            'D' => out.push_str(&DAY_NAMES[dt.weekday().num_days_from_monday() as usize][..3]),
            'j' => out.push_str(&dt.day().to_string()),
            'l' => out.push_str(DAY_NAMES[dt.weekday().num_days_from_monday() as usize]),
            'N' => out.push_str(&dt.weekday().number_from_monday().to_string()),
            'S' => out.push_str(english_suffix(dt.day())),
            'w' => out.push_str(&dt.weekday().num_days_from_sunday().to_string()),
            'z' => out.push_str(&dt.ordinal0().to_string()),
            // Week
            'W' => out.push_str(&format!("{:02}", dt.iso_week().week())),
            // Month
            'F' => out.push_str(MONTH_NAMES[dt.month0() as usize]),
            'm' => out.push_str(&format!("{:02}", dt.month())),
            'M' => out.push_str(&MONTH_NAMES[dt.month0() as usize][..3]),
            'n' => out.push_str(&dt.month().to_string()),
            't' => out.push_str(&days_in_month(dt.year(), dt.month()).to_string()),
            // Year
            'L' => {
                let leap = NaiveDate::from_ymd_opt(dt.year(), 2, 29).is_some();
                out.push(if leap { '1' } else { '0' });
            }
            'o' => out.push_str(&dt.iso_week().year().to_string()),
            'Y' => out.push_str(&dt.year().to_string()),
            'y' => out.push_str(&format!("{:02}", dt.year().rem_euclid(100))),
            // Time
            'a' => out.push_str(if dt.hour() < 12 { "am" } else { "pm" }),
            'A' => out.push_str(if dt.hour() < 12 { "AM" } else { "PM" }),
            'g' => out.push_str(&hour12.to_string()),
            'G' => out.push_str(&dt.hour().to_string()),
            'h' => out.push_str(&format!("{:02}", hour12)),
            'H' => out.push_str(&format!("{:02}", dt.hour())),
            'i' => out.push_str(&format!("{:02}", dt.minute())),
            's' => out.push_str(&format!("{:02}", dt.second())),
            'u' => out.push_str(&format!("{:06}", dt.nanosecond() / 1_000)),
            'v' => out.push_str(&format!("{:03}", dt.nanosecond() / 1_000_000)),
            // Timezone
            'e' | 'T' => {
                if offset == 0 {
                    out.push_str("UTC");
                } else {
                    out.push_str(&offset_text(offset, true));
                }
            }
            'P' => out.push_str(&offset_text(offset, true)),
            'O' => out.push_str(&offset_text(offset, false)),
            'Z' => out.push_str(&offset.to_string()),
            // Full date/time
            'c' => out.push_str(&dt.format("%Y-%m-%dT%H:%M:%S%:z").to_string()),
            'r' => out.push_str(&dt.format("%a, %d %b %Y %H:%M:%S %z").to_string()),
            'U' => out.push_str(&dt.timestamp().to_string()),
            other => out.push(other),
        }
    }
    out
}
