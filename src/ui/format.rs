/// Display helpers shared by the popup and dashboard

use url::Url;

use crate::tab_data::{Group, SaveResult, Session};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

/// "1 tab", "3 tabs"
pub fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{} {}", count, word)
    } else {
        format!("{} {}s", count, word)
    }
}

/// Relative age of a timestamp; older than a week falls back to the date
pub fn time_ago(now_ms: i64, timestamp_ms: i64) -> String {
    let seconds = (now_ms - timestamp_ms).max(0) / 1000;
    match seconds {
        s if s < MINUTE => "just now".to_string(),
        s if s < HOUR => format!("{}m ago", s / MINUTE),
        s if s < DAY => format!("{}h ago", s / HOUR),
        s if s < 2 * DAY => "yesterday".to_string(),
        s if s < 7 * DAY => format!("{}d ago", s / DAY),
        _ => format_date(timestamp_ms),
    }
}

/// `YYYY-MM-DD` (UTC)
pub fn format_date(timestamp_ms: i64) -> String {
    let (year, month, day) = civil_from_days(timestamp_ms.div_euclid(DAY * 1000));
    format!("{:04}-{:02}-{:02}", year, month, day)
}

/// `YYYY-MM-DD HH:MM` (UTC)
pub fn format_date_time(timestamp_ms: i64) -> String {
    let seconds_of_day = timestamp_ms.div_euclid(1000).rem_euclid(DAY);
    format!(
        "{} {:02}:{:02}",
        format_date(timestamp_ms),
        seconds_of_day / HOUR,
        (seconds_of_day % HOUR) / MINUTE
    )
}

// Days since 1970-01-01 → (year, month, day), proleptic Gregorian
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// Toast after shelving a whole window
pub fn save_all_message(result: &SaveResult) -> String {
    let mut message = format!("{} shelved", plural(result.saved, "tab"));
    if result.duplicates > 0 {
        message.push_str(&format!(" ({} already shelved)", result.duplicates));
    }
    message
}

/// Toast after shelving the active tab
pub fn save_current_message(result: &SaveResult) -> &'static str {
    if result.duplicates > 0 {
        "Already on the shelf"
    } else if result.saved > 0 {
        "Tab shelved"
    } else {
        "Nothing to shelve"
    }
}

pub fn last_session_text(session: &Session, now_ms: i64) -> String {
    format!(
        "Last shelved {} · {}",
        plural(session.tab_count, "tab"),
        time_ago(now_ms, session.saved_at)
    )
}

/// Host and path of a URL, cut to `max_len` characters
pub fn truncate_url(url: &str, max_len: usize) -> String {
    let display = match Url::parse(url) {
        Ok(parsed) => format!("{}{}", parsed.host_str().unwrap_or_default(), parsed.path()),
        Err(_) => url.to_string(),
    };

    if display.chars().count() > max_len {
        let cut: String = display.chars().take(max_len).collect();
        format!("{}…", cut)
    } else {
        display
    }
}

/// Groups ordered by most recent activity, newest first
pub fn sort_groups_by_activity(groups: &[Group]) -> Vec<Group> {
    let mut sorted = groups.to_vec();
    sorted.sort_by(|a, b| b.latest_activity().cmp(&a.latest_activity()));
    sorted
}
