use chrono::{
    DateTime, Duration, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime,
    SecondsFormat, TimeZone, Utc,
};
use chrono_tz::Tz;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

/// A wall-clock moment rendered both as UTC (`Z` suffix) and in the source
/// zone (numeric offset suffix).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamps {
    pub utc: DateTime<Utc>,
    pub utc_iso: String,
    pub local_iso: String,
}

/// Compose `date` + optional `time` (midnight when absent) and localize in
/// `timezone`.
///
/// Unknown zones are read as UTC, in which case both renderings carry the same
/// value. Ambiguous local times resolve to the earlier instant; local times
/// inside a DST gap keep the offset in force before the transition. Unparseable
/// input is `None`.
pub fn parse_datetime(
    date: Option<&str>,
    time: Option<&str>,
    timezone: Option<&str>,
) -> Option<Timestamps> {
    let naive = parse_naive(date?, time)?;

    if let Some(tz) = timezone.map(str::trim).and_then(|name| name.parse::<Tz>().ok()) {
        if let Some(local) = localize(&tz, &naive) {
            let utc = local.with_timezone(&Utc);
            return Some(Timestamps {
                utc,
                utc_iso: to_utc_iso(&utc),
                local_iso: local.to_rfc3339_opts(SecondsFormat::Secs, false),
            });
        }
    }

    let utc = Utc.from_utc_datetime(&naive);
    let iso = to_utc_iso(&utc);
    Some(Timestamps {
        utc,
        utc_iso: iso.clone(),
        local_iso: iso,
    })
}

fn localize(tz: &Tz, naive: &NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Some(dt.fixed_offset()),
        LocalResult::None => {
            // Walk back out of the gap to find the offset that applied before it.
            let offset = (1..=24).find_map(|hours| {
                tz.from_local_datetime(&(*naive - Duration::hours(hours)))
                    .earliest()
                    .map(|dt| *dt.fixed_offset().offset())
            })?;
            offset.from_local_datetime(naive).single()
        }
    }
}

/// Split a combined "YYYY-MM-DD HH:MM:SS" cell at the first space.
pub fn split_date_time(value: &str) -> (&str, Option<&str>) {
    match value.split_once(' ') {
        Some((date, time)) => (date, Some(time)),
        None => (value, None),
    }
}

/// `2024-03-01T08:00:00Z`
pub fn to_utc_iso(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_naive(date: &str, time: Option<&str>) -> Option<NaiveDateTime> {
    let date = date.trim();
    if date.is_empty() {
        return None;
    }
    let day = NaiveDate::parse_from_str(date, DATE_FORMAT).ok()?;
    let clock = match time.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => TIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(t, fmt).ok())?,
        None => NaiveTime::from_hms_opt(0, 0, 0)?,
    };
    Some(day.and_time(clock))
}
