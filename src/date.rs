use chrono::{Datelike, Duration, NaiveDate};

/// Which weekday begins a grid row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekStart {
    Sunday,
    Monday,
}

impl WeekStart {
    /// Offset from Sunday, matching the 0/1 convention of the grid math.
    pub fn offset(self) -> i64 {
        match self {
            WeekStart::Sunday => 0,
            WeekStart::Monday => 1,
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            WeekStart::Sunday => WeekStart::Monday,
            WeekStart::Monday => WeekStart::Sunday,
        }
    }

    pub fn labels(self) -> [&'static str; 7] {
        match self {
            WeekStart::Sunday => ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"],
            WeekStart::Monday => ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
        }
    }
}

pub fn start_of_month(d: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(d.year(), d.month(), 1).unwrap_or(d)
}

pub fn end_of_month(d: NaiveDate) -> NaiveDate {
    add_months(d, 1).pred_opt().unwrap_or(d)
}

/// First day of the month `n` months away from `d`'s month. `n` may be negative.
pub fn add_months(d: NaiveDate, n: i32) -> NaiveDate {
    let months = d.year() * 12 + d.month0() as i32 + n;
    let year = months.div_euclid(12);
    let month0 = months.rem_euclid(12) as u32;
    NaiveDate::from_ymd_opt(year, month0 + 1, 1).unwrap_or(d)
}

/// Week rows covering the month of `d`, padded with adjacent-month days so every
/// row holds exactly seven dates.
pub fn weeks_in_month(d: NaiveDate, week_start: WeekStart) -> Vec<[NaiveDate; 7]> {
    let first = start_of_month(d);
    let last = end_of_month(d);
    let lead = (first.weekday().num_days_from_sunday() as i64 - week_start.offset() + 7) % 7;
    let cells = lead + last.day() as i64;
    let rows = (cells + 6) / 7;

    let mut weeks = Vec::with_capacity(rows as usize);
    let mut cursor = first - Duration::days(lead);
    for _ in 0..rows {
        let mut row = [first; 7];
        for cell in row.iter_mut() {
            *cell = cursor;
            cursor += Duration::days(1);
        }
        weeks.push(row);
    }
    weeks
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Zero-padded `YYYY-MM-DD`.
pub fn ymd(d: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day())
}

/// Splits on `-` and builds a plain calendar date. No timezone handling.
pub fn parse_ymd(s: &str) -> Option<NaiveDate> {
    let mut parts = s.splitn(3, '-');
    let year = parts.next()?.parse::<i32>().ok()?;
    let month = parts.next()?.parse::<u32>().ok()?;
    let day = parts.next()?.parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn month_label(d: NaiveDate) -> String {
    d.format("%B %Y").to_string()
}

/// Visibility-ratio thresholds for fine-grained intersection tracking:
/// 1/20 through 20/20, plus 0.
pub fn build_threshold_list() -> Vec<f64> {
    let steps = 20;
    let mut thresholds: Vec<f64> = (1..=steps).map(|i| i as f64 / steps as f64).collect();
    thresholds.push(0.0);
    thresholds
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_bounds() {
        assert_eq!(start_of_month(date(2024, 2, 17)), date(2024, 2, 1));
        assert_eq!(end_of_month(date(2024, 2, 17)), date(2024, 2, 29));
        assert_eq!(end_of_month(date(2023, 2, 3)), date(2023, 2, 28));
        assert_eq!(end_of_month(date(2024, 12, 31)), date(2024, 12, 31));
    }

    #[test]
    fn add_months_crosses_year_boundaries() {
        assert_eq!(add_months(date(2024, 1, 15), 1), date(2024, 2, 1));
        assert_eq!(add_months(date(2024, 1, 15), -1), date(2023, 12, 1));
        assert_eq!(add_months(date(2024, 11, 30), 14), date(2026, 1, 1));
        assert_eq!(add_months(date(2024, 3, 1), -27), date(2021, 12, 1));
        assert_eq!(add_months(date(2024, 6, 9), 0), date(2024, 6, 1));
    }

    #[test]
    fn weeks_cover_month_exactly_once() {
        for (y, m) in [(2024, 2), (2023, 2), (2024, 12), (2021, 10), (2000, 2)] {
            for start in [WeekStart::Sunday, WeekStart::Monday] {
                let anchor = date(y, m, 1);
                let weeks = weeks_in_month(anchor, start);
                let flat: Vec<NaiveDate> = weeks.iter().flatten().copied().collect();
                assert_eq!(flat.len() % 7, 0);
                // First cell lands on the configured week-start day.
                let lead = flat[0].weekday().num_days_from_sunday() as i64;
                assert_eq!(lead, start.offset());
                // Consecutive days, each month day present exactly once.
                for pair in flat.windows(2) {
                    assert_eq!(pair[1] - pair[0], Duration::days(1));
                }
                let in_month = flat.iter().filter(|d| d.month() == m).count();
                assert_eq!(in_month as u32, end_of_month(anchor).day());
            }
        }
    }

    #[test]
    fn leap_years() {
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(1900));
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(2023));
    }

    #[test]
    fn ymd_round_trip() {
        assert_eq!(ymd(date(2024, 3, 5)), "2024-03-05");
        assert_eq!(parse_ymd("2024-03-05"), Some(date(2024, 3, 5)));
        assert_eq!(parse_ymd("2024-3-5"), Some(date(2024, 3, 5)));
        assert_eq!(parse_ymd("2024-02-30"), None);
        assert_eq!(parse_ymd("not-a-date"), None);
        assert_eq!(parse_ymd(""), None);
    }

    #[test]
    fn threshold_list_shape() {
        let t = build_threshold_list();
        assert_eq!(t.len(), 21);
        assert_eq!(t[0], 0.05);
        assert_eq!(t[19], 1.0);
        assert_eq!(t[20], 0.0);
    }

    #[test]
    fn month_labels() {
        assert_eq!(month_label(date(2024, 1, 1)), "January 2024");
        assert_eq!(month_label(date(1999, 12, 31)), "December 1999");
    }
}
