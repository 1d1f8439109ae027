//! Period selection and next-departure detection.
//!
//! Everything here is a pure function of its inputs: the caller owns "now"
//! (see [`crate::clock`]) and the line snapshot.

use crate::line::DepartureRow;
use chrono::{Timelike, Weekday};

pub const MINUTES_PER_DAY: u32 = 1440;

// After 20:00, departures before 06:00 belong to the next service day
pub const LATE_EVENING_START: u32 = 1200;
pub const EARLY_MORNING_END: u32 = 360;

/// The day-of-week block a period label stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodKind {
    Weekdays,
    Saturday,
    Sunday,
}

impl PeriodKind {
    /// Display order of the period buttons.
    pub const DISPLAY_ORDER: [PeriodKind; 3] = [PeriodKind::Weekdays, PeriodKind::Saturday, PeriodKind::Sunday];

    pub fn for_day(day: Weekday) -> Self {
        match day {
            Weekday::Sun => PeriodKind::Sunday,
            Weekday::Sat => PeriodKind::Saturday,
            _ => PeriodKind::Weekdays,
        }
    }

    /// Folded label prefix ("Seg–Sex", "Sábado", "Domingo").
    pub fn prefix(self) -> &'static str {
        match self {
            PeriodKind::Weekdays => "seg",
            PeriodKind::Saturday => "sab",
            PeriodKind::Sunday => "dom",
        }
    }

    pub fn matches(self, label: &str) -> bool {
        fold_label(label).starts_with(self.prefix())
    }

    pub fn classify(label: &str) -> Option<Self> {
        Self::DISPLAY_ORDER.into_iter().find(|kind| kind.matches(label))
    }
}

// Combining Diacritical Marks block, left behind by decomposed (NFD) text
const COMBINING_MARKS: std::ops::RangeInclusive<char> = '\u{300}'..='\u{36f}';

/// Lowercase and strip the diacritics Portuguese labels use, so "Sábado"
/// and "SABADO" compare equal whether the accent is precomposed or not.
pub fn fold_label(label: &str) -> String {
    label
        .trim_start()
        .chars()
        .filter(|c| !COMBINING_MARKS.contains(c))
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// Pick the period that applies on `today`.
///
/// Sunday prefers a "dom…" label, Saturday "sab…", any other day "seg…".
/// Without a match the first label wins; no labels gives `None`.
pub fn select_default_period<'a, I>(periods: I, today: Weekday) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let wanted = PeriodKind::for_day(today);
    let mut first = None;
    for label in periods {
        if wanted.matches(label) {
            return Some(label);
        }
        first.get_or_insert(label);
    }
    first
}

/// Order labels for display: weekdays, Saturday, Sunday, then anything
/// unrecognized in its original relative order.
pub fn order_periods<'a, I>(periods: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut labels: Vec<&str> = periods.into_iter().collect();
    // sort_by_key is stable
    labels.sort_by_key(|label| {
        PeriodKind::classify(label)
            .and_then(|kind| PeriodKind::DISPLAY_ORDER.iter().position(|k| *k == kind))
            .unwrap_or(PeriodKind::DISPLAY_ORDER.len())
    });
    labels
}

/// Parse "HH:MM" into minutes since midnight.
///
/// Absent strings, a missing ':' or non-numeric components give `None`.
pub fn time_to_minutes(time: Option<&str>) -> Option<u32> {
    let mut parts = time?.trim().split(':');
    let hours: u32 = parts.next()?.trim().parse().ok()?;
    let minutes: u32 = parts.next()?.trim().parse().ok()?;
    hours.checked_mul(60)?.checked_add(minutes)
}

/// Departure time as compared against `now`, with the overnight rollover
/// applied.
pub fn adjusted_minutes(departure: u32, now: u32) -> u32 {
    if now > LATE_EVENING_START && departure < EARLY_MORNING_END {
        departure + MINUTES_PER_DAY
    } else {
        departure
    }
}

/// Index of the first row, in list order, whose adjusted departure is not
/// before `now`. Rows with an unparseable time are skipped.
pub fn find_next_departure(rows: &[DepartureRow], now: u32) -> Option<usize> {
    rows.iter().position(|row| {
        row.departure_minutes()
            .is_some_and(|departure| adjusted_minutes(departure, now) >= now)
    })
}

/// Minutes since midnight of a wall-clock time, seconds discarded.
pub fn minute_of_day<T: Timelike>(time: &T) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Current local minute of the day.
pub fn now_minutes() -> u32 {
    minute_of_day(&chrono::Local::now())
}

/// How a single row is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    Past,
    Next,
    Upcoming,
}

/// A period's timetable resolved against the current time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DepartureBoard<'a> {
    /// The period has no rows at all
    NoService,
    /// Every departure has already left
    AllDeparted(&'a [DepartureRow]),
    Upcoming { rows: &'a [DepartureRow], next: usize },
}

impl<'a> DepartureBoard<'a> {
    pub fn resolve(rows: &'a [DepartureRow], now: u32) -> Self {
        if rows.is_empty() {
            return DepartureBoard::NoService;
        }
        match find_next_departure(rows, now) {
            Some(next) => DepartureBoard::Upcoming { rows, next },
            None => DepartureBoard::AllDeparted(rows),
        }
    }

    pub fn next_index(&self) -> Option<usize> {
        match self {
            DepartureBoard::Upcoming { next, .. } => Some(*next),
            _ => None,
        }
    }

    pub fn next_row(&self) -> Option<&'a DepartureRow> {
        match *self {
            DepartureBoard::Upcoming { rows, next } => rows.get(next),
            _ => None,
        }
    }

    pub fn rows(&self) -> &'a [DepartureRow] {
        match *self {
            DepartureBoard::NoService => &[],
            DepartureBoard::AllDeparted(rows) => rows,
            DepartureBoard::Upcoming { rows, .. } => rows,
        }
    }

    pub fn row_state(&self, index: usize) -> RowState {
        match self.next_index() {
            None => RowState::Past,
            Some(next) if index < next => RowState::Past,
            Some(next) if index == next => RowState::Next,
            Some(_) => RowState::Upcoming,
        }
    }

    /// Rows paired with their render state.
    pub fn states(&self) -> impl Iterator<Item = (&'a DepartureRow, RowState)> + '_ {
        self.rows()
            .iter()
            .enumerate()
            .map(move |(i, row)| (row, self.row_state(i)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn rows(times: &[Option<&str>]) -> Vec<DepartureRow> {
        times.iter().map(|t| DepartureRow::new(*t, None, None)).collect()
    }

    #[test]
    fn test_time_to_minutes() {
        assert_eq!(time_to_minutes(Some("08:30")), Some(510));
        assert_eq!(time_to_minutes(Some(" 23:59 ")), Some(1439));
        assert_eq!(time_to_minutes(Some("00:00")), Some(0));
        assert_eq!(time_to_minutes(Some("--:--")), None);
        assert_eq!(time_to_minutes(Some("0800")), None);
        assert_eq!(time_to_minutes(Some("")), None);
        assert_eq!(time_to_minutes(None), None);
    }

    #[test]
    fn test_fold_label() {
        assert_eq!(fold_label("Sábado"), "sabado");
        assert_eq!(fold_label("SÁBADO"), "sabado");
        assert_eq!(fold_label("Seg–Sex"), "seg–sex");
        assert_eq!(fold_label("Sa\u{301}bado"), "sabado");
        assert_eq!(fold_label("SA\u{301}BADO"), "sabado");
    }

    #[test]
    fn test_rollover_only_late_evening() {
        assert_eq!(adjusted_minutes(15, 1260), 1455);
        assert_eq!(adjusted_minutes(15, 1200), 15);
        assert_eq!(adjusted_minutes(360, 1260), 360);
        assert_eq!(adjusted_minutes(600, 1260), 600);
    }

    #[test]
    fn test_after_midnight_departure_is_next_late_at_night() {
        let rows = rows(&[Some("05:50"), Some("22:00"), Some("03:50")]);
        // 22:30: 05:50 rolls over to tomorrow and comes first in list order
        assert_eq!(find_next_departure(&rows, 1350), Some(0));
        // 07:00: early departures are simply past
        assert_eq!(find_next_departure(&rows, 420), Some(1));
    }

    #[test]
    fn test_order_periods() {
        let ordered = order_periods(["Especial", "Domingo", "Sábado", "Seg–Sex", "Feriado"]);
        assert_eq!(ordered, vec!["Seg–Sex", "Sábado", "Domingo", "Especial", "Feriado"]);
    }

    #[test]
    fn test_row_states() {
        let rows = rows(&[Some("06:00"), Some("07:00"), Some("08:00")]);
        let board = DepartureBoard::resolve(&rows, 400);
        let states: Vec<RowState> = board.states().map(|(_, s)| s).collect();
        assert_eq!(states, vec![RowState::Past, RowState::Next, RowState::Upcoming]);

        let board = DepartureBoard::resolve(&rows, 600);
        assert!(matches!(board, DepartureBoard::AllDeparted(_)));
        assert!(board.states().all(|(_, s)| s == RowState::Past));
    }

    #[test]
    fn test_minute_of_day_discards_seconds() {
        let time = NaiveTime::from_hms_opt(21, 5, 59).unwrap();
        assert_eq!(minute_of_day(&time), 1265);
    }
}
