//! Recurrence schedules and the date arithmetic for occurrence sequences.
//!
//! A rule's occurrences form a strictly increasing sequence that starts at the
//! first date on or after the rule's start date matching its day selector.
//! Every following occurrence is one period later, where month based periods
//! clamp the rule's day of the month to the length of the target month.
//!
//! All functions here are pure: "today" is always passed in by the caller.

use std::{fmt::Display, num::NonZeroU32, str::FromStr};

use time::{Date, Duration, Month, Weekday, util};

use super::RecurrenceRule;

/// How often a recurring rule repeats, before the interval multiplier is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    /// Every day.
    Daily,
    /// Every week on a given weekday.
    Weekly,
    /// Every second week on a given weekday.
    Biweekly,
    /// Every month on a given day of the month.
    Monthly,
    /// Every three months on a given day of the month.
    Quarterly,
    /// Every twelve months on a given day of the month.
    Yearly,
}

impl Frequency {
    /// All frequencies in the order they are shown to the user.
    pub const ALL: [Frequency; 6] = [
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Biweekly,
        Frequency::Monthly,
        Frequency::Quarterly,
        Frequency::Yearly,
    ];

    /// The lowercase name used in forms and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Biweekly => "biweekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Yearly => "yearly",
        }
    }

    /// The capitalised name shown in the UI.
    pub fn label(&self) -> &'static str {
        match self {
            Frequency::Daily => "Daily",
            Frequency::Weekly => "Weekly",
            Frequency::Biweekly => "Biweekly",
            Frequency::Monthly => "Monthly",
            Frequency::Quarterly => "Quarterly",
            Frequency::Yearly => "Yearly",
        }
    }

    /// Whether rules with this frequency select a day of the week.
    pub fn uses_day_of_week(&self) -> bool {
        matches!(self, Frequency::Weekly | Frequency::Biweekly)
    }

    /// Whether rules with this frequency select a day of the month.
    pub fn uses_day_of_month(&self) -> bool {
        matches!(
            self,
            Frequency::Monthly | Frequency::Quarterly | Frequency::Yearly
        )
    }
}

impl FromStr for Frequency {
    type Err = InvalidRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Frequency::ALL
            .into_iter()
            .find(|frequency| frequency.as_str() == s)
            .ok_or_else(|| InvalidRuleError::UnknownFrequency(s.to_owned()))
    }
}

impl Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored rule that cannot be turned into a valid schedule, or a schedule
/// whose next occurrence cannot be represented.
///
/// Rules are validated before they are stored, so seeing this error means the
/// stored data is corrupt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidRuleError {
    /// The frequency is not one of the known frequencies.
    #[error("unknown frequency \"{0}\"")]
    UnknownFrequency(String),

    /// A weekly or biweekly rule has no day of the week.
    #[error("{0} rules need a day of the week")]
    MissingDayOfWeek(Frequency),

    /// The day of the week is not in 0 (Sunday) to 6 (Saturday).
    #[error("{0} is not a day of the week, expected 0 (Sunday) to 6 (Saturday)")]
    DayOfWeekOutOfRange(i64),

    /// A monthly, quarterly or yearly rule has no day of the month.
    #[error("{0} rules need a day of the month")]
    MissingDayOfMonth(Frequency),

    /// The day of the month is not in 1 to 31.
    #[error("{0} is not a day of the month, expected 1 to 31")]
    DayOfMonthOutOfRange(i64),

    /// The interval multiplier is zero, negative or too large.
    #[error("{0} is not a valid interval, expected a whole number of at least 1")]
    IntervalOutOfRange(i64),

    /// The occurrence after the given date falls outside of the supported date range.
    #[error("the occurrence after {0} is outside of the supported date range")]
    DateOutOfRange(Date),
}

/// How many periods pass between two occurrences. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntervalCount(NonZeroU32);

impl IntervalCount {
    /// An interval of one period.
    pub const ONE: IntervalCount = IntervalCount(NonZeroU32::MIN);

    /// Create an interval count.
    ///
    /// # Errors
    ///
    /// Returns [InvalidRuleError::IntervalOutOfRange] if `count` is less than one or does
    /// not fit in a `u32`.
    pub fn new(count: i64) -> Result<Self, InvalidRuleError> {
        u32::try_from(count)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or(InvalidRuleError::IntervalOutOfRange(count))
    }

    /// The interval as an integer.
    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

/// A day of the month between 1 and 31.
///
/// Months shorter than the day clamp it to their last day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayOfMonth(u8);

impl DayOfMonth {
    /// Create a day of the month.
    ///
    /// # Errors
    ///
    /// Returns [InvalidRuleError::DayOfMonthOutOfRange] if `day` is not in `1..=31`.
    pub fn new(day: i64) -> Result<Self, InvalidRuleError> {
        match u8::try_from(day) {
            Ok(day @ 1..=31) => Ok(Self(day)),
            _ => Err(InvalidRuleError::DayOfMonthOutOfRange(day)),
        }
    }

    /// The day as an integer.
    pub fn get(&self) -> u8 {
        self.0
    }
}

/// Convert a day of the week number, 0 for Sunday to 6 for Saturday, into a [Weekday].
///
/// # Errors
///
/// Returns [InvalidRuleError::DayOfWeekOutOfRange] if `day` is not in `0..=6`.
pub fn weekday_from_number(day: i64) -> Result<Weekday, InvalidRuleError> {
    match u8::try_from(day) {
        Ok(day @ 0..=6) => Ok(Weekday::Sunday.nth_next(day)),
        _ => Err(InvalidRuleError::DayOfWeekOutOfRange(day)),
    }
}

/// When a recurring rule occurs.
///
/// Each frequency carries exactly the day selector it needs, so a weekly
/// schedule without a weekday cannot be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Schedule {
    /// Every `interval` days.
    Daily {
        /// The number of days between occurrences.
        interval: IntervalCount,
    },
    /// Every `interval` weeks on `weekday`.
    Weekly {
        /// The number of weeks between occurrences.
        interval: IntervalCount,
        /// The day of the week of every occurrence.
        weekday: Weekday,
    },
    /// Every `2 * interval` weeks on `weekday`.
    Biweekly {
        /// The number of fortnights between occurrences.
        interval: IntervalCount,
        /// The day of the week of every occurrence.
        weekday: Weekday,
    },
    /// Every `interval` months on `day`.
    Monthly {
        /// The number of months between occurrences.
        interval: IntervalCount,
        /// The day of the month, clamped to the month length.
        day: DayOfMonth,
    },
    /// Every `3 * interval` months on `day`.
    Quarterly {
        /// The number of quarters between occurrences.
        interval: IntervalCount,
        /// The day of the month, clamped to the month length.
        day: DayOfMonth,
    },
    /// Every `12 * interval` months on `day`, in the month the rule starts.
    Yearly {
        /// The number of years between occurrences.
        interval: IntervalCount,
        /// The day of the month, clamped to the month length.
        day: DayOfMonth,
    },
}

/// The distance between two consecutive occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Period {
    Days(i64),
    Months { months: i64, day: DayOfMonth },
}

impl Schedule {
    /// Build a schedule from the loosely typed columns of a stored rule.
    ///
    /// Selectors that the frequency does not use are ignored.
    ///
    /// # Errors
    ///
    /// Returns an [InvalidRuleError] if the interval is less than one, or the
    /// selector the frequency needs is missing or out of range.
    pub fn from_parts(
        frequency: Frequency,
        interval: i64,
        day_of_week: Option<i64>,
        day_of_month: Option<i64>,
    ) -> Result<Self, InvalidRuleError> {
        let interval = IntervalCount::new(interval)?;

        let weekday = || {
            day_of_week
                .ok_or(InvalidRuleError::MissingDayOfWeek(frequency))
                .and_then(weekday_from_number)
        };
        let day = || {
            day_of_month
                .ok_or(InvalidRuleError::MissingDayOfMonth(frequency))
                .and_then(DayOfMonth::new)
        };

        let schedule = match frequency {
            Frequency::Daily => Schedule::Daily { interval },
            Frequency::Weekly => Schedule::Weekly {
                interval,
                weekday: weekday()?,
            },
            Frequency::Biweekly => Schedule::Biweekly {
                interval,
                weekday: weekday()?,
            },
            Frequency::Monthly => Schedule::Monthly {
                interval,
                day: day()?,
            },
            Frequency::Quarterly => Schedule::Quarterly {
                interval,
                day: day()?,
            },
            Frequency::Yearly => Schedule::Yearly {
                interval,
                day: day()?,
            },
        };

        Ok(schedule)
    }

    /// The frequency of the schedule.
    pub fn frequency(&self) -> Frequency {
        match self {
            Schedule::Daily { .. } => Frequency::Daily,
            Schedule::Weekly { .. } => Frequency::Weekly,
            Schedule::Biweekly { .. } => Frequency::Biweekly,
            Schedule::Monthly { .. } => Frequency::Monthly,
            Schedule::Quarterly { .. } => Frequency::Quarterly,
            Schedule::Yearly { .. } => Frequency::Yearly,
        }
    }

    /// The interval multiplier of the schedule.
    pub fn interval(&self) -> IntervalCount {
        match *self {
            Schedule::Daily { interval }
            | Schedule::Weekly { interval, .. }
            | Schedule::Biweekly { interval, .. }
            | Schedule::Monthly { interval, .. }
            | Schedule::Quarterly { interval, .. }
            | Schedule::Yearly { interval, .. } => interval,
        }
    }

    /// The weekday of weekly and biweekly schedules.
    pub fn weekday(&self) -> Option<Weekday> {
        match *self {
            Schedule::Weekly { weekday, .. } | Schedule::Biweekly { weekday, .. } => Some(weekday),
            _ => None,
        }
    }

    /// The day of the month of monthly, quarterly and yearly schedules.
    pub fn day_of_month(&self) -> Option<DayOfMonth> {
        match *self {
            Schedule::Monthly { day, .. }
            | Schedule::Quarterly { day, .. }
            | Schedule::Yearly { day, .. } => Some(day),
            _ => None,
        }
    }

    /// A short human readable description, e.g. "Every 2 weeks on Friday".
    ///
    /// `start_date` is needed to name the month of yearly schedules.
    pub fn label(&self, start_date: Date) -> String {
        let count = self.interval().get();

        match *self {
            Schedule::Daily { .. } => plural(count, "day"),
            Schedule::Weekly { weekday, .. } => format!("{} on {weekday}", plural(count, "week")),
            Schedule::Biweekly { weekday, .. } => {
                format!("{} on {weekday}", plural(count.saturating_mul(2), "week"))
            }
            Schedule::Monthly { day, .. } => {
                format!("{} on day {}", plural(count, "month"), day.get())
            }
            Schedule::Quarterly { day, .. } => {
                format!("{} on day {}", plural(count, "quarter"), day.get())
            }
            Schedule::Yearly { day, .. } => format!(
                "{} on {} {}",
                plural(count, "year"),
                day.get(),
                start_date.month()
            ),
        }
    }

    fn period(&self) -> Period {
        let count = i64::from(self.interval().get());

        match *self {
            Schedule::Daily { .. } => Period::Days(count),
            Schedule::Weekly { .. } => Period::Days(7 * count),
            Schedule::Biweekly { .. } => Period::Days(14 * count),
            Schedule::Monthly { day, .. } => Period::Months { months: count, day },
            Schedule::Quarterly { day, .. } => Period::Months {
                months: 3 * count,
                day,
            },
            Schedule::Yearly { day, .. } => Period::Months {
                months: 12 * count,
                day,
            },
        }
    }
}

fn plural(count: u32, unit: &str) -> String {
    if count == 1 {
        format!("Every {unit}")
    } else {
        format!("Every {count} {unit}s")
    }
}

/// The first occurrence of `schedule` for a rule starting on `start_date`.
///
/// This is the earliest date on or after `start_date` that matches the
/// schedule's day selector. Yearly schedules only look at the month of
/// `start_date`, moving to the same month of the next year if the day has
/// already passed.
///
/// # Errors
///
/// Returns [InvalidRuleError::DateOutOfRange] if that date cannot be represented.
pub fn first_occurrence(schedule: &Schedule, start_date: Date) -> Result<Date, InvalidRuleError> {
    let out_of_range = InvalidRuleError::DateOutOfRange(start_date);

    match *schedule {
        Schedule::Daily { .. } => Ok(start_date),
        Schedule::Weekly { weekday, .. } | Schedule::Biweekly { weekday, .. } => {
            let days_until_weekday = (i64::from(weekday.number_days_from_sunday())
                - i64::from(start_date.weekday().number_days_from_sunday()))
            .rem_euclid(7);

            start_date
                .checked_add(Duration::days(days_until_weekday))
                .ok_or(out_of_range)
        }
        Schedule::Monthly { day, .. }
        | Schedule::Quarterly { day, .. }
        | Schedule::Yearly { day, .. } => {
            let start_index = month_index(start_date);
            let candidate = date_at_month_index(start_index, day).ok_or(out_of_range.clone())?;

            if candidate >= start_date {
                return Ok(candidate);
            }

            let months_to_skip = match schedule {
                Schedule::Yearly { .. } => 12,
                _ => 1,
            };

            date_at_month_index(start_index + months_to_skip, day).ok_or(out_of_range)
        }
    }
}

/// The next occurrence of `rule` strictly after `from`.
///
/// If `from` is before the rule's first occurrence, the first occurrence is
/// returned. If `from` is itself an occurrence, the result is exactly one
/// period later. The result does not depend on anything but the arguments.
///
/// # Errors
///
/// Returns [InvalidRuleError::DateOutOfRange] if the next occurrence cannot be represented.
pub fn compute_next_occurrence(
    rule: &RecurrenceRule,
    from: Date,
) -> Result<Date, InvalidRuleError> {
    next_occurrence_after(&rule.schedule, rule.start_date, from)
}

/// The next occurrence strictly after `from` of a rule with `schedule` that
/// starts on `start_date`.
///
/// See [compute_next_occurrence].
///
/// # Errors
///
/// Returns [InvalidRuleError::DateOutOfRange] if the next occurrence cannot be represented.
pub fn next_occurrence_after(
    schedule: &Schedule,
    start_date: Date,
    from: Date,
) -> Result<Date, InvalidRuleError> {
    let first = first_occurrence(schedule, start_date)?;

    if from < first {
        return Ok(first);
    }

    let out_of_range = InvalidRuleError::DateOutOfRange(from);

    match schedule.period() {
        Period::Days(step) => {
            let elapsed = (from - first).whole_days();
            let periods = elapsed / step + 1;

            periods
                .checked_mul(step)
                .and_then(|days| first.checked_add(Duration::days(days)))
                .ok_or(out_of_range)
        }
        Period::Months { months: step, day } => {
            let first_index = month_index(first);
            let periods = (month_index(from) - first_index) / step;
            let candidate =
                date_at_month_index(first_index + periods * step, day).ok_or(out_of_range.clone())?;

            if candidate > from {
                Ok(candidate)
            } else {
                date_at_month_index(first_index + (periods + 1) * step, day).ok_or(out_of_range)
            }
        }
    }
}

/// Months since year zero, so that month arithmetic is plain integer arithmetic.
fn month_index(date: Date) -> i64 {
    i64::from(date.year()) * 12 + i64::from(u8::from(date.month())) - 1
}

/// The date in the month at `index` with `day` clamped to the length of that month.
fn date_at_month_index(index: i64, day: DayOfMonth) -> Option<Date> {
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month_number = u8::try_from(index.rem_euclid(12) + 1).ok()?;
    let month = Month::try_from(month_number).ok()?;
    let day = day.get().min(util::days_in_month(month, year));

    Date::from_calendar_date(year, month, day).ok()
}
