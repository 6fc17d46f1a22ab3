//! Periodic contribution (savings plan) schedule.

use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Interval {
    /// Identifies the calendar period a date belongs to.
    pub fn period_key(&self, date: NaiveDate) -> (i32, u32) {
        match self {
            Interval::Weekly => {
                let week = date.iso_week();
                (week.year(), week.week())
            }
            Interval::Monthly => (date.year(), date.month()),
            Interval::Quarterly => (date.year(), (date.month() - 1) / 3),
            Interval::Yearly => (date.year(), 0),
        }
    }

    /// True when `date` opens a new period relative to `previous`.
    pub fn starts_new_period(&self, previous: NaiveDate, date: NaiveDate) -> bool {
        self.period_key(previous) != self.period_key(date)
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weekly" | "week" => Ok(Interval::Weekly),
            "monthly" | "month" => Ok(Interval::Monthly),
            "quarterly" | "quarter" => Ok(Interval::Quarterly),
            "yearly" | "year" | "annual" => Ok(Interval::Yearly),
            other => Err(format!(
                "unknown interval '{}' (expected weekly, monthly, quarterly or yearly)",
                other
            )),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Interval::Weekly => "weekly",
            Interval::Monthly => "monthly",
            Interval::Quarterly => "quarterly",
            Interval::Yearly => "yearly",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contribution {
    pub amount: f64,
    pub interval: Interval,
}

impl Contribution {
    pub fn is_due(&self, previous: NaiveDate, date: NaiveDate) -> bool {
        self.amount > 0.0 && self.interval.starts_new_period(previous, date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn monthly_new_period() {
        let interval = Interval::Monthly;
        assert!(!interval.starts_new_period(d(2024, 1, 2), d(2024, 1, 31)));
        assert!(interval.starts_new_period(d(2024, 1, 31), d(2024, 2, 1)));
        assert!(interval.starts_new_period(d(2023, 12, 29), d(2024, 1, 2)));
    }

    #[test]
    fn weekly_uses_iso_weeks() {
        let interval = Interval::Weekly;
        // Friday 2024-01-05 → Monday 2024-01-08
        assert!(interval.starts_new_period(d(2024, 1, 5), d(2024, 1, 8)));
        // Monday → Friday of the same week
        assert!(!interval.starts_new_period(d(2024, 1, 8), d(2024, 1, 12)));
        // 2024-12-30 belongs to ISO week 1 of 2025, as does 2025-01-02
        assert!(!interval.starts_new_period(d(2024, 12, 30), d(2025, 1, 2)));
    }

    #[test]
    fn quarterly_and_yearly() {
        assert!(!Interval::Quarterly.starts_new_period(d(2024, 1, 15), d(2024, 3, 29)));
        assert!(Interval::Quarterly.starts_new_period(d(2024, 3, 29), d(2024, 4, 1)));
        assert!(!Interval::Yearly.starts_new_period(d(2024, 1, 2), d(2024, 12, 31)));
        assert!(Interval::Yearly.starts_new_period(d(2024, 12, 31), d(2025, 1, 2)));
    }

    #[test]
    fn parse_interval() {
        assert_eq!("Monthly".parse::<Interval>().unwrap(), Interval::Monthly);
        assert_eq!(" weekly ".parse::<Interval>().unwrap(), Interval::Weekly);
        assert_eq!("annual".parse::<Interval>().unwrap(), Interval::Yearly);
        assert!("daily".parse::<Interval>().is_err());
    }

    #[test]
    fn interval_display_roundtrips_through_parse() {
        for interval in [
            Interval::Weekly,
            Interval::Monthly,
            Interval::Quarterly,
            Interval::Yearly,
        ] {
            assert_eq!(interval.to_string().parse::<Interval>().unwrap(), interval);
        }
    }

    #[test]
    fn zero_amount_is_never_due() {
        let c = Contribution {
            amount: 0.0,
            interval: Interval::Monthly,
        };
        assert!(!c.is_due(d(2024, 1, 31), d(2024, 2, 1)));
    }
}
