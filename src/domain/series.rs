//! Ordered (date, value) time series with date resolution helpers.
//!
//! Values are `Option<f64>`: loaders coerce malformed cells to `None` rather
//! than failing, and every consumer decides how to treat the gaps.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

impl SeriesPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self {
            date,
            value: Some(value),
        }
    }

    pub fn missing(date: NaiveDate) -> Self {
        Self { date, value: None }
    }

    /// The value if it can be traded at: finite and strictly positive.
    pub fn price(&self) -> Option<f64> {
        self.value.filter(|v| v.is_finite() && *v > 0.0)
    }
}

/// A series sorted ascending by date with unique dates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    points: Vec<SeriesPoint>,
}

impl TimeSeries {
    /// Sorts by date; when a date repeats, the later row wins.
    pub fn new(mut points: Vec<SeriesPoint>) -> Self {
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<SeriesPoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }
        Self { points: deduped }
    }

    pub fn from_values(dates: &[NaiveDate], values: &[f64]) -> Self {
        Self::new(
            dates
                .iter()
                .zip(values)
                .map(|(&date, &value)| SeriesPoint::new(date, value))
                .collect(),
        )
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    pub fn values(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.points.iter().map(|p| p.value)
    }

    /// Latest date `<= target`, or the earliest date if every date is later.
    pub fn closest_preceding(&self, target: NaiveDate) -> Option<NaiveDate> {
        let idx = self.points.partition_point(|p| p.date <= target);
        if idx == 0 {
            self.first_date()
        } else {
            Some(self.points[idx - 1].date)
        }
    }

    /// Index of the point nearest to `target` by absolute day difference.
    /// Ties go to the earlier date.
    pub fn nearest_index(&self, target: NaiveDate) -> Option<usize> {
        if self.points.is_empty() {
            return None;
        }
        let idx = self.points.partition_point(|p| p.date < target);
        if idx == 0 {
            return Some(0);
        }
        if idx == self.points.len() {
            return Some(idx - 1);
        }
        let before = (target - self.points[idx - 1].date).num_days();
        let after = (self.points[idx].date - target).num_days();
        if after < before {
            Some(idx)
        } else {
            Some(idx - 1)
        }
    }

    /// Index of the point dated exactly `target`.
    pub fn index_of(&self, target: NaiveDate) -> Option<usize> {
        self.points.binary_search_by_key(&target, |p| p.date).ok()
    }

    pub fn nearest(&self, target: NaiveDate) -> Option<&SeriesPoint> {
        self.nearest_index(target).map(|i| &self.points[i])
    }

    /// Inclusive index range of points with `start <= date <= end`.
    pub fn range_indices(&self, start: NaiveDate, end: NaiveDate) -> std::ops::Range<usize> {
        let lo = self.points.partition_point(|p| p.date < start);
        let hi = self.points.partition_point(|p| p.date <= end);
        lo..hi.max(lo)
    }

    pub fn clip(&self, start: NaiveDate, end: NaiveDate) -> TimeSeries {
        TimeSeries {
            points: self.points[self.range_indices(start, end)].to_vec(),
        }
    }

    /// Copy keeping only points with a tradable price.
    pub fn priced(&self) -> TimeSeries {
        TimeSeries {
            points: self
                .points
                .iter()
                .filter(|p| p.price().is_some())
                .copied()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample() -> TimeSeries {
        TimeSeries::from_values(
            &[d(2024, 1, 2), d(2024, 1, 5), d(2024, 1, 9), d(2024, 1, 10)],
            &[100.0, 101.0, 102.0, 103.0],
        )
    }

    #[test]
    fn new_sorts_and_dedups() {
        let series = TimeSeries::new(vec![
            SeriesPoint::new(d(2024, 1, 3), 3.0),
            SeriesPoint::new(d(2024, 1, 1), 1.0),
            SeriesPoint::new(d(2024, 1, 3), 30.0),
        ]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.first_date(), Some(d(2024, 1, 1)));
        assert_eq!(series.points()[1].value, Some(30.0));
    }

    #[test]
    fn closest_preceding_exact_match() {
        assert_eq!(sample().closest_preceding(d(2024, 1, 5)), Some(d(2024, 1, 5)));
    }

    #[test]
    fn closest_preceding_between_dates() {
        assert_eq!(sample().closest_preceding(d(2024, 1, 7)), Some(d(2024, 1, 5)));
    }

    #[test]
    fn closest_preceding_before_first_falls_back_to_earliest() {
        assert_eq!(sample().closest_preceding(d(2023, 6, 1)), Some(d(2024, 1, 2)));
    }

    #[test]
    fn closest_preceding_after_last() {
        assert_eq!(sample().closest_preceding(d(2030, 1, 1)), Some(d(2024, 1, 10)));
    }

    #[test]
    fn closest_preceding_empty() {
        assert_eq!(TimeSeries::default().closest_preceding(d(2024, 1, 1)), None);
    }

    #[test]
    fn index_of_exact_date_only() {
        let series = sample();
        assert_eq!(series.index_of(d(2024, 1, 5)), Some(1));
        assert_eq!(series.index_of(d(2024, 1, 4)), None);
    }

    #[test]
    fn nearest_picks_closer_side() {
        let series = sample();
        // 2024-01-08: 3 days after the 5th, 1 day before the 9th
        assert_eq!(series.nearest(d(2024, 1, 8)).unwrap().date, d(2024, 1, 9));
        // 2024-01-06: 1 day after the 5th
        assert_eq!(series.nearest(d(2024, 1, 6)).unwrap().date, d(2024, 1, 5));
    }

    #[test]
    fn nearest_tie_prefers_earlier() {
        let series = TimeSeries::from_values(&[d(2024, 1, 1), d(2024, 1, 3)], &[1.0, 3.0]);
        assert_eq!(series.nearest(d(2024, 1, 2)).unwrap().date, d(2024, 1, 1));
    }

    #[test]
    fn nearest_outside_bounds() {
        let series = sample();
        assert_eq!(series.nearest_index(d(2020, 1, 1)), Some(0));
        assert_eq!(series.nearest_index(d(2030, 1, 1)), Some(3));
        assert_eq!(TimeSeries::default().nearest_index(d(2024, 1, 1)), None);
    }

    #[test]
    fn clip_is_inclusive() {
        let clipped = sample().clip(d(2024, 1, 5), d(2024, 1, 9));
        assert_eq!(clipped.len(), 2);
        assert_eq!(clipped.first_date(), Some(d(2024, 1, 5)));
        assert_eq!(clipped.last_date(), Some(d(2024, 1, 9)));
    }

    #[test]
    fn clip_inverted_bounds_is_empty() {
        assert!(sample().clip(d(2024, 1, 9), d(2024, 1, 5)).is_empty());
    }

    #[test]
    fn priced_drops_missing_and_non_positive() {
        let series = TimeSeries::new(vec![
            SeriesPoint::new(d(2024, 1, 1), 10.0),
            SeriesPoint::missing(d(2024, 1, 2)),
            SeriesPoint::new(d(2024, 1, 3), 0.0),
            SeriesPoint::new(d(2024, 1, 4), f64::NAN),
            SeriesPoint::new(d(2024, 1, 5), 12.0),
        ]);
        let priced = series.priced();
        assert_eq!(priced.len(), 2);
        assert_eq!(priced.last_date(), Some(d(2024, 1, 5)));
    }
}
