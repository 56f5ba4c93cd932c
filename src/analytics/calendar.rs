use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::models::TradeRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

/// Calendar bucket a trade date falls into. Weeks end on Sunday and are
/// keyed by that Sunday's date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PeriodKey {
    Day(NaiveDate),
    Week(NaiveDate),
    Month { year: i32, month: u32 },
    Quarter { year: i32, quarter: u32 },
    Year(i32),
}

pub fn quarter_of(month: u32) -> u32 {
    (month - 1) / 3 + 1
}

impl PeriodKey {
    pub fn for_date(period: Period, date: NaiveDate) -> Self {
        match period {
            Period::Day => PeriodKey::Day(date),
            Period::Week => {
                let to_sunday = (7 - date.weekday().num_days_from_sunday()) % 7;
                PeriodKey::Week(date + Days::new(to_sunday as u64))
            }
            Period::Month => PeriodKey::Month {
                year: date.year(),
                month: date.month(),
            },
            Period::Quarter => PeriodKey::Quarter {
                year: date.year(),
                quarter: quarter_of(date.month()),
            },
            Period::Year => PeriodKey::Year(date.year()),
        }
    }

    /// First calendar day covered by the bucket.
    pub fn start(&self) -> Option<NaiveDate> {
        match *self {
            PeriodKey::Day(date) => Some(date),
            PeriodKey::Week(sunday) => sunday.checked_sub_days(Days::new(6)),
            PeriodKey::Month { year, month } => NaiveDate::from_ymd_opt(year, month, 1),
            PeriodKey::Quarter { year, quarter } => {
                NaiveDate::from_ymd_opt(year, (quarter - 1) * 3 + 1, 1)
            }
            PeriodKey::Year(year) => NaiveDate::from_ymd_opt(year, 1, 1),
        }
    }

    pub fn next(&self) -> Option<PeriodKey> {
        Some(match *self {
            PeriodKey::Day(date) => PeriodKey::Day(date.succ_opt()?),
            PeriodKey::Week(sunday) => PeriodKey::Week(sunday.checked_add_days(Days::new(7))?),
            PeriodKey::Month { .. } => {
                let start = self.start()?.checked_add_months(Months::new(1))?;
                PeriodKey::for_date(Period::Month, start)
            }
            PeriodKey::Quarter { .. } => {
                let start = self.start()?.checked_add_months(Months::new(3))?;
                PeriodKey::for_date(Period::Quarter, start)
            }
            PeriodKey::Year(year) => PeriodKey::Year(year + 1),
        })
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodKey::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            PeriodKey::Week(sunday) => write!(f, "Week ending {}", sunday.format("%Y-%m-%d")),
            PeriodKey::Month { year, month } => write!(f, "{}-{:02}", year, month),
            PeriodKey::Quarter { year, quarter } => write!(f, "{} Q{}", year, quarter),
            PeriodKey::Year(year) => write!(f, "{}", year),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub net_pnl_sum: f64,
    pub trade_count: usize,
}

impl Bucket {
    fn add(&mut self, trade: &TradeRecord) {
        self.net_pnl_sum += trade.net_pnl;
        self.trade_count += 1;
    }
}

/// Sums Net PnL and counts trades per bucket. Only buckets holding at
/// least one trade appear in the result.
pub fn bucket<'a, I>(trades: I, period: Period) -> BTreeMap<PeriodKey, Bucket>
where
    I: IntoIterator<Item = &'a TradeRecord>,
{
    let mut buckets: BTreeMap<PeriodKey, Bucket> = BTreeMap::new();
    for trade in trades {
        buckets
            .entry(PeriodKey::for_date(period, trade.date))
            .or_default()
            .add(trade);
    }
    buckets
}

/// Every bucket between the ones containing `from` and `to` (inclusive),
/// with zero-valued entries for empty buckets. Trades outside the range
/// are ignored.
pub fn bucket_range<'a, I>(
    trades: I,
    period: Period,
    from: NaiveDate,
    to: NaiveDate,
) -> BTreeMap<PeriodKey, Bucket>
where
    I: IntoIterator<Item = &'a TradeRecord>,
{
    let first = PeriodKey::for_date(period, from);
    let last = PeriodKey::for_date(period, to);

    let mut buckets: BTreeMap<PeriodKey, Bucket> = BTreeMap::new();
    let mut key = Some(first);
    while let Some(current) = key {
        if current > last {
            break;
        }
        buckets.insert(current, Bucket::default());
        key = current.next();
    }

    for trade in trades {
        if let Some(entry) = buckets.get_mut(&PeriodKey::for_date(period, trade.date)) {
            entry.add(trade);
        }
    }
    buckets
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRow {
    pub key: PeriodKey,
    pub label: String,
    pub net_pnl_sum: f64,
    pub trade_count: usize,
}

pub fn to_rows(buckets: &BTreeMap<PeriodKey, Bucket>) -> Vec<PeriodRow> {
    buckets
        .iter()
        .map(|(key, b)| PeriodRow {
            key: *key,
            label: key.to_string(),
            net_pnl_sum: b.net_pnl_sum,
            trade_count: b.trade_count,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub net_pnl_sum: f64,
    pub trade_count: usize,
}

/// Month grid, Sunday-first. Cells outside the month are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthCalendar {
    pub year: i32,
    pub month: u32,
    pub weeks: Vec<[Option<DayCell>; 7]>,
}

pub fn month_calendar<'a, I>(trades: I, year: i32, month: u32) -> Option<MonthCalendar>
where
    I: IntoIterator<Item = &'a TradeRecord>,
{
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
    let days = bucket_range(trades, Period::Day, first, last);

    let mut weeks: Vec<[Option<DayCell>; 7]> = Vec::new();
    let mut week: [Option<DayCell>; 7] = [None; 7];

    for (key, b) in &days {
        let PeriodKey::Day(date) = *key else { continue };
        let column = date.weekday().num_days_from_sunday() as usize;
        week[column] = Some(DayCell {
            date,
            net_pnl_sum: b.net_pnl_sum,
            trade_count: b.trade_count,
        });
        if column == 6 {
            weeks.push(week);
            week = [None; 7];
        }
    }
    if week.iter().any(Option::is_some) {
        weeks.push(week);
    }

    Some(MonthCalendar { year, month, weeks })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trade::fixtures::fields;
    use crate::models::Direction;

    fn trade_on(id: u64, y: i32, m: u32, d: u32, net_pnl: f64) -> TradeRecord {
        let mut t = TradeRecord::new(id, fields("ES", Direction::Long, 4500.0, 4510.0));
        t.date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        t.net_pnl = net_pnl;
        t
    }

    fn sample() -> Vec<TradeRecord> {
        vec![
            trade_on(1, 2024, 1, 15, 100.0),
            trade_on(2, 2024, 1, 15, -40.0),
            trade_on(3, 2024, 3, 31, 25.0),
            trade_on(4, 2024, 4, 1, 10.0),
            trade_on(5, 2025, 12, 31, -5.0),
        ]
    }

    #[test]
    fn test_day_buckets() {
        let buckets = bucket(&sample(), Period::Day);
        let jan15 = buckets[&PeriodKey::Day(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())];
        assert_eq!(jan15.trade_count, 2);
        assert_eq!(jan15.net_pnl_sum, 60.0);
        assert_eq!(buckets.len(), 4);
    }

    #[test]
    fn test_quarter_boundaries() {
        let buckets = bucket(&sample(), Period::Quarter);
        assert_eq!(buckets[&PeriodKey::Quarter { year: 2024, quarter: 1 }].trade_count, 3);
        assert_eq!(buckets[&PeriodKey::Quarter { year: 2024, quarter: 2 }].trade_count, 1);
        assert_eq!(buckets[&PeriodKey::Quarter { year: 2025, quarter: 4 }].net_pnl_sum, -5.0);
    }

    #[test]
    fn test_week_ends_on_sunday() {
        // 2024-01-15 is a Monday, 2024-01-21 the following Sunday.
        let monday = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 21).unwrap();
        assert_eq!(PeriodKey::for_date(Period::Week, monday), PeriodKey::Week(sunday));
        assert_eq!(PeriodKey::for_date(Period::Week, sunday), PeriodKey::Week(sunday));
        assert_eq!(PeriodKey::Week(sunday).start(), Some(monday));
    }

    #[test]
    fn test_year_and_month_buckets() {
        let years = bucket(&sample(), Period::Year);
        assert_eq!(years[&PeriodKey::Year(2024)].trade_count, 4);
        assert_eq!(years[&PeriodKey::Year(2025)].trade_count, 1);

        let months = bucket(&sample(), Period::Month);
        assert_eq!(months[&PeriodKey::Month { year: 2024, month: 3 }].net_pnl_sum, 25.0);
    }

    #[test]
    fn test_range_zero_fills_requested_buckets() {
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let buckets = bucket_range(&sample(), Period::Month, from, to);

        assert_eq!(buckets.len(), 6);
        let feb = buckets[&PeriodKey::Month { year: 2024, month: 2 }];
        assert_eq!(feb, Bucket { net_pnl_sum: 0.0, trade_count: 0 });
        assert!(!buckets.contains_key(&PeriodKey::Month { year: 2025, month: 12 }));
    }

    #[test]
    fn test_repeated_calls_are_stable() {
        let trades = sample();
        assert_eq!(bucket(&trades, Period::Week), bucket(&trades, Period::Week));
    }

    #[test]
    fn test_month_calendar_grid() {
        // January 2024 starts on a Monday and has 31 days.
        let cal = month_calendar(&sample(), 2024, 1).unwrap();
        assert_eq!(cal.weeks.len(), 5);
        assert!(cal.weeks[0][0].is_none());
        assert_eq!(cal.weeks[0][1].unwrap().date.day(), 1);

        let jan15 = cal.weeks[2][1].unwrap();
        assert_eq!(jan15.date.day(), 15);
        assert_eq!(jan15.trade_count, 2);

        let cells: usize = cal.weeks.iter().map(|w| w.iter().flatten().count()).sum();
        assert_eq!(cells, 31);
        assert!(month_calendar(&sample(), 2024, 13).is_none());
    }
}
