use serde::{Deserialize, Serialize};

use crate::models::TradeRecord;

const BUCKET_WIDTH_PCT: i32 = 2;
const RANGE_LIMIT_PCT: i32 = 20;

/// One return interval. `lower` is inclusive and `upper` exclusive; the
/// outermost intervals are open on one side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnBucket {
    pub label: String,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub trade_count: usize,
    pub avg_net_pnl: f64,
}

impl ReturnBucket {
    fn empty(lower: Option<i32>, upper: Option<i32>) -> Self {
        let label = match (lower, upper) {
            (None, Some(upper)) => format!("{}% below", upper),
            (Some(lower), None) => format!("{}% above", lower),
            (Some(lower), Some(upper)) => format!("{}% to {}%", lower, upper),
            (None, None) => "all".to_string(),
        };
        Self {
            label,
            lower: lower.map(f64::from),
            upper: upper.map(f64::from),
            trade_count: 0,
            avg_net_pnl: 0.0,
        }
    }

    fn contains(&self, value: f64) -> bool {
        self.lower.is_none_or(|lower| value >= lower) && self.upper.is_none_or(|upper| value < upper)
    }
}

fn empty_buckets() -> Vec<ReturnBucket> {
    let mut buckets = vec![ReturnBucket::empty(None, Some(-RANGE_LIMIT_PCT))];
    let mut lower = -RANGE_LIMIT_PCT;
    while lower < RANGE_LIMIT_PCT {
        buckets.push(ReturnBucket::empty(Some(lower), Some(lower + BUCKET_WIDTH_PCT)));
        lower += BUCKET_WIDTH_PCT;
    }
    buckets.push(ReturnBucket::empty(Some(RANGE_LIMIT_PCT), None));
    buckets
}

/// Trade count and mean Net PnL per 2 % return interval, from "-20% below"
/// to "20% above". Every trade lands in exactly one interval.
pub fn return_distribution<'a, I>(trades: I) -> Vec<ReturnBucket>
where
    I: IntoIterator<Item = &'a TradeRecord>,
{
    let mut buckets = empty_buckets();
    let mut sums = vec![0.0; buckets.len()];

    for trade in trades {
        if let Some(index) = buckets.iter().position(|b| b.contains(trade.return_pct)) {
            buckets[index].trade_count += 1;
            sums[index] += trade.net_pnl;
        }
    }

    for (bucket, sum) in buckets.iter_mut().zip(sums) {
        if bucket.trade_count > 0 {
            bucket.avg_net_pnl = sum / bucket.trade_count as f64;
        }
    }
    buckets
}
