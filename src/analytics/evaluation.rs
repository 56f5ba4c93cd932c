use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::TradeRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagScore {
    pub label: String,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationPoint {
    pub trade_id: u64,
    pub score: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeEvaluation {
    pub entry_exit: Vec<TagScore>,
    pub emotion: Vec<TagScore>,
    pub curve: Vec<EvaluationPoint>,
}

/// Combined entry/exit and emotion score of a single trade.
pub fn trade_score(trade: &TradeRecord) -> i64 {
    (trade.entry_exit_quality.score() + trade.emotion.score()) as i64
}

fn sum_by_label<I>(tags: I) -> Vec<TagScore>
where
    I: IntoIterator<Item = (&'static str, i32)>,
{
    let mut sums: BTreeMap<&'static str, i64> = BTreeMap::new();
    for (label, score) in tags {
        *sums.entry(label).or_default() += score as i64;
    }

    let mut scores: Vec<TagScore> = sums
        .into_iter()
        .map(|(label, score)| TagScore {
            label: label.to_string(),
            score,
        })
        .collect();
    // Stable sort keeps equal scores in label order.
    scores.sort_by(|a, b| b.score.cmp(&a.score));
    scores
}

/// Running sum of trade scores in ledger order.
pub fn evaluation_curve(trades: &[TradeRecord], last: Option<usize>) -> Vec<EvaluationPoint> {
    let mut running = 0i64;
    let curve: Vec<EvaluationPoint> = trades
        .iter()
        .map(|trade| {
            running += trade_score(trade);
            EvaluationPoint {
                trade_id: trade.trade_id,
                score: running,
            }
        })
        .collect();

    match last {
        Some(n) => curve[curve.len().saturating_sub(n)..].to_vec(),
        None => curve,
    }
}

pub fn evaluate_trades(trades: &[TradeRecord], last: Option<usize>) -> TradeEvaluation {
    TradeEvaluation {
        entry_exit: sum_by_label(
            trades
                .iter()
                .map(|t| (t.entry_exit_quality.label(), t.entry_exit_quality.score())),
        ),
        emotion: sum_by_label(trades.iter().map(|t| (t.emotion.label(), t.emotion.score()))),
        curve: evaluation_curve(trades, last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trade::fixtures::fields;
    use crate::models::{Direction, Emotion, EntryExitQuality};

    fn trade(id: u64, quality: EntryExitQuality, emotion: Emotion) -> TradeRecord {
        let mut t = TradeRecord::new(id, fields("ES", Direction::Long, 4500.0, 4510.0));
        t.entry_exit_quality = quality;
        t.emotion = emotion;
        t
    }

    fn sample() -> Vec<TradeRecord> {
        vec![
            trade(1, EntryExitQuality::AsPlanned, Emotion::ByTheRules),
            trade(2, EntryExitQuality::TooEarly, Emotion::Fear),
            trade(3, EntryExitQuality::AsPlanned, Emotion::Greed),
            trade(4, EntryExitQuality::TooEarly, Emotion::ByTheRules),
            trade(5, EntryExitQuality::AsPlanned, Emotion::ByTheRules),
        ]
    }

    #[test]
    fn test_tag_sums_sorted_descending() {
        let evaluation = evaluate_trades(&sample(), None);

        assert_eq!(
            evaluation.entry_exit,
            vec![
                TagScore { label: "As Planned".to_string(), score: 3 },
                TagScore { label: "Too Early".to_string(), score: -2 },
            ]
        );
        assert_eq!(evaluation.emotion[0].label, "By The Rules");
        assert_eq!(evaluation.emotion[0].score, 3);
        assert_eq!(evaluation.emotion.len(), 3);
    }

    #[test]
    fn test_cumulative_curve() {
        let scores: Vec<i64> = evaluation_curve(&sample(), None).iter().map(|p| p.score).collect();
        assert_eq!(scores, vec![2, 0, 0, 0, 2]);
    }

    #[test]
    fn test_curve_last_n_keeps_running_total() {
        let tail = evaluation_curve(&sample(), Some(2));
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].trade_id, 4);
        assert_eq!(tail[1].score, 2);

        assert_eq!(evaluation_curve(&sample(), Some(50)).len(), 5);
    }
}
