//! Optimisation report

use crate::strategy::{IndicatorFamily, TradeParams};
use serde::Serialize;

/// Profit of one family's best parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ranking {
    pub family: IndicatorFamily,
    pub performance: f64,
    pub enabled: bool,
}

impl Ranking {
    pub fn new(family: IndicatorFamily, performance: f64) -> Self {
        Self {
            family,
            performance,
            enabled: false,
        }
    }
}

/// Outcome of one optimisation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationReport {
    /// Length of the replayed series
    pub candles: usize,
    /// Families, best first
    pub rankings: Vec<Ranking>,
    /// `None` when no family was profitable
    pub params: Option<TradeParams>,
}

impl OptimizationReport {
    /// Format report as string
    pub fn format(&self) -> String {
        let mut out = format!(
            "\nOptimisation Results\n====================\nCandles: {}\n",
            self.candles
        );
        for (i, ranking) in self.rankings.iter().enumerate() {
            out.push_str(&format!(
                "{}. {:<10} {:>14.2} {}\n",
                i + 1,
                ranking.family,
                ranking.performance,
                if ranking.enabled { "enabled" } else { "-" }
            ));
        }
        if self.params.is_none() {
            out.push_str("No trade configuration available\n");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_lists_rankings() {
        let report = OptimizationReport {
            candles: 10,
            rankings: vec![
                Ranking {
                    family: IndicatorFamily::Rsi,
                    performance: 12.5,
                    enabled: true,
                },
                Ranking::new(IndicatorFamily::Ema, 0.0),
            ],
            params: Some(TradeParams::default()),
        };
        let text = report.format();
        assert!(text.contains("1. rsi"));
        assert!(text.contains("12.50 enabled"));
        assert!(!text.contains("No trade configuration"));
    }
}
