//! Per-bar vote tally over the enabled rules

use crate::data::CandleSeries;
use crate::portfolio::Side;
use crate::strategy::{
    BollingerParams, BollingerRule, EmaCrossRule, EmaParams, IchimokuParams, IchimokuRule,
    IndicatorFamily, MacdParams, MacdRule, Rule, RsiParams, RsiRule, TradeParams,
};
use serde::Serialize;

/// Parameters of the family that cast a vote
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "indicator", rename_all = "snake_case")]
pub enum RuleParams {
    Ema(EmaParams),
    Bollinger(BollingerParams),
    Ichimoku(IchimokuParams),
    Macd(MacdParams),
    Rsi(RsiParams),
}

/// One family's recommendation for one bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FamilyVote {
    pub side: Side,
    #[serde(flatten)]
    pub params: RuleParams,
}

/// Votes cast for one bar
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VoteTally {
    pub buys: usize,
    pub sells: usize,
    pub votes: Vec<FamilyVote>,
}

impl VoteTally {
    /// JSON form for logging
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.votes).unwrap_or_default()
    }
}

/// Rules of every enabled family, built over one candle series
pub struct RuleSet {
    rules: Vec<(Box<dyn Rule>, RuleParams)>,
}

impl RuleSet {
    /// Compute indicator series for the enabled families of `params`
    pub fn build(params: &TradeParams, series: &CandleSeries) -> Self {
        let closes = series.closes();
        let mut rules: Vec<(Box<dyn Rule>, RuleParams)> = Vec::new();

        if params.ema.enabled {
            rules.push((Box::new(EmaCrossRule::new(&closes, &params.ema)), RuleParams::Ema(params.ema)));
        }
        if params.bollinger.enabled {
            rules.push((
                Box::new(BollingerRule::new(&closes, &params.bollinger)),
                RuleParams::Bollinger(params.bollinger),
            ));
        }
        if params.ichimoku.enabled {
            rules.push((
                Box::new(IchimokuRule::new(&series.highs(), &series.lows(), &closes, &params.ichimoku)),
                RuleParams::Ichimoku(params.ichimoku),
            ));
        }
        if params.macd.enabled {
            rules.push((Box::new(MacdRule::new(&closes, &params.macd)), RuleParams::Macd(params.macd)));
        }
        if params.rsi.enabled {
            rules.push((Box::new(RsiRule::new(&closes, &params.rsi)), RuleParams::Rsi(params.rsi)));
        }

        Self { rules }
    }

    pub fn families(&self) -> Vec<IndicatorFamily> {
        self.rules.iter().map(|(rule, _)| rule.family()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// One buy vote and one sell vote per family whose rule fires at `i`
    pub fn tally(&self, i: usize) -> VoteTally {
        let mut tally = VoteTally::default();
        for (rule, params) in &self.rules {
            if rule.should_buy(i) {
                tally.buys += 1;
                tally.votes.push(FamilyVote { side: Side::Buy, params: *params });
            }
            if rule.should_sell(i) {
                tally.sells += 1;
                tally.votes.push(FamilyVote { side: Side::Sell, params: *params });
            }
        }
        tally
    }
}
