//! Per-match evaluation pipeline and batch scanning.
//!
//! ```text
//! quotes -> partition -> select -> { surebet, freebet } -> rank
//! ```
//!
//! Every step is a pure function of its input. The engine holds only
//! configuration, so it can be shared across threads and evaluate many
//! matches at once.

use crate::{
    config::EngineConfig,
    error::EngineError,
    freebet::{self, FreebetOpportunity},
    partition::MarketPartitioner,
    quote::{MatchContext, MatchOddsView},
    rank::{self, Opportunity, RankFilters, SurebetOpportunity},
    select::AggregatedMarket,
    surebet::{self, SurebetResult},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Caller parameters of one evaluation cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EvaluationRequest {
    /// Total surebet stake. Falls back to the configured default.
    pub total_stake: Option<Decimal>,
    /// Free bet credit to extract. No freebet evaluation when `None`.
    pub freebet_value: Option<Decimal>,
}

impl EvaluationRequest {
    pub fn new(total_stake: Decimal) -> Self {
        Self {
            total_stake: Some(total_stake),
            freebet_value: None,
        }
    }

    pub fn with_freebet(mut self, freebet_value: Decimal) -> Self {
        self.freebet_value = Some(freebet_value);
        self
    }
}

/// Everything the engine derives for one match.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MatchEvaluation {
    pub context: MatchContext,
    pub market: AggregatedMarket,
    pub surebet: SurebetResult,
    pub freebet: Option<FreebetOpportunity>,
}

impl MatchEvaluation {
    /// Rankable opportunities of this match. Unprofitable surebets are kept so
    /// the ranker can surface near misses on request.
    pub fn into_opportunities(self) -> Vec<Opportunity> {
        let mut opportunities = vec![Opportunity::Surebet(SurebetOpportunity {
            context: self.context,
            result: self.surebet,
        })];
        opportunities.extend(self.freebet.map(Opportunity::Freebet));
        opportunities
    }
}

/// Odds aggregation and opportunity detection engine.
#[derive(Debug, Clone, Default)]
pub struct OddsEngine {
    config: EngineConfig,
    partitioner: MarketPartitioner,
}

impl OddsEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            partitioner: MarketPartitioner::from_config(&config),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn partitioner(&self) -> &MarketPartitioner {
        &self.partitioner
    }

    /// Ranking filters with no constraints, capped at the configured `max_results`.
    pub fn default_filters(&self) -> RankFilters {
        RankFilters::default().with_max_results(self.config.max_results)
    }

    /// Partition and select a match's quotes into comparable prices.
    pub fn aggregate(&self, view: &MatchOddsView) -> AggregatedMarket {
        AggregatedMarket::from_partition(&self.partitioner.partition(&view.quotes))
    }

    /// Evaluate one match for a surebet and, if requested, a freebet extraction.
    pub fn evaluate(
        &self,
        view: &MatchOddsView,
        request: &EvaluationRequest,
    ) -> Result<MatchEvaluation, EngineError> {
        let (total_stake, freebet_value) = self.validate(request)?;
        self.evaluate_validated(view, total_stake, freebet_value)
    }

    /// Evaluate every match and rank the resulting opportunities.
    ///
    /// Matches with unusable data are logged and skipped. An invalid request
    /// fails the whole scan.
    pub fn scan(
        &self,
        views: &[MatchOddsView],
        request: &EvaluationRequest,
        filters: &RankFilters,
    ) -> Result<Vec<Opportunity>, EngineError> {
        let (total_stake, freebet_value) = self.validate(request)?;

        let mut opportunities = Vec::new();
        for view in views {
            let evaluation = self.evaluate_validated(view, total_stake, freebet_value);
            collect(&mut opportunities, view.match_id(), evaluation)?;
        }

        Ok(self.finish(opportunities, filters, views.len()))
    }

    /// Same as [`OddsEngine::scan`], evaluating matches in parallel on the
    /// blocking thread pool.
    pub async fn scan_concurrent(
        self: Arc<Self>,
        views: Vec<MatchOddsView>,
        request: EvaluationRequest,
        filters: &RankFilters,
    ) -> Result<Vec<Opportunity>, EngineError> {
        let (total_stake, freebet_value) = self.validate(&request)?;
        let scanned = views.len();

        let mut tasks = JoinSet::new();
        for view in views {
            let engine = Arc::clone(&self);
            tasks.spawn_blocking(move || {
                let evaluation = engine.evaluate_validated(&view, total_stake, freebet_value);
                (view.context.match_id, evaluation)
            });
        }

        let mut opportunities = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((match_id, evaluation)) => collect(&mut opportunities, &match_id, evaluation)?,
                Err(error) if error.is_panic() => std::panic::resume_unwind(error.into_panic()),
                Err(error) => warn!(%error, "Match evaluation task cancelled"),
            }
        }

        Ok(self.finish(opportunities, filters, scanned))
    }

    fn validate(&self, request: &EvaluationRequest) -> Result<(Decimal, Option<Decimal>), EngineError> {
        let total_stake = request.total_stake.unwrap_or(self.config.default_total_stake);
        if total_stake <= Decimal::ZERO {
            return Err(EngineError::InvalidStake(total_stake));
        }

        if let Some(value) = request.freebet_value {
            if value <= Decimal::ZERO {
                return Err(EngineError::InvalidFreebetValue(value));
            }
        }

        Ok((total_stake, request.freebet_value))
    }

    fn evaluate_validated(
        &self,
        view: &MatchOddsView,
        total_stake: Decimal,
        freebet_value: Option<Decimal>,
    ) -> Result<MatchEvaluation, EngineError> {
        let market = self.aggregate(view);
        let surebet = surebet::detect(&market, view.sport(), total_stake)?;

        let freebet = match freebet_value {
            Some(value) => {
                match freebet::extract(&view.context, &market, value, self.config.freebet_payout) {
                    Ok(freebet) => freebet,
                    Err(error) if error.is_data_error() => {
                        warn!(match_id = %view.context.match_id, %error, "Freebet extraction skipped");
                        None
                    }
                    Err(error) => return Err(error),
                }
            }
            None => None,
        };

        if surebet.is_profitable {
            info!(
                match_id = %view.context.match_id,
                coefficient = %surebet.arbitrage_coefficient,
                roi = %surebet.roi_percent,
                profit = %surebet.guaranteed_profit,
                "Surebet detected"
            );
        }

        if let Some(freebet) = &freebet {
            info!(
                match_id = %view.context.match_id,
                leg = ?freebet.freebet_leg,
                extraction_rate = %freebet.extraction_rate_percent,
                profit = %freebet.guaranteed_profit,
                "Freebet extraction detected"
            );
        }

        Ok(MatchEvaluation {
            context: view.context.clone(),
            market,
            surebet,
            freebet,
        })
    }

    fn finish(&self, opportunities: Vec<Opportunity>, filters: &RankFilters, scanned: usize) -> Vec<Opportunity> {
        let candidates = opportunities.len();
        let ranked = rank::rank(opportunities, filters);

        debug!(
            matches = scanned,
            candidates,
            ranked = ranked.len(),
            "Scan complete"
        );

        ranked
    }
}

fn collect(
    opportunities: &mut Vec<Opportunity>,
    match_id: &str,
    evaluation: Result<MatchEvaluation, EngineError>,
) -> Result<(), EngineError> {
    match evaluation {
        Ok(evaluation) => {
            opportunities.extend(evaluation.into_opportunities());
            Ok(())
        }
        Err(error) if error.is_data_error() => {
            warn!(%match_id, %error, "Skipping match");
            Ok(())
        }
        Err(error) => Err(error),
    }
}
