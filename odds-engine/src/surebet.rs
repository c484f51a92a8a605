//! Surebet (cross-outcome arbitrage) detection and stake allocation.
//!
//! With best decimal odds `o_i` over the outcomes of a match, the arbitrage
//! coefficient is `c = Σ 1/o_i`. When `c < 1`, staking
//! `stake_i = total / (o_i * c)` on every outcome returns `total / c`
//! whichever outcome occurs:
//!
//! ```text
//! payout_i = o_i * stake_i = total / c
//! profit   = total / c - total
//! ROI      = (1 - c) * 100
//! ```

use crate::{
    error::{EngineError, ensure_valid_odd},
    quote::{Outcome, Sport},
    select::{AggregatedMarket, PricePoint},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One outcome of a surebet evaluation, priced at its best PA quote.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SurebetLeg {
    pub outcome: Outcome,
    pub price: PricePoint,
    /// Stake on this outcome. Only set when the surebet is profitable.
    pub stake: Option<Decimal>,
}

/// Stake per outcome. `draw` is `None` for a 2-way evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct OutcomeStakes {
    pub home: Decimal,
    pub draw: Option<Decimal>,
    pub away: Decimal,
}

impl OutcomeStakes {
    pub fn get(&self, outcome: Outcome) -> Option<Decimal> {
        match outcome {
            Outcome::Home => Some(self.home),
            Outcome::Draw => self.draw,
            Outcome::Away => Some(self.away),
        }
    }

    pub fn total(&self) -> Decimal {
        self.home + self.draw.unwrap_or(Decimal::ZERO) + self.away
    }
}

/// Outcome of a surebet evaluation over a match's best PA prices.
///
/// Unprofitable markets are still reported, with their coefficient and a
/// non-positive ROI, so callers can rank near misses. They never carry
/// stakes or a positive profit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SurebetResult {
    /// Sum of reciprocal best odds over the evaluated outcomes
    pub arbitrage_coefficient: Decimal,
    /// True only when the coefficient is below 1
    pub is_profitable: bool,
    /// `(1 - coefficient) * 100`
    pub roi_percent: Decimal,
    /// Total stake the allocation was computed for
    pub total_stake: Decimal,
    /// Stake split, when profitable
    pub stakes: Option<OutcomeStakes>,
    /// `total / coefficient - total` when profitable, otherwise zero
    pub guaranteed_profit: Decimal,
    /// Evaluated outcomes in home, draw, away order
    pub legs: Vec<SurebetLeg>,
}

impl SurebetResult {
    /// Number of outcomes the coefficient was computed over (2 or 3).
    pub fn outcomes_used(&self) -> usize {
        self.legs.len()
    }

    /// Gross return if `outcome` occurs, for a profitable allocation.
    pub fn payout_for(&self, outcome: Outcome) -> Option<Decimal> {
        let leg = self.legs.iter().find(|leg| leg.outcome == outcome)?;
        leg.stake?.checked_mul(leg.price.odd)
    }

    /// Net result if `outcome` occurs, for a profitable allocation.
    pub fn profit_for(&self, outcome: Outcome) -> Option<Decimal> {
        Some(self.payout_for(outcome)? - self.stakes?.total())
    }

    /// Check if this surebet meets a minimum ROI threshold.
    pub fn meets_threshold(&self, min_roi_percent: Decimal) -> bool {
        self.roi_percent >= min_roi_percent
    }
}

/// Sum of reciprocals of `odds`.
pub fn arbitrage_coefficient(odds: &[Decimal]) -> Decimal {
    odds.iter().map(|odd| Decimal::ONE / odd).sum()
}

/// Evaluate a match's best PA prices for a surebet.
///
/// Football uses home, draw and away. If no PA quote prices the draw above 1,
/// the evaluation degrades to the 2-way formula over home and away instead of
/// failing. Basketball always uses home and away.
///
/// # Errors
/// - [`EngineError::InvalidStake`] if `total_stake <= 0`, or so large the
///   allocation overflows
/// - [`EngineError::InsufficientData`] if home or away has no valid quote
/// - [`EngineError::InvalidOdds`] if a home or away best price is not above 1
pub fn detect(
    market: &AggregatedMarket,
    sport: Sport,
    total_stake: Decimal,
) -> Result<SurebetResult, EngineError> {
    if total_stake <= Decimal::ZERO {
        return Err(EngineError::InvalidStake(total_stake));
    }

    let home = required_price(market, Outcome::Home)?;
    let away = required_price(market, Outcome::Away)?;
    let draw = if sport.has_draw() {
        let draw = market.best_pa.draw.as_ref().filter(|price| price.odd > Decimal::ONE);
        if draw.is_none() {
            debug!(%sport, "No usable draw price, evaluating as 2-way market");
        }
        draw
    } else {
        None
    };

    let mut priced = vec![(Outcome::Home, home)];
    if let Some(draw) = draw {
        priced.push((Outcome::Draw, draw));
    }
    priced.push((Outcome::Away, away));

    let odds: Vec<Decimal> = priced.iter().map(|(_, price)| price.odd).collect();
    let coefficient = arbitrage_coefficient(&odds);
    let is_profitable = coefficient < Decimal::ONE;
    let roi_percent = (Decimal::ONE - coefficient) * Decimal::ONE_HUNDRED;

    let stake_for = |odd: Decimal| {
        odd.checked_mul(coefficient)
            .and_then(|weight| total_stake.checked_div(weight))
            .ok_or(EngineError::InvalidStake(total_stake))
    };

    let legs = priced
        .into_iter()
        .map(|(outcome, price)| -> Result<SurebetLeg, EngineError> {
            let stake = if is_profitable { Some(stake_for(price.odd)?) } else { None };
            Ok(SurebetLeg {
                outcome,
                stake,
                price: price.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let (stakes, guaranteed_profit) = if is_profitable {
        let stakes = OutcomeStakes {
            home: stake_for(home.odd)?,
            draw: draw.map(|price| stake_for(price.odd)).transpose()?,
            away: stake_for(away.odd)?,
        };
        let payout = total_stake
            .checked_div(coefficient)
            .ok_or(EngineError::InvalidStake(total_stake))?;
        (Some(stakes), payout - total_stake)
    } else {
        (None, Decimal::ZERO)
    };

    debug!(
        %coefficient,
        outcomes = legs.len(),
        is_profitable,
        roi = %roi_percent,
        "Surebet evaluated"
    );

    Ok(SurebetResult {
        arbitrage_coefficient: coefficient,
        is_profitable,
        roi_percent,
        total_stake,
        stakes,
        guaranteed_profit,
        legs,
    })
}

fn required_price(market: &AggregatedMarket, outcome: Outcome) -> Result<&PricePoint, EngineError> {
    let price = market
        .best_pa
        .get(outcome)
        .ok_or(EngineError::InsufficientData { outcome })?;
    ensure_valid_odd(outcome, price.odd)?;
    Ok(price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        partition::MarketPartitioner,
        quote::{MarketClass, Quote},
    };
    use chrono::DateTime;
    use rust_decimal_macros::dec;

    const TOLERANCE: Decimal = dec!(0.000001);

    fn market(quotes: &[Quote]) -> AggregatedMarket {
        let partition = MarketPartitioner::default().partition(quotes);
        AggregatedMarket::from_partition(&partition)
    }

    fn quote(id: &str, home: Decimal, draw: Option<Decimal>, away: Decimal) -> Quote {
        Quote::new(
            id,
            id,
            home,
            draw,
            away,
            DateTime::from_timestamp(1738368000, 0).unwrap(),
        )
    }

    fn assert_close(actual: Decimal, expected: Decimal, tolerance: Decimal) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected} +/- {tolerance}, got {actual}"
        );
    }

    #[test]
    fn test_arbitrage_coefficient() {
        assert_eq!(arbitrage_coefficient(&[dec!(2), dec!(4), dec!(4)]), dec!(1));
        assert_eq!(arbitrage_coefficient(&[dec!(2.5), dec!(2.5)]), dec!(0.8));
    }

    #[test]
    fn test_sample_market_not_profitable() {
        let m = market(&[quote("a", dec!(2.45), Some(dec!(3.40)), dec!(2.90))]);
        let result = detect(&m, Sport::Football, dec!(100)).unwrap();

        assert_close(result.arbitrage_coefficient, dec!(1.0471), dec!(0.0001));
        assert!(!result.is_profitable);
        assert!(result.roi_percent < Decimal::ZERO);
        assert!(result.stakes.is_none());
        assert_eq!(result.guaranteed_profit, Decimal::ZERO);
        assert!(result.legs.iter().all(|leg| leg.stake.is_none()));
    }

    #[test]
    fn test_near_miss_not_profitable() {
        let m = market(&[
            quote("pa", dec!(2.60), Some(dec!(3.10)), dec!(2.95)),
            quote("draw", dec!(1.50), Some(dec!(3.60)), dec!(1.50)),
        ]);
        let result = detect(&m, Sport::Football, dec!(100)).unwrap();

        assert_close(result.arbitrage_coefficient, dec!(1.0014), dec!(0.0001));
        assert!(!result.is_profitable);
        assert_close(result.roi_percent, dec!(-0.14), dec!(0.01));
    }

    #[test]
    fn test_genuine_surebet() {
        let m = market(&[
            quote("a", dec!(3.0), Some(dec!(3.2)), dec!(3.1)),
            quote("b", dec!(2.8), Some(dec!(3.5)), dec!(3.5)),
        ]);
        let result = detect(&m, Sport::Football, dec!(100)).unwrap();

        assert_close(result.arbitrage_coefficient, dec!(0.904762), TOLERANCE);
        assert!(result.is_profitable);

        let stakes = result.stakes.unwrap();
        assert_close(stakes.home, dec!(36.84), dec!(0.01));
        assert_close(stakes.draw.unwrap(), dec!(31.58), dec!(0.01));
        assert_close(stakes.away, dec!(31.58), dec!(0.01));
        assert_close(stakes.total(), dec!(100), TOLERANCE);
        assert_close(result.guaranteed_profit, dec!(10.5263), dec!(0.0001));
        assert_close(result.roi_percent, dec!(9.5238), dec!(0.0001));

        assert_eq!(result.legs[0].price.bookmaker_id.as_str(), "a");
        assert_eq!(result.legs[1].price.bookmaker_id.as_str(), "b");
        assert_eq!(result.legs[2].price.bookmaker_id.as_str(), "b");
    }

    #[test]
    fn test_equal_payout_across_outcomes() {
        let odds = [dec!(2.1), dec!(3.3), dec!(4.4), dec!(5.5), dec!(7.25), dec!(9.0)];

        for home in odds {
            for draw in odds {
                for away in odds {
                    let m = market(&[quote("x", home, Some(draw), away)]);
                    let result = detect(&m, Sport::Football, dec!(100)).unwrap();
                    let coefficient = Decimal::ONE / home + Decimal::ONE / draw + Decimal::ONE / away;

                    if coefficient < Decimal::ONE {
                        assert!(result.is_profitable);
                        let stakes = result.stakes.unwrap();
                        assert_close(stakes.total(), dec!(100), TOLERANCE);

                        let expected = result.guaranteed_profit;
                        assert!(expected > Decimal::ZERO);
                        for outcome in Sport::Football.outcomes() {
                            assert_close(result.profit_for(*outcome).unwrap(), expected, TOLERANCE);
                        }
                    } else {
                        assert!(!result.is_profitable);
                        assert!(result.stakes.is_none());
                        assert_eq!(result.guaranteed_profit, Decimal::ZERO);
                    }
                }
            }
        }
    }

    #[test]
    fn test_football_without_draw_degrades_to_two_way() {
        let m = market(&[
            quote("a", dec!(2.10), None, dec!(2.05)),
            quote("b", dec!(2.00), Some(dec!(0)), dec!(2.15)),
        ]);

        let first = detect(&m, Sport::Football, dec!(100)).unwrap();
        let second = detect(&m, Sport::Football, dec!(100)).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.outcomes_used(), 2);
        assert_eq!(
            first.arbitrage_coefficient,
            Decimal::ONE / dec!(2.10) + Decimal::ONE / dec!(2.15)
        );
        assert!(first.is_profitable);
        assert_eq!(first.stakes.unwrap().draw, None);
    }

    #[test]
    fn test_football_draw_at_or_below_one_degrades_to_two_way() {
        let m = market(&[quote("a", dec!(2.10), Some(dec!(1.0)), dec!(2.05))]);
        let result = detect(&m, Sport::Football, dec!(100)).unwrap();
        assert_eq!(result.outcomes_used(), 2);
    }

    #[test]
    fn test_basketball_ignores_draw() {
        let m = market(&[quote("a", dec!(1.90), Some(dec!(15.0)), dec!(1.95))]);
        let result = detect(&m, Sport::Basketball, dec!(100)).unwrap();

        assert_eq!(result.outcomes_used(), 2);
        assert!(!result.is_profitable);
    }

    #[test]
    fn test_missing_outcome_is_insufficient_data() {
        let so_only = quote("so", dec!(2.0), Some(dec!(3.0)), dec!(4.0)).with_class(MarketClass::So);
        let m = market(&[so_only]);

        assert_eq!(
            detect(&m, Sport::Football, dec!(100)),
            Err(EngineError::InsufficientData { outcome: Outcome::Home })
        );
    }

    #[test]
    fn test_odd_not_above_one_is_invalid() {
        let m = market(&[quote("a", dec!(0.95), Some(dec!(3.0)), dec!(4.0))]);

        assert_eq!(
            detect(&m, Sport::Football, dec!(100)),
            Err(EngineError::InvalidOdds {
                outcome: Outcome::Home,
                odd: dec!(0.95)
            })
        );
    }

    #[test]
    fn test_oversized_stake_is_rejected() {
        let m = market(&[
            quote("a", dec!(3.0), Some(dec!(3.2)), dec!(3.1)),
            quote("b", dec!(2.8), Some(dec!(3.5)), dec!(3.5)),
        ]);

        assert_eq!(
            detect(&m, Sport::Football, Decimal::MAX),
            Err(EngineError::InvalidStake(Decimal::MAX))
        );

        // Unprofitable markets allocate nothing, so any positive stake is fine
        let unprofitable = market(&[quote("a", dec!(2.45), Some(dec!(3.40)), dec!(2.90))]);
        let result = detect(&unprofitable, Sport::Football, Decimal::MAX).unwrap();
        assert!(!result.is_profitable);
        assert_eq!(result.total_stake, Decimal::MAX);
    }

    #[test]
    fn test_non_positive_stake_rejected() {
        let m = market(&[quote("a", dec!(3.0), Some(dec!(3.5)), dec!(3.5))]);

        assert_eq!(
            detect(&m, Sport::Football, dec!(-100)),
            Err(EngineError::InvalidStake(dec!(-100)))
        );
        assert_eq!(
            detect(&m, Sport::Football, Decimal::ZERO),
            Err(EngineError::InvalidStake(Decimal::ZERO))
        );
    }
}
