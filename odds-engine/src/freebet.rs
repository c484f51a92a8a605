//! Freebet extraction: turning a promotional credit into guaranteed cash.
//!
//! A free bet of value `F` is placed on one head-to-head outcome (the freebet
//! leg) at odd `a`. If it wins it pays `W`, which is `F * (a - 1)` or `F * a`
//! depending on [`FreebetPayout`]; if it loses only the credit is forfeited.
//! The two remaining outcomes are hedged with real money: the draw at the best
//! SO price `d` and the opposite side at the best PA price `o`.
//!
//! ```text
//! freebet leg wins: W - s_d - s_o
//! draw wins:        s_d * (d - 1) - s_o
//! opposite wins:    s_o * (o - 1) - s_d
//! ```
//!
//! Equalizing the draw and opposite rows gives `s_o = s_d * d / o`, so both
//! equal `s_d * d * (1 - 1/d - 1/o)`, which grows with `s_d`, while the freebet
//! row shrinks with it. The guaranteed profit (the minimum row) peaks where all
//! three meet, at `s_d = W / d` and `s_o = W / o`, and any smaller stake lowers
//! it. That point is the allocation used here:
//!
//! ```text
//! guaranteed = W * (1 - 1/d - 1/o)
//! ```
//!
//! An opportunity exists only when `1/d + 1/o < 1`.

use crate::{
    config::FreebetPayout,
    error::{EngineError, ensure_valid_odd},
    quote::{MatchContext, Outcome},
    select::{AggregatedMarket, PricePoint},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Head-to-head outcome a free bet can be placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FreebetSide {
    Home,
    Away,
}

impl FreebetSide {
    pub fn outcome(&self) -> Outcome {
        match self {
            FreebetSide::Home => Outcome::Home,
            FreebetSide::Away => Outcome::Away,
        }
    }

    /// The head-to-head outcome hedged with real money.
    pub fn opposite(&self) -> Outcome {
        match self {
            FreebetSide::Home => Outcome::Away,
            FreebetSide::Away => Outcome::Home,
        }
    }
}

/// A real-money stake hedging one outcome.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HedgeLeg {
    pub outcome: Outcome,
    pub price: PricePoint,
    pub stake: Decimal,
}

/// A freebet extraction with a strictly positive guaranteed profit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FreebetOpportunity {
    pub context: MatchContext,
    /// Outcome the free bet is placed on
    pub freebet_leg: FreebetSide,
    /// Best PA price for the freebet leg
    pub freebet_price: PricePoint,
    /// Credit value of the free bet
    pub freebet_value: Decimal,
    /// Payout convention the stakes were computed under
    pub payout_policy: FreebetPayout,
    /// Cash received if the freebet leg wins
    pub freebet_payout: Decimal,
    /// Draw hedge first, then the opposite side
    pub hedge_legs: Vec<HedgeLeg>,
    pub total_real_stake: Decimal,
    pub guaranteed_profit: Decimal,
    /// `guaranteed_profit / freebet_value * 100`
    pub extraction_rate_percent: Decimal,
}

impl FreebetOpportunity {
    pub fn match_id(&self) -> &str {
        self.context.match_id.as_str()
    }

    pub fn freebet_odd(&self) -> Decimal {
        self.freebet_price.odd
    }

    /// Net cash result if `outcome` occurs.
    pub fn profit_if(&self, outcome: Outcome) -> Decimal {
        if outcome == self.freebet_leg.outcome() {
            return self.freebet_payout - self.total_real_stake;
        }

        self.hedge_legs
            .iter()
            .find(|leg| leg.outcome == outcome)
            .map(|leg| leg.stake * leg.price.odd - self.total_real_stake)
            .unwrap_or(-self.total_real_stake)
    }

    /// Check if this opportunity meets a minimum extraction rate.
    pub fn meets_threshold(&self, min_extraction_percent: Decimal) -> bool {
        self.extraction_rate_percent >= min_extraction_percent
    }

    /// Every bookmaker that has to be used to place this extraction.
    pub fn bookmakers(&self) -> impl Iterator<Item = &PricePoint> {
        std::iter::once(&self.freebet_price).chain(self.hedge_legs.iter().map(|leg| &leg.price))
    }
}

/// Find the freebet extraction for a match, placing the free bet on whichever
/// of home and away has the higher best PA price (home on a tie).
///
/// Returns `Ok(None)` when there is no opportunity: a sport without a draw, no
/// SO draw price, or no positive guaranteed profit.
///
/// # Errors
/// - [`EngineError::InvalidFreebetValue`] if `freebet_value <= 0`, or so large
///   the payout overflows
/// - [`EngineError::InsufficientData`] if home or away has no PA quote
/// - [`EngineError::InvalidOdds`] if a used price is not above 1
pub fn extract(
    context: &MatchContext,
    market: &AggregatedMarket,
    freebet_value: Decimal,
    payout: FreebetPayout,
) -> Result<Option<FreebetOpportunity>, EngineError> {
    let side = match (&market.best_pa.home, &market.best_pa.away) {
        (Some(home), Some(away)) if away.odd > home.odd => FreebetSide::Away,
        _ => FreebetSide::Home,
    };

    extract_for_side(context, market, side, freebet_value, payout)
}

/// Find the freebet extraction for a match with the free bet on `side`.
///
/// Same contract as [`extract`].
pub fn extract_for_side(
    context: &MatchContext,
    market: &AggregatedMarket,
    side: FreebetSide,
    freebet_value: Decimal,
    payout: FreebetPayout,
) -> Result<Option<FreebetOpportunity>, EngineError> {
    if freebet_value <= Decimal::ZERO {
        return Err(EngineError::InvalidFreebetValue(freebet_value));
    }

    if !context.sport.has_draw() {
        return Ok(None);
    }

    let Some(draw) = market.best_so_draw() else {
        debug!(match_id = %context.match_id, "No SO draw market, skipping freebet extraction");
        return Ok(None);
    };

    let free = pa_price(market, side.outcome())?;
    let opposite = pa_price(market, side.opposite())?;
    let draw_odd = ensure_valid_odd(Outcome::Draw, draw.odd)?;

    if Decimal::ONE / draw_odd + Decimal::ONE / opposite.odd >= Decimal::ONE {
        debug!(
            match_id = %context.match_id,
            draw = %draw_odd,
            opposite = %opposite.odd,
            "Hedge prices leave no margin for freebet extraction"
        );
        return Ok(None);
    }

    let overflow = || EngineError::InvalidFreebetValue(freebet_value);
    let freebet_payout = payout.payout(freebet_value, free.odd).ok_or_else(overflow)?;
    let draw_stake = freebet_payout.checked_div(draw_odd).ok_or_else(overflow)?;
    let opposite_stake = freebet_payout.checked_div(opposite.odd).ok_or_else(overflow)?;
    let total_real_stake = draw_stake.checked_add(opposite_stake).ok_or_else(overflow)?;

    let profit_free = freebet_payout - total_real_stake;
    let profit_draw = draw_stake.checked_mul(draw_odd).ok_or_else(overflow)? - total_real_stake;
    let profit_opposite =
        opposite_stake.checked_mul(opposite.odd).ok_or_else(overflow)? - total_real_stake;
    let guaranteed_profit = profit_free.min(profit_draw).min(profit_opposite);

    if guaranteed_profit <= Decimal::ZERO {
        debug!(
            match_id = %context.match_id,
            %guaranteed_profit,
            "Freebet extraction not profitable"
        );
        return Ok(None);
    }

    let extraction_rate_percent = guaranteed_profit
        .checked_div(freebet_value)
        .and_then(|rate| rate.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or_else(overflow)?;

    debug!(
        match_id = %context.match_id,
        leg = %side.outcome(),
        profit = %guaranteed_profit,
        extraction_rate = %extraction_rate_percent,
        "Freebet extraction found"
    );

    Ok(Some(FreebetOpportunity {
        context: context.clone(),
        freebet_leg: side,
        freebet_price: free.clone(),
        freebet_value,
        payout_policy: payout,
        freebet_payout,
        hedge_legs: vec![
            HedgeLeg {
                outcome: Outcome::Draw,
                price: draw.clone(),
                stake: draw_stake,
            },
            HedgeLeg {
                outcome: side.opposite(),
                price: opposite.clone(),
                stake: opposite_stake,
            },
        ],
        total_real_stake,
        guaranteed_profit,
        extraction_rate_percent,
    }))
}

fn pa_price(market: &AggregatedMarket, outcome: Outcome) -> Result<&PricePoint, EngineError> {
    let price = market
        .best_pa
        .get(outcome)
        .ok_or(EngineError::InsufficientData { outcome })?;
    ensure_valid_odd(outcome, price.odd)?;
    Ok(price)
}
