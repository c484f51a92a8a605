//! Best and worst price selection per outcome, and the aggregated market view.

use crate::{
    partition::Partition,
    quote::{BookmakerId, MarketClass, Outcome, Quote},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Best and worst quote for one outcome.
///
/// Both are `None` when no quote prices the outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Selection<'a> {
    pub best: Option<&'a Quote>,
    pub worst: Option<&'a Quote>,
}

/// Select the highest and lowest priced quote for `outcome`.
///
/// Quotes without a positive price for `outcome` are skipped for that outcome
/// only. Equal prices resolve to the earliest `observed_at`, then to input
/// order, so the result never depends on anything but the input.
pub fn select<'a, I>(quotes: I, outcome: Outcome) -> Selection<'a>
where
    I: IntoIterator<Item = &'a Quote>,
{
    let mut best: Option<(&Quote, Decimal)> = None;
    let mut worst: Option<(&Quote, Decimal)> = None;

    for quote in quotes {
        let Some(odd) = quote.odd(outcome) else {
            continue;
        };

        best = match best {
            Some((current, current_odd))
                if odd < current_odd
                    || (odd == current_odd && quote.observed_at >= current.observed_at) =>
            {
                Some((current, current_odd))
            }
            _ => Some((quote, odd)),
        };

        worst = match worst {
            Some((current, current_odd))
                if odd > current_odd
                    || (odd == current_odd && quote.observed_at >= current.observed_at) =>
            {
                Some((current, current_odd))
            }
            _ => Some((quote, odd)),
        };
    }

    Selection {
        best: best.map(|(quote, _)| quote),
        worst: worst.map(|(quote, _)| quote),
    }
}

/// A single selected price together with the bookmaker quoting it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PricePoint {
    pub bookmaker_id: BookmakerId,
    pub bookmaker_name: SmolStr,
    pub market_class: MarketClass,
    pub odd: Decimal,
    pub observed_at: DateTime<Utc>,
}

impl PricePoint {
    fn from_quote(quote: &Quote, outcome: Outcome, market_class: MarketClass) -> Option<Self> {
        Some(Self {
            bookmaker_id: quote.bookmaker_id.clone(),
            bookmaker_name: quote.bookmaker_name.clone(),
            market_class,
            odd: quote.odd(outcome)?,
            observed_at: quote.observed_at,
        })
    }
}

/// One optional price per outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct OutcomePrices {
    pub home: Option<PricePoint>,
    pub draw: Option<PricePoint>,
    pub away: Option<PricePoint>,
}

impl OutcomePrices {
    pub fn get(&self, outcome: Outcome) -> Option<&PricePoint> {
        match outcome {
            Outcome::Home => self.home.as_ref(),
            Outcome::Draw => self.draw.as_ref(),
            Outcome::Away => self.away.as_ref(),
        }
    }

    fn set(&mut self, outcome: Outcome, price: Option<PricePoint>) {
        match outcome {
            Outcome::Home => self.home = price,
            Outcome::Draw => self.draw = price,
            Outcome::Away => self.away = price,
        }
    }
}

/// Comparable best/worst prices of one match, per market class and outcome.
///
/// Derived on every evaluation and never cached. Prices are only known to be
/// positive: a worst price, or a best price nobody beat, may be 1 or less.
/// The detectors validate every price they use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AggregatedMarket {
    pub best_pa: OutcomePrices,
    pub worst_pa: OutcomePrices,
    pub best_so: OutcomePrices,
    pub worst_so: OutcomePrices,
}

impl AggregatedMarket {
    /// Run the selector over every outcome of both market classes.
    pub fn from_partition(partition: &Partition<'_>) -> Self {
        let mut market = Self::default();

        for outcome in [Outcome::Home, Outcome::Draw, Outcome::Away] {
            let pa = select(partition.pa.iter().copied(), outcome);
            market.best_pa.set(
                outcome,
                pa.best.and_then(|q| PricePoint::from_quote(q, outcome, MarketClass::Pa)),
            );
            market.worst_pa.set(
                outcome,
                pa.worst.and_then(|q| PricePoint::from_quote(q, outcome, MarketClass::Pa)),
            );

            let so = select(partition.so.iter().copied(), outcome);
            market.best_so.set(
                outcome,
                so.best.and_then(|q| PricePoint::from_quote(q, outcome, MarketClass::So)),
            );
            market.worst_so.set(
                outcome,
                so.worst.and_then(|q| PricePoint::from_quote(q, outcome, MarketClass::So)),
            );
        }

        market
    }

    /// Best promotional draw price, the natural hedge leg of a freebet.
    pub fn best_so_draw(&self) -> Option<&PricePoint> {
        self.best_so.draw.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::MarketPartitioner;
    use rust_decimal_macros::dec;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1738368000 + secs, 0).unwrap()
    }

    fn quote(id: &str, home: Decimal, draw: Option<Decimal>, away: Decimal, secs: i64) -> Quote {
        Quote::new(id, id, home, draw, away, ts(secs))
    }

    #[test]
    fn test_select_best_and_worst() {
        let quotes = vec![
            quote("a", dec!(2.40), Some(dec!(3.30)), dec!(2.90), 0),
            quote("b", dec!(2.45), Some(dec!(3.20)), dec!(2.85), 0),
            quote("c", dec!(2.35), Some(dec!(3.40)), dec!(2.80), 0),
        ];

        let home = select(&quotes, Outcome::Home);
        assert_eq!(home.best.unwrap().bookmaker_id.as_str(), "b");
        assert_eq!(home.worst.unwrap().bookmaker_id.as_str(), "c");

        let draw = select(&quotes, Outcome::Draw);
        assert_eq!(draw.best.unwrap().bookmaker_id.as_str(), "c");
        assert_eq!(draw.worst.unwrap().bookmaker_id.as_str(), "b");
    }

    #[test]
    fn test_select_tie_prefers_earliest_observed() {
        let quotes = vec![
            quote("late", dec!(2.50), None, dec!(2.00), 60),
            quote("early", dec!(2.50), None, dec!(2.00), 10),
            quote("same_time_later_in_input", dec!(2.50), None, dec!(2.00), 10),
        ];

        let home = select(&quotes, Outcome::Home);
        assert_eq!(home.best.unwrap().bookmaker_id.as_str(), "early");
        assert_eq!(home.worst.unwrap().bookmaker_id.as_str(), "early");
    }

    #[test]
    fn test_select_skips_missing_outcome_only() {
        let quotes = vec![
            quote("two_way", dec!(2.80), None, dec!(2.60), 0),
            quote("zero_draw", dec!(2.10), Some(dec!(0)), dec!(3.00), 0),
            quote("three_way", dec!(2.20), Some(dec!(3.10)), dec!(2.90), 0),
        ];

        let draw = select(&quotes, Outcome::Draw);
        assert_eq!(draw.best.unwrap().bookmaker_id.as_str(), "three_way");
        assert_eq!(draw.worst.unwrap().bookmaker_id.as_str(), "three_way");

        let home = select(&quotes, Outcome::Home);
        assert_eq!(home.best.unwrap().bookmaker_id.as_str(), "two_way");
    }

    #[test]
    fn test_select_no_valid_quote() {
        let quotes = vec![quote("a", dec!(2.0), None, dec!(2.0), 0)];
        let draw = select(&quotes, Outcome::Draw);
        assert_eq!(draw, Selection::default());

        let empty = select(&[], Outcome::Home);
        assert!(empty.best.is_none());
        assert!(empty.worst.is_none());
    }

    #[test]
    fn test_low_positive_prices_are_not_filtered() {
        let quotes = vec![
            quote("sane", dec!(2.40), Some(dec!(3.30)), dec!(2.90), 0),
            quote("broken", dec!(0.95), Some(dec!(1.00)), dec!(2.80), 0),
        ];
        let market = AggregatedMarket::from_partition(&MarketPartitioner::default().partition(&quotes));

        assert_eq!(market.best_pa.get(Outcome::Home).unwrap().odd, dec!(2.40));
        assert_eq!(market.worst_pa.get(Outcome::Home).unwrap().odd, dec!(0.95));
        assert_eq!(market.worst_pa.get(Outcome::Draw).unwrap().odd, dec!(1.00));
    }

    #[test]
    fn test_aggregated_market_from_partition() {
        let quotes = vec![
            quote("pa1", dec!(2.45), Some(dec!(3.40)), dec!(2.90), 0),
            quote("pa2", dec!(2.60), Some(dec!(3.20)), dec!(2.95), 0),
            quote("so1", dec!(2.30), Some(dec!(3.60)), dec!(2.70), 0).with_class(MarketClass::So),
        ];
        let partition = MarketPartitioner::default().partition(&quotes);
        let market = AggregatedMarket::from_partition(&partition);

        let best_home = market.best_pa.get(Outcome::Home).unwrap();
        assert_eq!(best_home.bookmaker_id.as_str(), "pa2");
        assert_eq!(best_home.odd, dec!(2.60));
        assert_eq!(best_home.market_class, MarketClass::Pa);

        assert_eq!(market.worst_pa.get(Outcome::Away).unwrap().odd, dec!(2.90));
        assert_eq!(market.best_pa.get(Outcome::Draw).unwrap().odd, dec!(3.40));

        let so_draw = market.best_so_draw().unwrap();
        assert_eq!(so_draw.bookmaker_id.as_str(), "so1");
        assert_eq!(so_draw.odd, dec!(3.60));
        assert_eq!(so_draw.market_class, MarketClass::So);
    }
}
