//! Splits a match's quotes into PA and SO market classes.

use crate::{
    config::EngineConfig,
    quote::{MarketClass, Quote},
};
use tracing::{debug, warn};

/// Quotes of one match split by market class, borrowed from the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition<'a> {
    pub pa: Vec<&'a Quote>,
    pub so: Vec<&'a Quote>,
}

/// Classifies quotes as PA or SO.
///
/// Priority: an explicit `market_class` tag wins, then a denylist of
/// promotional-only bookmakers, then PA. Names are compared normalized
/// (lowercase letters and digits of any script), so `"Super-Odds Bet"` and
/// `"superoddsbet"` are the same bookmaker while `"Betão"` and `"Beto"` are not.
///
/// A denylist entry matches a quote's bookmaker name or its bookmaker id, so
/// feeds that only carry a stable id can still be listed. With the legacy
/// substring mode on, containment replaces equality for both.
#[derive(Debug, Clone, Default)]
pub struct MarketPartitioner {
    so_bookmakers: Vec<String>,
    legacy_substring_match: bool,
}

impl MarketPartitioner {
    /// Create a partitioner from a denylist of SO bookmaker names.
    pub fn new<I, S>(so_bookmakers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            so_bookmakers: so_bookmakers
                .into_iter()
                .filter_map(|name| {
                    let name = name.as_ref();
                    let normalized = normalize_name(name);
                    if normalized.is_empty() {
                        warn!(bookmaker = name, "Ignoring SO denylist entry without letters or digits");
                        return None;
                    }
                    Some(normalized)
                })
                .collect(),
            legacy_substring_match: false,
        }
    }

    /// Enable keyword matching: a bookmaker is SO when its normalized name
    /// contains any denylisted entry. Kept for feeds that still rely on it.
    pub fn with_legacy_substring_match(mut self, enabled: bool) -> Self {
        self.legacy_substring_match = enabled;
        self
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(&config.so_bookmakers).with_legacy_substring_match(config.legacy_substring_match)
    }

    /// Market class of a single quote. The denylist is checked against the
    /// normalized bookmaker name, then the normalized bookmaker id.
    pub fn classify(&self, quote: &Quote) -> MarketClass {
        if let Some(class) = quote.market_class {
            return class;
        }

        if self.is_so_bookmaker(&quote.bookmaker_name) || self.is_so_bookmaker(quote.bookmaker_id.as_str()) {
            MarketClass::So
        } else {
            MarketClass::Pa
        }
    }

    /// Split `quotes` into PA and SO, preserving input order within each class.
    pub fn partition<'a>(&self, quotes: &'a [Quote]) -> Partition<'a> {
        let (so, pa): (Vec<&Quote>, Vec<&Quote>) = quotes
            .iter()
            .partition(|quote| self.classify(quote) == MarketClass::So);

        debug!(pa = pa.len(), so = so.len(), "Quotes partitioned");

        Partition { pa, so }
    }

    fn is_so_bookmaker(&self, name: &str) -> bool {
        let name = normalize_name(name);
        if name.is_empty() {
            return false;
        }

        self.so_bookmakers.iter().any(|listed| {
            *listed == name || (self.legacy_substring_match && name.contains(listed.as_str()))
        })
    }
}

/// Lowercased letters and digits of `name`, everything else dropped.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use rust_decimal_macros::dec;

    fn quote(id: &str, name: &str) -> Quote {
        Quote::new(
            id,
            name,
            dec!(2.0),
            Some(dec!(3.0)),
            dec!(4.0),
            DateTime::from_timestamp(1738368000, 0).unwrap(),
        )
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Super-Odds Bet"), "superoddsbet");
        assert_eq!(normalize_name("  BET365 "), "bet365");
        assert_eq!(normalize_name("--"), "");
        assert_eq!(normalize_name("Betão Sports"), "betãosports");
        assert_eq!(normalize_name("СТАВКА"), "ставка");
    }

    #[test]
    fn test_denylist_keeps_non_ascii_names() {
        let cyrillic = MarketPartitioner::new(["Ставка"]);
        assert_eq!(cyrillic.classify(&quote("s1", "Ставка")), MarketClass::So);
        assert_eq!(cyrillic.classify(&quote("s2", "Другая")), MarketClass::Pa);

        let accented = MarketPartitioner::new(["Betão"]);
        assert_eq!(accented.classify(&quote("b1", "BETÃO")), MarketClass::So);
        assert_eq!(accented.classify(&quote("b2", "Beto")), MarketClass::Pa);
    }

    #[test]
    fn test_denylist_drops_empty_entries() {
        let partitioner = MarketPartitioner::new(["--", " ", "Promo Bet"]);

        assert_eq!(partitioner.so_bookmakers, vec!["promobet".to_string()]);
        assert_eq!(partitioner.classify(&quote("c1", "--")), MarketClass::Pa);
    }

    #[test]
    fn test_denylist_matches_bookmaker_id() {
        let partitioner = MarketPartitioner::new(["promo-feed"]);

        assert_eq!(partitioner.classify(&quote("PROMOFEED", "Display Name")), MarketClass::So);
        assert_eq!(partitioner.classify(&quote("cashfeed", "Promo Feed Cash")), MarketClass::Pa);
    }

    #[test]
    fn test_explicit_class_wins() {
        let partitioner = MarketPartitioner::new(["Promo Bet"]);

        let tagged_pa = quote("p1", "Promo Bet").with_class(MarketClass::Pa);
        let tagged_so = quote("c1", "Cash Bet").with_class(MarketClass::So);

        assert_eq!(partitioner.classify(&tagged_pa), MarketClass::Pa);
        assert_eq!(partitioner.classify(&tagged_so), MarketClass::So);
    }

    #[test]
    fn test_denylist_fallback() {
        let partitioner = MarketPartitioner::new(["Promo Bet", "exchange-x"]);

        assert_eq!(partitioner.classify(&quote("p1", "PROMO bet")), MarketClass::So);
        assert_eq!(partitioner.classify(&quote("exchangex", "Unnamed")), MarketClass::So);
        assert_eq!(partitioner.classify(&quote("c1", "Cash Bet")), MarketClass::Pa);
    }

    #[test]
    fn test_substring_match_is_opt_in() {
        let strict = MarketPartitioner::new(["superodds"]);
        let legacy = MarketPartitioner::new(["superodds"]).with_legacy_substring_match(true);
        let q = quote("b1", "BetNow SuperOdds");

        assert_eq!(strict.classify(&q), MarketClass::Pa);
        assert_eq!(legacy.classify(&q), MarketClass::So);
    }

    #[test]
    fn test_partition_preserves_order_and_input() {
        let partitioner = MarketPartitioner::new(["Promo Bet"]);
        let quotes = vec![
            quote("c1", "Cash One"),
            quote("p1", "Promo Bet"),
            quote("c2", "Cash Two"),
        ];
        let before = quotes.clone();

        let partition = partitioner.partition(&quotes);

        let pa: Vec<&str> = partition.pa.iter().map(|q| q.bookmaker_id.as_str()).collect();
        let so: Vec<&str> = partition.so.iter().map(|q| q.bookmaker_id.as_str()).collect();
        assert_eq!(pa, vec!["c1", "c2"]);
        assert_eq!(so, vec!["p1"]);
        assert_eq!(quotes, before);
    }

    #[test]
    fn test_partition_empty() {
        let partition = MarketPartitioner::default().partition(&[]);
        assert!(partition.pa.is_empty());
        assert!(partition.so.is_empty());
    }

    #[test]
    fn test_from_config() {
        let config = EngineConfig {
            so_bookmakers: vec!["odds".to_string()],
            legacy_substring_match: true,
            ..Default::default()
        };
        let partitioner = MarketPartitioner::from_config(&config);
        assert_eq!(partitioner.classify(&quote("b1", "Super Odds")), MarketClass::So);
    }
}
