//! Filtering and ordering of detected opportunities across matches.

use crate::{
    config::DEFAULT_MAX_RESULTS,
    freebet::FreebetOpportunity,
    partition::normalize_name,
    quote::MatchContext,
    select::PricePoint,
    surebet::SurebetResult,
};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A surebet evaluation tied to the match it was computed for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SurebetOpportunity {
    pub context: MatchContext,
    pub result: SurebetResult,
}

/// Kind of a ranked opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityKind {
    Surebet,
    Freebet,
}

/// Any opportunity the ranker orders.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Opportunity {
    Surebet(SurebetOpportunity),
    Freebet(FreebetOpportunity),
}

impl Opportunity {
    pub fn kind(&self) -> OpportunityKind {
        match self {
            Opportunity::Surebet(_) => OpportunityKind::Surebet,
            Opportunity::Freebet(_) => OpportunityKind::Freebet,
        }
    }

    pub fn context(&self) -> &MatchContext {
        match self {
            Opportunity::Surebet(surebet) => &surebet.context,
            Opportunity::Freebet(freebet) => &freebet.context,
        }
    }

    pub fn match_id(&self) -> &str {
        self.context().match_id.as_str()
    }

    /// Ranking score: ROI percent for surebets, extraction rate for freebets.
    pub fn score(&self) -> Decimal {
        match self {
            Opportunity::Surebet(surebet) => surebet.result.roi_percent,
            Opportunity::Freebet(freebet) => freebet.extraction_rate_percent,
        }
    }

    /// Whether acting on this opportunity guarantees a profit.
    pub fn is_profitable(&self) -> bool {
        match self {
            Opportunity::Surebet(surebet) => surebet.result.is_profitable,
            Opportunity::Freebet(freebet) => freebet.guaranteed_profit > Decimal::ZERO,
        }
    }

    /// Prices of every leg, one per bookmaker placement.
    pub fn prices(&self) -> Vec<&PricePoint> {
        match self {
            Opportunity::Surebet(surebet) => surebet.result.legs.iter().map(|leg| &leg.price).collect(),
            Opportunity::Freebet(freebet) => freebet.bookmakers().collect(),
        }
    }

    fn involves_bookmaker(&self, normalized: &[String]) -> bool {
        self.prices().iter().any(|price| {
            let name = normalize_name(&price.bookmaker_name);
            let id = normalize_name(price.bookmaker_id.as_str());
            normalized.iter().any(|wanted| *wanted == name || *wanted == id)
        })
    }
}

impl From<SurebetOpportunity> for Opportunity {
    fn from(value: SurebetOpportunity) -> Self {
        Opportunity::Surebet(value)
    }
}

impl From<FreebetOpportunity> for Opportunity {
    fn from(value: FreebetOpportunity) -> Self {
        Opportunity::Freebet(value)
    }
}

/// Caller-supplied predicates and output cap for a ranking pass.
///
/// `None` means "no constraint". Date bounds are inclusive; a match without a
/// known start time fails any date bound, and a match without a league fails a
/// league filter.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RankFilters {
    /// Keep only these leagues (compared normalized)
    pub leagues: Option<Vec<String>>,
    /// Keep opportunities that use at least one of these bookmakers
    pub bookmakers: Option<Vec<String>>,
    /// Keep only one kind of opportunity
    pub kind: Option<OpportunityKind>,
    pub starts_after: Option<DateTime<Utc>>,
    pub starts_before: Option<DateTime<Utc>>,
    /// Minimum surebet ROI percent
    pub min_roi_percent: Option<Decimal>,
    /// Minimum freebet extraction rate percent
    pub min_extraction_percent: Option<Decimal>,
    /// Also keep surebets with a coefficient of 1 or more
    pub include_unprofitable: bool,
    /// Maximum number of results
    pub max_results: usize,
}

impl Default for RankFilters {
    fn default() -> Self {
        Self {
            leagues: None,
            bookmakers: None,
            kind: None,
            starts_after: None,
            starts_before: None,
            min_roi_percent: None,
            min_extraction_percent: None,
            include_unprofitable: false,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl RankFilters {
    /// Filters that only show the closest-to-profitable surebets.
    pub fn near_misses() -> Self {
        Self {
            kind: Some(OpportunityKind::Surebet),
            include_unprofitable: true,
            ..Self::default()
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    fn compile(&self) -> CompiledFilters<'_> {
        let normalize_all = |names: &Vec<String>| -> Vec<String> {
            names.iter().map(|name| normalize_name(name)).collect()
        };

        CompiledFilters {
            filters: self,
            leagues: self.leagues.as_ref().map(normalize_all),
            bookmakers: self.bookmakers.as_ref().map(normalize_all),
        }
    }
}

struct CompiledFilters<'a> {
    filters: &'a RankFilters,
    leagues: Option<Vec<String>>,
    bookmakers: Option<Vec<String>>,
}

impl CompiledFilters<'_> {
    fn accepts(&self, opportunity: &Opportunity) -> bool {
        let filters = self.filters;
        let context = opportunity.context();

        if filters.kind.is_some_and(|kind| kind != opportunity.kind()) {
            return false;
        }

        if !filters.include_unprofitable && !opportunity.is_profitable() {
            return false;
        }

        if let Some(leagues) = &self.leagues {
            let Some(league) = &context.league else {
                return false;
            };
            let league = normalize_name(league);
            if !leagues.contains(&league) {
                return false;
            }
        }

        if let Some(bookmakers) = &self.bookmakers {
            if !opportunity.involves_bookmaker(bookmakers) {
                return false;
            }
        }

        if let Some(after) = filters.starts_after {
            if !context.starts_at.is_some_and(|start| start >= after) {
                return false;
            }
        }

        if let Some(before) = filters.starts_before {
            if !context.starts_at.is_some_and(|start| start <= before) {
                return false;
            }
        }

        match opportunity {
            Opportunity::Surebet(surebet) => filters
                .min_roi_percent
                .is_none_or(|min| surebet.result.meets_threshold(min)),
            Opportunity::Freebet(freebet) => filters
                .min_extraction_percent
                .is_none_or(|min| freebet.meets_threshold(min)),
        }
    }
}

/// Total order used by [`rank`]: score descending, then earliest start (unknown
/// start last), then match id, then surebets before freebets.
pub fn compare(a: &Opportunity, b: &Opportunity) -> Ordering {
    b.score()
        .cmp(&a.score())
        .then_with(|| match (a.context().starts_at, b.context().starts_at) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.match_id().cmp(b.match_id()))
        .then_with(|| a.kind().cmp(&b.kind()))
}

/// Filter, sort and truncate opportunities.
pub fn rank<I>(opportunities: I, filters: &RankFilters) -> Vec<Opportunity>
where
    I: IntoIterator<Item = Opportunity>,
{
    let compiled = filters.compile();

    opportunities
        .into_iter()
        .filter(|opportunity| compiled.accepts(opportunity))
        .sorted_by(compare)
        .take(filters.max_results)
        .collect()
}
