//! Quote and match data types consumed by the engine.

use chrono::{DateTime, Utc};
use derive_more::{Display, From};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Unique identifier of a bookmaker as supplied by the ingestion layer.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Debug, Display, From, Deserialize, Serialize)]
pub struct BookmakerId(pub SmolStr);

impl BookmakerId {
    pub fn new(id: impl Into<SmolStr>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for BookmakerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Market class of a quote.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Debug, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketClass {
    /// Pagamento Antecipado: an ordinary, immediately realizable cash price.
    Pa,
    /// Super Odds: a promotional or exchange-style price.
    So,
}

impl std::fmt::Display for MarketClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketClass::Pa => write!(f, "PA"),
            MarketClass::So => write!(f, "SO"),
        }
    }
}

/// Sport of a match, which fixes the set of outcomes that must be priced.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Debug, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sport {
    /// Three outcomes: home, draw, away.
    Football,
    /// Two outcomes: home, away.
    Basketball,
}

impl Sport {
    /// Whether matches of this sport have a draw outcome.
    pub fn has_draw(&self) -> bool {
        matches!(self, Sport::Football)
    }

    /// Outcomes a complete market of this sport prices.
    pub fn outcomes(&self) -> &'static [Outcome] {
        match self {
            Sport::Football => &[Outcome::Home, Outcome::Draw, Outcome::Away],
            Sport::Basketball => &[Outcome::Home, Outcome::Away],
        }
    }
}

impl std::fmt::Display for Sport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sport::Football => write!(f, "football"),
            Sport::Basketball => write!(f, "basketball"),
        }
    }
}

/// Result of a match from the bettor's perspective.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Debug, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

impl Outcome {
    /// The other side of a head-to-head outcome. `Draw` has no opposite.
    pub fn opposite(&self) -> Option<Self> {
        match self {
            Outcome::Home => Some(Outcome::Away),
            Outcome::Away => Some(Outcome::Home),
            Outcome::Draw => None,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Outcome::Home => "home",
            Outcome::Draw => "draw",
            Outcome::Away => "away",
        })
    }
}

/// One bookmaker's price for one match at one point in time.
///
/// Quotes are immutable once produced. A missing or non-positive `draw_odd`
/// signals a 2-outcome price.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Quote {
    pub bookmaker_id: BookmakerId,
    pub bookmaker_name: SmolStr,
    /// Explicit market class tag. When absent the partitioner classifies the
    /// quote from the bookmaker name.
    #[serde(default)]
    pub market_class: Option<MarketClass>,
    pub home_odd: Decimal,
    #[serde(default)]
    pub draw_odd: Option<Decimal>,
    pub away_odd: Decimal,
    pub observed_at: DateTime<Utc>,
    /// Opaque key-value data carried through from ingestion.
    #[serde(default)]
    pub metadata: IndexMap<SmolStr, String>,
}

impl Quote {
    /// Create an untagged quote with no metadata.
    pub fn new(
        bookmaker_id: impl Into<BookmakerId>,
        bookmaker_name: impl Into<SmolStr>,
        home_odd: Decimal,
        draw_odd: Option<Decimal>,
        away_odd: Decimal,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            bookmaker_id: bookmaker_id.into(),
            bookmaker_name: bookmaker_name.into(),
            market_class: None,
            home_odd,
            draw_odd,
            away_odd,
            observed_at,
            metadata: IndexMap::new(),
        }
    }

    /// Tag the quote with an explicit market class.
    pub fn with_class(mut self, class: MarketClass) -> Self {
        self.market_class = Some(class);
        self
    }

    /// Attach an opaque metadata entry.
    pub fn with_metadata(mut self, key: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Price for `outcome`, if present and positive.
    ///
    /// Zero and negative values are treated as absent for that outcome only.
    /// A positive price of 1 or less is returned as is: it is rejected with
    /// [`EngineError::InvalidOdds`](crate::EngineError::InvalidOdds) only where
    /// it reaches a stake formula.
    pub fn odd(&self, outcome: Outcome) -> Option<Decimal> {
        let odd = match outcome {
            Outcome::Home => Some(self.home_odd),
            Outcome::Draw => self.draw_odd,
            Outcome::Away => Some(self.away_odd),
        };
        odd.filter(|odd| *odd > Decimal::ZERO)
    }

    /// Whether this quote only prices home and away.
    pub fn is_two_way(&self) -> bool {
        self.odd(Outcome::Draw).is_none()
    }
}

/// Identity and scheduling data of a match.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct MatchContext {
    pub match_id: SmolStr,
    pub sport: Sport,
    #[serde(default)]
    pub league: Option<SmolStr>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
}

impl MatchContext {
    pub fn new(match_id: impl Into<SmolStr>, sport: Sport) -> Self {
        Self {
            match_id: match_id.into(),
            sport,
            league: None,
            starts_at: None,
        }
    }

    pub fn with_league(mut self, league: impl Into<SmolStr>) -> Self {
        self.league = Some(league.into());
        self
    }

    pub fn with_start(mut self, starts_at: DateTime<Utc>) -> Self {
        self.starts_at = Some(starts_at);
        self
    }
}

/// All latest quotes for one match in one evaluation cycle.
///
/// Quotes are expected to be deduplicated to the latest quote per bookmaker
/// and market class by the caller.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct MatchOddsView {
    #[serde(flatten)]
    pub context: MatchContext,
    pub quotes: Vec<Quote>,
}

impl MatchOddsView {
    pub fn new(context: MatchContext, quotes: Vec<Quote>) -> Self {
        Self { context, quotes }
    }

    pub fn match_id(&self) -> &str {
        self.context.match_id.as_str()
    }

    pub fn sport(&self) -> Sport {
        self.context.sport
    }
}
