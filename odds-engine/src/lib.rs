//! Odds Aggregation and Arbitrage Engine
//!
//! This crate compares simultaneous quotes for the same match from many
//! bookmakers and finds two kinds of opportunity: surebets, where staking every
//! outcome at its best price guarantees a profit, and freebet extractions,
//! where a promotional credit is hedged with real stakes into guaranteed cash.
//!
//! # Architecture
//!
//! Data flows one way and no component keeps state between calls:
//!
//! ```text
//! Quote[] -> MarketPartitioner -> select -> AggregatedMarket
//!                                              |-> surebet::detect
//!                                              |-> freebet::extract
//!                                                       -> rank -> caller
//! ```
//!
//! # Key Components
//!
//! - [`MarketPartitioner`]: Splits quotes into PA (cash) and SO (promotional) classes
//! - [`select()`]: Best and worst price per outcome with deterministic tie-breaks
//! - [`AggregatedMarket`]: Best/worst prices per class and outcome for one match
//! - [`surebet::detect`]: Arbitrage coefficient and equal-payout stake split
//! - [`freebet::extract`]: Real-money hedge stakes for a free bet credit
//! - [`rank()`]: Filters and orders opportunities across matches
//! - [`OddsEngine`]: Runs the whole pipeline for one match or a batch
//!
//! # Example
//!
//! ```rust,ignore
//! use odds_engine::{
//!     EngineConfig, EvaluationRequest, MatchContext, MatchOddsView, OddsEngine,
//!     Quote, RankFilters, Sport,
//! };
//! use rust_decimal_macros::dec;
//!
//! let engine = OddsEngine::new(EngineConfig {
//!     so_bookmakers: vec!["Super Odds".to_string()],
//!     ..Default::default()
//! });
//!
//! let view = MatchOddsView::new(
//!     MatchContext::new("match-1", Sport::Football).with_league("Serie A"),
//!     vec![
//!         Quote::new("b1", "Bet One", dec!(3.0), Some(dec!(3.2)), dec!(3.1), chrono::Utc::now()),
//!         Quote::new("b2", "Bet Two", dec!(2.8), Some(dec!(3.5)), dec!(3.5), chrono::Utc::now()),
//!     ],
//! );
//!
//! let request = EvaluationRequest::new(dec!(100)).with_freebet(dec!(10));
//! let ranked = engine.scan(&[view], &request, &RankFilters::default())?;
//! ```
//!
//! # Free Bet Payout
//!
//! Whether a winning free bet also returns its stake differs between
//! providers. [`FreebetPayout`] makes the convention explicit; the default
//! assumes the stake is not returned (`value * (odd - 1)`).

pub mod config;
pub mod engine;
pub mod error;
pub mod freebet;
pub mod partition;
pub mod quote;
pub mod rank;
pub mod select;
pub mod surebet;

// Re-exports for convenience
pub use config::{EngineConfig, FreebetPayout};
pub use engine::{EvaluationRequest, MatchEvaluation, OddsEngine};
pub use error::EngineError;
pub use freebet::{FreebetOpportunity, FreebetSide, HedgeLeg};
pub use partition::{MarketPartitioner, Partition};
pub use quote::{BookmakerId, MarketClass, MatchContext, MatchOddsView, Outcome, Quote, Sport};
pub use rank::{Opportunity, OpportunityKind, RankFilters, SurebetOpportunity, rank};
pub use select::{AggregatedMarket, OutcomePrices, PricePoint, Selection, select};
pub use surebet::{OutcomeStakes, SurebetLeg, SurebetResult};
