//! Scan a slate of matches for surebets and freebet extractions.
//!
//! Loads engine configuration from the environment, reads a JSON slate of
//! match odds views and prints the ranked opportunities.
//!
//! Usage:
//!   ODDS_SO_BOOKMAKERS="Super Odds" RUST_LOG=odds_engine=debug \
//!   cargo run -p odds-engine --example scan_matches

use odds_engine::{
    EngineConfig, EvaluationRequest, MatchOddsView, OddsEngine, Opportunity, Outcome, RankFilters,
};
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::{error, info};

const SLATE: &str = r#"[
    {
        "match_id": "flamengo-palmeiras",
        "sport": "football",
        "league": "Brasileirao",
        "starts_at": "2025-02-01T21:30:00Z",
        "quotes": [
            { "bookmaker_id": "betone", "bookmaker_name": "Bet One",
              "home_odd": "2.10", "draw_odd": "3.00", "away_odd": "3.90",
              "observed_at": "2025-02-01T18:00:00Z" },
            { "bookmaker_id": "bettwo", "bookmaker_name": "Bet Two",
              "home_odd": "1.95", "draw_odd": "3.10", "away_odd": "4.20",
              "observed_at": "2025-02-01T18:00:05Z" },
            { "bookmaker_id": "superodds", "bookmaker_name": "Super Odds",
              "home_odd": "1.80", "draw_odd": "3.40", "away_odd": "3.50",
              "observed_at": "2025-02-01T18:00:10Z" }
        ]
    },
    {
        "match_id": "inter-milan",
        "sport": "football",
        "league": "Serie A",
        "starts_at": "2025-02-02T19:45:00Z",
        "quotes": [
            { "bookmaker_id": "betone", "bookmaker_name": "Bet One",
              "home_odd": "3.00", "draw_odd": "3.20", "away_odd": "3.10",
              "observed_at": "2025-02-01T18:00:00Z" },
            { "bookmaker_id": "bettwo", "bookmaker_name": "Bet Two",
              "home_odd": "2.80", "draw_odd": "3.50", "away_odd": "3.50",
              "observed_at": "2025-02-01T18:00:05Z" }
        ]
    },
    {
        "match_id": "franca-flamengo",
        "sport": "basketball",
        "league": "NBB",
        "starts_at": "2025-02-01T20:00:00Z",
        "quotes": [
            { "bookmaker_id": "betone", "bookmaker_name": "Bet One",
              "home_odd": "1.75", "away_odd": "2.05",
              "observed_at": "2025-02-01T18:00:00Z" },
            { "bookmaker_id": "bettwo", "bookmaker_name": "Bet Two",
              "home_odd": "1.80", "away_odd": "1.98",
              "observed_at": "2025-02-01T18:00:05Z" }
        ]
    }
]"#;

#[tokio::main]
async fn main() {
    init_logging();

    let config = match EngineConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            error!(%error, "Invalid engine configuration");
            return;
        }
    };

    let views: Vec<MatchOddsView> = match serde_json::from_str(SLATE) {
        Ok(views) => views,
        Err(error) => {
            error!(%error, "Failed to parse match slate");
            return;
        }
    };

    info!(
        matches = views.len(),
        so_bookmakers = ?config.so_bookmakers,
        "Scanning slate"
    );

    let engine = Arc::new(OddsEngine::new(config));
    let request = EvaluationRequest::new(dec!(100)).with_freebet(dec!(10));
    let filters = RankFilters::near_misses().with_max_results(engine.config().max_results);

    let near_misses = match Arc::clone(&engine)
        .scan_concurrent(views.clone(), request, &filters)
        .await
    {
        Ok(ranked) => ranked,
        Err(error) => {
            error!(%error, "Scan failed");
            return;
        }
    };

    let opportunities = match engine.scan(&views, &request, &engine.default_filters()) {
        Ok(ranked) => ranked,
        Err(error) => {
            error!(%error, "Scan failed");
            return;
        }
    };

    println!("\n=== Opportunities ===");
    for opportunity in &opportunities {
        print_opportunity(opportunity);
    }

    println!("\n=== Closest surebets ===");
    for opportunity in &near_misses {
        print_opportunity(opportunity);
    }
}

fn print_opportunity(opportunity: &Opportunity) {
    match opportunity {
        Opportunity::Surebet(surebet) => {
            let result = &surebet.result;
            println!(
                "[surebet] {} coefficient={:.4} roi={:.2}% profit={:.2}",
                surebet.context.match_id,
                result.arbitrage_coefficient,
                result.roi_percent,
                result.guaranteed_profit,
            );
            for leg in &result.legs {
                let stake = leg
                    .stake
                    .map(|stake| format!("{stake:.2}"))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "    {:<5} @ {:<6} {:<12} stake={stake}",
                    leg.outcome, leg.price.odd, leg.price.bookmaker_name,
                );
            }
        }
        Opportunity::Freebet(freebet) => {
            println!(
                "[freebet] {} leg={} @ {} ({}) extraction={:.2}% profit={:.2}",
                freebet.context.match_id,
                freebet.freebet_leg.outcome(),
                freebet.freebet_odd(),
                freebet.freebet_price.bookmaker_name,
                freebet.extraction_rate_percent,
                freebet.guaranteed_profit,
            );
            for leg in &freebet.hedge_legs {
                println!(
                    "    {:<5} @ {:<6} {:<12} stake={:.2}",
                    leg.outcome, leg.price.odd, leg.price.bookmaker_name, leg.stake,
                );
            }
            for outcome in [Outcome::Home, Outcome::Draw, Outcome::Away] {
                println!("    if {outcome:<5} -> {:.2}", freebet.profit_if(outcome));
            }
        }
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_ansi(cfg!(debug_assertions))
        .init();
}
