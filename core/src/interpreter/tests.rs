//! Tests for the expense interpreter

use super::*;
use crate::economy::{MarketPrices, Resource};
use crate::replay::Payload;

const GUILDS: u32 = 15;
const LOOM: u32 = 22;
const VILLAGER: u32 = 83;
const HOUSE: u32 = 70;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn catalog() -> CostCatalog {
    CostCatalog::builder()
        .unit(VILLAGER, "Villager", ResourceVector::new(0.0, 50.0, 0.0, 0.0))
        .unit(HOUSE, "House", ResourceVector::new(25.0, 0.0, 0.0, 0.0))
        .technology(LOOM, "Loom", ResourceVector::new(0.0, 0.0, 0.0, 50.0))
        .technology(GUILDS, "Guilds", ResourceVector::new(0.0, 200.0, 100.0, 0.0))
        .technology(101, "Feudal Age", ResourceVector::new(0.0, 500.0, 0.0, 0.0))
        .build()
}

fn action(timestamp: Timestamp, kind: &str, player: u64) -> ReplayAction {
    ReplayAction::new(timestamp, kind, Payload::new()).with("player_id", player)
}

fn research(timestamp: Timestamp, player: u64, technology: u32) -> ReplayAction {
    action(timestamp, "RESEARCH", player).with("technology_id", technology)
}

fn trade(
    timestamp: Timestamp,
    kind: &str,
    player: u64,
    resource: Resource,
    lots: u32,
) -> ReplayAction {
    action(timestamp, kind, player)
        .with("resource_id", resource.replay_id())
        .with("amount", lots)
}

fn run(actions: &[ReplayAction]) -> Interpretation {
    let catalog = catalog();
    Interpreter::new(&catalog, MarketRates::default())
        .interpret(actions)
        .unwrap()
}

#[test]
fn test_loom_research_record() {
    // The stone-cost Loom of the fixture catalog
    let result = run(&[research(1352, 4, LOOM)]);

    assert_eq!(result.ledger.len(), 1);
    let record = &result.ledger.records()[0];
    assert_eq!(record.timestamp, 1352);
    assert_eq!(record.action, "RESEARCH");
    assert_eq!(record.player, 4);
    assert_eq!(record.entity_id, LOOM);
    assert_eq!(record.delta, ResourceVector::new(0.0, 0.0, 0.0, 50.0));
    assert_eq!(record.name, "Loom");
    assert!(result.diagnostics.is_empty());
}

#[test]
fn test_guilds_twice_reduces_fee_once() {
    let result = run(&[
        research(2_670_249, 2, GUILDS),
        research(3_000_000, 2, GUILDS),
    ]);

    // Both researches are charged
    assert_eq!(result.ledger.len(), 2);
    assert!(approx(result.market.fee_for(2), 0.15));
    assert_eq!(result.market.fee_reduced_at(2), Some(2_670_249));

    let reduced: Vec<_> = result.diagnostics.of_kind(DiagnosticKind::FeeReduced).collect();
    assert_eq!(reduced.len(), 1);
    assert_eq!(reduced[0].timestamp, 2_670_249);
    assert_eq!(reduced[0].severity, Severity::Info);

    let duplicates: Vec<_> = result
        .diagnostics
        .of_kind(DiagnosticKind::DuplicateFeeReduction)
        .collect();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].timestamp, 3_000_000);
    assert_eq!(duplicates[0].severity, Severity::Info);
}

#[test]
fn test_sell_food_at_default_fee() {
    let result = run(&[trade(5000, "SELL", 1, Resource::Food, 1)]);

    assert_eq!(result.ledger.len(), 1);
    let record = &result.ledger.records()[0];
    assert_eq!(record.action, "SELL");
    assert_eq!(record.entity_id, 0);
    assert_eq!(record.name, "sell food");
    assert!(approx(record.delta.food, -100.0));
    assert!(approx(record.delta.gold, 70.0));
    assert!(approx(record.delta.wood, 0.0));
    assert!(approx(record.delta.stone, 0.0));
}

#[test]
fn test_unclassified_action_is_reported_with_payload() {
    let odd = action(700, "DE_MYSTERY", 3).with("x", 1);
    let result = run(&[odd]);

    assert!(result.ledger.is_empty());
    assert_eq!(result.diagnostics.len(), 1);

    let diagnostic = result.diagnostics.iter().next().unwrap();
    assert_eq!(diagnostic.kind, DiagnosticKind::UnclassifiedAction);
    assert_eq!(diagnostic.severity, Severity::Critical);
    assert_eq!(diagnostic.action, "DE_MYSTERY");
    assert_eq!(diagnostic.player, Some(3));
    assert_eq!(diagnostic.payload.as_deref(), Some(r#"{"player_id":3,"x":1}"#));
}

#[test]
fn test_catalog_miss_skips_only_that_action() {
    let actions = vec![
        action(100, "DE_QUEUE", 1).with("unit_id", VILLAGER),
        action(200, "BUILD", 1).with("building_id", 9999),
        action(300, "BUILD", 1).with("building_id", HOUSE),
        research(400, 1, LOOM),
    ];
    let result = run(&actions);

    assert_eq!(result.ledger.len(), 3);
    assert_eq!(result.actions, 4);
    let misses: Vec<_> = result.diagnostics.of_kind(DiagnosticKind::CatalogMiss).collect();
    assert_eq!(misses.len(), 1);
    assert_eq!(misses[0].severity, Severity::Warning);
    assert_eq!(misses[0].timestamp, 200);
    assert_eq!(
        misses[0].payload.as_deref(),
        Some(r#"{"building_id":9999,"player_id":1}"#)
    );
}

#[test]
fn test_unmodelled_action_keeps_payload() {
    let result = run(&[action(20, "TRIBUTE", 1)
        .with("player_to", 2)
        .with("resource_id", 3)
        .with("amount", 200)]);

    let tribute = result
        .diagnostics
        .of_kind(DiagnosticKind::UnmodelledAction)
        .next()
        .unwrap();
    let payload = tribute.payload.as_deref().unwrap();
    assert!(payload.contains(r#""amount":200"#));
    assert!(payload.contains(r#""player_to":2"#));
}

#[test]
fn test_guilds_missing_from_catalog_still_reduces_fee() {
    let catalog = CostCatalog::builder().build();
    let result = Interpreter::new(&catalog, MarketRates::default())
        .interpret(&[research(1000, 5, GUILDS)])
        .unwrap();

    assert!(result.ledger.is_empty());
    assert!(approx(result.market.fee_for(5), 0.15));
    assert_eq!(result.diagnostics.of_kind(DiagnosticKind::CatalogMiss).count(), 1);
    assert_eq!(result.diagnostics.of_kind(DiagnosticKind::FeeReduced).count(), 1);
}

#[test]
fn test_queue_amount_multiplies_cost() {
    let result = run(&[
        action(10, "QUEUE", 1).with("unit_id", VILLAGER).with("amount", 5),
        action(20, "DE_QUEUE", 1).with("unit_id", VILLAGER),
        action(30, "DE_QUEUE", 1).with("unit_id", VILLAGER).with("amount", 0),
    ]);

    let food: Vec<_> = result.ledger.iter().map(|r| r.delta.food).collect();
    assert_eq!(food, vec![250.0, 50.0, 0.0]);
    assert_eq!(result.ledger.records()[1].action, "DE_QUEUE");
}

#[test]
fn test_ignored_and_unmodelled_actions() {
    let result = run(&[
        action(10, "MOVE", 1),
        action(20, "TRIBUTE", 1),
        action(30, "CREATE", 1),
    ]);

    assert!(result.ledger.is_empty());
    let counts = result.diagnostics.counts();
    assert_eq!(counts[&Severity::Debug], 1);
    assert_eq!(counts[&Severity::Warning], 2);
    assert_eq!(result.diagnostics.of_kind(DiagnosticKind::UnmodelledAction).count(), 2);
}

#[test]
fn test_fee_reduction_applies_to_later_trades_only() {
    let result = run(&[
        trade(100, "SELL", 2, Resource::Food, 1),
        research(200, 2, GUILDS),
        trade(300, "SELL", 2, Resource::Food, 1),
    ]);

    let trades: Vec<_> = result.ledger.iter().filter(|r| r.action == "SELL").collect();
    assert_eq!(trades.len(), 2);
    assert!(approx(trades[0].delta.gold, 70.0));
    // Price fell to 97 after the first lot; fee is now 15%
    assert!(approx(trades[1].delta.gold, 97.0 * 0.85));
}

#[test]
fn test_bulk_buy_and_price_snapshot() {
    let result = run(&[trade(100, "BUY", 3, Resource::Stone, 5)]);

    let record = &result.ledger.records()[0];
    assert_eq!(record.name, "buy stone");
    assert!(approx(record.delta.stone, 500.0));
    let expected: f64 = (0..5).map(|i| (130.0 + 3.0 * i as f64) * 1.3).sum();
    assert!(approx(record.delta.gold, -expected));
    assert_eq!(
        record.prices,
        Some(MarketPrices {
            stone: 145.0,
            ..MarketPrices::default()
        })
    );
}

#[test]
fn test_trading_gold_is_rejected() {
    let result = run(&[trade(100, "BUY", 3, Resource::Gold, 1)]);
    assert!(result.ledger.is_empty());
    assert_eq!(result.diagnostics.of_kind(DiagnosticKind::RejectedTrade).count(), 1);
}

#[test]
fn test_timestamps_going_backwards_is_fatal() {
    let catalog = catalog();
    let err = Interpreter::new(&catalog, MarketRates::default())
        .interpret(&[research(2000, 1, LOOM), research(1000, 1, LOOM)])
        .unwrap_err();

    assert_eq!(
        err,
        StreamError::MalformedStream {
            index: 1,
            timestamp: 1000,
            action: "RESEARCH".to_string(),
            reason: "timestamp 1000 ms is before previous action at 2000 ms".to_string(),
        }
    );
}

#[test]
fn test_missing_required_field_is_fatal() {
    let catalog = catalog();
    let err = Interpreter::new(&catalog, MarketRates::default())
        .interpret(&[action(10, "BUILD", 1)])
        .unwrap_err();

    let StreamError::MalformedStream { index, reason, .. } = err;
    assert_eq!(index, 0);
    assert!(reason.contains("building_id"));
}

#[test]
fn test_implausible_lot_count_is_fatal() {
    let catalog = catalog();
    let err = Interpreter::new(&catalog, MarketRates::default())
        .interpret(&[
            trade(100, "SELL", 2, Resource::Food, 1),
            trade(200, "SELL", 2, Resource::Food, 50_000_000),
        ])
        .unwrap_err();

    assert_eq!(
        err,
        StreamError::MalformedStream {
            index: 1,
            timestamp: 200,
            action: "SELL".to_string(),
            reason: "50000000 lots in one trade exceeds the limit of 100".to_string(),
        }
    );
}

#[test]
fn test_lot_limit_comes_from_rates() {
    let catalog = catalog();
    let rates = MarketRates {
        max_lots: 5,
        ..MarketRates::default()
    };
    let result = Interpreter::new(&catalog, rates.clone())
        .interpret(&[trade(100, "BUY", 2, Resource::Wood, 5)])
        .unwrap();
    assert!(approx(result.ledger.records()[0].delta.wood, 500.0));

    assert!(
        Interpreter::new(&catalog, rates)
            .interpret(&[trade(100, "BUY", 2, Resource::Wood, 6)])
            .is_err()
    );
}

#[test]
fn test_step_returns_emitted_record() {
    let catalog = catalog();
    let mut interpreter = Interpreter::new(&catalog, MarketRates::default());

    let record = interpreter.step(&research(1352, 4, LOOM)).unwrap().cloned();
    assert_eq!(record.map(|r| r.name), Some("Loom".to_string()));

    let none = interpreter.step(&action(1400, "MOVE", 4)).unwrap();
    assert!(none.is_none());
    assert_eq!(interpreter.processed(), 2);
    assert_eq!(interpreter.ledger().len(), 1);
}

#[test]
fn test_cumulative_spend_non_decreasing_without_market() {
    let actions = vec![
        action(0, "DE_QUEUE", 1).with("unit_id", VILLAGER),
        research(50, 1, LOOM),
        action(60, "BUILD", 1).with("building_id", HOUSE),
        action(70, "BUILD", 2).with("building_id", HOUSE),
        research(80, 1, 101),
    ];
    let result = run(&actions);

    for player in result.ledger.players() {
        let curve = result.ledger.cumulative_for(player);
        for pair in curve.windows(2) {
            for resource in Resource::LEDGER_ORDER {
                assert!(pair[1].1[resource] >= pair[0].1[resource]);
            }
        }
    }
}

#[test]
fn test_output_order_matches_input_order() {
    let actions = vec![
        action(0, "BUILD", 2).with("building_id", HOUSE),
        action(0, "BUILD", 1).with("building_id", HOUSE),
        research(10, 3, LOOM),
        action(10, "FLARE", 1),
        trade(25, "SELL", 1, Resource::Wood, 1),
    ];
    let result = run(&actions);

    let order: Vec<_> = result.ledger.iter().map(|r| (r.timestamp, r.player)).collect();
    assert_eq!(order, vec![(0, 2), (0, 1), (10, 3), (25, 1)]);
}
