mod support;

use rust_decimal_macros::dec;

use spreadhound::domain::{ExitReason, TradeStatus};
use spreadhound::port::Event;
use spreadhound::testkit::config::paper_config;

use support::{null_stores, orchestrator_with, secs, single_slot_config, t0, tick};

#[test]
fn e2e_detect_open_converge_close() {
    let now = t0();
    let (mut orch, events) = orchestrator_with(&paper_config(), null_stores(), now);

    let outcome = orch.on_tick(&tick(dec!(100), dec!(100.5), now), now);
    let id = outcome.opened.expect("trade opened");
    assert_eq!(orch.ledger().current_balance(), dec!(9000));

    let outcome = orch.on_tick(&tick(dec!(100), dec!(100.1), now + secs(3)), now + secs(3));
    assert_eq!(outcome.closed, vec![id]);
    // 0.1% is below the 0.2% entry threshold, nothing new opens.
    assert!(outcome.opportunity.is_none());

    let trade = orch.ledger().get(id).unwrap();
    match trade.status() {
        TradeStatus::Closed(close) => {
            assert_eq!(close.reason, ExitReason::TargetReached);
            // (0.5 - 0.1)% of 1000, less 0.15% round trip fees.
            assert_eq!(close.actual_profit, dec!(2.5));
        }
        TradeStatus::Open => panic!("trade should be closed"),
    }
    assert_eq!(orch.ledger().current_balance(), dec!(10002.5));

    let metrics = orch.tracker().metrics();
    assert_eq!(metrics.total_opportunities, 1);
    assert_eq!(metrics.total_trades, 1);
    assert_eq!(metrics.profitable_trades, 1);
    assert_eq!(metrics.total_net_profit, dec!(2.5));
    assert_eq!(metrics.total_fees_paid, dec!(1.5));

    let opened = events.count(|e| matches!(e, Event::TradeOpened(_)));
    let closed = events.count(|e| matches!(e, Event::TradeClosed(_)));
    let detected = events.count(|e| matches!(e, Event::OpportunityDetected(_)));
    assert_eq!((detected, opened, closed), (1, 1, 1));
}

#[test]
fn balance_invariant_holds_across_session() {
    let now = t0();
    let (mut orch, _) = orchestrator_with(&paper_config(), null_stores(), now);
    let prices = [
        dec!(100.5),
        dec!(100.6),
        dec!(100.1),
        dec!(100.9),
        dec!(100.3),
        dec!(100.05),
        dec!(100.7),
    ];

    for (i, perp) in prices.into_iter().enumerate() {
        let at = now + secs(i as i64 * 5);
        orch.on_tick(&tick(dec!(100), perp, at), at);

        let ledger = orch.ledger();
        assert_eq!(
            ledger.current_balance() + ledger.open_exposure(),
            ledger.initial_balance() + ledger.realized_profit()
        );
        assert!(ledger.open_count() <= 3);
    }

    orch.shutdown(now + secs(60));
    let ledger = orch.ledger();
    assert_eq!(ledger.open_count(), 0);
    assert_eq!(
        ledger.current_balance(),
        ledger.initial_balance() + ledger.realized_profit()
    );
    assert_eq!(
        orch.tracker().metrics().total_net_profit,
        ledger.realized_profit()
    );
}

#[test]
fn max_hold_time_closes_stale_trade() {
    let now = t0();
    let (mut orch, _) = orchestrator_with(&single_slot_config(), null_stores(), now);

    let id = orch
        .on_tick(&tick(dec!(100), dec!(100.5), now), now)
        .opened
        .unwrap();

    let held = orch.on_tick(&tick(dec!(100), dec!(100.5), now + secs(60)), now + secs(60));
    assert!(held.closed.is_empty());

    let late = now + secs(61);
    let outcome = orch.on_tick(&tick(dec!(100), dec!(100.5), late), late);
    assert_eq!(outcome.closed, vec![id]);
    assert_eq!(
        orch.ledger().get(id).unwrap().close_info().map(|c| c.reason),
        Some(ExitReason::MaxHoldTime)
    );
    // The slot freed up and the still-wide spread reopens.
    assert!(outcome.opened.is_some());
}

#[test]
fn shutdown_force_closes_and_reports() {
    let now = t0();
    let (mut orch, events) = orchestrator_with(&paper_config(), null_stores(), now);
    orch.on_tick(&tick(dec!(100), dec!(100.5), now), now);
    orch.on_tick(&tick(dec!(100), dec!(100.3), now + secs(1)), now + secs(1));
    let open_before = orch.ledger().open_count();
    assert_eq!(open_before, 2);

    let report = orch.shutdown(now + secs(10));

    assert_eq!(orch.ledger().open_count(), 0);
    assert!(orch
        .ledger()
        .trades()
        .all(|t| t.close_info().map(|c| c.reason) == Some(ExitReason::Shutdown)));
    assert_eq!(report.metrics.total_trades, 2);
    assert_eq!(
        events.count(|e| matches!(e, Event::ProfitabilityReport(_))),
        1
    );
}

#[test]
fn invalid_prices_are_ignored() {
    let now = t0();
    let (mut orch, _) = orchestrator_with(&paper_config(), null_stores(), now);

    let outcome = orch.on_tick(&tick(dec!(0), dec!(100.5), now), now);
    assert!(outcome.opportunity.is_none());
    assert_eq!(orch.ledger().open_count(), 0);
}
