//! End-to-end round settlement properties across all five games

use parlay::games::payout;
use parlay::{
    Amount, CrashConfig, DiceConfig, DiceDirection, DrawRng, EngineConfig, GameEngine,
    MinesConfig, MinesProgress, MockChainRecorder, PlinkoConfig, PlinkoTier, RoundConfig,
    RouletteBet, RouletteConfig, RouletteWager,
};
use std::sync::Arc;

fn engine(seed: u64) -> Arc<GameEngine> {
    let mut config = EngineConfig::fast_sim();
    config.session.starting_balance = Amount::from_units(10_000);
    Arc::new(
        GameEngine::with_parts(
            config,
            Arc::new(DrawRng::seeded(seed)),
            Arc::new(MockChainRecorder),
        )
        .expect("engine construction failed"),
    )
}

fn all_games(stake: Amount) -> Vec<RoundConfig> {
    vec![
        RoundConfig::Dice(DiceConfig {
            stake,
            threshold: 50,
            direction: DiceDirection::Over,
        }),
        RoundConfig::Crash(CrashConfig {
            stake,
            auto_cash_out_bps: Some(15_000),
        }),
        RoundConfig::Plinko(PlinkoConfig {
            stake,
            tier: PlinkoTier::Hard,
        }),
        RoundConfig::Mines(MinesConfig {
            stake,
            mines: 5,
            auto_reveal: Some(3),
        }),
        RoundConfig::Roulette(RouletteConfig {
            wagers: vec![RouletteWager {
                bet: RouletteBet::Red,
                amount: stake,
            }],
        }),
    ]
}

#[tokio::test]
async fn balance_invariant_holds_for_every_round() {
    let engine = engine(42);
    for round in 0..50u32 {
        for config in all_games(Amount::from_units(10)) {
            let before = engine.balance();
            let outcome = engine.play(&config).await.expect("round failed");
            assert_eq!(
                outcome.balance_after.minor() as i128,
                before.minor() as i128 - outcome.stake.minor() as i128
                    + outcome.payout.minor() as i128,
                "round {round} {}: balance drifted",
                outcome.game
            );
            assert_eq!(outcome.net, outcome.payout.minor() as i64 - outcome.stake.minor() as i64);
        }
    }
}

#[tokio::test]
async fn history_replays_to_final_balance() {
    let engine = engine(7);
    for config in all_games(Amount::from_units(25)) {
        for _ in 0..10 {
            let _ = engine.play(&config).await.expect("round failed");
        }
    }

    let snapshot = engine.snapshot();
    let mut replayed = Amount::from_units(10_000).minor() as i128;
    for record in &snapshot.history {
        replayed -= record.stake.minor() as i128;
        replayed += record.payout.minor() as i128;
        assert_eq!(
            record.balance_after.minor() as i128,
            replayed,
            "record {} does not replay",
            record.commit_seq
        );
    }
    assert_eq!(snapshot.balance.minor() as i128, replayed);

    // settlement happened strictly in commit order
    for (i, record) in snapshot.history.iter().enumerate() {
        assert_eq!(record.commit_seq, i as u64);
    }
}

#[tokio::test]
async fn snapshots_are_idempotent_between_rounds() {
    let engine = engine(3);
    engine
        .play(&all_games(Amount::from_units(10))[0])
        .await
        .unwrap();

    let first = engine.snapshot();
    for _ in 0..5 {
        let again = engine.snapshot();
        assert_eq!(first.balance, again.balance);
        assert_eq!(first.history.len(), again.history.len());
        for (a, b) in first.history.iter().zip(again.history.iter()) {
            assert_eq!(a.round_id, b.round_id);
            assert_eq!(a.balance_after, b.balance_after);
            assert_eq!(a.settled_at, b.settled_at);
        }
    }
}

#[tokio::test]
async fn seeded_sessions_produce_identical_histories() {
    let a = engine(1234);
    let b = engine(1234);
    for config in all_games(Amount::from_units(10)) {
        for _ in 0..5 {
            let oa = a.play(&config).await.unwrap();
            let ob = b.play(&config).await.unwrap();
            assert_eq!(oa.won, ob.won);
            assert_eq!(oa.multiplier_bps, ob.multiplier_bps);
            assert_eq!(oa.payout, ob.payout);
        }
    }
    assert_eq!(a.balance(), b.balance());
}

#[tokio::test]
async fn mines_cash_out_matches_compounding_formula() {
    // walk an interactive round and confirm the locked multiplier against
    // direct recomputation of the per-reveal product
    let engine = engine(99);
    let id = engine
        .begin_mines(MinesConfig {
            stake: Amount::from_units(10),
            mines: 3,
            auto_reveal: None,
        })
        .await
        .unwrap();

    let mut reveals = 0u8;
    for _ in 0..4 {
        match engine.mines_reveal(&id).await.unwrap() {
            MinesProgress::Safe {
                multiplier_bps,
                safe_revealed,
            } => {
                reveals = safe_revealed;
                assert_eq!(multiplier_bps, payout::mines_multiplier_after(3, safe_revealed));
            }
            MinesProgress::Settled { outcome } => {
                assert!(!outcome.won);
                assert_eq!(outcome.payout, Amount::ZERO);
                return;
            }
        }
    }

    let outcome = engine.mines_cash_out(&id).await.unwrap();
    assert_eq!(
        outcome.multiplier_bps,
        payout::mines_multiplier_after(3, reveals)
    );
    assert_eq!(
        outcome.payout,
        Amount::from_units(10).scale_bps(outcome.multiplier_bps)
    );
}

#[tokio::test]
async fn roulette_color_and_parity_double_pay() {
    // force the deterministic payout table check through a real round:
    // whatever number comes up, the settlement must match the table
    let engine = engine(555);
    let config = RouletteConfig {
        wagers: vec![
            RouletteWager {
                bet: RouletteBet::Red,
                amount: Amount::from_units(10),
            },
            RouletteWager {
                bet: RouletteBet::Odd,
                amount: Amount::from_units(10),
            },
        ],
    };
    for _ in 0..30 {
        let outcome = engine.play_roulette(config.clone()).await.unwrap();
        // each wager pays 2x or nothing, so the round pays 0, 20 or 40
        let units = outcome.payout.minor() / 100;
        assert!(
            [0, 20, 40].contains(&units),
            "impossible roulette payout {units}"
        );
        assert_eq!(
            outcome.payout,
            Amount::from_units(20).scale_bps(outcome.multiplier_bps)
        );
    }
}

#[tokio::test]
async fn dangling_rounds_are_reaped_with_refund() {
    let mut config = EngineConfig::fast_sim();
    config.session.round_deadline_ms = 10;
    let engine = GameEngine::with_parts(
        config,
        Arc::new(DrawRng::seeded(1)),
        Arc::new(MockChainRecorder),
    )
    .unwrap();

    let id = engine
        .begin_mines(MinesConfig {
            stake: Amount::from_units(50),
            mines: 3,
            auto_reveal: None,
        })
        .await
        .unwrap();
    let reserved_balance = engine.balance();

    tokio::time::sleep(std::time::Duration::from_millis(30)).await;
    let reaped = engine.abort_dangling();
    assert_eq!(reaped.len(), 1);
    assert!(matches!(
        reaped[0],
        parlay::EngineError::DanglingRound { .. }
    ));

    // stake came back and the round is gone
    assert_eq!(
        engine.balance(),
        reserved_balance + Amount::from_units(50)
    );
    assert!(engine.mines_cash_out(&id).await.is_err());

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.history.len(), 1);
    assert!(snapshot.history[0].aborted);
    assert_eq!(snapshot.history[0].net, 0);
}
