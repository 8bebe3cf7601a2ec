//! Parlay session simulator
//!
//! Runs an autoplay sequence of a chosen game against a fresh session and
//! prints the settlement report. Useful for eyeballing payout behavior and
//! house edge over many rounds.

use clap::{Parser, ValueEnum};
use parlay::{
    autoplay, Amount, AutoplayPlan, CrashConfig, DiceConfig, DiceDirection, DrawRng, EngineConfig,
    GameEngine, MinesConfig, MockChainRecorder, PlinkoConfig, PlinkoTier, RoundConfig,
    RouletteBet, RouletteConfig, RouletteWager,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Game {
    Dice,
    Crash,
    Plinko,
    Mines,
    Roulette,
}

#[derive(Parser, Debug)]
#[command(name = "parlay-sim", about = "Run unattended wagering rounds against a fresh session")]
struct Args {
    /// Game to simulate
    #[arg(long, value_enum, default_value = "dice")]
    game: Game,

    /// Number of rounds to play
    #[arg(long, default_value_t = 100)]
    rounds: u32,

    /// Stake per round, in whole credits
    #[arg(long, default_value_t = 10)]
    stake: u64,

    /// Opening balance, in whole credits
    #[arg(long, default_value_t = 10_000)]
    balance: u64,

    /// RNG seed for reproducible runs; omit for OS entropy
    #[arg(long)]
    seed: Option<u64>,
}

fn round_config(game: Game, stake: Amount) -> RoundConfig {
    match game {
        Game::Dice => RoundConfig::Dice(DiceConfig {
            stake,
            threshold: 50,
            direction: DiceDirection::Over,
        }),
        Game::Crash => RoundConfig::Crash(CrashConfig {
            stake,
            auto_cash_out_bps: Some(20_000),
        }),
        Game::Plinko => RoundConfig::Plinko(PlinkoConfig {
            stake,
            tier: PlinkoTier::Medium,
        }),
        Game::Mines => RoundConfig::Mines(MinesConfig {
            stake,
            mines: 5,
            auto_reveal: Some(3),
        }),
        Game::Roulette => RoundConfig::Roulette(RouletteConfig {
            wagers: vec![RouletteWager {
                bet: RouletteBet::Red,
                amount: stake,
            }],
        }),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("parlay=info".parse()?))
        .init();

    let args = Args::parse();

    let mut config = EngineConfig::fast_sim();
    config.session.starting_balance = Amount::from_units(args.balance);

    let rng = match args.seed {
        Some(seed) => DrawRng::seeded(seed),
        None => DrawRng::from_entropy(),
    };
    let engine = Arc::new(GameEngine::with_parts(
        config,
        Arc::new(rng),
        Arc::new(MockChainRecorder),
    )?);

    println!("🎲 Parlay session simulator");
    println!("   Game: {:?}", args.game);
    println!("   Rounds: {}", args.rounds);
    println!("   Stake: {}", Amount::from_units(args.stake));
    println!("   Opening balance: {}", engine.balance());

    let plan = AutoplayPlan::rounds(args.rounds);
    let config = round_config(args.game, Amount::from_units(args.stake));
    let handle = autoplay::start(engine.clone(), config, plan)?;
    let report = handle.join().await;

    let stats = engine.stats();
    println!("\n📊 Sequence report");
    println!("   Rounds settled: {}", report.rounds_settled);
    println!("   Rounds aborted: {}", report.rounds_aborted);
    println!("   Stop reason: {:?}", report.stop_reason);
    println!("   Wagered: {}", report.total_wagered);
    println!("   Returned: {}", report.total_returned);
    println!("   Final balance: {}", report.final_balance);
    println!("   Session win rate: {:.1}%", stats.win_rate * 100.0);
    if report.rounds_settled > 0 {
        let rtp = report.total_returned.minor() as f64 / report.total_wagered.minor() as f64;
        println!("   Observed return-to-player: {:.1}%", rtp * 100.0);
    }

    engine.shutdown();
    Ok(())
}
