#![deny(warnings)]

//! Headless CLI: load (or start) a school, run the live session for a few
//! seconds, and print the school's summary and leaderboard standing.

use std::sync::Arc;
use std::time::Duration;

use academy_runtime::{Command, SessionHandle};
use anyhow::Result;
use persistence::{FileStore, SaveStore};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

struct Args {
    save_dir: Option<String>,
    seconds: Option<u64>,
    name: Option<String>,
    seed: Option<u64>,
}

fn parse_args() -> Args {
    let mut args = Args {
        save_dir: None,
        seconds: None,
        name: None,
        seed: None,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--save-dir" => args.save_dir = it.next(),
            "--seconds" => args.seconds = it.next().and_then(|s| s.parse().ok()),
            "--name" => args.name = it.next(),
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()),
            _ => {}
        }
    }
    args
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args();
    let save_dir = args
        .save_dir
        .unwrap_or_else(|| persistence::default_save_dir().to_string());
    let seconds = args.seconds.unwrap_or(3);
    info!(%save_dir, seconds, "starting session");

    let store: Arc<dyn SaveStore> = Arc::new(FileStore::new(&save_dir));
    let now = chrono::Utc::now().timestamp();
    let state = persistence::load_state_or_default(store.as_ref(), now);
    let handle = SessionHandle::spawn(state, Some(store));

    if let Some(name) = args.name {
        handle.send(Command::SetSchoolName(name)).await;
    }

    if let Some(reward) = handle.pending_offline_reward().await {
        println!(
            "Welcome back! {} min away earned {} mana and {} gold.",
            reward.minutes, reward.mana, reward.gold
        );
        handle
            .send(Command::ClaimOfflineReward { doubled: false })
            .await;
    }

    tokio::time::sleep(Duration::from_secs(seconds)).await;
    let state = handle.state();
    handle.shutdown().await;

    let rivals = academy_ranking::generate_rivals(args.seed.unwrap_or(academy_ranking::DEFAULT_SEED));
    let rank = academy_ranking::player_rank(&rivals, state.total_magical_power);
    let school = if state.school_name.is_empty() {
        "(unnamed school)"
    } else {
        state.school_name.as_str()
    };
    println!(
        "{} | mana: {} | gold: {} | power: {} | stones: {} | students: {}",
        school,
        state.mana,
        state.gold,
        state.total_magical_power,
        state.philosophers_stones,
        state.students.total_students
    );
    println!("Leaderboard standing: #{rank} of {}", rivals.len() + 1);
    for rival in rivals.iter().take(3) {
        println!("  #{} {} | power {}", rival.rank, rival.name, rival.power);
    }

    Ok(())
}
