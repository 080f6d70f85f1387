use clap::{Parser, ValueEnum};
use serde::Serialize;
use square_wars::constants::{FRAME_DT, PLAY_AREA};
use square_wars::controller::{InputEvent, Key};
use square_wars::engine::{HumanSlot, RoundConfig};
use square_wars::error::{LevelError, LoadError};
use square_wars::level::{builtin, campaign, load_levels, Level};
use square_wars::match_state::{Match, MatchOptions, RoundResult};
use square_wars::types::{Phase, RuntimeEvent, Snapshot, SquareTeam};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

// Ten minutes of simulated time per scenario.
const TICK_SAFETY_LIMIT: u64 = 60 * 60 * 10;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
enum Pilot {
    /// Team A's first player never presses a key.
    Idle,
    /// Team A's first player is driven by the opponent AI.
    Autopilot,
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Play a single built-in level instead of the campaign.
    #[arg(long)]
    level: Option<String>,
    /// JSON level pack to play instead of the built-in campaign.
    #[arg(long)]
    levels: Option<PathBuf>,
    /// JSON round config overriding the default tuning.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Pilot::Autopilot)]
    human: Pilot,
    #[arg(long, default_value_t = 1)]
    runs: u32,
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    seed: u32,
    human: Pilot,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    human: Pilot,
    outcome: String,
    #[serde(rename = "levelsPlayed")]
    levels_played: usize,
    #[serde(rename = "totalScore")]
    total_score: i32,
    ticks: u64,
    claims: u32,
    knockouts: u32,
    shots: u32,
    explosions: u32,
    #[serde(rename = "powerupsSpawned")]
    powerups_spawned: u32,
    rounds: Vec<RoundResult>,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageTotalScore")]
    average_total_score: f32,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(io::stderr)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            error!(%err, "simulation failed");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<bool, LoadError> {
    let levels = resolve_levels(cli)?;
    let config = match cli.config.as_deref() {
        Some(path) => read_config(path)?,
        None => RoundConfig::default(),
    };
    let scenarios = resolve_scenarios(cli, &levels);
    let started_at = now_rfc3339();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed_hint, chrono::Utc::now().timestamp_millis()));

    let mut results = Vec::new();
    let mut clean = true;
    for scenario in &scenarios {
        info!(
            match_id = %match_id,
            scenario = %scenario.name,
            seed = scenario.seed,
            human = ?scenario.human,
            "scenario started"
        );
        let result = run_scenario(scenario, &levels, &config)?;
        for anomaly in &result.anomalies {
            warn!(match_id = %match_id, scenario = %scenario.name, %anomaly, "anomaly detected");
        }
        clean &= result.anomalies.is_empty();
        info!(
            match_id = %match_id,
            scenario = %scenario.name,
            outcome = %result.outcome,
            total_score = result.total_score,
            ticks = result.ticks,
            "scenario finished"
        );
        println!("{}", serde_json::to_string(&result)?);
        results.push(result);
    }

    let summary = build_run_summary(match_id.clone(), started_at, now_rfc3339(), results);
    if let Some(path) = cli.summary_out.as_ref() {
        write_summary(path, &summary)?;
        info!(match_id = %match_id, path = %path.display(), "summary written");
    }
    info!(
        match_id = %match_id,
        scenarios = summary.scenario_count,
        anomalies = summary.anomaly_count,
        average_total_score = summary.average_total_score,
        "run finished"
    );
    Ok(clean)
}

fn resolve_levels(cli: &Cli) -> Result<Vec<Level>, LoadError> {
    if let Some(path) = cli.levels.as_deref() {
        return load_levels(path);
    }
    if let Some(name) = cli.level.as_deref() {
        let level = builtin(name).ok_or_else(|| LevelError::UnknownLevel {
            name: name.to_string(),
        })??;
        return Ok(vec![level]);
    }
    Ok(campaign()?)
}

fn read_config(path: &Path) -> Result<RoundConfig, LoadError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn resolve_scenarios(cli: &Cli, levels: &[Level]) -> Vec<Scenario> {
    let seed = cli.seed.unwrap_or_else(rand::random::<u32>);
    let label = match (levels.len(), levels.first()) {
        (1, Some(level)) => level.name.clone(),
        _ => "campaign".to_string(),
    };
    (0..cli.runs.max(1))
        .map(|run| Scenario {
            name: format!("{label}-{run}"),
            seed: seed.wrapping_add(run),
            human: cli.human,
        })
        .collect()
}

fn run_scenario(
    scenario: &Scenario,
    levels: &[Level],
    config: &RoundConfig,
) -> Result<ScenarioResultLine, LevelError> {
    let mut game = Match::new(MatchOptions {
        seed: scenario.seed,
        levels: levels.to_vec(),
        config: config.clone(),
        human: match scenario.human {
            Pilot::Idle => HumanSlot::Input,
            Pilot::Autopilot => HumanSlot::Autopilot,
        },
    })?;

    let mut anomalies = Vec::new();
    let mut seen = HashSet::new();
    let mut ticks = 0u64;
    let mut counts = EventCounts::default();
    let dismiss = [InputEvent::KeyDown(Key::Dismiss)];

    while !game.is_over() {
        let input: &[InputEvent] = if game.phase() == Phase::Intro {
            &dismiss
        } else {
            &[]
        };
        game.step(FRAME_DT, input);
        ticks += 1;
        counts.record(&game.drain_events());
        if game.phase() == Phase::Playing {
            for message in collect_snapshot_anomalies(&game.snapshot()) {
                push_anomaly(&mut anomalies, &mut seen, message);
            }
        }
        if ticks > TICK_SAFETY_LIMIT {
            push_anomaly(
                &mut anomalies,
                &mut seen,
                "tick safety limit exceeded".to_string(),
            );
            break;
        }
    }

    Ok(ScenarioResultLine {
        scenario: scenario.name.clone(),
        seed: scenario.seed,
        human: scenario.human,
        outcome: outcome_key(game.phase()).to_string(),
        levels_played: game.results().len(),
        total_score: game.total_score(),
        ticks,
        claims: counts.claims,
        knockouts: counts.knockouts,
        shots: counts.shots,
        explosions: counts.explosions,
        powerups_spawned: counts.powerups_spawned,
        rounds: game.results().to_vec(),
        anomalies,
    })
}

#[derive(Clone, Debug, Default)]
struct EventCounts {
    claims: u32,
    knockouts: u32,
    shots: u32,
    explosions: u32,
    powerups_spawned: u32,
}

impl EventCounts {
    fn record(&mut self, events: &[RuntimeEvent]) {
        for event in events {
            match event {
                RuntimeEvent::SquareClaimed { .. } => self.claims += 1,
                RuntimeEvent::Knockout { .. } => self.knockouts += 1,
                RuntimeEvent::Shot { .. } => self.shots += 1,
                RuntimeEvent::Explosion { .. } => self.explosions += 1,
                RuntimeEvent::PowerupSpawned { .. } => self.powerups_spawned += 1,
                _ => {}
            }
        }
    }
}

fn collect_snapshot_anomalies(snapshot: &Snapshot) -> Vec<String> {
    let mut anomalies = Vec::new();
    for player in &snapshot.players {
        let inside = (0.0..=PLAY_AREA).contains(&player.x) && (0.0..=PLAY_AREA).contains(&player.y);
        if !inside {
            anomalies.push(format!(
                "player outside play area: {} ({}, {})",
                player.id.0, player.x, player.y
            ));
        }
    }

    for (team, score) in [(SquareTeam::TeamA, snapshot.team_a), (SquareTeam::TeamB, snapshot.team_b)] {
        let owned = snapshot
            .squares
            .iter()
            .filter(|square| square.team == team)
            .count() as i32;
        if owned != score.squares {
            anomalies.push(format!(
                "square tally mismatch for {team:?}: board {owned}, score {}",
                score.squares
            ));
        }
        if score.score != score.squares - score.knockouts {
            anomalies.push(format!("score formula broken for {team:?}"));
        }
    }

    let owned_total: usize = snapshot.players.iter().map(|player| player.square_count).sum();
    let claimed = snapshot
        .squares
        .iter()
        .filter(|square| matches!(square.team, SquareTeam::TeamA | SquareTeam::TeamB))
        .count();
    if owned_total != claimed {
        anomalies.push(format!(
            "owned-square backrefs {owned_total} do not match claimed squares {claimed}"
        ));
    }
    anomalies
}

fn push_anomaly(anomalies: &mut Vec<String>, seen: &mut HashSet<String>, message: String) {
    if seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn outcome_key(phase: Phase) -> &'static str {
    match phase {
        Phase::Victory => "victory",
        Phase::Defeat => "defeat",
        _ => "unfinished",
    }
}

fn default_match_id(seed: u32, timestamp_ms: i64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn build_run_summary(
    match_id: String,
    started_at: String,
    finished_at: String,
    scenarios: Vec<ScenarioResultLine>,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let anomaly_count = scenarios.iter().map(|s| s.anomalies.len()).sum();
    let average_total_score = if scenario_count == 0 {
        0.0
    } else {
        scenarios.iter().map(|s| s.total_score as f32).sum::<f32>() / scenario_count as f32
    };
    let mut outcome_counts = BTreeMap::new();
    for scenario in &scenarios {
        *outcome_counts.entry(scenario.outcome.clone()).or_insert(0) += 1;
    }
    RunSummary {
        match_id,
        started_at,
        finished_at,
        scenario_count,
        anomaly_count,
        average_total_score,
        outcome_counts,
        scenarios,
    }
}

fn write_summary(path: &Path, summary: &RunSummary) -> Result<(), LoadError> {
    let summary_text = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, summary_text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_result(outcome: &str, total_score: i32, anomalies: usize) -> ScenarioResultLine {
        ScenarioResultLine {
            scenario: "test".to_string(),
            seed: 42,
            human: Pilot::Idle,
            outcome: outcome.to_string(),
            levels_played: 1,
            total_score,
            ticks: 100,
            claims: 0,
            knockouts: 0,
            shots: 0,
            explosions: 0,
            powerups_spawned: 0,
            rounds: Vec::new(),
            anomalies: (0..anomalies).map(|n| format!("anomaly {n}")).collect(),
        }
    }

    #[test]
    fn default_match_id_contains_seed_and_timestamp() {
        assert_eq!(default_match_id(42, 123456789), "sim-42-123456789");
    }

    #[test]
    fn build_run_summary_counts_outcomes() {
        let summary = build_run_summary(
            "sim-42-1".to_string(),
            "2024-01-01T00:00:00+00:00".to_string(),
            "2024-01-01T00:01:00+00:00".to_string(),
            vec![
                make_result("defeat", -2, 1),
                make_result("victory", 10, 0),
                make_result("defeat", 4, 2),
            ],
        );
        assert_eq!(summary.scenario_count, 3);
        assert_eq!(summary.anomaly_count, 3);
        assert_eq!(summary.outcome_counts.get("defeat"), Some(&2));
        assert!((summary.average_total_score - 4.0).abs() < 1e-6);
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let target = std::env::temp_dir()
            .join(format!("square-wars-missing-{}", chrono::Utc::now().timestamp_millis()))
            .join("summary.json");
        let summary = build_run_summary(
            "sim-1-1".to_string(),
            now_rfc3339(),
            now_rfc3339(),
            vec![make_result("victory", 1, 0)],
        );
        assert!(matches!(write_summary(&target, &summary), Err(LoadError::Io(_))));
    }

    #[test]
    fn push_anomaly_deduplicates_messages() {
        let mut anomalies = Vec::new();
        let mut seen = HashSet::new();
        push_anomaly(&mut anomalies, &mut seen, "same anomaly".to_string());
        push_anomaly(&mut anomalies, &mut seen, "same anomaly".to_string());
        assert_eq!(anomalies.len(), 1);
    }

    #[test]
    fn single_level_scenario_runs_to_an_outcome() {
        let level = builtin("tutorial")
            .expect("tutorial exists")
            .expect("tutorial parses");
        let config = RoundConfig {
            round_duration_secs: 8.0,
            ..RoundConfig::default()
        };
        let scenario = Scenario {
            name: "tutorial-0".to_string(),
            seed: 5,
            human: Pilot::Autopilot,
        };
        let result = run_scenario(&scenario, &[level], &config).expect("scenario runs");
        assert_ne!(result.outcome, "unfinished");
        assert_eq!(result.levels_played, 1);
        assert!(result.anomalies.is_empty(), "{:?}", result.anomalies);
    }

    #[test]
    fn unknown_level_name_is_rejected() {
        let cli = Cli::parse_from(["simulate", "--level", "nowhere"]);
        assert!(matches!(
            resolve_levels(&cli),
            Err(LoadError::Level(LevelError::UnknownLevel { .. }))
        ));
    }
}
