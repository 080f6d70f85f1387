use serde::Serialize;
use tracing::info;

use crate::constants::{clamp_frame_dt, COUNTDOWN_SECS, INTRO_DISPLAY_SECS};
use crate::controller::{InputEvent, Key};
use crate::engine::{HumanSlot, Round, RoundConfig};
use crate::error::LevelError;
use crate::level::Level;
use crate::rng::Rng;
use crate::timer::Timer;
use crate::types::{Phase, RuntimeEvent, Snapshot, Team, TeamScore};

#[derive(Clone, Debug)]
pub struct MatchOptions {
    pub seed: u32,
    pub levels: Vec<Level>,
    pub config: RoundConfig,
    pub human: HumanSlot,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RoundResult {
    pub level: usize,
    #[serde(rename = "levelName")]
    pub level_name: String,
    pub winner: Option<Team>,
    #[serde(rename = "teamA")]
    pub team_a: TeamScore,
    #[serde(rename = "teamB")]
    pub team_b: TeamScore,
}

impl RoundResult {
    /// A tie is not a loss.
    pub fn human_lost(&self) -> bool {
        self.winner == Some(Team::TeamB)
    }
}

#[derive(Clone, Debug)]
pub struct Match {
    phase: Phase,
    levels: Vec<Level>,
    config: RoundConfig,
    human: HumanSlot,
    rng: Rng,
    round: Round,
    intro: Timer,
    countdown: Timer,
    results: Vec<RoundResult>,
    total_score: i32,
    events: Vec<RuntimeEvent>,
}

impl Match {
    pub fn new(options: MatchOptions) -> Result<Self, LevelError> {
        let MatchOptions {
            seed,
            levels,
            config,
            human,
        } = options;
        let Some(first) = levels.first() else {
            return Err(LevelError::EmptyCampaign);
        };
        let mut rng = Rng::new(seed);
        let round = Round::new(first, 0, &config, human, rng.next_u32());
        info!(level = %first.name, levels = levels.len(), seed, "match started");
        Ok(Self {
            phase: Phase::Intro,
            levels,
            config,
            human,
            rng,
            round,
            intro: Timer::new(INTRO_DISPLAY_SECS),
            countdown: Timer::new(COUNTDOWN_SECS),
            results: Vec::new(),
            total_score: 0,
            events: vec![RuntimeEvent::PhaseChanged {
                phase: Phase::Intro,
            }],
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn round_mut(&mut self) -> &mut Round {
        &mut self.round
    }

    pub fn level_index(&self) -> usize {
        self.round.level_index
    }

    pub fn results(&self) -> &[RoundResult] {
        &self.results
    }

    pub fn total_score(&self) -> i32 {
        self.total_score
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, Phase::Defeat | Phase::Victory)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.round.snapshot()
    }

    pub fn drain_events(&mut self) -> Vec<RuntimeEvent> {
        let mut events = std::mem::take(&mut self.events);
        events.extend(self.round.drain_events());
        events
    }

    pub fn step(&mut self, dt: f32, input: &[InputEvent]) {
        let dt = clamp_frame_dt(dt);
        let pressed = |key: Key| input.contains(&InputEvent::KeyDown(key));

        match self.phase {
            Phase::Intro => {
                self.intro.update(dt);
                if self.intro.done() && pressed(Key::Dismiss) {
                    self.countdown.restart();
                    self.set_phase(Phase::Countdown);
                }
            }
            Phase::Countdown => {
                self.countdown.update(dt);
                if self.countdown.done() {
                    self.set_phase(Phase::Playing);
                }
            }
            Phase::Playing => {
                if pressed(Key::Pause) {
                    self.round.release_keys(input);
                    self.set_phase(Phase::Paused);
                    return;
                }
                self.round.step(dt, input);
                if self.round.is_finished() {
                    self.finish_round();
                }
            }
            Phase::Paused => {
                self.round.release_keys(input);
                if pressed(Key::Dismiss) || pressed(Key::Pause) {
                    self.set_phase(Phase::Playing);
                }
            }
            Phase::RoundEnd => self.after_round(),
            Phase::NextLevel => {
                self.intro.restart();
                self.set_phase(Phase::Intro);
            }
            Phase::Defeat | Phase::Victory => {}
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase == phase {
            return;
        }
        info!(from = ?self.phase, to = ?phase, level = self.round.level_index, "phase changed");
        self.phase = phase;
        self.events.push(RuntimeEvent::PhaseChanged { phase });
    }

    fn finish_round(&mut self) {
        let result = RoundResult {
            level: self.round.level_index,
            level_name: self.round.level().name.clone(),
            winner: self.round.winner(),
            team_a: self.round.score(Team::TeamA),
            team_b: self.round.score(Team::TeamB),
        };
        self.total_score += result.team_a.score;
        info!(
            level = %result.level_name,
            winner = ?result.winner,
            team_a = result.team_a.score,
            team_b = result.team_b.score,
            total = self.total_score,
            "round finished"
        );
        self.events.push(RuntimeEvent::RoundFinished {
            level: result.level,
            winner: result.winner,
            team_a_score: result.team_a.score,
            team_b_score: result.team_b.score,
        });
        self.results.push(result);
        self.set_phase(Phase::RoundEnd);
    }

    fn after_round(&mut self) {
        let lost = self
            .results
            .last()
            .map(RoundResult::human_lost)
            .unwrap_or(false);
        let next = self.round.level_index + 1;
        if lost {
            self.set_phase(Phase::Defeat);
        } else if next >= self.levels.len() {
            self.set_phase(Phase::Victory);
        } else {
            let seed = self.rng.next_u32();
            self.round = Round::new(&self.levels[next], next, &self.config, self.human, seed);
            self.set_phase(Phase::NextLevel);
        }
    }
}
