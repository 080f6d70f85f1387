use serde::Deserialize;
use tracing::debug;

use crate::constants::{
    clamp_frame_dt, CLAIM_DEBOUNCE_SECS, POWERUP_SPAWN_INTERVAL_SECS, ROUND_DURATION_SECS,
};
use crate::controller::{Controller, ControllerContext, InputEvent, MotionInterrupt};
use crate::grid::Grid;
use crate::level::Level;
use crate::player::Player;
use crate::powerup::{
    blast_cells, speedup_direction, Bullet, Explosion, ItemTick, Powerup, TouchOutcome,
    UseOutcome,
};
use crate::rng::Rng;
use crate::timer::Timer;
use crate::types::{
    BulletView, Coord, HazardView, PlayerId, PlayerView, PowerupId, PowerupKind, PowerupView,
    RuntimeEvent, Snapshot, SquareTeam, SquareView, Team, TeamScore,
};

mod motion_system;
mod powerup_system;
mod territory_system;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoundConfig {
    pub round_duration_secs: f32,
    pub powerup_interval_secs: f32,
    pub claim_debounce_secs: f32,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            round_duration_secs: ROUND_DURATION_SECS,
            powerup_interval_secs: POWERUP_SPAWN_INTERVAL_SECS,
            claim_debounce_secs: CLAIM_DEBOUNCE_SECS,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HumanSlot {
    #[default]
    Input,
    Autopilot,
}

#[derive(Clone, Debug)]
pub struct Round {
    pub level_index: usize,
    level: Level,
    grid: Grid,
    rng: Rng,
    human: PlayerId,
    players: Vec<Player>,
    controllers: Vec<Controller>,
    powerups: Vec<Powerup>,
    bullets: Vec<Bullet>,
    explosions: Vec<Explosion>,
    knockouts_a: i32,
    knockouts_b: i32,
    round_timer: Timer,
    spawn_timer: Timer,
    events: Vec<RuntimeEvent>,
    tick: u64,
    next_powerup_id: u64,
}

impl Round {
    pub fn new(
        level: &Level,
        level_index: usize,
        config: &RoundConfig,
        human_slot: HumanSlot,
        seed: u32,
    ) -> Self {
        let grid = Grid::from_level(level, config.claim_debounce_secs);

        let mut players = Vec::new();
        let mut controllers = Vec::new();
        for (idx, spawn) in level.spawns(Team::TeamA).into_iter().enumerate() {
            players.push(Player::new(PlayerId(players.len()), Team::TeamA, spawn));
            controllers.push(match (idx, human_slot) {
                (0, HumanSlot::Input) => Controller::human(),
                _ => Controller::ai(level.ai_dumbness),
            });
        }
        for spawn in level.spawns(Team::TeamB) {
            let id = PlayerId(players.len());
            players.push(Player::new(id, Team::TeamB, spawn));
            controllers.push(Controller::ai(level.ai_dumbness));
        }

        Self {
            level_index,
            level: level.clone(),
            grid,
            rng: Rng::new(seed),
            human: PlayerId(0),
            players,
            controllers,
            powerups: Vec::new(),
            bullets: Vec::new(),
            explosions: Vec::new(),
            knockouts_a: 0,
            knockouts_b: 0,
            round_timer: Timer::new(config.round_duration_secs),
            spawn_timer: Timer::new(config.powerup_interval_secs),
            events: Vec::new(),
            tick: 0,
            next_powerup_id: 1,
        }
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn time_left(&self) -> f32 {
        self.round_timer.time_left()
    }

    pub fn is_finished(&self) -> bool {
        self.round_timer.done()
    }

    pub fn knockouts(&self, team: Team) -> i32 {
        match team {
            Team::TeamA => self.knockouts_a,
            Team::TeamB => self.knockouts_b,
        }
    }

    pub fn score(&self, team: Team) -> TeamScore {
        let squares = self.grid.count(SquareTeam::from(team)) as i32;
        TeamScore::new(squares, self.knockouts(team))
    }

    /// Team with the higher score, `None` on a tie.
    pub fn winner(&self) -> Option<Team> {
        let a = self.score(Team::TeamA).score;
        let b = self.score(Team::TeamB).score;
        match a.cmp(&b) {
            std::cmp::Ordering::Greater => Some(Team::TeamA),
            std::cmp::Ordering::Less => Some(Team::TeamB),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn step(&mut self, dt: f32, input: &[InputEvent]) {
        if self.is_finished() {
            return;
        }
        let dt = clamp_frame_dt(dt);
        self.tick += 1;

        self.update_controllers(dt, input);
        self.update_players(dt);
        self.update_squares(dt);
        self.update_powerups(dt);
        self.update_timers(dt);

        debug_assert!(self.players.iter().all(|player| {
            self.powerups
                .iter()
                .filter(|powerup| powerup.holder == Some(player.id))
                .count()
                <= 1
        }));
    }

    pub fn release_keys(&mut self, input: &[InputEvent]) {
        if let Some(controller) = self.controllers.get_mut(self.human.0) {
            controller.release_keys(input);
        }
    }

    fn update_timers(&mut self, dt: f32) {
        self.spawn_timer.update(dt);
        if self.spawn_timer.done() {
            self.spawn_timer.restart();
            self.spawn_powerup();
        }
        self.round_timer.update(dt);
    }

    /// Knocks a player out, destroying whatever it held.
    pub fn knock_out(&mut self, id: PlayerId) {
        let Some(player) = self.players.get_mut(id.0) else {
            return;
        };
        if player.is_knocked_out() {
            return;
        }
        if let Some(held) = player.held {
            self.powerups.retain(|powerup| powerup.id != held);
        }
        player.knock_out();
        let team = player.team;
        match team {
            Team::TeamA => self.knockouts_a += 1,
            Team::TeamB => self.knockouts_b += 1,
        }
        debug!(player = id.0, ?team, "knockout");
        self.events.push(RuntimeEvent::Knockout {
            player_id: id,
            team,
        });
    }

    fn held_kind(&self, idx: usize) -> Option<PowerupKind> {
        let held = self.players[idx].held?;
        self.powerups
            .iter()
            .find(|powerup| powerup.id == held)
            .map(Powerup::kind)
    }

    pub fn drain_events(&mut self) -> Vec<RuntimeEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> Snapshot {
        let squares = self
            .grid
            .squares()
            .iter()
            .map(|square| SquareView {
                x: square.coord.0,
                y: square.coord.1,
                team: square.team,
                owner: square.owner,
            })
            .collect();
        let players = self
            .players
            .iter()
            .enumerate()
            .map(|(idx, player)| PlayerView {
                id: player.id,
                team: player.team,
                x: player.pos.x,
                y: player.pos.y,
                facing: player.facing,
                state: player.state,
                ai: self.controllers[idx].is_ai(),
                held: self.held_kind(idx),
                square_count: player.squares.len(),
            })
            .collect();
        let powerups = self
            .powerups
            .iter()
            .filter(|powerup| powerup.on_ground())
            .map(|powerup| PowerupView {
                id: powerup.id,
                kind: powerup.kind(),
                x: powerup.coord.0,
                y: powerup.coord.1,
                armed: powerup.is_armed(),
            })
            .collect();
        let fuses = self
            .powerups
            .iter()
            .filter_map(|powerup| {
                powerup.fuse_left().map(|time_left| HazardView {
                    x: powerup.coord.0,
                    y: powerup.coord.1,
                    time_left,
                })
            })
            .collect();
        Snapshot {
            tick: self.tick,
            time_left: self.time_left(),
            squares,
            players,
            powerups,
            bullets: self
                .bullets
                .iter()
                .map(|bullet| BulletView {
                    x: bullet.pos.x,
                    y: bullet.pos.y,
                    dir: bullet.dir,
                })
                .collect(),
            fuses,
            explosions: self
                .explosions
                .iter()
                .map(|explosion| HazardView {
                    x: explosion.coord.0,
                    y: explosion.coord.1,
                    time_left: explosion.time_left(),
                })
                .collect(),
            team_a: self.score(Team::TeamA),
            team_b: self.score(Team::TeamB),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FRAME_DT;
    use crate::controller::Key;
    use crate::square::Claim;
    use crate::test_support::{level_with, OPEN};
    use crate::types::{Direction, MotionState, Vec2};

    const RINGED: &str = "
1.......
........
...#....
..%.....
........
........
........
.......2
";

    const WALLED_IN: &str = "
1#######
########
########
########
########
########
########
#######2
";

    fn round(world: &str, powerups: &[&str], dumbness: u32) -> Round {
        let level = level_with(world, powerups, dumbness);
        Round::new(&level, 0, &RoundConfig::default(), HumanSlot::Input, 7)
    }

    fn run(round: &mut Round, secs: f32) {
        let ticks = (secs / FRAME_DT).ceil() as usize;
        for _ in 0..ticks {
            round.step(FRAME_DT, &[]);
        }
    }

    fn paint(round: &mut Round, coord: Coord, team: Team) {
        let id = round.grid.id_at(coord).expect("addressable");
        let previous_team = round.grid.square(id).team;
        let owner = PlayerId(0);
        round.grid.squares_mut()[id.0].team = SquareTeam::from(team);
        round.grid.squares_mut()[id.0].owner = Some(owner);
        round.grid.record_claim(&Claim {
            square: id,
            previous_team,
            previous_owner: None,
            owner,
            team,
        });
        round.players[0].squares.insert(id);
    }

    fn lit_can(round: &mut Round, coord: Coord) {
        let id = PowerupId(900);
        let mut can = Powerup::new(id, PowerupKind::GasCan, (0, 0));
        let dropper = Player::new(PlayerId(99), Team::TeamA, coord);
        can.holder = Some(dropper.id);
        can.use_by(&dropper);
        round.powerups.push(can);
    }

    #[test]
    fn players_are_seated_on_spawns() {
        let round = round(OPEN, &["gun"], 0);
        assert_eq!(round.players().len(), 2);
        assert_eq!(round.players()[0].team, Team::TeamA);
        assert!(!round.controllers[0].is_ai());
        assert!(round.controllers[1].is_ai());
        assert_eq!(round.players()[1].coord(), (7, 7));
    }

    #[test]
    fn autopilot_slot_is_reported_as_ai() {
        let level = level_with(OPEN, &["gun"], 0);
        let round = Round::new(&level, 0, &RoundConfig::default(), HumanSlot::Autopilot, 7);
        assert!(round.snapshot().players.iter().all(|player| player.ai));
    }

    #[test]
    fn largest_dumbness_steps_without_panicking() {
        let mut round = round(OPEN, &["gun"], u32::MAX);
        run(&mut round, 1.0);
        assert_eq!(round.players()[1].coord(), (7, 7));
    }

    #[test]
    fn extra_spawns_get_ai_players() {
        let level = crate::level::builtin("death")
            .expect("death exists")
            .expect("death parses");
        let round = Round::new(&level, 0, &RoundConfig::default(), HumanSlot::Input, 1);
        let ai_count = round.controllers.iter().filter(|controller| controller.is_ai()).count();
        assert_eq!(round.players().len(), 4);
        assert_eq!(ai_count, 3);
    }

    #[test]
    fn gas_can_blast_resets_diamond_and_spares_fixed_cells() {
        let mut round = round(RINGED, &["gun"], 1_000_000);
        for x in 1..6 {
            for y in 1..6 {
                let team = round.grid.square_at((x, y)).map(|square| square.team);
                if team == Some(SquareTeam::Neutral) {
                    paint(&mut round, (x, y), Team::TeamA);
                }
            }
        }
        let before = round.grid.count(SquareTeam::TeamA);
        lit_can(&mut round, (3, 3));
        run(&mut round, 1.05);

        let diamond = round.grid.neighbors((3, 3), true);
        for cell in &diamond {
            let team = round.grid.square_at(*cell).map(|square| square.team);
            assert!(matches!(team, Some(SquareTeam::Neutral | SquareTeam::Gravel)));
        }
        assert!(diamond.contains(&(2, 3)));
        assert!(!diamond.contains(&(3, 2)));
        assert_eq!(
            round.grid.square_at((2, 3)).map(|square| square.team),
            Some(SquareTeam::Gravel)
        );
        assert!(round.grid.is_obstacle((3, 2)));
        assert_eq!(
            round.grid.square_at((3, 3)).map(|square| square.team),
            Some(SquareTeam::Neutral)
        );
        // Own cell plus every diamond cell except the gravel one.
        assert_eq!(round.grid.count(SquareTeam::TeamA), before - diamond.len());
        assert_eq!(
            round.grid.square_at((5, 5)).map(|square| square.team),
            Some(SquareTeam::TeamA)
        );
        assert!(round
            .drain_events()
            .iter()
            .any(|event| matches!(event, RuntimeEvent::Explosion { x: 3, y: 3 })));
    }

    #[test]
    fn explosion_knocks_out_players_in_blast() {
        let mut round = round(OPEN, &["gun"], 1_000_000);
        round.players[1].pos = Vec2::new(32.0, 24.0);
        lit_can(&mut round, (3, 3));
        run(&mut round, 1.05);
        assert_eq!(round.players[1].state, MotionState::KnockedOut);
        assert_eq!(round.knockouts(Team::TeamB), 1);
        assert_eq!(round.score(Team::TeamB).score, -1);
    }

    #[test]
    fn bullet_knocks_out_rival_in_line() {
        let mut round = round(OPEN, &["gun"], 1_000_000);
        round.players[0].pos = Vec2::new(8.0, 24.0);
        round.players[0].facing = Direction::Right;
        round.players[1].pos = Vec2::new(40.0, 24.0);
        let gun = Powerup::new(PowerupId(50), PowerupKind::Gun, (1, 3));
        round.powerups.push(gun);
        round.step(FRAME_DT, &[]);
        assert_eq!(round.players[0].held, Some(PowerupId(50)));

        round.step(FRAME_DT, &[InputEvent::KeyDown(Key::Shoot)]);
        assert!(round.players[0].held.is_none());
        assert_eq!(round.bullets.len(), 1);
        run(&mut round, 1.5);
        assert!(round.bullets.is_empty());
        assert_eq!(round.knockouts(Team::TeamB), 1);
        assert!(round.players[1].is_knocked_out() || round.players[1].pos == round.players[1].spawn);
    }

    #[test]
    fn new_pickup_discards_held_item() {
        let mut round = round(OPEN, &["gun"], 1_000_000);
        round.players[0].pos = Vec2::new(8.0, 0.0);
        round.powerups.push(Powerup::new(PowerupId(60), PowerupKind::Gun, (1, 0)));
        round.step(FRAME_DT, &[]);
        assert_eq!(round.players[0].held, Some(PowerupId(60)));

        round.players[0].pos = Vec2::new(16.0, 0.0);
        round.powerups.push(Powerup::new(PowerupId(61), PowerupKind::GasCan, (2, 0)));
        round.step(FRAME_DT, &[]);
        assert_eq!(round.players[0].held, Some(PowerupId(61)));
        assert!(round.powerups.iter().all(|powerup| powerup.id != PowerupId(60)));
    }

    #[test]
    fn armed_barbwire_catches_rival_only() {
        let mut round = round(OPEN, &["gun"], 1_000_000);
        round.players[0].pos = Vec2::new(24.0, 24.0);
        round.powerups.push(Powerup::new(PowerupId(70), PowerupKind::Barbwire, (3, 3)));
        round.step(FRAME_DT, &[]);
        assert!(round.powerups[0].is_armed());
        assert!(!round.players[0].is_knocked_out());

        round.players[1].pos = Vec2::new(24.0, 24.0);
        round.step(FRAME_DT, &[]);
        assert!(round.players[1].is_knocked_out());
        assert!(!round.players[0].is_knocked_out());
    }

    #[test]
    fn speedup_boosts_and_claims_on_the_run() {
        let mut round = round(OPEN, &["speedup"], 1_000_000);
        round.players[0].pos = Vec2::new(24.0, 24.0);
        round.powerups.push(Powerup::new(PowerupId(80), PowerupKind::Speedup, (3, 3)));
        round.step(FRAME_DT, &[]);
        assert!(round.powerups.is_empty());
        assert!(round.players[0].is_boosted());
        run(&mut round, 2.5);
        assert!(!round.players[0].is_boosted());
        assert!(round.grid.count(SquareTeam::TeamA) >= 3);
    }

    #[test]
    fn knocked_out_player_drops_held_item() {
        let mut round = round(OPEN, &["gun"], 1_000_000);
        round.players[0].pos = Vec2::new(8.0, 0.0);
        round.powerups.push(Powerup::new(PowerupId(90), PowerupKind::Gun, (1, 0)));
        round.step(FRAME_DT, &[]);
        round.knock_out(PlayerId(0));
        assert!(round.powerups.is_empty());
        assert!(round.players[0].held.is_none());
        round.knock_out(PlayerId(0));
        assert_eq!(round.knockouts(Team::TeamA), 1);
    }

    #[test]
    fn powerups_spawn_on_clear_cells() {
        let mut round = round(OPEN, &["gun", "gas_can"], 1_000_000);
        run(&mut round, 2.05);
        assert_eq!(round.powerups.len(), 1);
        let coord = round.powerups[0].coord;
        assert!(round.grid.is_passable(coord));
        assert!(round
            .drain_events()
            .iter()
            .any(|event| matches!(event, RuntimeEvent::PowerupSpawned { .. })));
    }

    #[test]
    fn spawn_gives_up_without_clear_cell() {
        let mut round = round(WALLED_IN, &["gun"], 0);
        run(&mut round, 6.0);
        assert!(round.powerups.is_empty());
    }

    #[test]
    fn round_finishes_and_freezes() {
        let level = level_with(OPEN, &["gun"], 1_000_000);
        let config = RoundConfig {
            round_duration_secs: 1.0,
            ..RoundConfig::default()
        };
        let mut round = Round::new(&level, 0, &config, HumanSlot::Input, 3);
        run(&mut round, 1.1);
        assert!(round.is_finished());
        let tick = round.snapshot().tick;
        round.step(FRAME_DT, &[]);
        assert_eq!(round.snapshot().tick, tick);
        assert_eq!(round.winner(), None);
    }

    #[test]
    fn snapshot_serializes_scores() {
        let round = round(OPEN, &["gun"], 0);
        let value = serde_json::to_value(round.snapshot()).expect("snapshot serializes");
        assert_eq!(value["squares"].as_array().map(Vec::len), Some(64));
        assert_eq!(value["teamA"]["score"], 0);
        assert_eq!(value["players"][1]["ai"], true);
    }
}
