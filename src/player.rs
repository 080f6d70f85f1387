use std::collections::{BTreeSet, VecDeque};

use crate::constants::{
    cell_origin, BOOST_MULTIPLIER, CELL_SIZE, CELL_SIZE_F, GRID_SIZE, HALF_CELL,
    KNOCKOUT_RETURN_SPEED, PLAY_AREA, PLAYER_SPEED,
};
use crate::grid::Grid;
use crate::types::{
    Command, Coord, Direction, MotionState, PlayerId, PowerupId, Rect, SquareId, Team, Vec2,
};

#[derive(Clone, Debug)]
pub struct Player {
    pub id: PlayerId,
    pub team: Team,
    pub pos: Vec2,
    pub spawn: Vec2,
    pub moving: [i32; 2],
    pub facing: Direction,
    pub state: MotionState,
    pub held: Option<PowerupId>,
    pub squares: BTreeSet<SquareId>,
    boost_dir: Option<Direction>,
    pending: VecDeque<Command>,
    shoot_requested: bool,
    strafing: bool,
}

impl Player {
    pub fn new(id: PlayerId, team: Team, spawn: Coord) -> Self {
        let (x, y) = cell_origin(spawn);
        let facing = if spawn.0 < GRID_SIZE / 2 {
            Direction::Right
        } else {
            Direction::Left
        };
        Self {
            id,
            team,
            pos: Vec2::new(x, y),
            spawn: Vec2::new(x, y),
            moving: [0, 0],
            facing,
            state: MotionState::Normal,
            held: None,
            squares: BTreeSet::new(),
            boost_dir: None,
            pending: VecDeque::new(),
            shoot_requested: false,
            strafing: false,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, CELL_SIZE_F, CELL_SIZE_F)
    }

    pub fn center(&self) -> Vec2 {
        self.rect().center()
    }

    pub fn coord(&self) -> Coord {
        let center = self.center();
        (
            (center.x / CELL_SIZE_F).floor() as i32,
            (center.y / CELL_SIZE_F).floor() as i32,
        )
    }

    fn phase(&self) -> (i32, i32) {
        (
            (self.pos.x.floor() as i32).rem_euclid(CELL_SIZE),
            (self.pos.y.floor() as i32).rem_euclid(CELL_SIZE),
        )
    }

    pub fn aligned(&self) -> bool {
        self.phase() == (0, 0)
    }

    pub fn half_aligned(&self) -> bool {
        matches!(
            self.phase(),
            (0, HALF_CELL) | (HALF_CELL, 0) | (HALF_CELL, HALF_CELL)
        )
    }

    pub fn is_knocked_out(&self) -> bool {
        self.state == MotionState::KnockedOut
    }

    pub fn is_boosted(&self) -> bool {
        self.state == MotionState::Boosted
    }

    #[cfg(test)]
    fn pending_commands(&self) -> usize {
        self.pending.len()
    }

    pub fn receive<I>(&mut self, commands: I)
    where
        I: IntoIterator<Item = Command>,
    {
        for command in commands {
            if self.is_knocked_out() {
                continue;
            }
            if command == Command::Shoot {
                self.shoot_requested = true;
            } else {
                self.pending.push_back(command);
            }
        }
    }

    pub fn take_shoot_request(&mut self) -> bool {
        std::mem::take(&mut self.shoot_requested)
    }

    /// Stage two: apply queued motion commands, only while cell-aligned.
    ///
    /// Returns true when at least one command was applied; the player is then
    /// snapped onto the exact cell origin.
    pub fn apply_pending(&mut self) -> bool {
        if self.state != MotionState::Normal || !self.aligned() || self.pending.is_empty() {
            return false;
        }
        while let Some(command) = self.pending.pop_front() {
            self.apply(command);
        }
        self.moving[0] = self.moving[0].clamp(-1, 1);
        self.moving[1] = self.moving[1].clamp(-1, 1);
        self.snap_to_cell();
        true
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Up => {
                self.moving[1] -= 1;
                self.face(Direction::Up);
            }
            Command::StopUp => {
                if self.moving[1] < 0 {
                    self.moving[1] += 1;
                }
            }
            Command::Down => {
                self.moving[1] += 1;
                self.face(Direction::Down);
            }
            Command::StopDown => {
                if self.moving[1] > 0 {
                    self.moving[1] -= 1;
                }
            }
            Command::Left => {
                self.moving[0] -= 1;
                self.face(Direction::Left);
            }
            Command::StopLeft => {
                if self.moving[0] < 0 {
                    self.moving[0] += 1;
                }
            }
            Command::Right => {
                self.moving[0] += 1;
                self.face(Direction::Right);
            }
            Command::StopRight => {
                if self.moving[0] > 0 {
                    self.moving[0] -= 1;
                }
            }
            Command::Strafe => self.strafing = true,
            Command::StopStrafe => self.strafing = false,
            Command::Shoot => self.shoot_requested = true,
        }
    }

    fn face(&mut self, dir: Direction) {
        if !self.strafing {
            self.facing = dir;
        }
    }

    fn snap_to_cell(&mut self) {
        self.pos.x = (self.pos.x / CELL_SIZE_F).floor() * CELL_SIZE_F;
        self.pos.y = (self.pos.y / CELL_SIZE_F).floor() * CELL_SIZE_F;
    }

    pub fn velocity(&self) -> Vec2 {
        match self.state {
            MotionState::KnockedOut => Vec2::default(),
            MotionState::Boosted => {
                let Some(dir) = self.boost_dir else {
                    return Vec2::default();
                };
                let (dx, dy) = dir.delta();
                let speed = PLAYER_SPEED * BOOST_MULTIPLIER;
                Vec2::new(dx as f32 * speed, dy as f32 * speed)
            }
            MotionState::Normal => {
                // Horizontal intent wins over vertical.
                if self.moving[0] != 0 {
                    Vec2::new(self.moving[0].signum() as f32 * PLAYER_SPEED, 0.0)
                } else if self.moving[1] != 0 {
                    Vec2::new(0.0, self.moving[1].signum() as f32 * PLAYER_SPEED)
                } else {
                    Vec2::default()
                }
            }
        }
    }

    /// Moves by `velocity * dt`, resolving each axis on its own against
    /// obstacles and the play-area edge. Returns true when anything blocked
    /// the move; an active boost is cancelled in that case.
    pub fn integrate(&mut self, dt: f32, grid: &Grid) -> bool {
        let velocity = self.velocity();
        let mut blocked = false;

        if velocity.x != 0.0 {
            self.pos.x += velocity.x * dt;
            blocked |= self.resolve_x(velocity.x, grid);
        }
        if velocity.y != 0.0 {
            self.pos.y += velocity.y * dt;
            blocked |= self.resolve_y(velocity.y, grid);
        }

        if blocked && self.is_boosted() {
            self.cancel_boost();
        }
        blocked
    }

    fn resolve_x(&mut self, vx: f32, grid: &Grid) -> bool {
        let mut blocked = false;
        let rect = self.rect();
        for obstacle in grid.obstacle_rects() {
            if !rect.overlaps(&obstacle) {
                continue;
            }
            self.pos.x = if vx > 0.0 {
                obstacle.x - CELL_SIZE_F
            } else {
                obstacle.right()
            };
            blocked = true;
        }
        let clamped = self.pos.x.clamp(0.0, PLAY_AREA - CELL_SIZE_F);
        if clamped != self.pos.x {
            self.pos.x = clamped;
            blocked = true;
        }
        blocked
    }

    fn resolve_y(&mut self, vy: f32, grid: &Grid) -> bool {
        let mut blocked = false;
        let rect = self.rect();
        for obstacle in grid.obstacle_rects() {
            if !rect.overlaps(&obstacle) {
                continue;
            }
            self.pos.y = if vy > 0.0 {
                obstacle.y - CELL_SIZE_F
            } else {
                obstacle.bottom()
            };
            blocked = true;
        }
        let clamped = self.pos.y.clamp(0.0, PLAY_AREA - CELL_SIZE_F);
        if clamped != self.pos.y {
            self.pos.y = clamped;
            blocked = true;
        }
        blocked
    }

    pub fn start_boost(&mut self, dir: Direction) {
        self.snap_to_cell();
        self.state = MotionState::Boosted;
        self.boost_dir = Some(dir);
        self.facing = dir;
        self.moving = [0, 0];
        self.pending.clear();
    }

    pub fn cancel_boost(&mut self) {
        if !self.is_boosted() {
            return;
        }
        self.state = MotionState::Normal;
        self.boost_dir = None;
        self.moving = [0, 0];
        self.snap_to_cell();
    }

    pub fn knock_out(&mut self) {
        self.state = MotionState::KnockedOut;
        self.boost_dir = None;
        self.moving = [0, 0];
        self.pending.clear();
        self.shoot_requested = false;
        self.strafing = false;
        self.held = None;
    }

    pub fn return_to_spawn(&mut self, dt: f32) -> bool {
        if !self.is_knocked_out() {
            return false;
        }
        let to_spawn = self.spawn.sub(self.pos);
        let distance = to_spawn.length_sq().sqrt();
        let step = KNOCKOUT_RETURN_SPEED * dt;
        if distance <= step {
            self.pos = self.spawn;
            self.state = MotionState::Normal;
            return true;
        }
        self.pos.x += to_spawn.x / distance * step;
        self.pos.y += to_spawn.y / distance * step;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CLAIM_DEBOUNCE_SECS;
    use crate::test_support::{level_from, OPEN};

    fn open_grid() -> Grid {
        Grid::from_level(&level_from(OPEN), CLAIM_DEBOUNCE_SECS)
    }

    fn player_at(x: f32, y: f32) -> Player {
        let mut player = Player::new(PlayerId(0), Team::TeamA, (0, 0));
        player.pos = Vec2::new(x, y);
        player
    }

    #[test]
    fn alignment_uses_integer_part_of_position() {
        assert!(player_at(8.0, 16.0).aligned());
        assert!(player_at(8.5, 16.0).aligned());
        assert!(!player_at(9.0, 16.0).aligned());
        assert!(player_at(12.2, 16.0).half_aligned());
        assert!(!player_at(12.2, 16.0).aligned());
    }

    #[test]
    fn unaligned_commands_wait_for_next_aligned_tick() {
        let grid = open_grid();
        let mut player = player_at(3.0, 0.0);
        player.moving = [1, 0];
        player.receive([Command::StopRight, Command::Left]);
        assert!(!player.apply_pending());
        assert_eq!(player.moving, [1, 0]);

        let mut ticks = 0;
        while !player.aligned() {
            player.integrate(1.0 / 60.0, &grid);
            ticks += 1;
            assert!(ticks < 200, "never reached alignment");
        }
        assert_eq!(player.moving, [1, 0]);
        assert!(player.apply_pending());
        assert_eq!(player.moving, [-1, 0]);
        assert_eq!(player.pos.x, 8.0);
        assert_eq!(player.facing, Direction::Left);
    }

    #[test]
    fn stale_stop_does_not_cancel_newer_direction() {
        let mut player = player_at(0.0, 0.0);
        player.receive([Command::Right, Command::StopRight, Command::Left, Command::StopRight]);
        player.apply_pending();
        assert_eq!(player.moving, [-1, 0]);
    }

    #[test]
    fn intent_is_clamped_and_horizontal_wins() {
        let mut player = player_at(8.0, 8.0);
        player.receive([Command::Right, Command::Right, Command::Down]);
        player.apply_pending();
        assert_eq!(player.moving, [1, 1]);
        let velocity = player.velocity();
        assert_eq!(velocity.x, PLAYER_SPEED);
        assert_eq!(velocity.y, 0.0);
    }

    #[test]
    fn shoot_is_flagged_not_queued() {
        let mut player = player_at(3.0, 0.0);
        player.receive([Command::Shoot, Command::Up]);
        assert_eq!(player.pending_commands(), 1);
        assert!(player.take_shoot_request());
        assert!(!player.take_shoot_request());
    }

    #[test]
    fn strafe_keeps_facing() {
        let mut player = player_at(0.0, 0.0);
        player.facing = Direction::Right;
        player.receive([Command::Strafe, Command::Up]);
        player.apply_pending();
        assert_eq!(player.facing, Direction::Right);
        player.receive([Command::StopStrafe, Command::StopUp, Command::Down]);
        player.apply_pending();
        assert_eq!(player.facing, Direction::Down);
    }

    #[test]
    fn obstacle_clamps_leading_edge() {
        let grid = Grid::from_level(
            &level_from("1.#.....\n........\n........\n........\n........\n........\n........\n.......2"),
            CLAIM_DEBOUNCE_SECS,
        );
        let mut player = player_at(8.0, 0.0);
        player.moving = [1, 0];
        let mut blocked = false;
        for _ in 0..120 {
            blocked |= player.integrate(1.0 / 60.0, &grid);
        }
        assert!(blocked);
        assert_eq!(player.pos.x, 8.0);
    }

    #[test]
    fn boundary_clamp_cancels_boost() {
        let grid = open_grid();
        let mut player = player_at(48.0, 0.0);
        player.start_boost(Direction::Right);
        let mut blocked = false;
        for _ in 0..60 {
            blocked |= player.integrate(1.0 / 60.0, &grid);
            if blocked {
                break;
            }
        }
        assert!(blocked);
        assert_eq!(player.state, MotionState::Normal);
        assert_eq!(player.pos.x, PLAY_AREA - CELL_SIZE_F);
        assert_eq!(player.moving, [0, 0]);
    }

    #[test]
    fn boosted_player_ignores_queued_turns() {
        let grid = open_grid();
        let mut player = player_at(0.0, 0.0);
        player.start_boost(Direction::Down);
        player.receive([Command::Right]);
        assert!(!player.apply_pending());
        player.integrate(0.05, &grid);
        assert_eq!(player.pos.x, 0.0);
        assert!(player.pos.y > 0.0);
    }

    #[test]
    fn knocked_out_player_returns_to_spawn() {
        let mut player = Player::new(PlayerId(1), Team::TeamB, (7, 7));
        player.pos = Vec2::new(8.0, 8.0);
        player.knock_out();
        player.receive([Command::Up]);
        assert_eq!(player.pending_commands(), 0);
        let mut arrived = false;
        for _ in 0..400 {
            if player.return_to_spawn(0.05) {
                arrived = true;
                break;
            }
        }
        assert!(arrived);
        assert_eq!(player.pos, player.spawn);
        assert_eq!(player.state, MotionState::Normal);
    }
}
