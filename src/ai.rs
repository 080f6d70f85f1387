use std::collections::{BTreeMap, VecDeque};

use tracing::trace;

use crate::constants::{AI_FLEE_SECS, AI_GAS_CAN_RADIUS_SQ, AI_GUN_BAND, HALF_CELL};
use crate::controller::{ControllerContext, MotionInterrupt};
use crate::grid::Grid;
use crate::player::Player;
use crate::rng::Rng;
use crate::timer::Timer;
use crate::types::{Command, Coord, Direction, PowerupKind, SquareTeam};

/// Breadth-first search from `start`, returning the cells leading to the
/// first discovered cell that satisfies `is_target` (start excluded).
///
/// Neighbors are expanded in the order [`Grid::neighbors`] yields them, so
/// ties between equally short paths follow that order.
pub fn find_path<F>(grid: &Grid, start: Coord, is_target: F) -> Option<Vec<Coord>>
where
    F: Fn(Coord) -> bool,
{
    let mut frontier = VecDeque::from([start]);
    let mut came_from: BTreeMap<Coord, Coord> = BTreeMap::new();
    let mut found = None;

    'search: while let Some(current) = frontier.pop_front() {
        for next in grid.neighbors(current, false) {
            if next == start || came_from.contains_key(&next) {
                continue;
            }
            came_from.insert(next, current);
            if is_target(next) {
                found = Some(next);
                break 'search;
            }
            frontier.push_back(next);
        }
    }

    let mut cell = found?;
    let mut path = vec![cell];
    while let Some(prev) = came_from.get(&cell).copied() {
        if prev == start {
            break;
        }
        path.push(prev);
        cell = prev;
    }
    path.reverse();
    Some(path)
}

pub fn path_commands(start: Coord, path: &[Coord]) -> VecDeque<Command> {
    let mut commands = VecDeque::with_capacity(path.len() * 2);
    let mut current = start;
    for cell in path {
        let Some(dir) = Direction::from_delta((cell.0 - current.0, cell.1 - current.1)) else {
            break;
        };
        commands.push_back(dir.start_command());
        commands.push_back(dir.stop_command());
        current = *cell;
    }
    commands
}

fn manhattan(a: Coord, b: Coord) -> i32 {
    (a.0 - b.0).abs() + (a.1 - b.1).abs()
}

#[derive(Clone, Debug)]
pub struct AiController {
    dumbness: u32,
    path: VecDeque<Command>,
    outbox: Vec<Command>,
    flee: Timer,
    flee_from: Option<Coord>,
    checkpoint: Option<Coord>,
}

impl AiController {
    pub fn new(dumbness: u32) -> Self {
        Self {
            dumbness,
            path: VecDeque::new(),
            outbox: Vec::new(),
            flee: Timer::expired(AI_FLEE_SECS),
            flee_from: None,
            checkpoint: None,
        }
    }

    pub fn is_fleeing(&self) -> bool {
        !self.flee.done()
    }

    #[cfg(test)]
    fn queued_commands(&self) -> usize {
        self.path.len()
    }

    pub fn update(&mut self, ctx: &ControllerContext<'_>, rng: &mut Rng) -> Vec<Command> {
        let me = ctx.me;
        if me.is_knocked_out() {
            self.reset();
            return Vec::new();
        }
        self.flee.update(ctx.dt);
        if self.flee.done() {
            self.flee_from = None;
        }

        let mut out = std::mem::take(&mut self.outbox);
        self.react(ctx, &mut out);

        if me.is_boosted() {
            return out;
        }
        if me.aligned() {
            self.checkpoint = None;
            if self.path.is_empty() && rng.draws_zero(self.dumbness) && self.pathfind(ctx) {
                out.extend(self.path.pop_front());
            }
        } else if me.half_aligned() {
            let mark = checkpoint_of(me);
            if self.checkpoint != Some(mark) {
                self.checkpoint = Some(mark);
                out.extend(self.path.pop_front());
                out.extend(self.path.pop_front());
            }
        }
        out
    }

    pub fn on_motion_input(&mut self, interrupt: MotionInterrupt) {
        self.path.clear();
        self.checkpoint = None;
        let [mx, my] = interrupt.moving;
        if mx > 0 {
            self.outbox.push(Command::StopRight);
        } else if mx < 0 {
            self.outbox.push(Command::StopLeft);
        }
        if my > 0 {
            self.outbox.push(Command::StopDown);
        } else if my < 0 {
            self.outbox.push(Command::StopUp);
        }
    }

    fn reset(&mut self) {
        self.path.clear();
        self.outbox.clear();
        self.checkpoint = None;
        self.flee.end();
        self.flee_from = None;
    }

    fn react(&mut self, ctx: &ControllerContext<'_>, out: &mut Vec<Command>) {
        let Some(rival) = nearest_rival(ctx) else {
            return;
        };
        let me = ctx.me;
        match ctx.held {
            Some(PowerupKind::Gun) if lined_up(me, rival) => {
                trace!(player = me.id.0, target = rival.id.0, "ai fires");
                out.push(Command::Shoot);
            }
            Some(PowerupKind::GasCan) if !self.is_fleeing() => {
                let distance_sq = rival.center().sub(me.center()).length_sq();
                if distance_sq <= AI_GAS_CAN_RADIUS_SQ {
                    trace!(player = me.id.0, "ai drops gas can and runs");
                    out.push(Command::Shoot);
                    self.flee.restart();
                    self.flee_from = Some(me.coord());
                    // Finish the cell in progress, then re-plan an escape.
                    let leading_stop = self.path.pop_front().filter(|command| {
                        matches!(
                            command,
                            Command::StopUp | Command::StopDown | Command::StopLeft | Command::StopRight
                        )
                    });
                    self.path.clear();
                    self.path.extend(leading_stop);
                }
            }
            _ => {}
        }
    }

    pub fn pathfind(&mut self, ctx: &ControllerContext<'_>) -> bool {
        let start = ctx.me.coord();
        let hunt = self.hunt_target(ctx);
        let path = find_path(ctx.grid, start, |cell| self.is_valid_target(ctx, hunt, cell));
        match path {
            Some(path) => {
                trace!(player = ctx.me.id.0, ?start, steps = path.len(), "ai path");
                self.path = path_commands(start, &path);
                true
            }
            None => {
                trace!(player = ctx.me.id.0, ?start, "ai has no path");
                false
            }
        }
    }

    fn hunt_target(&self, ctx: &ControllerContext<'_>) -> Option<Coord> {
        if !matches!(ctx.held, Some(PowerupKind::Gun | PowerupKind::GasCan)) {
            return None;
        }
        let rival = nearest_rival(ctx)?.coord();
        ctx.grid.is_passable(rival).then_some(rival)
    }

    fn is_valid_target(&self, ctx: &ControllerContext<'_>, hunt: Option<Coord>, cell: Coord) -> bool {
        if self.is_fleeing() {
            return match self.flee_from {
                Some(from) => manhattan(cell, from) > 2,
                None => true,
            };
        }
        if let Some(hunt) = hunt {
            return cell == hunt;
        }
        let me = ctx.me;
        let Some(square) = ctx.grid.square_at(cell) else {
            return false;
        };
        let worth_taking = square.team == SquareTeam::Neutral
            || square.team.team() == Some(me.team.rival());
        worth_taking
            && !ctx
                .players
                .iter()
                .any(|other| other.id != me.id && !other.is_knocked_out() && other.coord() == cell)
    }
}

fn checkpoint_of(player: &Player) -> Coord {
    (
        (player.pos.x.floor() as i32).div_euclid(HALF_CELL),
        (player.pos.y.floor() as i32).div_euclid(HALF_CELL),
    )
}

fn nearest_rival<'a>(ctx: &ControllerContext<'a>) -> Option<&'a Player> {
    let me = ctx.me.center();
    ctx.players
        .iter()
        .filter(|other| other.team != ctx.me.team && !other.is_knocked_out())
        .min_by(|a, b| {
            let da = a.center().sub(me).length_sq();
            let db = b.center().sub(me).length_sq();
            da.total_cmp(&db)
        })
}

fn lined_up(me: &Player, target: &Player) -> bool {
    let offset = target.center().sub(me.center());
    match me.facing {
        Direction::Right => offset.y.abs() <= AI_GUN_BAND && offset.x > 0.0,
        Direction::Left => offset.y.abs() <= AI_GUN_BAND && offset.x < 0.0,
        Direction::Down => offset.x.abs() <= AI_GUN_BAND && offset.y > 0.0,
        Direction::Up => offset.x.abs() <= AI_GUN_BAND && offset.y < 0.0,
    }
}
