use std::collections::BTreeSet;

use crate::ai::AiController;
use crate::grid::Grid;
use crate::player::Player;
use crate::rng::Rng;
use crate::types::{Command, Direction, PowerupKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Shoot,
    Strafe,
    Pause,
    Dismiss,
}

impl Key {
    fn direction(self) -> Option<Direction> {
        match self {
            Self::Up => Some(Direction::Up),
            Self::Down => Some(Direction::Down),
            Self::Left => Some(Direction::Left),
            Self::Right => Some(Direction::Right),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
}

pub struct ControllerContext<'a> {
    pub me: &'a Player,
    pub players: &'a [Player],
    pub grid: &'a Grid,
    pub held: Option<PowerupKind>,
    pub input: &'a [InputEvent],
    pub dt: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MotionInterrupt {
    pub boost_ended: bool,
    pub moving: [i32; 2],
}

#[derive(Clone, Debug, Default)]
pub struct HumanController {
    held: BTreeSet<Key>,
    outbox: Vec<Command>,
}

impl HumanController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, input: &[InputEvent]) -> Vec<Command> {
        let mut out = std::mem::take(&mut self.outbox);
        for event in input {
            match *event {
                InputEvent::KeyDown(key) => {
                    if !self.held.insert(key) {
                        continue;
                    }
                    if let Some(dir) = key.direction() {
                        out.push(dir.start_command());
                    } else if key == Key::Shoot {
                        out.push(Command::Shoot);
                    } else if key == Key::Strafe {
                        out.push(Command::Strafe);
                    }
                }
                InputEvent::KeyUp(key) => out.extend(self.release(key)),
            }
        }
        out
    }

    pub fn release_keys(&mut self, input: &[InputEvent]) {
        for event in input {
            if let InputEvent::KeyUp(key) = *event {
                let stop = self.release(key);
                self.outbox.extend(stop);
            }
        }
    }

    fn release(&mut self, key: Key) -> Option<Command> {
        if !self.held.remove(&key) {
            return None;
        }
        match key.direction() {
            Some(dir) => Some(dir.stop_command()),
            None if key == Key::Strafe => Some(Command::StopStrafe),
            None => None,
        }
    }

    /// A boost wipes the player's intent, so directions still held down are
    /// pressed again.
    pub fn on_motion_input(&mut self, interrupt: MotionInterrupt) {
        if !interrupt.boost_ended {
            return;
        }
        let held = self.held.iter().filter_map(|key| key.direction());
        self.outbox.extend(held.map(Direction::start_command));
    }

    pub fn release_all(&mut self) {
        self.held.clear();
        self.outbox.clear();
    }
}

#[derive(Clone, Debug)]
pub enum Controller {
    Human(HumanController),
    Ai(AiController),
}

impl Controller {
    pub fn human() -> Self {
        Self::Human(HumanController::new())
    }

    pub fn ai(dumbness: u32) -> Self {
        Self::Ai(AiController::new(dumbness))
    }

    pub fn is_ai(&self) -> bool {
        matches!(self, Self::Ai(_))
    }

    pub fn update(&mut self, ctx: &ControllerContext<'_>, rng: &mut Rng) -> Vec<Command> {
        match self {
            Self::Human(human) => {
                if ctx.me.is_knocked_out() {
                    human.release_all();
                    return Vec::new();
                }
                human.update(ctx.input)
            }
            Self::Ai(ai) => ai.update(ctx, rng),
        }
    }

    pub fn release_keys(&mut self, input: &[InputEvent]) {
        if let Self::Human(human) = self {
            human.release_keys(input);
        }
    }

    pub fn on_motion_input(&mut self, interrupt: MotionInterrupt) {
        match self {
            Self::Human(human) => human.on_motion_input(interrupt),
            Self::Ai(ai) => ai.on_motion_input(interrupt),
        }
    }
}
