use crate::constants::{
    cell_origin, BARBWIRE_WINDOW_SECS, BULLET_SIZE, BULLET_SPEED, CELL_SIZE_F,
    EXPLOSION_DEADLY_SECS, EXPLOSION_LIFETIME_SECS, GAS_CAN_FUSE_SECS, PLAY_AREA,
};
use crate::grid::Grid;
use crate::player::Player;
use crate::rng::Rng;
use crate::timer::Timer;
use crate::types::{Coord, Direction, PlayerId, PowerupId, PowerupKind, Rect, Vec2};

#[derive(Clone, Debug)]
pub enum Item {
    Speedup,
    Gun,
    GasCan { fuse: Option<Timer> },
    Barbwire { owner: Option<PlayerId>, window: Option<Timer> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchOutcome {
    Ignore,
    Boost,
    Equip,
    Arm,
    Knockout,
}

#[derive(Clone, Debug)]
pub enum UseOutcome {
    Fire(Bullet),
    LightFuse(Coord),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemTick {
    Idle,
    Detonate(Coord),
    Expired,
}

#[derive(Clone, Debug)]
pub struct Powerup {
    pub id: PowerupId,
    pub coord: Coord,
    pub holder: Option<PlayerId>,
    pub item: Item,
}

impl Powerup {
    pub fn new(id: PowerupId, kind: PowerupKind, coord: Coord) -> Self {
        let item = match kind {
            PowerupKind::Speedup => Item::Speedup,
            PowerupKind::Gun => Item::Gun,
            PowerupKind::GasCan => Item::GasCan { fuse: None },
            PowerupKind::Barbwire => Item::Barbwire {
                owner: None,
                window: None,
            },
        };
        Self {
            id,
            coord,
            holder: None,
            item,
        }
    }

    pub fn kind(&self) -> PowerupKind {
        match self.item {
            Item::Speedup => PowerupKind::Speedup,
            Item::Gun => PowerupKind::Gun,
            Item::GasCan { .. } => PowerupKind::GasCan,
            Item::Barbwire { .. } => PowerupKind::Barbwire,
        }
    }

    pub fn rect(&self) -> Rect {
        let (x, y) = cell_origin(self.coord);
        Rect::new(x, y, CELL_SIZE_F, CELL_SIZE_F)
    }

    pub fn on_ground(&self) -> bool {
        self.holder.is_none()
    }

    pub fn is_armed(&self) -> bool {
        match &self.item {
            Item::GasCan { fuse } => fuse.is_some(),
            Item::Barbwire { owner, .. } => owner.is_some(),
            _ => false,
        }
    }

    pub fn fuse_left(&self) -> Option<f32> {
        match &self.item {
            Item::GasCan { fuse: Some(fuse) } => Some(fuse.time_left()),
            _ => None,
        }
    }

    pub fn touches(&self, player: &Player) -> bool {
        self.on_ground() && !player.is_knocked_out() && self.rect().contains_point(player.center())
    }

    /// Applies a touch from `player`, who must already satisfy [`Powerup::touches`].
    ///
    /// Pickups need the toucher to be cell-aligned; barbwire reacts to any touch.
    pub fn touch(&mut self, player: &Player) -> TouchOutcome {
        match &mut self.item {
            Item::Speedup if player.aligned() && !player.is_boosted() => TouchOutcome::Boost,
            Item::Gun | Item::GasCan { fuse: None } if player.aligned() => TouchOutcome::Equip,
            Item::Barbwire { owner, window } => match *owner {
                None => {
                    *owner = Some(player.id);
                    *window = Some(Timer::new(BARBWIRE_WINDOW_SECS));
                    TouchOutcome::Arm
                }
                Some(id) if id != player.id => TouchOutcome::Knockout,
                Some(_) => TouchOutcome::Ignore,
            },
            _ => TouchOutcome::Ignore,
        }
    }

    pub fn use_by(&mut self, player: &Player) -> Option<UseOutcome> {
        match &mut self.item {
            Item::Gun => Some(UseOutcome::Fire(Bullet::fired_by(player))),
            Item::GasCan { fuse } => {
                let coord = player.coord();
                *fuse = Some(Timer::new(GAS_CAN_FUSE_SECS));
                self.holder = None;
                self.coord = coord;
                Some(UseOutcome::LightFuse(coord))
            }
            _ => None,
        }
    }

    pub fn update(&mut self, dt: f32) -> ItemTick {
        match &mut self.item {
            Item::GasCan { fuse: Some(fuse) } => {
                fuse.update(dt);
                if fuse.done() {
                    ItemTick::Detonate(self.coord)
                } else {
                    ItemTick::Idle
                }
            }
            Item::Barbwire {
                window: Some(window),
                ..
            } => {
                window.update(dt);
                if window.done() {
                    ItemTick::Expired
                } else {
                    ItemTick::Idle
                }
            }
            _ => ItemTick::Idle,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Bullet {
    pub owner: PlayerId,
    pub pos: Vec2,
    pub dir: Direction,
}

impl Bullet {
    pub fn fired_by(player: &Player) -> Self {
        let center = player.center();
        Self {
            owner: player.id,
            pos: Vec2::new(center.x - BULLET_SIZE / 2.0, center.y - BULLET_SIZE / 2.0),
            dir: player.facing,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, BULLET_SIZE, BULLET_SIZE)
    }

    pub fn update(&mut self, dt: f32) -> bool {
        let (dx, dy) = self.dir.delta();
        self.pos.x += dx as f32 * BULLET_SPEED * dt;
        self.pos.y += dy as f32 * BULLET_SPEED * dt;
        let area = Rect::new(0.0, 0.0, PLAY_AREA, PLAY_AREA);
        area.overlaps(&self.rect())
    }
}

#[derive(Clone, Debug)]
pub struct Explosion {
    pub coord: Coord,
    deadly: Timer,
    life: Timer,
}

impl Explosion {
    pub fn new(coord: Coord) -> Self {
        Self {
            coord,
            deadly: Timer::new(EXPLOSION_DEADLY_SECS),
            life: Timer::new(EXPLOSION_LIFETIME_SECS),
        }
    }

    pub fn rect(&self) -> Rect {
        let (x, y) = cell_origin(self.coord);
        Rect::new(x, y, CELL_SIZE_F, CELL_SIZE_F)
    }

    pub fn is_deadly(&self) -> bool {
        !self.deadly.done()
    }

    pub fn time_left(&self) -> f32 {
        self.life.time_left()
    }

    pub fn update(&mut self, dt: f32) -> bool {
        self.deadly.update(dt);
        self.life.update(dt);
        !self.life.done()
    }
}

/// Cells hit by a gas can going off at `coord`: its own cell plus the
/// passable 12-cell diamond around it.
pub fn blast_cells(grid: &Grid, coord: Coord) -> Vec<Coord> {
    let mut cells = vec![coord];
    cells.extend(grid.neighbors(coord, true));
    cells
}

fn run_length(grid: &Grid, from: Coord, dir: Direction) -> usize {
    let (dx, dy) = dir.delta();
    let mut cell = (from.0 + dx, from.1 + dy);
    let mut length = 0;
    while grid.is_passable(cell) {
        length += 1;
        cell = (cell.0 + dx, cell.1 + dy);
    }
    length
}

/// Boost heading: the four directions ranked by open run length, one of the
/// top two taken at random. `None` when every direction is blocked.
pub fn speedup_direction(grid: &Grid, from: Coord, rng: &mut Rng) -> Option<Direction> {
    let mut ranked: Vec<(Direction, usize)> = Direction::ALL
        .iter()
        .map(|dir| (*dir, run_length(grid, from, *dir)))
        .filter(|(_, length)| *length > 0)
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(2);
    rng.pick(&ranked).map(|(dir, _)| *dir)
}
