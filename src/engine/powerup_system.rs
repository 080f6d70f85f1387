use crate::constants::{GRID_SIZE, POWERUP_SPAWN_ATTEMPTS};

use super::*;

impl Round {
    pub(super) fn update_powerups(&mut self, dt: f32) {
        self.resolve_shots();
        self.resolve_touches();
        self.tick_items(dt);
        self.update_bullets(dt);
        self.update_explosions(dt);
    }

    fn resolve_shots(&mut self) {
        for idx in 0..self.players.len() {
            if !self.players[idx].take_shoot_request() {
                continue;
            }
            let player = &mut self.players[idx];
            let Some(held) = player.held else {
                continue;
            };
            let Some(slot) = self.powerups.iter().position(|powerup| powerup.id == held) else {
                player.held = None;
                continue;
            };
            match self.powerups[slot].use_by(player) {
                Some(UseOutcome::Fire(bullet)) => {
                    self.powerups.remove(slot);
                    player.held = None;
                    self.bullets.push(bullet);
                    self.events.push(RuntimeEvent::Shot {
                        player_id: player.id,
                    });
                }
                Some(UseOutcome::LightFuse((x, y))) => {
                    player.held = None;
                    debug!(x, y, player = idx, "gas can lit");
                    self.events.push(RuntimeEvent::FuseLit { x, y });
                }
                None => {}
            }
        }
    }

    fn resolve_touches(&mut self) {
        let mut consumed = Vec::new();
        let mut caught = Vec::new();

        for slot in 0..self.powerups.len() {
            for idx in 0..self.players.len() {
                let powerup = &mut self.powerups[slot];
                let player = &mut self.players[idx];
                if !powerup.touches(player) {
                    continue;
                }
                let kind = powerup.kind();
                match powerup.touch(player) {
                    TouchOutcome::Ignore => {}
                    TouchOutcome::Boost => {
                        consumed.push(powerup.id);
                        self.events.push(RuntimeEvent::PowerupPickedUp {
                            kind,
                            player_id: player.id,
                        });
                        if let Some(dir) = speedup_direction(&self.grid, player.coord(), &mut self.rng)
                        {
                            player.start_boost(dir);
                            self.events.push(RuntimeEvent::SpeedBoost {
                                player_id: player.id,
                                dir,
                            });
                        }
                        break;
                    }
                    TouchOutcome::Equip => {
                        if let Some(old) = player.held.replace(powerup.id) {
                            consumed.push(old);
                        }
                        powerup.holder = Some(player.id);
                        self.events.push(RuntimeEvent::PowerupPickedUp {
                            kind,
                            player_id: player.id,
                        });
                        break;
                    }
                    TouchOutcome::Arm => {
                        let (x, y) = powerup.coord;
                        self.events.push(RuntimeEvent::BarbwireArmed {
                            x,
                            y,
                            player_id: player.id,
                        });
                    }
                    TouchOutcome::Knockout => caught.push(player.id),
                }
            }
        }

        self.powerups.retain(|powerup| !consumed.contains(&powerup.id));
        for id in caught {
            self.knock_out(id);
        }
    }

    fn tick_items(&mut self, dt: f32) {
        let mut detonations = Vec::new();
        self.powerups.retain_mut(|powerup| match powerup.update(dt) {
            ItemTick::Idle => true,
            ItemTick::Detonate(coord) => {
                detonations.push(coord);
                false
            }
            ItemTick::Expired => false,
        });
        for coord in detonations {
            self.detonate(coord);
        }
    }

    pub(super) fn detonate(&mut self, coord: Coord) {
        let cells = blast_cells(&self.grid, coord);
        debug!(x = coord.0, y = coord.1, cells = cells.len(), "explosion");
        self.events.push(RuntimeEvent::Explosion {
            x: coord.0,
            y: coord.1,
        });
        self.explosions
            .extend(cells.iter().copied().map(Explosion::new));
        self.reset_squares(&cells);
    }

    fn update_bullets(&mut self, dt: f32) {
        let mut hits = Vec::new();
        let players = &self.players;
        self.bullets.retain_mut(|bullet| {
            if !bullet.update(dt) {
                return false;
            }
            let rect = bullet.rect();
            let target = players.iter().find(|player| {
                player.id != bullet.owner && !player.is_knocked_out() && player.rect().overlaps(&rect)
            });
            match target {
                Some(player) => {
                    hits.push(player.id);
                    false
                }
                None => true,
            }
        });
        for id in hits {
            self.knock_out(id);
        }
    }

    fn update_explosions(&mut self, dt: f32) {
        let mut burnt = Vec::new();
        for explosion in &self.explosions {
            if !explosion.is_deadly() {
                continue;
            }
            let rect = explosion.rect();
            burnt.extend(
                self.players
                    .iter()
                    .filter(|player| !player.is_knocked_out() && player.rect().overlaps(&rect))
                    .map(|player| player.id),
            );
        }
        for id in burnt {
            self.knock_out(id);
        }
        self.explosions.retain_mut(|explosion| explosion.update(dt));
    }

    pub(super) fn spawn_powerup(&mut self) {
        let Some(kind) = self.rng.pick(&self.level.powerups).copied() else {
            return;
        };
        for _ in 0..POWERUP_SPAWN_ATTEMPTS {
            let coord = (
                self.rng.int(0, GRID_SIZE - 1),
                self.rng.int(0, GRID_SIZE - 1),
            );
            if !self.is_clear(coord) {
                continue;
            }
            let id = PowerupId(self.next_powerup_id);
            self.next_powerup_id += 1;
            self.powerups.push(Powerup::new(id, kind, coord));
            debug!(?kind, x = coord.0, y = coord.1, "powerup spawned");
            self.events.push(RuntimeEvent::PowerupSpawned {
                kind,
                x: coord.0,
                y: coord.1,
            });
            return;
        }
        debug!(?kind, "no clear cell for powerup");
    }

    fn is_clear(&self, coord: Coord) -> bool {
        self.grid.is_passable(coord)
            && !self
                .powerups
                .iter()
                .any(|powerup| powerup.on_ground() && powerup.coord == coord)
            && !self
                .players
                .iter()
                .any(|player| !player.is_knocked_out() && player.coord() == coord)
    }
}
