use super::*;

impl Round {
    pub(super) fn update_controllers(&mut self, dt: f32, input: &[InputEvent]) {
        for idx in 0..self.players.len() {
            let held = self.held_kind(idx);
            let ctx = ControllerContext {
                me: &self.players[idx],
                players: &self.players,
                grid: &self.grid,
                held,
                input: if PlayerId(idx) == self.human { input } else { &[] },
                dt,
            };
            let commands = self.controllers[idx].update(&ctx, &mut self.rng);
            self.players[idx].receive(commands);
        }
    }

    pub(super) fn update_players(&mut self, dt: f32) {
        for idx in 0..self.players.len() {
            let player = &mut self.players[idx];
            if player.is_knocked_out() {
                if player.return_to_spawn(dt) {
                    debug!(player = idx, "back at spawn");
                    self.events.push(RuntimeEvent::Respawned {
                        player_id: player.id,
                    });
                }
                continue;
            }

            player.apply_pending();
            let was_boosted = player.is_boosted();
            if player.integrate(dt, &self.grid) {
                let interrupt = MotionInterrupt {
                    boost_ended: was_boosted && !player.is_boosted(),
                    moving: player.moving,
                };
                self.controllers[idx].on_motion_input(interrupt);
            }
        }
    }
}
