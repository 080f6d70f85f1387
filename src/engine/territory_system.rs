use super::*;

impl Round {
    pub(super) fn update_squares(&mut self, dt: f32) {
        let mut claims = Vec::new();
        for square in self.grid.squares_mut() {
            if let Some(claim) = square.update(dt, &self.players) {
                claims.push(claim);
            }
        }

        for claim in claims {
            self.grid.record_claim(&claim);
            if let Some(previous) = claim.previous_owner {
                if let Some(player) = self.players.get_mut(previous.0) {
                    player.squares.remove(&claim.square);
                }
            }
            if let Some(player) = self.players.get_mut(claim.owner.0) {
                player.squares.insert(claim.square);
            }
            let (x, y) = self.grid.square(claim.square).coord;
            debug!(x, y, team = ?claim.team, player = claim.owner.0, "square claimed");
            self.events.push(RuntimeEvent::SquareClaimed {
                x,
                y,
                team: claim.team,
                player_id: claim.owner,
            });
        }
    }

    pub(super) fn reset_squares(&mut self, cells: &[Coord]) {
        for cell in cells {
            let Some((square, owner)) = self.grid.neutralize(*cell) else {
                continue;
            };
            if let Some(player) = owner.and_then(|owner| self.players.get_mut(owner.0)) {
                player.squares.remove(&square);
            }
            self.events.push(RuntimeEvent::SquareReset {
                x: cell.0,
                y: cell.1,
            });
        }
    }
}
