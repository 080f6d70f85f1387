use crate::constants::{cell_origin, CELL_SIZE_F};
use crate::player::Player;
use crate::timer::Timer;
use crate::types::{Coord, PlayerId, Rect, SquareId, SquareTeam, Team};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Claim {
    pub square: SquareId,
    pub previous_team: SquareTeam,
    pub previous_owner: Option<PlayerId>,
    pub owner: PlayerId,
    pub team: Team,
}

#[derive(Clone, Debug)]
pub struct Square {
    pub id: SquareId,
    pub coord: Coord,
    pub team: SquareTeam,
    pub initial_team: SquareTeam,
    pub occupant: Option<PlayerId>,
    pub owner: Option<PlayerId>,
    claim_timer: Timer,
}

impl Square {
    pub fn new(id: SquareId, coord: Coord, team: SquareTeam, debounce_secs: f32) -> Self {
        Self {
            id,
            coord,
            team,
            initial_team: team,
            occupant: None,
            owner: None,
            claim_timer: Timer::new(debounce_secs),
        }
    }

    pub fn rect(&self) -> Rect {
        let (x, y) = cell_origin(self.coord);
        Rect::new(x, y, CELL_SIZE_F, CELL_SIZE_F)
    }

    #[cfg(test)]
    fn claim_time_left(&self) -> f32 {
        self.claim_timer.time_left()
    }

    /// Runs the occupancy/claim rule once for this frame.
    ///
    /// A new live occupant restarts the debounce (boosted occupants expire
    /// it at once), a departing occupant leaves a debounce-long grace window,
    /// and ownership moves once the debounce has elapsed under one occupant.
    pub fn update(&mut self, dt: f32, players: &[Player]) -> Option<Claim> {
        if !self.team.is_claimable() {
            return None;
        }
        self.claim_timer.update(dt);
        let rect = self.rect();

        let newcomer = players.iter().find(|player| {
            !player.is_knocked_out()
                && Some(player.id) != self.occupant
                && rect.contains_point(player.center())
        });

        if let Some(player) = newcomer {
            self.occupant = Some(player.id);
            self.claim_timer.restart();
            if player.is_boosted() {
                self.claim_timer.end();
            }
        } else if let Some(occupant) = self.occupant {
            let still_here = players
                .iter()
                .find(|player| player.id == occupant)
                .map(|player| !player.is_knocked_out() && rect.contains_point(player.center()))
                .unwrap_or(false);
            if !still_here {
                self.occupant = None;
                self.claim_timer.restart();
            }
        }

        let occupant = self.occupant?;
        if !self.claim_timer.done() || self.owner == Some(occupant) {
            return None;
        }
        let team = players.iter().find(|player| player.id == occupant)?.team;
        let claim = Claim {
            square: self.id,
            previous_team: self.team,
            previous_owner: self.owner,
            owner: occupant,
            team,
        };
        self.team = SquareTeam::from(team);
        self.owner = Some(occupant);
        Some(claim)
    }

    pub fn neutralize(&mut self) -> Option<PlayerId> {
        if !matches!(self.team, SquareTeam::TeamA | SquareTeam::TeamB) {
            return None;
        }
        self.team = SquareTeam::Neutral;
        self.owner.take()
    }
}
