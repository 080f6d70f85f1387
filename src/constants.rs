pub const GRID_SIZE: i32 = 8;
pub const CELL_SIZE: i32 = 8;
pub const CELL_SIZE_F: f32 = CELL_SIZE as f32;
pub const HALF_CELL: i32 = CELL_SIZE / 2;
pub const PLAY_AREA: f32 = (GRID_SIZE * CELL_SIZE) as f32;

pub const MIN_FRAME_DT: f32 = 0.0005;
pub const MAX_FRAME_DT: f32 = 0.05;
pub const FRAME_DT: f32 = 1.0 / 60.0;

pub const PLAYER_SPEED: f32 = 8.0;
pub const BOOST_MULTIPLIER: f32 = 2.0;
pub const KNOCKOUT_RETURN_SPEED: f32 = 24.0;

pub const CLAIM_DEBOUNCE_SECS: f32 = 0.3;

pub const ROUND_DURATION_SECS: f32 = 64.0;
pub const COUNTDOWN_SECS: f32 = 3.0;
pub const INTRO_DISPLAY_SECS: f32 = 1.0;
pub const POWERUP_SPAWN_INTERVAL_SECS: f32 = 2.0;
pub const POWERUP_SPAWN_ATTEMPTS: usize = 30;

pub const BULLET_SPEED: f32 = 32.0;
pub const BULLET_SIZE: f32 = 2.0;
pub const GAS_CAN_FUSE_SECS: f32 = 1.0;
pub const EXPLOSION_DEADLY_SECS: f32 = 0.6;
pub const EXPLOSION_LIFETIME_SECS: f32 = 0.9;
pub const BARBWIRE_WINDOW_SECS: f32 = 7.0;

pub const AI_FLEE_SECS: f32 = 3.0;
pub const AI_GUN_BAND: f32 = 4.0;
pub const AI_GAS_CAN_RADIUS_SQ: f32 = 96.0;

pub fn clamp_frame_dt(dt: f32) -> f32 {
    if !dt.is_finite() {
        return MIN_FRAME_DT;
    }
    dt.clamp(MIN_FRAME_DT, MAX_FRAME_DT)
}

pub fn cell_origin(coord: (i32, i32)) -> (f32, f32) {
    ((coord.0 * CELL_SIZE) as f32, (coord.1 * CELL_SIZE) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_dt_is_clamped_to_sane_range() {
        assert_eq!(clamp_frame_dt(0.0), MIN_FRAME_DT);
        assert_eq!(clamp_frame_dt(1.0), MAX_FRAME_DT);
        assert_eq!(clamp_frame_dt(f32::NAN), MIN_FRAME_DT);
        assert_eq!(clamp_frame_dt(0.016), 0.016);
    }

    #[test]
    fn boosted_player_cannot_skip_an_alignment_band() {
        assert!(PLAYER_SPEED * BOOST_MULTIPLIER * MAX_FRAME_DT < 1.0);
    }
}
