use serde::{Deserialize, Serialize};

pub type Coord = (i32, i32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SquareId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PowerupId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    TeamA,
    TeamB,
}

impl Team {
    pub fn rival(self) -> Self {
        match self {
            Self::TeamA => Self::TeamB,
            Self::TeamB => Self::TeamA,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SquareTeam {
    Neutral,
    TeamA,
    TeamB,
    Obstacle,
    Gravel,
    SpawnA,
    SpawnB,
}

impl SquareTeam {
    pub fn is_claimable(self) -> bool {
        matches!(self, Self::Neutral | Self::TeamA | Self::TeamB)
    }

    pub fn is_passable(self) -> bool {
        matches!(self, Self::Neutral | Self::TeamA | Self::TeamB | Self::Gravel)
    }

    pub fn team(self) -> Option<Team> {
        match self {
            Self::TeamA => Some(Team::TeamA),
            Self::TeamB => Some(Team::TeamB),
            _ => None,
        }
    }
}

impl From<Team> for SquareTeam {
    fn from(team: Team) -> Self {
        match team {
            Team::TeamA => Self::TeamA,
            Team::TeamB => Self::TeamB,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    pub fn delta(self) -> Coord {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    pub fn from_delta(delta: Coord) -> Option<Self> {
        match delta {
            (0, -1) => Some(Self::Up),
            (0, 1) => Some(Self::Down),
            (-1, 0) => Some(Self::Left),
            (1, 0) => Some(Self::Right),
            _ => None,
        }
    }

    pub fn start_command(self) -> Command {
        match self {
            Self::Up => Command::Up,
            Self::Down => Command::Down,
            Self::Left => Command::Left,
            Self::Right => Command::Right,
        }
    }

    pub fn stop_command(self) -> Command {
        match self {
            Self::Up => Command::StopUp,
            Self::Down => Command::StopDown,
            Self::Left => Command::StopLeft,
            Self::Right => Command::StopRight,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Up,
    StopUp,
    Down,
    StopDown,
    Left,
    StopLeft,
    Right,
    StopRight,
    Shoot,
    Strafe,
    StopStrafe,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerupKind {
    Speedup,
    Gun,
    GasCan,
    Barbwire,
}

impl PowerupKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "speedup" => Some(Self::Speedup),
            "gun" => Some(Self::Gun),
            "gas_can" | "gascan" => Some(Self::GasCan),
            "barbwire" => Some(Self::Barbwire),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionState {
    Normal,
    Boosted,
    KnockedOut,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Intro,
    Countdown,
    Playing,
    Paused,
    RoundEnd,
    NextLevel,
    Defeat,
    Victory,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length_sq(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    PhaseChanged {
        phase: Phase,
    },
    SquareClaimed {
        x: i32,
        y: i32,
        team: Team,
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },
    SquareReset {
        x: i32,
        y: i32,
    },
    PowerupSpawned {
        kind: PowerupKind,
        x: i32,
        y: i32,
    },
    PowerupPickedUp {
        kind: PowerupKind,
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },
    SpeedBoost {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        dir: Direction,
    },
    Shot {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },
    FuseLit {
        x: i32,
        y: i32,
    },
    Explosion {
        x: i32,
        y: i32,
    },
    BarbwireArmed {
        x: i32,
        y: i32,
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },
    Knockout {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        team: Team,
    },
    Respawned {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },
    RoundFinished {
        level: usize,
        winner: Option<Team>,
        #[serde(rename = "teamAScore")]
        team_a_score: i32,
        #[serde(rename = "teamBScore")]
        team_b_score: i32,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct SquareView {
    pub x: i32,
    pub y: i32,
    pub team: SquareTeam,
    pub owner: Option<PlayerId>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub team: Team,
    pub x: f32,
    pub y: f32,
    pub facing: Direction,
    pub state: MotionState,
    pub ai: bool,
    pub held: Option<PowerupKind>,
    #[serde(rename = "squareCount")]
    pub square_count: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct PowerupView {
    pub id: PowerupId,
    pub kind: PowerupKind,
    pub x: i32,
    pub y: i32,
    pub armed: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct BulletView {
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
}

#[derive(Clone, Debug, Serialize)]
pub struct HazardView {
    pub x: i32,
    pub y: i32,
    #[serde(rename = "timeLeft")]
    pub time_left: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TeamScore {
    pub squares: i32,
    pub knockouts: i32,
    pub score: i32,
}

impl TeamScore {
    pub fn new(squares: i32, knockouts: i32) -> Self {
        Self {
            squares,
            knockouts,
            score: squares - knockouts,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "timeLeft")]
    pub time_left: f32,
    pub squares: Vec<SquareView>,
    pub players: Vec<PlayerView>,
    pub powerups: Vec<PowerupView>,
    pub bullets: Vec<BulletView>,
    pub fuses: Vec<HazardView>,
    pub explosions: Vec<HazardView>,
    #[serde(rename = "teamA")]
    pub team_a: TeamScore,
    #[serde(rename = "teamB")]
    pub team_b: TeamScore,
}
