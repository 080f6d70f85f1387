use std::fmt;
use std::io;

// Level setup errors. These surface once, before a round is built.
#[derive(Debug, PartialEq, Eq)]
pub enum LevelError {
    RowCount { level: String, rows: usize },
    RowWidth { level: String, row: usize, width: usize },
    UnknownTile { level: String, x: usize, y: usize, symbol: char },
    MissingSpawn { level: String, symbol: char },
    UnknownPowerup { level: String, name: String },
    NoPowerups { level: String },
    UnknownLevel { name: String },
    EmptyCampaign,
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RowCount { level, rows } => {
                write!(f, "level '{level}' has {rows} rows, expected 8")
            }
            Self::RowWidth { level, row, width } => {
                write!(f, "level '{level}' row {row} is {width} wide, expected 8")
            }
            Self::UnknownTile {
                level,
                x,
                y,
                symbol,
            } => write!(f, "level '{level}' has unknown tile '{symbol}' at ({x},{y})"),
            Self::MissingSpawn { level, symbol } => {
                write!(f, "level '{level}' has no '{symbol}' spawn")
            }
            Self::UnknownPowerup { level, name } => {
                write!(f, "level '{level}' lists unknown power-up '{name}'")
            }
            Self::NoPowerups { level } => write!(f, "level '{level}' allows no power-ups"),
            Self::UnknownLevel { name } => write!(f, "no built-in level named '{name}'"),
            Self::EmptyCampaign => write!(f, "campaign has no levels"),
        }
    }
}

impl std::error::Error for LevelError {}

#[derive(Debug)]
pub enum LoadError {
    Io(io::Error),
    Json(serde_json::Error),
    Level(LevelError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "read failed: {err}"),
            Self::Json(err) => write!(f, "invalid json: {err}"),
            Self::Level(err) => write!(f, "invalid level: {err}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Level(err) => Some(err),
        }
    }
}

impl From<io::Error> for LoadError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<LevelError> for LoadError {
    fn from(err: LevelError) -> Self {
        Self::Level(err)
    }
}
