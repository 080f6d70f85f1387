use crate::level::{Level, LevelDef};

pub(crate) const OPEN: &str = "
1.......
........
........
........
........
........
........
.......2
";

pub(crate) fn level_from(world: &str) -> Level {
    level_with(world, &["gun"], 0)
}

pub(crate) fn level_with(world: &str, powerups: &[&str], ai_dumbness: u32) -> Level {
    Level::parse(&LevelDef {
        name: "test".to_string(),
        remark: String::new(),
        powerups: powerups.iter().map(|p| p.to_string()).collect(),
        ai_dumbness,
        world: world.to_string(),
        fov: false,
    })
    .expect("test level parses")
}
