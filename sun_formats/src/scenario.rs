use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Area identifiers from the retail scenario table.
///
/// The numeric values are load-bearing: classification fallbacks compare
/// against the bounds below, and the secret-course block is contiguous so
/// the ex-stage check stays a pair of comparisons.
pub mod areas {
    pub const AIRPORT: u8 = 0;
    pub const DOLPIC: u8 = 1;
    pub const BIANCO: u8 = 2;
    pub const RICCO: u8 = 3;
    pub const MAMMA: u8 = 4;
    pub const PINNA_BOSS: u8 = 5;
    pub const PINNA_BEACH: u8 = 6;
    pub const SIRENA: u8 = 7;
    pub const DELFINO: u8 = 8;
    pub const MARE: u8 = 9;
    pub const MONTE: u8 = 10;
    pub const MARE_BOSS: u8 = 11;
    pub const SIRENA_BOSS: u8 = 12;
    pub const CASINO: u8 = 13;
    pub const CORONA: u8 = 14;
    pub const OPTION: u8 = 15;
    pub const TEST10: u8 = 16;
    pub const MARE_UNDERSEA: u8 = 17;
    pub const DOLPIC_EX0: u8 = 18;
    pub const DOLPIC_EX1: u8 = 19;
    pub const BIANCO_EX0: u8 = 20;
    pub const BIANCO_EX1: u8 = 21;
    pub const RICCO_EX0: u8 = 22;
    pub const RICCO_EX1: u8 = 23;
    pub const MAMMA_EX0: u8 = 24;
    pub const MAMMA_EX1: u8 = 25;
    pub const PINNA_EX0: u8 = 26;
    pub const PINNA_EX1: u8 = 27;
    pub const SIRENA_EX0: u8 = 28;
    pub const SIRENA_EX1: u8 = 29;
    pub const MONTE_EX0: u8 = 30;
    pub const MARE_EX0: u8 = 31;
    pub const CORO_EX0: u8 = 32;
    pub const CORO_EX1: u8 = 33;
    pub const CORO_EX2: u8 = 34;
    pub const CORO_EX3: u8 = 35;
    pub const CORO_EX4: u8 = 36;
    pub const CORO_EX5: u8 = 37;
    pub const CORO_EX6: u8 = 38;

    pub const COUNT: usize = 39;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaScenarios {
    pub name: String,
    pub episodes: Vec<String>,
}

/// The scenario (stage archive) name table: one row per area, one archive
/// name per episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioTable {
    pub areas: Vec<AreaScenarios>,
}

impl ScenarioTable {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading scenario manifest from {}", path.display()))?;
        let table: ScenarioTable = serde_json::from_str(&data)
            .with_context(|| format!("parsing scenario manifest from {}", path.display()))?;
        Ok(table)
    }

    pub fn stage_name(&self, area: u8, episode: u8) -> Option<&str> {
        self.areas
            .get(area as usize)?
            .episodes
            .get(episode as usize)
            .map(String::as_str)
    }

    pub fn area_count(&self) -> usize {
        self.areas.len()
    }

    /// The retail table, used when no manifest is supplied.
    pub fn builtin() -> Self {
        fn row(name: &str, episodes: &[&str]) -> AreaScenarios {
            AreaScenarios {
                name: name.to_string(),
                episodes: episodes.iter().map(|e| e.to_string()).collect(),
            }
        }

        ScenarioTable {
            areas: vec![
                row("airport", &["airport0"]),
                row("dolpic", &["dolpic0", "dolpic1", "dolpic2"]),
                row("bianco", &["bianco0", "bianco1", "bianco2"]),
                row("ricco", &["ricco0", "ricco1", "ricco2"]),
                row("mamma", &["mamma0", "mamma1", "mamma2"]),
                row("pinnaBoss", &["pinnaBoss0"]),
                row("pinnaBeach", &["pinnaBeach0", "pinnaBeach1"]),
                row("sirena", &["sirena0", "sirena1"]),
                row("delfino", &["delfino0", "delfino1"]),
                row("mare", &["mare0", "mare1"]),
                row("monte", &["monte0", "monte1"]),
                row("mareBoss", &["mareBoss0"]),
                row("sirenaBoss", &["sirenaBoss0"]),
                row("casino", &["casino0"]),
                row("corona", &["corona0"]),
                row("option", &["option"]),
                row("test10", &["test10"]),
                row("mareUndersea", &["mareUndersea"]),
                row("dolpicEx0", &["dolpicEx0"]),
                row("dolpicEx1", &["dolpicEx1"]),
                row("biancoEx0", &["biancoEx0"]),
                row("biancoEx1", &["biancoEx1"]),
                row("riccoEx0", &["riccoEx0"]),
                row("riccoEx1", &["riccoEx1"]),
                row("mammaEx0", &["mammaEx0"]),
                row("mammaEx1", &["mammaEx1"]),
                row("pinnaEx0", &["pinnaEx0"]),
                row("pinnaEx1", &["pinnaEx1"]),
                row("sirenaEx0", &["sirenaEx0"]),
                row("sirenaEx1", &["sirenaEx1"]),
                row("monteEx0", &["monteEx0"]),
                row("mareEx0", &["mareEx0"]),
                row("coroEx0", &["coroEx0"]),
                row("coroEx1", &["coroEx1"]),
                row("coroEx2", &["coroEx2"]),
                row("coroEx3", &["coroEx3"]),
                row("coroEx4", &["coroEx4"]),
                row("coroEx5", &["coroEx5"]),
                row("coroEx6", &["coroEx6"]),
            ],
        }
    }
}
