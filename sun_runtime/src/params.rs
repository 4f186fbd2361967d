use std::fs;
use std::path::{Path, PathBuf};

use sun_formats::{areas, StageParams};

use crate::services::{EventLog, StageNames};

/// Parameter files live under the data root at this fixed prefix.
pub const PARAMS_DIR: &str = "data/scene/params";

/// Derives the on-disc parameter path for a stage archive name.
///
/// Specific form: the name minus any extension, plus `.prm`. Generalized
/// form: everything before the first digit run, plus `+.prm`; a name with
/// no digits generalizes to the whole name plus the wildcard.
pub fn param_path(data_root: &Path, stage_name: &str, generalize: bool) -> PathBuf {
    let base = match stage_name.find('.') {
        Some(pos) => &stage_name[..pos],
        None => stage_name,
    };
    let file = if generalize {
        let prefix = match base.find(|c: char| c.is_ascii_digit()) {
            Some(pos) => &base[..pos],
            None => base,
        };
        format!("{prefix}+.prm")
    } else {
        format!("{base}.prm")
    };
    data_root.join(PARAMS_DIR).join(file)
}

/// Loads per-stage configuration with a two-tier fallback: the specific
/// file, then the generalized file, then hard defaults. Missing and corrupt
/// files are both recoverable; nothing here fails the caller.
pub struct StageParamsResolver {
    data_root: PathBuf,
    log: EventLog,
}

impl StageParamsResolver {
    pub fn new(data_root: impl Into<PathBuf>, log: EventLog) -> Self {
        StageParamsResolver {
            data_root: data_root.into(),
            log,
        }
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Resolves configuration for a stage archive name. `None` (the naming
    /// table had no entry) short-circuits to defaults.
    pub fn resolve(&self, stage_name: Option<&str>) -> StageParams {
        let Some(name) = stage_name else {
            return StageParams::default();
        };

        for generalize in [false, true] {
            let path = param_path(&self.data_root, name, generalize);
            if let Some(mut params) = self.try_load(&path) {
                params.custom_config_loaded = true;
                self.log.push(format!("params.load {}", path.display()));
                return params;
            }
        }

        self.log.push(format!("params.default {name}"));
        StageParams::default()
    }

    /// Resolves through the naming table for an (area, episode) pair.
    pub fn resolve_scene(&self, names: &dyn StageNames, area: u8, episode: u8) -> StageParams {
        self.resolve(names.stage_name(area, episode).as_deref())
    }

    fn try_load(&self, path: &Path) -> Option<StageParams> {
        let bytes = fs::read(path).ok()?;
        match StageParams::decode(&bytes) {
            Ok(params) => Some(params),
            Err(err) => {
                eprintln!(
                    "[sun_runtime] warning: ignoring corrupt parameter file {}: {err}",
                    path.display()
                );
                None
            }
        }
    }

    // Ad-hoc classification queries re-resolve on demand; the long-lived
    // cache is the stage pipeline's session config.

    pub fn query_ex_stage(&self, names: &dyn StageNames, area: u8, episode: u8) -> bool {
        let params = self.resolve_scene(names, area, episode);
        classify_ex(Some(&params), area)
    }

    pub fn query_diving_stage(&self, names: &dyn StageNames, area: u8, episode: u8) -> bool {
        let params = self.resolve_scene(names, area, episode);
        classify_diving(Some(&params), area)
    }

    pub fn query_multiplayer_stage(&self, names: &dyn StageNames, area: u8, episode: u8) -> bool {
        let params = self.resolve_scene(names, area, episode);
        classify_multiplayer(Some(&params), area, episode)
    }

    pub fn query_option_stage(&self, names: &dyn StageNames, area: u8, episode: u8) -> bool {
        let params = self.resolve_scene(names, area, episode);
        classify_option(Some(&params), area)
    }
}

// Classification rules: a custom-loaded configuration speaks for itself;
// otherwise the closed numeric table of retail area identifiers decides.

pub fn classify_ex(params: Option<&StageParams>, area: u8) -> bool {
    match params {
        Some(p) if p.custom_config_loaded => p.is_ex_stage,
        _ => (areas::DOLPIC_EX0..=areas::CORO_EX6).contains(&area),
    }
}

pub fn classify_diving(params: Option<&StageParams>, area: u8) -> bool {
    match params {
        Some(p) if p.custom_config_loaded => p.is_diving_stage,
        _ => {
            area == areas::MARE_BOSS || area == areas::MARE_EX0 || area == areas::MARE_UNDERSEA
        }
    }
}

pub fn classify_multiplayer(params: Option<&StageParams>, area: u8, episode: u8) -> bool {
    match params {
        Some(p) if p.custom_config_loaded => p.is_multiplayer_stage,
        _ => area == areas::TEST10 && episode == 0,
    }
}

pub fn classify_option(params: Option<&StageParams>, area: u8) -> bool {
    match params {
        Some(p) if p.custom_config_loaded => p.is_option_stage,
        _ => area == areas::OPTION,
    }
}
