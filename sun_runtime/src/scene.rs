use std::fmt;

use serde::{Deserialize, Serialize};

/// Reserved episode value marking "no previous episode".
pub const EPISODE_UNSET: u8 = 0xFF;

/// An (area, episode, act) triple identifying one playable stage instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneDescriptor {
    pub area: u8,
    pub episode: u8,
    pub act: u8,
}

impl SceneDescriptor {
    pub fn new(area: u8, episode: u8, act: u8) -> Self {
        SceneDescriptor { area, episode, act }
    }

    pub fn set(&mut self, area: u8, episode: u8, act: u8) {
        self.area = area;
        self.episode = episode;
        self.act = act;
    }

    /// Same stage means same area and episode; the act does not matter for
    /// scene-transition bookkeeping.
    pub fn same_stage_as(&self, other: &SceneDescriptor) -> bool {
        self.area == other.area && self.episode == other.episode
    }
}

impl fmt::Display for SceneDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.area, self.episode, self.act)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_identity_ignores_the_act() {
        let a = SceneDescriptor::new(1, 2, 0);
        let b = SceneDescriptor::new(1, 2, 5);
        let c = SceneDescriptor::new(1, 3, 0);
        assert!(a.same_stage_as(&b));
        assert!(!a.same_stage_as(&c));
    }

    #[test]
    fn displays_as_colon_triple() {
        assert_eq!(SceneDescriptor::new(15, 0, 0).to_string(), "15:0:0");
    }
}
