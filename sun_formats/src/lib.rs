pub mod prm;
pub mod scenario;

pub use prm::{PrmError, StageParams};
pub use scenario::{areas, AreaScenarios, ScenarioTable};
