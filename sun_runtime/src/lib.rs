pub mod application;
pub mod callbacks;
pub mod cli;
pub mod context;
pub mod director;
pub mod handlers;
pub mod params;
pub mod runtime;
pub mod scene;
pub mod script;
pub mod services;
pub mod stage;

pub use application::{
    resolve_reset, AppCallback, AppOptions, Application, ApplicationLoop, ResetResolution,
    RunSummary,
};
pub use context::{AppContext, ContextDispatchTable, ContextHandler, ContextId, DispatchError};
pub use director::{Director, DirectorKind, StageSetup};
pub use scene::{SceneDescriptor, EPISODE_UNSET};
pub use script::{ScriptedActivation, ScriptedDriver, SessionScript};
pub use services::{EventLog, FrameDriver, HostServices, RenderMode};
pub use stage::StagePipeline;
