//! Glue between the UI, the hosted endpoints and the audio devices

pub mod config;
pub mod orchestrator;
pub mod session;

pub use config::AppConfig;
pub use orchestrator::{
    join_worker, Orchestrator, OrchestratorCommand, OrchestratorEvent, OrchestratorHandle,
};
pub use session::{TurnOutcome, TutorSession, UserTurn};
