//! socialbot - concurrent simulated users for a social-posting REST API
//!
//! Each simulated user signs up, logs in and creates posts. Once every user
//! has recorded its posts in the shared [`PostRegistry`], the [`PhaseBarrier`]
//! releases them all into the like phase, where each user likes a random
//! sample of the posts created by anyone, then logs out.
//!
//! - `client`: the API seam, an HTTP implementation and an in-memory one
//! - `registry`: the shared post-id pool
//! - `barrier`: the one-shot rendezvous between the two phases
//! - `session`: one simulated user's scripted lifecycle
//! - `runner`: spawns and awaits all sessions of a run

pub mod barrier;
pub mod client;
pub mod config;
pub mod error;
pub mod fake;
pub mod logging;
pub mod registry;
pub mod runner;
pub mod session;

// Re-export commonly used types for easy access
pub use barrier::{Phase, PhaseBarrier, PhaseTicket};
pub use client::{ApiClient, Credentials, MockApiClient, PostId, RestClient};
pub use config::{ApiConfig, BarrierConfig, Config, LoggingConfig, RunConfig};
pub use error::{Error, Result};
pub use fake::FakeData;
pub use registry::PostRegistry;
pub use runner::{RunSummary, Simulation};
pub use session::{SessionContext, SessionOutcome, SimulatedUser, UserSession};
