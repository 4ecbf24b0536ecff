#![forbid(unsafe_code)]

pub mod config;
pub mod delivery;
pub mod error;
pub mod identity;
pub mod quiz_api;
pub mod sessions;

pub use quiz_core::Clock;

pub use config::{ApiConfig, DeliveryMode, EngineConfig};
pub use delivery::{BoundedRetry, DeliveryOutcome, FireAndForget, RecordDelivery};
pub use error::{ConfigError, QuizApiError, SessionError};
pub use identity::{CurrentUser, IdentityProvider, StaticIdentity};
pub use quiz_api::QuizApiClient;

pub use sessions::{
    PhaseKind, QuizEngine, SessionController, SessionHandle, SessionSnapshot, Step,
};
