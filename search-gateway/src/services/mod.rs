pub mod credentials;
pub mod gateway;
pub mod metrics;
pub mod providers;
pub mod registry;

pub use credentials::{CredentialSource, TokenProvider};
pub use gateway::SearchGateway;
pub use providers::{DiscoveryEngineClient, SearchProvider};
pub use registry::SessionRegistry;
