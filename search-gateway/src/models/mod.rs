pub mod search;
pub mod session;

pub use search::{
    CreateSessionRequest, SearchRequest, SessionInfo, SessionList,
    DEFAULT_SEARCH_RESULT_PERSISTENCE_COUNT,
};
pub use session::{RemoteSession, Session};
