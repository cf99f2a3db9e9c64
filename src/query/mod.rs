pub mod aggregate;
pub mod matcher;
pub mod session;

pub use aggregate::{aggregate, Hit, ResultGroup, ResultSet};
pub use matcher::{match_entries, match_shards, Match};
pub use session::{
    NullRenderer, QuerySession, Renderer, ResultView, SessionConfig, SessionState, SessionStats,
};
