use crate::config::AppConfig;
use crate::inspect::builder::QueryBuilder;
use crate::inspect::session::Session;
use crate::inspect::InspectError;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Shared application state for the web server
pub struct AppState {
    pub config: AppConfig,
    pub builder: QueryBuilder,
    // One isolated session per client-chosen id
    pub sessions: RwLock<HashMap<String, Session>>,
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, InspectError> {
        Ok(Self {
            config,
            builder: QueryBuilder::new()?,
            sessions: RwLock::new(HashMap::new()),
            startup_time: chrono::Utc::now(),
        })
    }

    pub fn new_session(&self, session_id: &str) -> Session {
        debug!("Creating session '{}'", session_id);
        Session::new(self.config.generator.default_date_filter())
    }

    /// Runs `f` against the session, creating it on first use.
    pub async fn with_session<T>(&self, session_id: &str, f: impl FnOnce(&mut Session) -> T) -> T {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| self.new_session(session_id));
        f(session)
    }

    /// Runs `f` against the session if it exists, without creating one.
    pub async fn read_session<T>(&self, session_id: &str, f: impl FnOnce(Option<&Session>) -> T) -> T {
        let sessions = self.sessions.read().await;
        f(sessions.get(session_id))
    }

    /// Ends a session, dropping its table and last query.
    pub async fn remove_session(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id).is_some();
        if removed {
            debug!("Removed session '{}'", session_id);
        }
        removed
    }
}
