use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::shell::Session;

pub const SESSION_COOKIE: &str = "calorie_advisor_session";

/// In-memory sessions, one per browser, addressed by the id carried in the
/// signed session cookie
pub struct SessionStore {
    idle_ttl: Duration,
    max_sessions: usize,
    sessions: Mutex<HashMap<String, Arc<Mutex<Session>>>>,
}

/// Session handed to a request
pub struct OpenSession {
    pub id: String,
    pub session: Arc<Mutex<Session>>,
    pub is_new: bool,
}

impl SessionStore {
    pub fn new(idle_ttl: Duration, max_sessions: usize) -> Self {
        Self {
            idle_ttl,
            max_sessions: max_sessions.max(1),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a verified session id, starting a fresh session when the id
    /// is absent or no longer known.
    pub async fn open(&self, id: Option<&str>) -> OpenSession {
        let mut sessions = self.sessions.lock().await;
        self.sweep(&mut sessions);

        if let Some((id, session)) = id.and_then(|id| sessions.get_key_value(id)) {
            if let Ok(mut active) = session.try_lock() {
                active.touch();
            }
            return OpenSession {
                id: id.clone(),
                session: session.clone(),
                is_new: false,
            };
        }

        if sessions.len() >= self.max_sessions {
            Self::evict_oldest(&mut sessions);
        }

        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(Mutex::new(Session::new()));
        sessions.insert(id.clone(), session.clone());
        log::debug!("🆕 Session started ({} active)", sessions.len());

        OpenSession {
            id,
            session,
            is_new: true,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Drop sessions idle for longer than the TTL. Sessions busy with an
    /// analysis hold their lock and are skipped.
    fn sweep(&self, sessions: &mut HashMap<String, Arc<Mutex<Session>>>) {
        let Some(cutoff) = Utc::now().checked_sub_signed(self.idle_ttl) else {
            return;
        };
        let before = sessions.len();

        sessions.retain(|_, session| match session.try_lock() {
            Ok(session) => session.last_seen() >= cutoff,
            Err(_) => true,
        });

        let expired = before - sessions.len();
        if expired > 0 {
            log::info!("🧹 Expired {} idle session(s)", expired);
        }
    }

    /// Make room for a new session by dropping the least recently used idle one
    fn evict_oldest(sessions: &mut HashMap<String, Arc<Mutex<Session>>>) {
        let oldest = sessions
            .iter()
            .filter_map(|(id, session)| session.try_lock().ok().map(|s| (s.last_seen(), id.clone())))
            .min();

        if let Some((_, id)) = oldest {
            sessions.remove(&id);
            log::warn!("⚠️ Session limit reached, evicted least recently used session");
        }
    }
}
