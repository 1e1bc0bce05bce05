use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use focusfeed_core_types::SessionId;
use parking_lot::RwLock;
use tokio::sync::watch;

/// State of the one active focus session.
#[derive(Clone, Debug)]
pub struct FocusSession {
    pub id: SessionId,
    /// Increases with every activation; work dispatched under an older generation is stale.
    pub generation: u64,
    pub topic: String,
    pub topic_embedding: Option<Arc<Vec<f32>>>,
    pub active: bool,
    pub model_ready: bool,
    /// The scoring model failed for this session; everything is unavailable.
    pub degraded: bool,
}

/// Readiness of the topic vector, tagged with the generation it belongs to.
#[derive(Clone, Debug)]
pub enum TopicPhase {
    Idle,
    Warming,
    Ready(Arc<Vec<f32>>),
    Unavailable,
    Closed,
}

/// Owner of the current [`FocusSession`]. At most one session exists at a time.
pub struct SessionState {
    current: RwLock<Option<FocusSession>>,
    generations: AtomicU64,
    phase: watch::Sender<(u64, TopicPhase)>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        let (phase, _) = watch::channel((0, TopicPhase::Idle));
        Self {
            current: RwLock::new(None),
            generations: AtomicU64::new(0),
            phase,
        }
    }

    /// Start a new session, replacing any current one. Returns its generation.
    pub fn begin(&self, topic: String) -> FocusSession {
        let generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        let session = FocusSession {
            id: SessionId::new(),
            generation,
            topic,
            topic_embedding: None,
            active: true,
            model_ready: false,
            degraded: false,
        };
        *self.current.write() = Some(session.clone());
        self.phase.send_replace((generation, TopicPhase::Warming));
        session
    }

    /// Cache the topic vector. Ignored when the generation is no longer current.
    pub fn mark_ready(&self, generation: u64, embedding: Vec<f32>) -> bool {
        let embedding = Arc::new(embedding);
        let mut guard = self.current.write();
        match guard.as_mut() {
            Some(session) if session.generation == generation && session.active => {
                session.model_ready = true;
                session.topic_embedding = Some(Arc::clone(&embedding));
                self.phase
                    .send_replace((generation, TopicPhase::Ready(embedding)));
                true
            }
            _ => false,
        }
    }

    /// Enter degraded mode. Returns true only on the first call for this session.
    pub fn mark_unavailable(&self, generation: u64) -> bool {
        let mut guard = self.current.write();
        match guard.as_mut() {
            Some(session) if session.generation == generation && session.active => {
                let first = !session.degraded;
                session.degraded = true;
                session.model_ready = false;
                session.topic_embedding = None;
                self.phase
                    .send_replace((generation, TopicPhase::Unavailable));
                first
            }
            _ => false,
        }
    }

    /// Destroy the current session, clearing its embedding. Anything waiting on the
    /// topic vector is released.
    pub fn end(&self) -> Option<FocusSession> {
        let mut ended = self.current.write().take()?;
        ended.active = false;
        ended.model_ready = false;
        ended.topic_embedding = None;
        self.phase
            .send_replace((ended.generation, TopicPhase::Closed));
        Some(ended)
    }

    pub fn snapshot(&self) -> Option<FocusSession> {
        self.current.read().clone()
    }

    pub fn is_active(&self) -> bool {
        self.current.read().as_ref().is_some_and(|s| s.active)
    }

    pub fn current_generation(&self) -> Option<u64> {
        self.current
            .read()
            .as_ref()
            .filter(|s| s.active)
            .map(|s| s.generation)
    }

    /// True while the session of `generation` is the active one.
    pub fn is_current(&self, generation: u64) -> bool {
        self.current_generation() == Some(generation)
    }

    /// Run `f` against the session of `generation` while holding it current.
    ///
    /// [`SessionState::end`] and [`SessionState::begin`] wait for `f` to return, so work
    /// done inside cannot land after the session has been torn down. `f` must not call
    /// back into this state.
    pub fn with_current<R>(&self, generation: u64, f: impl FnOnce(&FocusSession) -> R) -> Option<R> {
        let guard = self.current.read();
        let session = guard
            .as_ref()
            .filter(|s| s.active && s.generation == generation)?;
        Some(f(session))
    }

    pub fn topic(&self) -> Option<String> {
        self.current.read().as_ref().map(|s| s.topic.clone())
    }

    /// Wait until the topic vector of `generation` is settled.
    ///
    /// Returns the vector when ready, or `None` when the model is unavailable, the
    /// session ended, or another session replaced it.
    pub async fn topic_vector(&self, generation: u64) -> Option<Arc<Vec<f32>>> {
        let mut rx = self.phase.subscribe();
        let settled = rx
            .wait_for(|(current, phase)| {
                *current != generation || !matches!(phase, TopicPhase::Warming)
            })
            .await
            .ok()?;
        match &*settled {
            (current, TopicPhase::Ready(vector)) if *current == generation => {
                Some(Arc::clone(vector))
            }
            _ => None,
        }
    }
}
