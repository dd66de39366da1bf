use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use crate::core::repeater::Repeater;
use crate::error::{Error, Result};
use crate::events::{Event, EventHub};
use crate::models::{LikeSnapshot, TrackId, UserId};
use crate::sources::TrackSource;

pub const DEFAULT_LIKE_CHECK_INTERVAL: Duration = Duration::from_secs(1);
/// 새 좋아요로 인정하는 범위. 가져온 목록의 앞 N개만 본다.
pub const DEFAULT_MAX_LIKE_CHECK: usize = 10;

#[derive(Debug, Default)]
pub struct WatchState {
    pub username: Option<String>,
    pub user_id: Option<UserId>,
    /// None이면 아직 기준 목록이 없다. 첫 tick은 기준만 저장한다.
    pub baseline: Option<LikeSnapshot>,
    pub watching: bool,
    /// start/stop마다 증가한다. fetch 도중 바뀌면 그 결과는 버린다.
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    FetchFailed,
    Empty,
    Stale,
    BaselineEstablished(usize),
    Checked(Vec<TrackId>),
}

/// 사용자의 좋아요 목록을 주기적으로 확인해 새로 좋아요한 트랙을 알린다.
pub struct LikeWatcher<S> {
    source: Arc<S>,
    events: Arc<EventHub>,
    state: Mutex<WatchState>,
    repeater: Mutex<Option<Repeater>>,
    interval: Duration,
    max_like_check: usize,
}

impl<S: TrackSource + 'static> LikeWatcher<S> {
    pub fn new(source: Arc<S>, events: Arc<EventHub>) -> Self {
        Self {
            source,
            events,
            state: Mutex::new(WatchState::default()),
            repeater: Mutex::new(None),
            interval: DEFAULT_LIKE_CHECK_INTERVAL,
            max_like_check: DEFAULT_MAX_LIKE_CHECK,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    fn state(&self) -> MutexGuard<'_, WatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_watching(&self) -> bool {
        self.state().watching
    }

    /// 사용자를 확인한 뒤 감시를 시작한다. 이미 감시 중이면 새 사용자로 다시 시작한다.
    pub fn start_watching(self: &Arc<Self>, username: &str) -> Result<()> {
        let username = username.trim();
        if username.is_empty() {
            return Err(Error::NoUser);
        }
        let user_id = self.source.resolve_user(username)?;

        self.cancel_repeater();
        {
            let mut state = self.state();
            state.username = Some(username.to_string());
            state.user_id = Some(user_id);
            state.baseline = None;
            state.watching = true;
            state.generation += 1;
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        let repeater = Repeater::start("like-poll", self.interval, move || match weak.upgrade() {
            Some(watcher) => {
                watcher.on_tick();
                true
            }
            None => false,
        });

        let repeater = match repeater {
            Ok(repeater) => repeater,
            Err(e) => {
                self.mark_idle();
                return Err(e.into());
            }
        };
        *self.repeater.lock().unwrap_or_else(PoisonError::into_inner) = Some(repeater);

        self.events.emit(Event::WatchingChanged {
            username: username.to_string(),
            watching: true,
        });
        self.events.info(format!(
            "\"{}\" 사용자의 좋아요 감시를 시작했습니다",
            username
        ));
        Ok(())
    }

    /// 감시를 멈춘다. 이미 멈춰 있으면 아무 일도 하지 않고 false를 반환한다.
    pub fn stop_watching(&self) -> bool {
        self.cancel_repeater();
        let Some(username) = self.mark_idle() else {
            return false;
        };

        self.events.emit(Event::WatchingChanged {
            username: username.clone(),
            watching: false,
        });
        self.events.info(format!(
            "\"{}\" 사용자의 좋아요 감시를 중지했습니다",
            username
        ));
        true
    }

    fn cancel_repeater(&self) {
        let taken = self
            .repeater
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut repeater) = taken {
            repeater.stop();
        }
    }

    /// 감시 중이었다면 사용자명을 돌려준다.
    fn mark_idle(&self) -> Option<String> {
        let mut state = self.state();
        if !state.watching {
            return None;
        }
        state.watching = false;
        state.generation += 1;
        Some(state.username.clone().unwrap_or_default())
    }

    /// 한 번의 확인. 반복 스레드가 호출하며, 테스트에서는 직접 호출한다.
    pub fn on_tick(&self) -> TickOutcome {
        let (user_id, generation) = {
            let state = self.state();
            match (state.watching, state.user_id) {
                (true, Some(id)) => (id, state.generation),
                _ => return TickOutcome::Idle,
            }
        };

        // fetch 중에는 잠금을 잡지 않는다
        let fetched = match self.source.liked_track_ids(user_id) {
            Ok(ids) => ids,
            Err(e) => {
                self.events.warning(format!(
                    "SoundCloud API 오류가 발생했습니다. 다시 시도합니다. ({})",
                    e
                ));
                return TickOutcome::FetchFailed;
            }
        };

        if fetched.is_empty() {
            return TickOutcome::Empty;
        }

        let new_ids = {
            let mut state = self.state();
            if state.generation != generation {
                return TickOutcome::Stale;
            }
            let new_ids = match state.baseline.take() {
                None => {
                    let count = fetched.len();
                    state.baseline = Some(fetched);
                    tracing::debug!(count, "like baseline established");
                    return TickOutcome::BaselineEstablished(count);
                }
                Some(baseline) => new_likes(&baseline, &fetched, self.max_like_check),
            };
            state.baseline = Some(fetched);
            new_ids
        };

        for id in &new_ids {
            self.events.emit(Event::NewLikedTrack(*id));
        }
        TickOutcome::Checked(new_ids)
    }
}

impl<S> Drop for LikeWatcher<S> {
    fn drop(&mut self) {
        if let Some(mut repeater) = self
            .repeater
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            repeater.stop();
        }
    }
}

/// 기준 목록에 없고 가져온 목록의 앞 `max`개 안에 있는 ID. 가져온 순서를 유지한다.
pub fn new_likes(baseline: &[TrackId], fetched: &[TrackId], max: usize) -> Vec<TrackId> {
    fetched
        .iter()
        .take(max)
        .filter(|id| !baseline.contains(id))
        .copied()
        .collect()
}
