//! In-memory `TrackSource` for engine and orchestrator tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::models::{Track, TrackId, UserId};
use crate::sources::TrackSource;

#[derive(Default)]
pub struct FakeSource {
    users: HashMap<String, UserId>,
    tracks: HashMap<TrackId, Track>,
    pages: HashMap<String, String>,
    likes: Mutex<VecDeque<Result<Vec<TrackId>>>>,
    page_requests: AtomicUsize,
    stream_requests: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, username: &str, id: UserId) -> Self {
        self.users.insert(username.to_lowercase(), id);
        self
    }

    pub fn with_track(mut self, id: TrackId, username: &str, title: &str) -> Self {
        self.tracks.insert(
            id,
            Track {
                id,
                title: title.to_string(),
                username: username.to_string(),
            },
        );
        self
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// 다음 `liked_track_ids` 호출이 돌려줄 목록을 쌓는다.
    pub fn push_likes(&self, ids: &[TrackId]) {
        self.likes.lock().unwrap().push_back(Ok(ids.to_vec()));
    }

    pub fn push_like_failure(&self) {
        self.likes
            .lock()
            .unwrap()
            .push_back(Err(Error::Transport("connection reset".to_string())));
    }

    pub fn page_requests(&self) -> usize {
        self.page_requests.load(Ordering::SeqCst)
    }

    pub fn stream_requests(&self) -> usize {
        self.stream_requests.load(Ordering::SeqCst)
    }
}

impl TrackSource for FakeSource {
    fn name(&self) -> &str {
        "Fake"
    }

    fn resolve_user(&self, username: &str) -> Result<UserId> {
        self.users
            .get(&username.to_lowercase())
            .copied()
            .ok_or_else(|| Error::UserNotFound(username.to_string()))
    }

    fn get_track(&self, id: TrackId) -> Result<Track> {
        self.tracks.get(&id).cloned().ok_or(Error::TrackNotFound(id))
    }

    fn liked_track_ids(&self, _user: UserId) -> Result<Vec<TrackId>> {
        self.likes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn stream_bytes(&self, id: TrackId) -> Result<Vec<u8>> {
        self.stream_requests.fetch_add(1, Ordering::SeqCst);
        if !self.tracks.contains_key(&id) {
            return Err(Error::StreamUnavailable(id));
        }
        Ok(format!("audio-{id}").into_bytes())
    }

    fn fetch_page(&self, url: &str) -> Result<String> {
        self.page_requests.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Transport(format!("404 for {url}")))
    }

    fn search(&self, query: &str) -> Result<Vec<Track>> {
        let query = query.to_lowercase();
        let mut found: Vec<Track> = self
            .tracks
            .values()
            .filter(|t| t.title.to_lowercase().contains(&query))
            .cloned()
            .collect();
        found.sort_by_key(|t| t.id);
        Ok(found)
    }
}
