use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::{self, Settings};
use crate::core::downloader::Downloader;
use crate::core::watcher::LikeWatcher;
use crate::error::{Error, Result};
use crate::events::EventHub;
use crate::models::{BatchReport, DownloadOutcome, Track, TrackId};
use crate::sources::TrackSource;

pub const DEFAULT_SEARCH_RESULTS: usize = 5;

/// UI와 원격 소스, 설정 파일을 잇는다.
/// 새 좋아요 알림을 받으면 해당 트랙을 바로 다운로드한다.
pub struct Controller<S: TrackSource + 'static> {
    source: Arc<S>,
    events: Arc<EventHub>,
    downloader: Arc<Downloader<S>>,
    watcher: Arc<LikeWatcher<S>>,
    settings: Mutex<Settings>,
    settings_path: PathBuf,
}

impl<S: TrackSource + 'static> Controller<S> {
    pub fn new(source: S, settings: Settings, settings_path: PathBuf) -> Self {
        let source = Arc::new(source);
        let events = Arc::new(EventHub::new());
        Self::with_parts(
            Arc::clone(&source),
            Arc::clone(&events),
            LikeWatcher::new(source, events),
            settings,
            settings_path,
        )
    }

    pub fn with_parts(
        source: Arc<S>,
        events: Arc<EventHub>,
        watcher: LikeWatcher<S>,
        settings: Settings,
        settings_path: PathBuf,
    ) -> Self {
        let downloader = Arc::new(Downloader::new(
            Arc::clone(&source),
            Arc::clone(&events),
            settings.general.output.clone(),
        ));

        let weak = Arc::downgrade(&downloader);
        let hub = Arc::downgrade(&events);
        let lookup = Arc::downgrade(&source);
        events.on_new_liked_track(move |id| {
            let (Some(downloader), Some(events), Some(source)) =
                (weak.upgrade(), hub.upgrade(), lookup.upgrade())
            else {
                return;
            };
            let name = source
                .get_track(id)
                .map(|t| t.display_title())
                .unwrap_or_else(|_| id.to_string());
            events.info(format!("좋아요한 곡을 찾았습니다: {}, 다운로드합니다...", name));
            let _ = downloader.download_by_id(id);
        });

        Self {
            source,
            events,
            downloader,
            watcher: Arc::new(watcher),
            settings: Mutex::new(settings),
            settings_path,
        }
    }

    pub fn events(&self) -> &Arc<EventHub> {
        &self.events
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    fn settings(&self) -> MutexGuard<'_, Settings> {
        self.settings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn settings_snapshot(&self) -> Settings {
        self.settings().clone()
    }

    pub fn output_dir(&self) -> PathBuf {
        self.downloader.output_dir()
    }

    pub fn set_output_dir(&self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        self.settings().general.output = dir.clone();
        self.downloader.set_output_dir(dir);
    }

    pub fn search(&self, query: &str) -> Result<Vec<Track>> {
        let query = query.trim();
        if query.is_empty() {
            let err = Error::EmptyQuery;
            self.events.log(err.level(), "검색어를 입력하세요.");
            return Err(err);
        }

        match self.source.search(query) {
            Ok(mut tracks) => {
                tracks.truncate(DEFAULT_SEARCH_RESULTS);
                if tracks.is_empty() {
                    self.events
                        .warning(format!("\"{}\"에 대한 검색 결과가 없습니다", query));
                }
                Ok(tracks)
            }
            Err(e) => {
                self.events.log(e.level(), e.to_string());
                Err(e)
            }
        }
    }

    pub fn download_track(&self, id: TrackId) -> Result<DownloadOutcome> {
        self.downloader.download_by_id(id)
    }

    /// 트랙 ID 또는 URL 하나를 받는다.
    pub fn download_target(&self, target: &str) -> Result<DownloadOutcome> {
        self.downloader.download_target(target)
    }

    pub fn batch_download<I, U>(&self, urls: I) -> BatchReport
    where
        I: IntoIterator<Item = U>,
        U: AsRef<str>,
    {
        self.downloader.batch_download(urls)
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_watching()
    }

    pub fn start_watching(&self, username: &str) -> Result<()> {
        match self.watcher.start_watching(username) {
            Ok(()) => {
                self.settings().like.user = username.trim().to_string();
                Ok(())
            }
            Err(e) => {
                self.events.log(e.level(), e.to_string());
                Err(e)
            }
        }
    }

    pub fn stop_watching(&self) -> bool {
        self.watcher.stop_watching()
    }

    /// 감시 중이면 멈추고, 아니면 시작한다. 반환값은 전환 후의 감시 여부.
    pub fn toggle_watching(&self, username: &str) -> Result<bool> {
        if self.watcher.is_watching() {
            self.stop_watching();
            Ok(false)
        } else {
            self.start_watching(username)?;
            Ok(true)
        }
    }

    pub fn queued_links(&self) -> Vec<String> {
        self.settings().queued_links()
    }

    pub fn queue_link(&self, link: &str) -> Result<()> {
        let link = link.trim();
        if let Err(e) = config::validate_link(link) {
            self.events.log(e.level(), e.to_string());
            return Err(e);
        }

        let mut settings = self.settings();
        let mut links = settings.queued_links();
        links.push(link.to_string());
        settings.set_queued_links(&links);
        Ok(())
    }

    pub fn remove_link(&self, link: &str) -> bool {
        let mut settings = self.settings();
        let mut links = settings.queued_links();
        let Some(pos) = links.iter().position(|l| l == link.trim()) else {
            return false;
        };
        links.remove(pos);
        settings.set_queued_links(&links);
        true
    }

    /// 대기열을 비우면서 모든 링크를 다운로드한다.
    pub fn download_queue(&self) -> BatchReport {
        let links = {
            let mut settings = self.settings();
            let links = settings.queued_links();
            settings.set_queued_links(&[]);
            links
        };
        self.downloader.batch_download(links)
    }

    pub fn save_settings(&self) -> anyhow::Result<()> {
        let settings = self.settings_snapshot();
        config::save_settings(&self.settings_path, &settings)
    }

    /// 감시를 멈추고 설정을 저장한다.
    pub fn shutdown(&self) -> anyhow::Result<()> {
        self.stop_watching();
        self.save_settings()
    }
}
