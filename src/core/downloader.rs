use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use scraper::{Html, Selector};

use crate::core::tagger;
use crate::error::{Error, Result};
use crate::events::{Event, EventHub};
use crate::models::{BatchReport, DownloadOutcome, TrackId};
use crate::sources::TrackSource;

/// 트랙 페이지에 심어진 앱 링크. 뒤에 트랙 ID가 온다.
const TRACK_MARKER: &str = "soundcloud://sounds:";

/// 트랙 ID나 URL을 받아 MP3 파일로 저장하고 제목 태그를 단다.
pub struct Downloader<S> {
    source: Arc<S>,
    events: Arc<EventHub>,
    output_dir: Mutex<PathBuf>,
}

impl<S: TrackSource> Downloader<S> {
    pub fn new(source: Arc<S>, events: Arc<EventHub>, output_dir: PathBuf) -> Self {
        Self {
            source,
            events,
            output_dir: Mutex::new(output_dir),
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_output_dir(&self, dir: PathBuf) {
        *self.output_dir.lock().unwrap_or_else(PoisonError::into_inner) = dir;
    }

    /// 트랙 ID로 다운로드한다. 결과와 오류는 로그로도 남긴다.
    pub fn download_by_id(&self, id: TrackId) -> Result<DownloadOutcome> {
        let result = self.fetch_track(id);
        self.report(result)
    }

    /// 트랙 페이지 URL로 다운로드한다.
    pub fn download_by_url(&self, url: &str) -> Result<DownloadOutcome> {
        let result = self.resolve_url(url).and_then(|id| self.fetch_track(id));
        self.report(result)
    }

    /// 숫자만 있으면 트랙 ID로, 아니면 페이지 URL로 받는다.
    pub fn download_target(&self, target: &str) -> Result<DownloadOutcome> {
        let target = target.trim();
        match target.parse::<TrackId>() {
            Ok(id) => self.download_by_id(id),
            Err(_) => self.download_by_url(target),
        }
    }

    /// 목록을 입력 순서대로 받는다. 개별 실패는 로그만 남기고 계속 진행한다.
    pub fn batch_download<I, U>(&self, targets: I) -> BatchReport
    where
        I: IntoIterator<Item = U>,
        U: AsRef<str>,
    {
        let mut report = BatchReport::default();

        for target in targets {
            let target = target.as_ref();
            report.processed += 1;
            self.events
                .info(format!("* 곡 {}: {}", report.processed, target));

            match self.download_target(target) {
                Ok(DownloadOutcome::Downloaded { .. }) => report.downloaded += 1,
                Ok(DownloadOutcome::Skipped { .. }) => report.skipped += 1,
                Err(_) => report.failed += 1,
            }
        }

        self.events.success(format!(
            "--- 작업 완료, {}곡을 처리했습니다! ---",
            report.processed
        ));
        report
    }

    /// 페이지 HTML에서 트랙 ID를 찾는다. 형식이 잘못된 URL은 요청하지 않는다.
    pub fn resolve_url(&self, url: &str) -> Result<TrackId> {
        let parsed = reqwest::Url::parse(url).map_err(|_| Error::UrlParse(url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::UrlParse(url.to_string()));
        }

        let html = self.source.fetch_page(url)?;
        let id = extract_track_id(&html).ok_or_else(|| Error::UrlParse(url.to_string()))?;

        self.events
            .info(format!("{}에서 트랙 ID {}를 찾았습니다!", url, id));
        Ok(id)
    }

    fn fetch_track(&self, id: TrackId) -> Result<DownloadOutcome> {
        let track = self.source.get_track(id)?;
        let title = track.display_title();

        let path = match self.prepare_target(&title) {
            Ok(path) => path,
            Err(Error::AlreadyExists(path)) => return Ok(DownloadOutcome::Skipped { path }),
            Err(e) => return Err(e),
        };

        let data = self.source.stream_bytes(id)?;
        let partial = partial_path(&path);
        let written = std::fs::write(&partial, &data)
            .map_err(Error::from)
            .and_then(|()| tagger::write_title(&partial, &title))
            .and_then(|()| std::fs::rename(&partial, &path).map_err(Error::from));
        if let Err(e) = written {
            // 반쯤 쓰인 파일이 남으면 다음 시도가 건너뛰게 된다
            let _ = std::fs::remove_file(&partial);
            return Err(e);
        }

        tracing::debug!(id, path = %path.display(), bytes = data.len(), "track written");
        Ok(DownloadOutcome::Downloaded { path, title })
    }

    /// 저장 경로를 만든다. 출력 디렉토리가 없거나 파일이 이미 있으면 에러.
    fn prepare_target(&self, title: &str) -> Result<PathBuf> {
        let dir = self.output_dir();
        if !dir.is_dir() {
            return Err(Error::OutputPathMissing(dir));
        }

        let path = target_path(&dir, title);
        if path.exists() {
            return Err(Error::AlreadyExists(path));
        }
        Ok(path)
    }

    fn report(&self, result: Result<DownloadOutcome>) -> Result<DownloadOutcome> {
        match &result {
            Ok(outcome) => {
                match outcome {
                    DownloadOutcome::Downloaded { title, .. } => {
                        self.events
                            .success(format!("다운로드 완료: \"{}\"", title));
                    }
                    DownloadOutcome::Skipped { path } => {
                        self.events.warning(format!(
                            "파일이 이미 존재합니다: {}. 건너뜁니다.",
                            path.display()
                        ));
                    }
                }
                self.events.emit(Event::DownloadFinished(outcome.clone()));
            }
            Err(e) => self.events.log(e.level(), e.to_string()),
        }
        result
    }
}

pub fn target_path(dir: &Path, title: &str) -> PathBuf {
    dir.join(format!("{}.mp3", title))
}

/// 태그까지 다 쓴 뒤에 `target`으로 이름을 바꾼다.
fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// `soundcloud://sounds:<id>"` 표식에서 트랙 ID를 꺼낸다.
/// 먼저 `<meta>` 태그의 content 속성을 보고, 없으면 본문 텍스트를 훑는다.
pub fn extract_track_id(html: &str) -> Option<TrackId> {
    let document = Html::parse_document(html);
    if let Ok(meta_sel) = Selector::parse("meta[content]") {
        let from_meta = document
            .select(&meta_sel)
            .filter_map(|el| el.value().attr("content"))
            .find_map(|content| content.strip_prefix(TRACK_MARKER))
            .and_then(|id| id.trim().parse().ok());
        if from_meta.is_some() {
            return from_meta;
        }
    }

    let start = html.find(TRACK_MARKER)? + TRACK_MARKER.len();
    let rest = &html[start..];
    let end = rest.find('"')?;
    rest[..end].trim().parse().ok()
}
