use std::sync::{Arc, Mutex, PoisonError};

use crate::models::{DownloadOutcome, TrackId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Log { level: LogLevel, message: String },
    NewLikedTrack(TrackId),
    DownloadFinished(DownloadOutcome),
    WatchingChanged { username: String, watching: bool },
}

type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

/// 코어와 UI 사이의 콜백 목록.
/// 컴포넌트는 생성 시 `Arc<EventHub>`를 받아 로그와 알림을 여기로 보낸다.
#[derive(Default)]
pub struct EventHub {
    listeners: Mutex<Vec<Listener>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }

    pub fn on_log<F>(&self, listener: F)
    where
        F: Fn(LogLevel, &str) + Send + Sync + 'static,
    {
        self.subscribe(move |event| {
            if let Event::Log { level, message } = event {
                listener(*level, message);
            }
        });
    }

    pub fn on_new_liked_track<F>(&self, listener: F)
    where
        F: Fn(TrackId) + Send + Sync + 'static,
    {
        self.subscribe(move |event| {
            if let Event::NewLikedTrack(id) = event {
                listener(*id);
            }
        });
    }

    pub fn on_download_finished<F>(&self, listener: F)
    where
        F: Fn(&DownloadOutcome) + Send + Sync + 'static,
    {
        self.subscribe(move |event| {
            if let Event::DownloadFinished(outcome) = event {
                listener(outcome);
            }
        });
    }

    /// 이벤트를 모든 리스너에 전달한다.
    /// 리스너 목록의 복사본으로 호출하므로 콜백 안에서 다시 emit 해도 된다.
    pub fn emit(&self, event: Event) {
        trace_event(&event);

        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for listener in &listeners {
            listener(&event);
        }
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.emit(Event::Log {
            level,
            message: message.into(),
        });
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.log(LogLevel::Success, message);
    }
}

fn trace_event(event: &Event) {
    match event {
        Event::Log { level, message } => match level {
            LogLevel::Info => tracing::info!("{message}"),
            LogLevel::Success => tracing::info!(outcome = "success", "{message}"),
            LogLevel::Warning => tracing::warn!("{message}"),
            LogLevel::Error => tracing::error!("{message}"),
        },
        other => tracing::debug!(event = ?other, "event"),
    }
}
