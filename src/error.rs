use std::path::PathBuf;

use thiserror::Error;

use crate::events::LogLevel;
use crate::models::TrackId;

/// 다운로드/감시 작업에서 발생하는 오류.
/// 어떤 오류도 프로세스를 종료시키지 않으며, 로그 한 줄과 해당 작업의 중단으로 끝난다.
#[derive(Debug, Error)]
pub enum Error {
    #[error("사용자 \"{0}\"을(를) 찾을 수 없습니다. 올바른 사용자명으로 다시 시도하세요.")]
    UserNotFound(String),

    #[error("사용자가 입력되지 않았습니다")]
    NoUser,

    #[error("트랙 {0}을(를) 찾을 수 없습니다")]
    TrackNotFound(TrackId),

    #[error("SoundCloud 요청에 실패했습니다: {0}")]
    Transport(String),

    #[error("잘못된 URL \"{0}\"입니다. 올바른 SoundCloud 링크를 입력하세요.")]
    UrlParse(String),

    #[error("출력 경로 {}이(가) 존재하지 않습니다", .0.display())]
    OutputPathMissing(PathBuf),

    #[error("파일이 이미 존재합니다: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("트랙 {0}의 스트림 주소를 찾을 수 없습니다")]
    StreamUnavailable(TrackId),

    #[error("검색어가 비어 있습니다")]
    EmptyQuery,

    #[error("링크 \"{link}\"을(를) 추가할 수 없습니다: {reason}")]
    InvalidLink { link: String, reason: &'static str },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("태그 기록에 실패했습니다: {0}")]
    Tag(#[from] id3::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(e.to_string())
    }
}

impl Error {
    /// 사용자에게 보여줄 로그 수준.
    pub fn level(&self) -> LogLevel {
        match self {
            Error::UserNotFound(_)
            | Error::Transport(_)
            | Error::UrlParse(_)
            | Error::AlreadyExists(_)
            | Error::EmptyQuery
            | Error::InvalidLink { .. } => LogLevel::Warning,
            _ => LogLevel::Error,
        }
    }
}
