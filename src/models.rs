use std::path::PathBuf;

use crate::core::formatter;

pub type TrackId = u64;
pub type UserId = u64;

/// 한 시점의 좋아요 목록. 가장 최근에 좋아요한 트랙이 앞에 온다.
pub type LikeSnapshot = Vec<TrackId>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub username: String,
}

impl Track {
    /// 파일명과 태그에 쓰이는 `"{artist} - {title}"` 형식의 제목.
    pub fn display_title(&self) -> String {
        formatter::format_title(&self.username, &self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded { path: PathBuf, title: String },
    /// 같은 경로에 파일이 이미 있어 건너뛰었다.
    Skipped { path: PathBuf },
}

impl DownloadOutcome {
    pub fn path(&self) -> &PathBuf {
        match self {
            DownloadOutcome::Downloaded { path, .. } | DownloadOutcome::Skipped { path } => path,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_title_uses_formatter() {
        let track = Track {
            id: 1,
            title: "Night Drive".to_string(),
            username: "kavinsky".to_string(),
        };
        assert_eq!(track.display_title(), "kavinsky - Night Drive");
    }
}
