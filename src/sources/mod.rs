pub mod soundcloud;

#[cfg(test)]
pub mod fake;

use crate::error::Result;
use crate::models::{Track, TrackId, UserId};

/// 트랙 메타데이터와 오디오를 제공하는 원격 소스.
/// 감시 스레드와 UI 스레드가 함께 사용하므로 `Send + Sync`여야 한다.
pub trait TrackSource: Send + Sync {
    fn name(&self) -> &str;
    /// 사용자명을 사용자 ID로 변환한다. 없으면 `Error::UserNotFound`.
    fn resolve_user(&self, username: &str) -> Result<UserId>;
    fn get_track(&self, id: TrackId) -> Result<Track>;
    /// 사용자가 좋아요한 트랙 ID 목록. 최근 것이 앞에 온다.
    fn liked_track_ids(&self, user: UserId) -> Result<Vec<TrackId>>;
    /// 스트림 정보를 거쳐 실제 오디오 바이트를 받아온다.
    fn stream_bytes(&self, id: TrackId) -> Result<Vec<u8>>;
    /// 트랙 페이지 HTML. URL에서 트랙 ID를 찾을 때 쓴다.
    fn fetch_page(&self, url: &str) -> Result<String>;
    fn search(&self, query: &str) -> Result<Vec<Track>>;
}
