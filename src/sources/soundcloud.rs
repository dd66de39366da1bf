use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::SoundCloudSettings;
use crate::error::{Error, Result};
use crate::models::{Track, TrackId, UserId};
use crate::sources::TrackSource;

const API_BASE: &str = "https://api.soundcloud.com";
const FAVORITES_LIMIT: &str = "50";

pub struct SoundCloudClient {
    client: reqwest::blocking::Client,
    client_id: String,
}

#[derive(Deserialize)]
struct ApiUser {
    id: UserId,
    username: String,
}

#[derive(Deserialize)]
struct ApiTrack {
    id: TrackId,
    title: String,
    user: ApiUser,
}

/// 목록 엔드포인트는 배열 또는 `{ "collection": [...] }` 형태로 응답한다.
#[derive(Deserialize)]
#[serde(untagged)]
enum TrackList {
    Plain(Vec<ApiTrack>),
    Paged { collection: Vec<ApiTrack> },
}

impl TrackList {
    fn into_tracks(self) -> Vec<ApiTrack> {
        match self {
            TrackList::Plain(tracks) | TrackList::Paged { collection: tracks } => tracks,
        }
    }
}

#[derive(Deserialize)]
struct StreamDescriptor {
    http_mp3_128_url: Option<String>,
}

impl SoundCloudClient {
    pub fn new(settings: &SoundCloudSettings) -> anyhow::Result<Self> {
        let client_id = settings
            .effective_client_id()
            .ok_or_else(|| anyhow::anyhow!("SoundCloud client_id가 설정되지 않았습니다"))?
            .to_string();

        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("soundplow/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, client_id })
    }

    fn get(&self, path: &str) -> reqwest::blocking::RequestBuilder {
        self.client
            .get(format!("{}{}", API_BASE, path))
            .query(&[("client_id", self.client_id.as_str())])
    }

    fn convert_track(track: ApiTrack) -> Track {
        Track {
            id: track.id,
            title: track.title,
            username: track.user.username,
        }
    }

    fn parse_stream_url(id: TrackId, body: &str) -> Result<String> {
        let descriptor: StreamDescriptor =
            serde_json::from_str(body).map_err(|_| Error::StreamUnavailable(id))?;
        descriptor
            .http_mp3_128_url
            .ok_or(Error::StreamUnavailable(id))
    }
}

/// 사용자가 없을 때만 404가 온다. 나머지 실패(잘못된 client_id 등)는
/// `error_for_status`에서 전송 에러로 처리한다.
fn check_resolve_status(status: StatusCode, username: &str) -> Result<()> {
    if status == StatusCode::NOT_FOUND {
        return Err(Error::UserNotFound(username.to_string()));
    }
    Ok(())
}

impl TrackSource for SoundCloudClient {
    fn name(&self) -> &str {
        "SoundCloud"
    }

    fn resolve_user(&self, username: &str) -> Result<UserId> {
        let profile = format!("https://soundcloud.com/{}", username);
        let resp = self.get("/resolve").query(&[("url", profile.as_str())]).send()?;

        check_resolve_status(resp.status(), username)?;

        let user: ApiUser = resp.error_for_status()?.json()?;
        tracing::debug!(username = %user.username, id = user.id, "resolved user");
        Ok(user.id)
    }

    fn get_track(&self, id: TrackId) -> Result<Track> {
        let resp = self.get(&format!("/tracks/{}", id)).send()?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(Error::TrackNotFound(id));
        }
        let track: ApiTrack = resp.error_for_status()?.json()?;
        Ok(Self::convert_track(track))
    }

    fn liked_track_ids(&self, user: UserId) -> Result<Vec<TrackId>> {
        let list: TrackList = self
            .get(&format!("/users/{}/favorites", user))
            .query(&[("limit", FAVORITES_LIMIT)])
            .send()?
            .error_for_status()?
            .json()?;

        Ok(list.into_tracks().iter().map(|t| t.id).collect())
    }

    fn stream_bytes(&self, id: TrackId) -> Result<Vec<u8>> {
        // 1단계: 스트림이 호스팅된 위치를 받아온다
        let body = self
            .get(&format!("/i1/tracks/{}/streams", id))
            .send()?
            .error_for_status()?
            .text()?;
        let mp3_url = Self::parse_stream_url(id, &body)?;

        // 2단계: 실제 MP3 데이터
        let data = self
            .client
            .get(&mp3_url)
            .send()?
            .error_for_status()?
            .bytes()?
            .to_vec();

        Ok(data)
    }

    fn fetch_page(&self, url: &str) -> Result<String> {
        let html = self.client.get(url).send()?.error_for_status()?.text()?;
        Ok(html)
    }

    fn search(&self, query: &str) -> Result<Vec<Track>> {
        let list: TrackList = self
            .get("/tracks")
            .query(&[("q", query)])
            .send()?
            .error_for_status()?
            .json()?;

        Ok(list
            .into_tracks()
            .into_iter()
            .map(Self::convert_track)
            .collect())
    }
}
