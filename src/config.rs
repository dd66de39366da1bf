use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::Error;

const CLIENT_ID_ENV: &str = "SOUNDPLOW_CLIENT_ID";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub general: GeneralSettings,
    #[serde(default)]
    pub like: LikeSettings,
    #[serde(default)]
    pub link: LinkSettings,
    #[serde(default)]
    pub soundcloud: SoundCloudSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralSettings {
    #[serde(default = "default_output_dir")]
    pub output: PathBuf,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            output: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LikeSettings {
    #[serde(default)]
    pub user: String,
}

/// 대기열 링크는 쉼표로 이어 붙인 한 줄로 저장한다.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LinkSettings {
    #[serde(default)]
    pub tracks: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SoundCloudSettings {
    pub client_id: Option<String>,
    /// 환경 변수로 받은 값. 파일에는 기록하지 않는다.
    #[serde(skip)]
    pub env_client_id: Option<String>,
}

impl SoundCloudSettings {
    /// 실제로 쓸 client_id. 환경 변수가 파일 값보다 우선한다.
    pub fn effective_client_id(&self) -> Option<&str> {
        self.env_client_id
            .as_deref()
            .or(self.client_id.as_deref())
            .filter(|s| !s.is_empty())
    }

    pub fn is_configured(&self) -> bool {
        self.effective_client_id().is_some()
    }
}

impl Settings {
    pub fn queued_links(&self) -> Vec<String> {
        self.link
            .tracks
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn set_queued_links(&mut self, links: &[String]) {
        self.link.tracks = links.join(",");
    }

    /// 시작 시 출력 디렉토리가 없으면 만든다. 다운로드 시점에는 만들지 않는다.
    pub fn ensure_output_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.general.output).with_context(|| {
            format!(
                "출력 디렉토리를 만들 수 없습니다: {}",
                self.general.output.display()
            )
        })
    }

    fn apply_env(&mut self, client_id: Option<String>) {
        self.soundcloud.env_client_id = client_id.filter(|id| !id.is_empty());
    }
}

/// 대기열에 넣을 링크를 검사한다.
/// 쉼표는 저장 형식의 구분자이므로 링크 안에 들어갈 수 없다.
pub fn validate_link(link: &str) -> std::result::Result<(), Error> {
    let reason = if link.is_empty() {
        "링크가 비어 있습니다"
    } else if link.contains(',') {
        "링크에 \",\" 문자가 들어 있습니다"
    } else if !link.contains("soundcloud.com") {
        "\"...soundcloud.com/...\" 형식의 링크가 필요합니다"
    } else {
        return Ok(());
    };

    Err(Error::InvalidLink {
        link: link.to_string(),
        reason,
    })
}

fn home_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
}

fn default_output_dir() -> PathBuf {
    home_dir().join("Music")
}

pub fn settings_path() -> PathBuf {
    home_dir()
        .join(".config")
        .join("soundplow")
        .join("settings.toml")
}

/// 설정 파일을 읽는다. 파일이나 항목이 없으면 기본값으로 채운다.
/// 파일을 해석할 수 없으면 에러를 돌려주고 파일은 건드리지 않는다.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let mut settings = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("설정 파일을 읽을 수 없습니다: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("설정 파일을 해석할 수 없습니다: {}", path.display()))?
    } else {
        tracing::debug!(path = %path.display(), "no settings file, using defaults");
        Settings::default()
    };

    settings.apply_env(std::env::var(CLIENT_ID_ENV).ok());
    Ok(settings)
}

/// 시작 시 설정을 읽고 빠진 항목을 기본값으로 채워 다시 기록한다.
pub fn load_or_init(path: &Path) -> Result<Settings> {
    let settings = load_settings(path)?;
    save_settings(path, &settings)?;
    Ok(settings)
}

pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(settings)?;
    std::fs::write(path, content)
        .with_context(|| format!("설정을 저장할 수 없습니다: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings(&dir.path().join("none.toml")).unwrap();
        assert!(settings.like.user.is_empty());
        assert!(settings.queued_links().is_empty());
        assert!(settings.general.output.ends_with("Music"));
    }

    #[test]
    fn test_partial_file_fills_missing_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[like]\nuser = \"alice\"\n").unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.like.user, "alice");
        assert!(settings.link.tracks.is_empty());
        assert!(settings.general.output.ends_with("Music"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");

        let mut settings = Settings::default();
        settings.general.output = dir.path().join("out");
        settings.like.user = "bob".to_string();
        settings.set_queued_links(&[
            "https://soundcloud.com/a/one".to_string(),
            "https://soundcloud.com/b/two".to_string(),
        ]);
        save_settings(&path, &settings).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("[general]"));
        assert!(content.contains("[like]"));
        assert!(content.contains("[link]"));

        let loaded = load_settings(&path).unwrap();
        assert_eq!(loaded.general.output, settings.general.output);
        assert_eq!(loaded.like.user, "bob");
        assert_eq!(loaded.queued_links(), settings.queued_links());
    }

    #[test]
    fn test_queued_links_skip_empty_entries() {
        let mut settings = Settings::default();
        settings.link.tracks = "https://soundcloud.com/a/x,, https://soundcloud.com/b/y,".to_string();
        assert_eq!(
            settings.queued_links(),
            vec![
                "https://soundcloud.com/a/x".to_string(),
                "https://soundcloud.com/b/y".to_string()
            ]
        );
    }

    #[test]
    fn test_validate_link() {
        assert!(validate_link("https://soundcloud.com/artist/track").is_ok());
        assert!(validate_link("").is_err());
        assert!(validate_link("https://soundcloud.com/a,b").is_err());
        assert!(validate_link("https://example.com/track").is_err());
    }

    #[test]
    fn test_ensure_output_dir_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.general.output = dir.path().join("music").join("sc");
        settings.ensure_output_dir().unwrap();
        assert!(settings.general.output.is_dir());
    }

    #[test]
    fn test_malformed_file_is_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let broken = "[soundcloud]\nclient_id = \"abc\"\n[like]\nuser = alice\n";
        std::fs::write(&path, broken).unwrap();

        assert!(load_settings(&path).is_err());
        assert!(load_or_init(&path).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), broken);
    }

    #[test]
    fn test_load_or_init_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("settings.toml");

        let settings = load_or_init(&path).unwrap();
        assert!(path.is_file());
        assert_eq!(load_settings(&path).unwrap().general, settings.general);
    }

    #[test]
    fn test_env_client_id_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[soundcloud]\nclient_id = \"mine\"\n").unwrap();

        let mut settings = load_settings(&path).unwrap();
        settings.apply_env(Some("secret-from-env".to_string()));
        assert_eq!(settings.soundcloud.effective_client_id(), Some("secret-from-env"));

        save_settings(&path, &settings).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("mine"));
        assert!(!content.contains("secret-from-env"));
    }

    #[test]
    fn test_empty_env_client_id_falls_back_to_file() {
        let mut settings = Settings::default();
        settings.soundcloud.client_id = Some("mine".to_string());
        settings.apply_env(Some(String::new()));
        assert_eq!(settings.soundcloud.effective_client_id(), Some("mine"));

        settings.soundcloud.client_id = None;
        assert!(!settings.soundcloud.is_configured());
    }
}
