use std::path::Path;

use id3::{Tag, TagLike, Version};

use crate::error::Result;

/// MP3 파일의 ID3 title 프레임을 읽는다. 태그가 없으면 None.
#[cfg(test)]
pub fn read_title(path: &Path) -> Result<Option<String>> {
    let tag = match Tag::read_from_path(path) {
        Ok(tag) => tag,
        Err(id3::Error {
            kind: id3::ErrorKind::NoTag,
            ..
        }) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    Ok(tag.title().map(|s| s.to_string()))
}

/// 다운로드한 파일에 ID3v2.4 title 태그를 기록한다.
/// 기존 태그가 있으면 title만 덮어쓰고 나머지 프레임은 유지한다.
pub fn write_title(path: &Path, title: &str) -> Result<()> {
    let mut tag = Tag::read_from_path(path).unwrap_or_else(|_| Tag::new());
    tag.set_title(title);
    tag.write_to_path(path, Version::Id3v24)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read_title() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.mp3");
        std::fs::write(&path, b"not really audio").unwrap();

        assert_eq!(read_title(&path).unwrap(), None);

        write_title(&path, "bob - My Track").unwrap();
        assert_eq!(read_title(&path).unwrap().as_deref(), Some("bob - My Track"));
    }

    #[test]
    fn test_rewrite_replaces_title() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.mp3");
        std::fs::write(&path, b"payload").unwrap();

        write_title(&path, "first").unwrap();
        write_title(&path, "second").unwrap();
        assert_eq!(read_title(&path).unwrap().as_deref(), Some("second"));
    }
}
