/// 파일명에 사용할 수 없어 제목에서 삭제하는 문자들.
pub const FORBIDDEN_CHARACTERS: [char; 10] = ['/', '\\', '?', '%', '*', ':', '|', '"', '<', '>'];

/// 트랙 제목을 `"{artist} - {title}"` 형식으로 맞춘다.
/// 제목에 업로더 이름이 이미 있거나 `"... - ..."` 형식이면 그대로 둔다.
/// 결과에서 파일명 금지 문자는 치환하지 않고 삭제한다.
pub fn format_title(username: &str, raw_title: &str) -> String {
    let contains_user = raw_title
        .to_lowercase()
        .contains(&username.to_lowercase());

    let title = if !contains_user && !has_artist_separator(raw_title) {
        format!("{} - {}", username, raw_title)
    } else {
        raw_title.to_string()
    };

    strip_forbidden(&title)
}

/// `"<something> - <something>"` 형식인지 확인한다. 양쪽이 비어 있어도 된다.
fn has_artist_separator(title: &str) -> bool {
    title.contains(" - ")
}

fn strip_forbidden(s: &str) -> String {
    s.chars()
        .filter(|c| !FORBIDDEN_CHARACTERS.contains(c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_title_containing_username() {
        assert_eq!(format_title("alice", "alice - Song"), "alice - Song");
    }

    #[test]
    fn test_username_match_ignores_case() {
        assert_eq!(format_title("Alice", "ALICE live set"), "ALICE live set");
    }

    #[test]
    fn test_prefixes_username() {
        assert_eq!(format_title("bob", "My Track"), "bob - My Track");
    }

    #[test]
    fn test_keeps_existing_separator() {
        assert_eq!(format_title("bob", "X - Y"), "X - Y");
    }

    #[test]
    fn test_removes_forbidden_characters() {
        let title = format_title("a", "Song/Name?");
        assert!(!title.contains('/'));
        assert!(!title.contains('?'));
        assert_eq!(title, "a - SongName");
    }

    #[test]
    fn test_removes_every_forbidden_character() {
        let raw = "x - a/b\\c?d%e*f:g|h\"i<j>k";
        assert_eq!(format_title("x", raw), "x - abcdefghijk");
    }

    #[test]
    fn test_forbidden_characters_in_username() {
        assert_eq!(format_title("AC/DC", "Thunder"), "ACDC - Thunder");
    }
}
