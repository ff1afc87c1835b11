//! Collision-resistant object names
//!
//! Object paths are `{owner}/{unix_millis}-{token}-{file name}`. The
//! timestamp plus a short random token make collisions unlikely enough that
//! no existence check round trip is needed; the store's no-overwrite put
//! catches the rest.

use chrono::{DateTime, Utc};
use rand::Rng;

use super::UploadError;

/// Length of the random token in each object name
pub const TOKEN_LENGTH: usize = 6;

const TOKEN_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const MAX_OWNER_ID_LEN: usize = 128;
const FALLBACK_FILE_NAME: &str = "photo";

/// Owner ids become the first path segment: ASCII letters, digits, `-` and `_`
pub fn validate_owner_id(owner_id: &str) -> Result<(), UploadError> {
    let valid = !owner_id.is_empty()
        && owner_id.len() <= MAX_OWNER_ID_LEN
        && owner_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(UploadError::InvalidOwner(owner_id.to_string()))
    }
}

/// Last path component of `name` with unsafe characters replaced by `_`
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(&['/', '\\'][..]).next().unwrap_or(name);
    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches('.').is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        sanitized
    }
}

/// Short lowercase alphanumeric token
pub fn random_token() -> String {
    let mut rng = rand::thread_rng();
    (0..TOKEN_LENGTH)
        .map(|_| TOKEN_CHARSET[rng.gen_range(0..TOKEN_CHARSET.len())] as char)
        .collect()
}

/// Deterministic object path for a given clock reading and token
pub fn build_object_path(owner_id: &str, file_name: &str, now: DateTime<Utc>, token: &str) -> String {
    format!(
        "{}/{}-{}-{}",
        owner_id,
        now.timestamp_millis(),
        token,
        sanitize_file_name(file_name)
    )
}

/// Object path for an upload happening now
pub fn new_object_path(owner_id: &str, file_name: &str) -> String {
    build_object_path(owner_id, file_name, Utc::now(), &random_token())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_build_object_path() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(
            build_object_path("acme", "living room.jpg", now, "k3x9qa"),
            "acme/1700000000123-k3x9qa-living_room.jpg"
        );
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\rug.png"), "rug.png");
        assert_eq!(sanitize_file_name("tapis-été.jpg"), "tapis-_t_.jpg");
    }

    #[test]
    fn test_sanitize_falls_back_for_empty_names() {
        assert_eq!(sanitize_file_name(""), "photo");
        assert_eq!(sanitize_file_name(".."), "photo");
        assert_eq!(sanitize_file_name("dir/"), "photo");
    }

    #[test]
    fn test_random_token_shape() {
        let token = random_token();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_new_paths_differ() {
        let first = new_object_path("acme", "rug.jpg");
        let second = new_object_path("acme", "rug.jpg");
        assert_ne!(first, second);
        assert!(first.starts_with("acme/"));
        assert!(first.ends_with("-rug.jpg"));
    }

    #[test]
    fn test_owner_id_validation() {
        assert!(validate_owner_id("acme-cleaning_01").is_ok());
        assert!(validate_owner_id(&"x".repeat(128)).is_ok());
        for bad in ["", "acme/other", "..", "acme cleaning", "acme.", "x".repeat(129).as_str()] {
            assert!(
                matches!(validate_owner_id(bad), Err(UploadError::InvalidOwner(_))),
                "accepted {bad:?}"
            );
        }
    }
}
