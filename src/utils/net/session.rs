//! Session ids: extraction from invite links, link building, generation.

use rand::Rng;
use url::Url;

const SESSION_PARAM: &str = "session";

/// Resolves the session id from whatever a student pasted at join time.
///
/// 1. a URL with a `session` query parameter yields that value;
/// 2. any other URL yields its last path segment;
/// 3. a non-URL containing `=` yields the text after the last `=`;
/// 4. anything else is taken verbatim.
///
/// Never fails. Ambiguous input may resolve to the wrong id.
pub fn extract_session_id(input: &str) -> String {
    match Url::parse(input) {
        Ok(url) => {
            if let Some((_, value)) = url.query_pairs().find(|(key, _)| key == SESSION_PARAM) {
                return value.into_owned();
            }
            match url.path_segments().and_then(|mut segments| segments.next_back()) {
                Some(last) => last.to_string(),
                None => input.rsplit('/').next().unwrap_or(input).to_string(),
            }
        }
        Err(_) => match input.rsplit_once('=') {
            Some((_, after)) => after.to_string(),
            None => input.to_string(),
        },
    }
}

/// `<join_url>?session=<id>`
pub fn invite_link(join_url: &str, session_id: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(join_url)?;
    url.query_pairs_mut().append_pair(SESSION_PARAM, session_id);
    Ok(url)
}

/// `session_` followed by six random base-36 characters.
pub fn generate_session_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .filter_map(|_| char::from_digit(rng.gen_range(0..36), 36))
        .collect();
    format!("session_{}", suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_query_parameter() {
        assert_eq!(extract_session_id("https://x.example/join?session=abc123"), "abc123");
        assert_eq!(extract_session_id("https://x.example/meet/other?session=abc123&x=1"), "abc123");
    }

    #[test]
    fn test_extract_from_path() {
        assert_eq!(extract_session_id("https://x.example/meet/zzz"), "zzz");
        assert_eq!(extract_session_id("https://x.example/meet/zzz?lang=en"), "zzz");
    }

    #[test]
    fn test_extract_from_bare_input() {
        assert_eq!(extract_session_id("abc123"), "abc123");
        assert_eq!(extract_session_id("room=xyz9"), "xyz9");
        assert_eq!(extract_session_id("a=b=c"), "c");
    }

    #[test]
    fn test_invite_link_round_trip() {
        let id = generate_session_id();
        let link = invite_link("http://localhost:3000/join", &id).unwrap();
        assert_eq!(link.as_str(), format!("http://localhost:3000/join?session={}", id));
        assert_eq!(extract_session_id(link.as_str()), id);
    }

    #[test]
    fn test_generated_session_id_shape() {
        let id = generate_session_id();
        let suffix = id.strip_prefix("session_").unwrap();
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }
}
