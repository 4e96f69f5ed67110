//! On-disk layout: `<base>/<feed title>/<slug(guid)>/<enclosure file name>`.

use std::path::{Path, PathBuf};
use url::Url;

use super::error::PathError;
use crate::util::{sanitize_component, slugify};

/// Directory holding every item of the feed titled `title`.
pub fn plan_feed_dir(base: &Path, title: &str) -> Result<PathBuf, PathError> {
    let name =
        sanitize_component(title).ok_or_else(|| PathError::InvalidName(title.to_string()))?;
    Ok(base.join(name.as_ref()))
}

/// Directory for a single item, named after its slugified identifier.
pub fn plan_item_dir(feed_dir: &Path, guid: &str) -> PathBuf {
    feed_dir.join(slugify(guid))
}

/// Local file name for an enclosure: the last path segment of its URL,
/// percent-decoded.
pub fn enclosure_file_name(url: &Url) -> Result<String, PathError> {
    let segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .ok_or_else(|| PathError::InvalidName(url.to_string()))?;

    let decoded = urlencoding::decode(segment).unwrap_or(std::borrow::Cow::Borrowed(segment));

    sanitize_component(&decoded)
        .map(|name| name.into_owned())
        .ok_or_else(|| PathError::InvalidName(url.to_string()))
}

/// Creates `path` if it does not exist yet.
///
/// An existing directory is not an error. New directories get mode 0755 on
/// Unix.
pub async fn ensure_dir(path: &Path) -> Result<(), PathError> {
    let mut builder = tokio::fs::DirBuilder::new();
    #[cfg(unix)]
    builder.mode(0o755);

    match builder.create(path).await {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Created directory");
            Ok(())
        }
        Err(source) if source.kind() == std::io::ErrorKind::AlreadyExists => {
            match tokio::fs::metadata(path).await {
                Ok(metadata) if metadata.is_dir() => Ok(()),
                _ => Err(PathError::CreateDir {
                    path: path.to_path_buf(),
                    source,
                }),
            }
        }
        Err(source) => Err(PathError::CreateDir {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plan_layout() {
        let base = Path::new("/archive");
        let feed_dir = plan_feed_dir(base, "Example Cast").unwrap();
        assert_eq!(feed_dir, PathBuf::from("/archive/Example Cast"));
        assert_eq!(
            plan_item_dir(&feed_dir, "abc-123"),
            PathBuf::from("/archive/Example Cast/abc-123")
        );
    }

    #[test]
    fn test_plan_is_deterministic() {
        let base = Path::new("/archive");
        let a = plan_item_dir(&plan_feed_dir(base, "Cast").unwrap(), "urn:uuid:1234");
        let b = plan_item_dir(&plan_feed_dir(base, "Cast").unwrap(), "urn:uuid:1234");
        assert_eq!(a, b);
    }

    #[test]
    fn test_title_cannot_escape_base() {
        let base = Path::new("/archive");
        assert_eq!(
            plan_feed_dir(base, "../etc").unwrap(),
            PathBuf::from("/archive/.._etc")
        );
        assert!(matches!(
            plan_feed_dir(base, ".."),
            Err(PathError::InvalidName(_))
        ));
    }

    #[test]
    fn test_enclosure_file_name() {
        let url = Url::parse("https://host.example/shows/ep1.mp3?token=abc").unwrap();
        assert_eq!(enclosure_file_name(&url).unwrap(), "ep1.mp3");

        let url = Url::parse("https://host.example/shows/My%20Episode.mp3").unwrap();
        assert_eq!(enclosure_file_name(&url).unwrap(), "My Episode.mp3");

        let url = Url::parse("https://host.example/shows/ep2.m4a/").unwrap();
        assert_eq!(enclosure_file_name(&url).unwrap(), "ep2.m4a");
    }

    #[test]
    fn test_enclosure_file_name_rejects_empty_path() {
        let url = Url::parse("https://host.example/").unwrap();
        assert!(matches!(
            enclosure_file_name(&url),
            Err(PathError::InvalidName(_))
        ));

        let url = Url::parse("https://host.example/a/%2E%2E").unwrap();
        assert!(enclosure_file_name(&url).is_err());
    }

    #[test]
    fn test_encoded_separator_stays_in_one_component() {
        let url = Url::parse("https://host.example/a%2Fb.mp3").unwrap();
        assert_eq!(enclosure_file_name(&url).unwrap(), "a_b.mp3");
    }

    #[tokio::test]
    async fn test_ensure_dir_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("feed");

        ensure_dir(&dir).await.unwrap();
        ensure_dir(&dir).await.unwrap();
        assert!(dir.is_dir());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&dir).unwrap().permissions().mode();
            // umask may clear bits but never adds any
            assert_eq!(mode & 0o777 & !0o755, 0);
            assert_eq!(mode & 0o700, 0o700);
        }
    }

    #[tokio::test]
    async fn test_ensure_dir_missing_parent_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("missing").join("feed");
        assert!(matches!(
            ensure_dir(&dir).await,
            Err(PathError::CreateDir { .. })
        ));
    }

    #[tokio::test]
    async fn test_ensure_dir_file_in_the_way_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("feed");
        std::fs::write(&path, b"not a dir").unwrap();
        assert!(matches!(
            ensure_dir(&path).await,
            Err(PathError::CreateDir { .. })
        ));
    }
}
