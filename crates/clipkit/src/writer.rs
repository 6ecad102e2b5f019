//! Output files for exported articles

use rand::Rng;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Characters not allowed in file names on common filesystems
const ILLEGAL_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// File name used when a title sanitizes to nothing
pub const UNTITLED: &str = "untitled";

/// Turn an item title into a safe file stem
///
/// Each illegal character becomes `_`, surrounding whitespace is trimmed, and
/// an empty result becomes [`UNTITLED`].
pub fn sanitize_title(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| if ILLEGAL_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let trimmed = replaced.trim();
    if trimmed.is_empty() {
        UNTITLED.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Markdown path for an item title inside `dir`
pub fn article_path(dir: &Path, title: &str) -> PathBuf {
    dir.join(format!("{}.md", sanitize_title(title)))
}

/// What [`write_if_absent`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// A file already existed; nothing was touched
    Skipped,
}

/// Write `content` to `path` unless something is already there
pub async fn write_if_absent(path: &Path, content: &str) -> io::Result<WriteOutcome> {
    if tokio::fs::try_exists(path).await? {
        debug!(path = %path.display(), "Output exists, skipping");
        return Ok(WriteOutcome::Skipped);
    }
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content).await?;
    Ok(WriteOutcome::Written)
}

/// Randomized pause between exports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    min: Duration,
    max: Duration,
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_millis(3000))
    }
}

impl Throttle {
    /// Pause for a uniform random duration in `[min, max]`
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// No pause at all
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Pick the next delay
    pub fn next_delay(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let ms = rand::thread_rng().gen_range(self.min.as_millis()..=self.max.as_millis());
        Duration::from_millis(ms as u64)
    }

    pub async fn wait(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            debug!(delay_ms = delay.as_millis() as u64, "Throttling");
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_title_replaces_each_char() {
        assert_eq!(sanitize_title("a/b:c*d"), "a_b_c_d");
        assert_eq!(sanitize_title("<>:\"/\\|?*"), "_________");
    }

    #[test]
    fn test_sanitize_title_trims_and_defaults() {
        assert_eq!(sanitize_title("  What is Rust?  "), "What is Rust_");
        assert_eq!(sanitize_title(""), "untitled");
        assert_eq!(sanitize_title("   "), "untitled");
    }

    #[test]
    fn test_article_path() {
        let path = article_path(Path::new("/tmp/out"), "a/b");
        assert_eq!(path, PathBuf::from("/tmp/out/a_b.md"));
    }

    #[tokio::test]
    async fn test_write_if_absent_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/dir/a.md");

        let outcome = write_if_absent(&path, "hello").await.unwrap();
        assert_eq!(outcome, WriteOutcome::Written);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_write_if_absent_skips_existing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.md");
        std::fs::write(&path, "original").unwrap();

        let outcome = write_if_absent(&path, "new").await.unwrap();
        assert_eq!(outcome, WriteOutcome::Skipped);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "original");
    }

    #[test]
    fn test_throttle_range() {
        let throttle = Throttle::default();
        for _ in 0..50 {
            let delay = throttle.next_delay();
            assert!(delay >= Duration::from_millis(500));
            assert!(delay <= Duration::from_millis(3000));
        }
        assert_eq!(Throttle::disabled().next_delay(), Duration::ZERO);
    }

    #[test]
    fn test_throttle_swaps_inverted_bounds() {
        let throttle = Throttle::new(Duration::from_millis(20), Duration::from_millis(10));
        let delay = throttle.next_delay();
        assert!(delay >= Duration::from_millis(10) && delay <= Duration::from_millis(20));
    }
}
