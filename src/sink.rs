//! Output targets that rendered HTML is written into, addressed by `domId`.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Every write is a full replacement of the target's content, so concurrent
/// writers to the same target are last-write-wins.
pub trait OutputSink: Send + Sync {
    fn has_target(&self, dom_id: &str) -> bool;
    fn replace(&self, dom_id: &str, html: &str) -> io::Result<()>;
}

/// In-memory targets. Only ids declared up front exist.
#[derive(Debug, Default)]
pub struct MemorySink {
    targets: Mutex<HashMap<String, String>>,
}

impl MemorySink {
    pub fn with_targets<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let targets = ids.into_iter().map(|id| (id.into(), String::new())).collect();
        Self {
            targets: Mutex::new(targets),
        }
    }

    pub fn add_target(&self, dom_id: impl Into<String>) {
        self.lock().entry(dom_id.into()).or_default();
    }

    pub fn content(&self, dom_id: &str) -> Option<String> {
        self.lock().get(dom_id).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // a poisoned map is still a valid map
        self.targets.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl OutputSink for MemorySink {
    fn has_target(&self, dom_id: &str) -> bool {
        self.lock().contains_key(dom_id)
    }

    fn replace(&self, dom_id: &str, html: &str) -> io::Result<()> {
        match self.lock().get_mut(dom_id) {
            Some(content) => {
                *content = html.to_string();
                Ok(())
            }
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no output target '{}'", dom_id),
            )),
        }
    }
}

/// One `<domId>.html` file per target inside `root`.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, dom_id: &str) -> PathBuf {
        self.root.join(format!("{}.html", dom_id))
    }
}

/// Ids usable as file names: ASCII letters, digits, `-` and `_`.
fn is_valid_dom_id(dom_id: &str) -> bool {
    !dom_id.is_empty()
        && dom_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl OutputSink for DirectorySink {
    fn has_target(&self, dom_id: &str) -> bool {
        is_valid_dom_id(dom_id)
    }

    fn replace(&self, dom_id: &str, html: &str) -> io::Result<()> {
        if !is_valid_dom_id(dom_id) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("'{}' is not a usable target id", dom_id),
            ));
        }
        std::fs::create_dir_all(&self.root)?;

        // write then rename so readers never see a half-written file
        let path = self.path_for(dom_id);
        let tmp = self.root.join(format!(".{}.html.tmp", dom_id));
        std::fs::write(&tmp, html)?;
        std::fs::rename(&tmp, &path).inspect_err(|_| {
            let _ = std::fs::remove_file(&tmp);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_only_declared_targets() {
        let sink = MemorySink::with_targets(["example1"]);
        assert!(sink.has_target("example1"));
        assert!(!sink.has_target("example2"));
        assert!(sink.replace("example2", "<ul></ul>").is_err());

        sink.add_target("example2");
        sink.replace("example2", "<ul></ul>").unwrap();
        assert_eq!(sink.content("example2").as_deref(), Some("<ul></ul>"));
    }

    #[test]
    fn test_memory_sink_replace_overwrites() {
        let sink = MemorySink::with_targets(["example1"]);
        sink.replace("example1", "first").unwrap();
        sink.replace("example1", "second").unwrap();
        assert_eq!(sink.content("example1").as_deref(), Some("second"));
    }

    #[test]
    fn test_directory_sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("out"));
        sink.replace("example1", "<ul></ul>").unwrap();
        sink.replace("example1", "<ul><li>x</li></ul>").unwrap();
        let written = std::fs::read_to_string(sink.path_for("example1")).unwrap();
        assert_eq!(written, "<ul><li>x</li></ul>");
    }

    #[test]
    fn test_directory_sink_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path());
        assert!(!sink.has_target("../escape"));
        assert!(!sink.has_target(""));
        assert!(sink.replace("a/b", "x").is_err());
    }

    #[test]
    fn test_directory_sink_failed_rename_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path());
        // a non-empty directory where the file should go makes rename fail
        let blocker = sink.path_for("example1");
        std::fs::create_dir(&blocker).unwrap();
        std::fs::write(blocker.join("keep"), "x").unwrap();

        assert!(sink.replace("example1", "<ul></ul>").is_err());
        assert!(!dir.path().join(".example1.html.tmp").exists());
        assert!(blocker.join("keep").exists());
    }
}
