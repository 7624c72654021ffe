use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

/// Watches a single model file and yields change events on the async side
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    receiver: UnboundedReceiver<notify::Result<Event>>,
    target: PathBuf,
}

impl FileWatcher {
    pub fn new(path: &Path) -> notify::Result<Self> {
        let (tx, rx) = unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;

        // Watch the parent so editors that replace the file on save are still seen
        let dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
            target: path.to_path_buf(),
        })
    }

    /// Next event that creates or modifies the watched file.
    ///
    /// Returns `None` once the underlying watcher goes away.
    pub async fn next_change(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await? {
                Ok(event) if self.is_change(&event) => return Some(event),
                Ok(_) => continue,
                Err(err) => {
                    tracing::warn!(error = %err, "Watch error");
                }
            }
        }
    }

    fn is_change(&self, event: &Event) -> bool {
        matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
            && event
                .paths
                .iter()
                .any(|changed| changed.file_name() == self.target.file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;

    #[tokio::test]
    async fn test_file_watcher() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("model.json");
        fs::write(&model, "{}").unwrap();

        let mut watcher = FileWatcher::new(&model).unwrap();

        let target = model.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            fs::write(dir.path().join("other.json"), "{}").unwrap();
            fs::write(&target, r#"{ ":type": "text" }"#).unwrap();
            // Keep the directory alive until the watcher has seen the write
            tokio::time::sleep(Duration::from_millis(500)).await;
        });

        let event = tokio::time::timeout(Duration::from_secs(5), watcher.next_change())
            .await
            .unwrap();
        let event = event.unwrap();
        assert!(event
            .paths
            .iter()
            .any(|changed| changed.file_name() == model.file_name()));
    }
}
