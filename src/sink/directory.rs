use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

use super::{ArtifactSet, ArtifactSink};
use crate::agent::schema::is_plain_file_name;

/// File holding the player guide.
pub const GUIDE_FILE: &str = "PLAYING.md";
/// File holding the JSON build report.
pub const REPORT_FILE: &str = "build-report.json";

/// Writes the game files, guide and report into one output directory.
///
/// Only plain file names are written; anything with a path component is
/// refused before any file is touched. Files listed in the previous
/// `build-report.json` are removed first; other files in the directory are
/// left alone.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Names written by the previous delivery, taken from its build report.
    fn previous_delivery(&self) -> Vec<String> {
        let path = self.dir.join(REPORT_FILE);
        let Ok(content) = fs::read_to_string(&path) else {
            return Vec::new();
        };
        let report: serde_json::Value = match serde_json::from_str(&content) {
            Ok(report) => report,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Unreadable previous build report");
                return vec![REPORT_FILE.to_string()];
            }
        };

        let mut names: Vec<String> = report["files"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|f| f["name"].as_str())
            .filter(|n| is_plain_file_name(n))
            .map(str::to_string)
            .collect();
        names.extend([GUIDE_FILE.to_string(), REPORT_FILE.to_string()]);
        names
    }

    /// Remove the previous delivery so no stale game survives a new build.
    fn clear_previous(&self) -> Result<()> {
        for name in self.previous_delivery() {
            let path = self.dir.join(&name);
            match fs::remove_file(&path) {
                Ok(()) => debug!(file = %path.display(), "Removed previous artifact"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to remove previous artifact {}", path.display())
                    });
                }
            }
        }
        Ok(())
    }

    fn write(&self, name: &str, content: &str) -> Result<()> {
        let path = self.dir.join(name);
        fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(file = %path.display(), bytes = content.len(), "Wrote artifact");
        Ok(())
    }
}

impl ArtifactSink for DirectorySink {
    fn deliver(&self, artifacts: &ArtifactSet) -> Result<()> {
        if let Some(bad) = artifacts.files.keys().find(|n| !is_plain_file_name(n)) {
            bail!("Refusing to write file outside the output directory: {:?}", bad);
        }
        for reserved in [GUIDE_FILE, REPORT_FILE] {
            if artifacts.files.contains_key(reserved) {
                warn!(file = reserved, "Generated file will be overwritten by build metadata");
            }
        }

        fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create output directory: {}", self.dir.display())
        })?;
        self.clear_previous()?;

        for (name, content) in &artifacts.files {
            self.write(name, content)?;
        }
        if let Some(guide) = &artifacts.guide {
            self.write(GUIDE_FILE, guide)?;
        }
        self.write(REPORT_FILE, &artifacts.report.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::FileSet;
    use crate::orchestrator::{BuildState, FinalStatus};
    use crate::sink::BuildReport;
    use chrono::Utc;
    use uuid::Uuid;

    fn artifacts(files: FileSet, status: FinalStatus, guide: Option<&str>) -> ArtifactSet {
        let report = BuildReport::new(
            Uuid::new_v4(),
            Utc::now(),
            &BuildState::new("pong"),
            status,
            None,
            vec![],
            &files,
        );
        ArtifactSet {
            files,
            status,
            guide: guide.map(str::to_string),
            report,
        }
    }

    fn trio() -> FileSet {
        [
            ("index.html", "<html></html>"),
            ("style.css", "body{}"),
            ("game.js", "loop();"),
        ]
        .into_iter()
        .map(|(n, c)| (n.to_string(), c.to_string()))
        .collect()
    }

    #[test]
    fn writes_files_guide_and_report() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        let sink = DirectorySink::new(&out);

        sink.deliver(&artifacts(trio(), FinalStatus::Success, Some("# Play")))
            .unwrap();

        assert_eq!(fs::read_to_string(out.join("game.js")).unwrap(), "loop();");
        assert_eq!(fs::read_to_string(out.join(GUIDE_FILE)).unwrap(), "# Play");
        let report: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join(REPORT_FILE)).unwrap()).unwrap();
        assert_eq!(report["status"], "SUCCESS");
        assert_eq!(report["files"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn failed_build_writes_only_the_report() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(tmp.path());
        sink.deliver(&artifacts(FileSet::new(), FinalStatus::Failed, None))
            .unwrap();
        let entries: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, [REPORT_FILE]);
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn failed_build_removes_previous_game() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(tmp.path());
        let mut files = trio();
        files.insert("levels.js".into(), "[]".into());
        sink.deliver(&artifacts(files, FinalStatus::Success, Some("# Play")))
            .unwrap();
        assert_eq!(entries(tmp.path()).len(), 6);

        sink.deliver(&artifacts(FileSet::new(), FinalStatus::Failed, None))
            .unwrap();
        assert_eq!(entries(tmp.path()), [REPORT_FILE]);
    }

    #[test]
    fn redelivery_drops_stale_files_and_keeps_foreign_ones() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(tmp.path());
        fs::write(tmp.path().join("notes.txt"), "mine").unwrap();
        let mut files = trio();
        files.insert("levels.js".into(), "[]".into());
        sink.deliver(&artifacts(files, FinalStatus::Success, Some("# Play")))
            .unwrap();

        sink.deliver(&artifacts(trio(), FinalStatus::Success, None))
            .unwrap();
        assert_eq!(
            entries(tmp.path()),
            [REPORT_FILE, "game.js", "index.html", "notes.txt", "style.css"]
        );
        assert_eq!(fs::read_to_string(tmp.path().join("notes.txt")).unwrap(), "mine");
    }

    #[test]
    fn path_components_are_refused() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        let mut files = trio();
        files.insert("../escape.js".into(), "x".into());
        let err = DirectorySink::new(&out)
            .deliver(&artifacts(files, FinalStatus::Success, None))
            .unwrap_err();
        assert!(err.to_string().contains("Refusing"));
        assert!(!out.exists());
        assert!(!tmp.path().join("escape.js").exists());
    }
}
