//! Classification buckets and report artifacts
//!
//! Outcomes accumulate into buckets keyed by status class. The buckets are
//! mutated only by the runner's aggregator task; once a run finishes they
//! are read-only and the writer turns them into newline-separated endpoint
//! lists on disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::ReportError;
use crate::probe::outcome::{ClassKey, ProbeOutcome, StatusFilter};

/// Endpoints grouped by status classification
///
/// Insertion order within a bucket is completion order, which is
/// unconstrained relative to input order.
#[derive(Debug, Default)]
pub struct ClassificationBuckets {
    buckets: HashMap<ClassKey, Vec<String>>,
}

impl ClassificationBuckets {
    /// Create empty buckets
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one outcome into its classification bucket
    pub fn insert(&mut self, outcome: ProbeOutcome) {
        self.buckets
            .entry(outcome.class_key())
            .or_default()
            .push(outcome.endpoint);
    }

    /// Get the endpoints in one bucket
    pub fn get(&self, key: &ClassKey) -> Option<&[String]> {
        self.buckets.get(key).map(Vec::as_slice)
    }

    /// Iterate buckets in ascending class order, unreachable last
    pub fn iter_sorted(&self) -> impl Iterator<Item = (&ClassKey, &[String])> {
        let mut keys: Vec<&ClassKey> = self.buckets.keys().collect();
        keys.sort();
        keys.into_iter()
            .map(|key| (key, self.buckets[key].as_slice()))
    }

    /// Total endpoints across all buckets
    pub fn total(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Whether no outcome has been recorded
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// One file produced by the report writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Path the artifact was written to
    pub path: PathBuf,

    /// Classification the artifact covers, `None` for a filtered report
    pub class: Option<ClassKey>,

    /// Number of endpoints written
    pub count: usize,
}

/// Writes classification buckets as newline-separated endpoint lists
#[derive(Debug, Clone)]
pub struct ReportWriter {
    /// Base name for output files
    base: PathBuf,
}

impl ReportWriter {
    /// Create a writer with the given output base name
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Write the report
    ///
    /// With a filter configured a single `{base}.txt` holds the endpoints
    /// of all matching classes. Without one, each observed class gets its
    /// own `{base}_{class}.txt`, including the unreachable bucket.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Write` naming the failing path. Files written
    /// earlier in the same call are left intact.
    pub async fn write(
        &self,
        buckets: &ClassificationBuckets,
        filter: Option<&StatusFilter>,
    ) -> Result<Vec<Artifact>, ReportError> {
        match filter {
            Some(filter) => self.write_filtered(buckets, filter).await,
            None => self.write_per_class(buckets).await,
        }
    }

    async fn write_filtered(
        &self,
        buckets: &ClassificationBuckets,
        filter: &StatusFilter,
    ) -> Result<Vec<Artifact>, ReportError> {
        let mut matched = Vec::new();
        for (key, endpoints) in buckets.iter_sorted() {
            if filter.matches_key(key) {
                matched.extend_from_slice(endpoints);
            }
        }

        let path = artifact_path(&self.base, None);
        write_lines(&path, &matched).await?;
        tracing::debug!(path = %path.display(), count = matched.len(), "Wrote filtered report");

        Ok(vec![Artifact {
            path,
            class: None,
            count: matched.len(),
        }])
    }

    async fn write_per_class(
        &self,
        buckets: &ClassificationBuckets,
    ) -> Result<Vec<Artifact>, ReportError> {
        let mut artifacts = Vec::new();

        for (key, endpoints) in buckets.iter_sorted() {
            let path = artifact_path(&self.base, Some(&key.suffix()));

            write_lines(&path, endpoints).await?;
            tracing::debug!(
                path = %path.display(),
                class = %key,
                count = endpoints.len(),
                "Wrote class report"
            );

            artifacts.push(Artifact {
                path,
                class: Some(*key),
                count: endpoints.len(),
            });
        }

        Ok(artifacts)
    }
}

/// Build an artifact path by appending to the base name
///
/// Plain concatenation, not `with_extension`: a base like `results.2024`
/// must yield `results.2024_2xx.txt`, not clobber everything after its
/// last dot.
fn artifact_path(base: &Path, suffix: Option<&str>) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    if let Some(suffix) = suffix {
        name.push(format!("_{suffix}"));
    }
    name.push(".txt");
    PathBuf::from(name)
}

async fn write_lines(path: &Path, endpoints: &[String]) -> Result<(), ReportError> {
    let mut contents = String::with_capacity(endpoints.iter().map(|e| e.len() + 1).sum());
    for endpoint in endpoints {
        contents.push_str(endpoint);
        contents.push('\n');
    }

    tokio::fs::write(path, contents)
        .await
        .map_err(|source| ReportError::Write {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_buckets() -> ClassificationBuckets {
        let mut buckets = ClassificationBuckets::new();
        buckets.insert(ProbeOutcome::responded("http://ok-1.test", 200));
        buckets.insert(ProbeOutcome::responded("http://moved.test", 301));
        buckets.insert(ProbeOutcome::responded("http://ok-2.test", 204));
        buckets.insert(ProbeOutcome::responded("http://gone.test", 404));
        buckets.insert(ProbeOutcome::unreachable("http://down.test"));
        buckets
    }

    #[test]
    fn test_insert_preserves_completion_order() {
        let buckets = sample_buckets();
        let ok = buckets.get(&ClassKey::Status(2)).unwrap();
        assert_eq!(ok, ["http://ok-1.test", "http://ok-2.test"]);
    }

    #[test]
    fn test_iter_sorted_puts_unreachable_last() {
        let buckets = sample_buckets();
        let keys: Vec<&ClassKey> = buckets.iter_sorted().map(|(key, _)| key).collect();
        assert_eq!(
            keys,
            [
                &ClassKey::Status(2),
                &ClassKey::Status(3),
                &ClassKey::Status(4),
                &ClassKey::Unreachable
            ]
        );
    }

    #[test]
    fn test_total() {
        assert_eq!(sample_buckets().total(), 5);
        assert!(ClassificationBuckets::new().is_empty());
    }

    #[tokio::test]
    async fn test_write_per_class() {
        let dir = tempfile::TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path().join("status"));

        let artifacts = writer.write(&sample_buckets(), None).await.unwrap();
        assert_eq!(artifacts.len(), 4);

        let ok_file = dir.path().join("status_2xx.txt");
        let contents = std::fs::read_to_string(&ok_file).unwrap();
        assert_eq!(contents, "http://ok-1.test\nhttp://ok-2.test\n");

        assert!(dir.path().join("status_unreachable.txt").exists());
    }

    #[tokio::test]
    async fn test_write_filtered() {
        let dir = tempfile::TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path().join("status"));
        let filter: StatusFilter = "2xx".parse().unwrap();

        let artifacts = writer
            .write(&sample_buckets(), Some(&filter))
            .await
            .unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].count, 2);

        let contents = std::fs::read_to_string(dir.path().join("status.txt")).unwrap();
        assert_eq!(contents, "http://ok-1.test\nhttp://ok-2.test\n");
    }

    #[tokio::test]
    async fn test_write_filtered_excludes_unreachable() {
        let dir = tempfile::TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path().join("status"));
        let filter: StatusFilter = "2xx,3xx,4xx,5xx".parse().unwrap();

        let artifacts = writer
            .write(&sample_buckets(), Some(&filter))
            .await
            .unwrap();
        assert_eq!(artifacts[0].count, 4);

        let contents = std::fs::read_to_string(dir.path().join("status.txt")).unwrap();
        assert!(!contents.contains("down.test"));
    }

    #[tokio::test]
    async fn test_write_empty_buckets_with_filter_yields_empty_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path().join("status"));
        let filter: StatusFilter = "2xx".parse().unwrap();

        let artifacts = writer
            .write(&ClassificationBuckets::new(), Some(&filter))
            .await
            .unwrap();
        assert_eq!(artifacts[0].count, 0);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("status.txt")).unwrap(),
            ""
        );
    }

    #[test]
    fn test_artifact_path_appends_instead_of_replacing() {
        assert_eq!(
            artifact_path(Path::new("status"), Some("2xx")),
            PathBuf::from("status_2xx.txt")
        );
        assert_eq!(
            artifact_path(Path::new("results.2024"), Some("4xx")),
            PathBuf::from("results.2024_4xx.txt")
        );
        assert_eq!(
            artifact_path(Path::new("results.2024"), None),
            PathBuf::from("results.2024.txt")
        );
    }

    #[tokio::test]
    async fn test_dotted_base_keeps_per_class_files_distinct() {
        let dir = tempfile::TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path().join("results.2024"));

        let mut buckets = ClassificationBuckets::new();
        buckets.insert(ProbeOutcome::responded("http://ok.test", 200));
        buckets.insert(ProbeOutcome::responded("http://gone.test", 404));

        let artifacts = writer.write(&buckets, None).await.unwrap();
        assert_eq!(artifacts.len(), 2);

        let ok_file = dir.path().join("results.2024_2xx.txt");
        let gone_file = dir.path().join("results.2024_4xx.txt");
        assert_eq!(
            std::fs::read_to_string(&ok_file).unwrap(),
            "http://ok.test\n"
        );
        assert_eq!(
            std::fs::read_to_string(&gone_file).unwrap(),
            "http://gone.test\n"
        );
    }

    #[tokio::test]
    async fn test_dotted_base_filtered_report_keeps_suffix() {
        let dir = tempfile::TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path().join("results.2024"));
        let filter: StatusFilter = "2xx".parse().unwrap();

        let artifacts = writer
            .write(&sample_buckets(), Some(&filter))
            .await
            .unwrap();
        assert_eq!(artifacts[0].path, dir.path().join("results.2024.txt"));
        assert!(artifacts[0].path.exists());
    }

    #[tokio::test]
    async fn test_write_to_unwritable_path_fails_with_path() {
        let writer = ReportWriter::new("/nonexistent-dir/status");
        let filter: StatusFilter = "2xx".parse().unwrap();

        let err = writer
            .write(&sample_buckets(), Some(&filter))
            .await
            .unwrap_err();
        let ReportError::Write { path, .. } = err;
        assert_eq!(path, PathBuf::from("/nonexistent-dir/status.txt"));
    }
}
