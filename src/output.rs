//! Run results: per-page artifacts, per-page failures and the aggregate outcome.

use crate::error::{ImagifyError, PageError, PageErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A page image written to its final location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageArtifact {
    /// 1-indexed page number.
    pub page: usize,
    /// `{output_dir}/{page}.{extension}`.
    pub path: PathBuf,
    /// Pixel width after resizing.
    pub width: u32,
    /// Pixel height after resizing.
    pub height: u32,
    /// Encoded size in bytes.
    pub bytes: usize,
}

/// A page that reached a terminal failure state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFailure {
    pub page: usize,
    pub kind: PageErrorKind,
    pub message: String,
}

impl From<&PageError> for PageFailure {
    fn from(e: &PageError) -> Self {
        Self {
            page: e.page(),
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

/// `Page   3  ResizeError      <message>`, as listed in run summaries.
impl fmt::Display for PageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page {:>3}  {:<15}  {}", self.page, self.kind, self.message)
    }
}

/// Overall classification of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every requested page was written.
    Success,
    /// At least one page was written, and at least one failed or was skipped.
    PartialSuccess,
    /// No page was written.
    Failed,
}

/// Aggregate result of a conversion run, finalised after the completion barrier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Pages handed to the worker pool.
    pub requested: usize,
    /// Pages written successfully.
    pub succeeded: usize,
    /// Pages that failed in some stage.
    pub failed: usize,
    /// Pages never admitted because the run was cancelled (or strict mode tripped).
    pub skipped: usize,
    /// Directory the artifacts were written to.
    pub output_dir: PathBuf,
    /// Successful pages, sorted by page number.
    pub artifacts: Vec<PageArtifact>,
    /// Failed pages, sorted by page number.
    pub failures: Vec<PageFailure>,
    /// Wall-clock time spent in the worker pool.
    pub duration_ms: u64,
}

impl RunOutcome {
    /// Fold one terminal page result into the outcome.
    pub(crate) fn record(&mut self, result: Result<PageArtifact, PageError>) {
        match result {
            Ok(artifact) => {
                self.succeeded += 1;
                self.artifacts.push(artifact);
            }
            Err(e) => {
                self.failed += 1;
                self.failures.push(PageFailure::from(&e));
            }
        }
    }

    /// Sort artifacts and failures and derive the skipped count.
    pub(crate) fn finalize(&mut self) {
        self.artifacts.sort_by_key(|a| a.page);
        self.failures.sort_by_key(|f| f.page);
        self.skipped = self
            .requested
            .saturating_sub(self.succeeded + self.failed);
    }

    pub fn status(&self) -> RunStatus {
        if self.succeeded == self.requested {
            RunStatus::Success
        } else if self.succeeded == 0 {
            RunStatus::Failed
        } else {
            RunStatus::PartialSuccess
        }
    }

    /// Treat any failed or skipped page as an error.
    pub fn into_result(self) -> Result<Self, ImagifyError> {
        if self.status() == RunStatus::Success {
            Ok(self)
        } else {
            Err(ImagifyError::PartialFailure {
                succeeded: self.succeeded,
                failed: self.failed,
                skipped: self.skipped,
                requested: self.requested,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(page: usize) -> PageArtifact {
        PageArtifact {
            page,
            path: PathBuf::from(format!("{page}.png")),
            width: 1,
            height: 1,
            bytes: 1,
        }
    }

    #[test]
    fn record_and_finalize() {
        let mut outcome = RunOutcome {
            requested: 4,
            ..Default::default()
        };
        outcome.record(Ok(artifact(3)));
        outcome.record(Err(PageError::Decode {
            page: 2,
            detail: "corrupt".into(),
        }));
        outcome.record(Ok(artifact(1)));
        outcome.finalize();

        assert_eq!(outcome.succeeded, 2);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(
            outcome.artifacts.iter().map(|a| a.page).collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert_eq!(outcome.failures[0].kind, PageErrorKind::Decode);
        assert_eq!(outcome.status(), RunStatus::PartialSuccess);
    }

    #[test]
    fn into_result_rejects_partial_runs() {
        let mut outcome = RunOutcome {
            requested: 2,
            ..Default::default()
        };
        outcome.record(Ok(artifact(1)));
        outcome.record(Err(PageError::Encode {
            page: 2,
            detail: "x".into(),
        }));
        outcome.finalize();
        assert!(matches!(
            outcome.into_result(),
            Err(ImagifyError::PartialFailure { failed: 1, .. })
        ));
    }

    #[test]
    fn all_failed_status() {
        let mut outcome = RunOutcome {
            requested: 1,
            ..Default::default()
        };
        outcome.record(Err(PageError::Persist {
            page: 1,
            path: PathBuf::from("1.png"),
            detail: "denied".into(),
        }));
        outcome.finalize();
        assert_eq!(outcome.status(), RunStatus::Failed);
    }

    #[test]
    fn failure_line_names_page_and_kind() {
        let failure = PageFailure::from(&PageError::Decode {
            page: 3,
            detail: "bad header".into(),
        });
        let line = failure.to_string();
        assert!(line.starts_with("Page   3  DecodeError      "), "{line}");
        assert!(line.ends_with("bad header"), "{line}");
    }

    #[test]
    fn outcome_is_json_serialisable() {
        let mut outcome = RunOutcome {
            requested: 1,
            ..Default::default()
        };
        outcome.record(Ok(artifact(1)));
        outcome.finalize();
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"succeeded\":1"));
    }
}
