use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

/// Highest percentage reported while bytes are still moving
const MAX_IN_FLIGHT_PERCENT: u8 = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UploadProgress {
    Pending,
    Transferring { percent: u8 },
    Completed,
    Failed { percent: u8 },
}

impl UploadProgress {
    pub fn percent(&self) -> u8 {
        match *self {
            Self::Pending => 0,
            Self::Transferring { percent } | Self::Failed { percent } => percent,
            Self::Completed => 100,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed { .. })
    }
}

/// Publishes the progress of one upload.
///
/// The percentage never goes down, stays below 100 until the upload
/// completes, and once `Completed` or `Failed` is reached nothing changes
/// anymore. Clones share the same state.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    tx: Arc<watch::Sender<UploadProgress>>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(UploadProgress::Pending);
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadProgress> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> UploadProgress {
        *self.tx.borrow()
    }

    /// Reports `sent` of `total` bytes transferred
    pub fn report(&self, sent: u64, total: u64) {
        let percent = if total == 0 {
            0
        } else {
            (sent.min(total) * 100 / total).min(MAX_IN_FLIGHT_PERCENT as u64) as u8
        };

        self.tx.send_if_modified(|state| match *state {
            UploadProgress::Pending => {
                *state = UploadProgress::Transferring { percent };
                true
            }
            UploadProgress::Transferring { percent: current } if percent > current => {
                *state = UploadProgress::Transferring { percent };
                true
            }
            _ => false,
        });
    }

    /// Marks the upload as done. Returns false if it already ended.
    pub fn complete(&self) -> bool {
        self.finish(|_| UploadProgress::Completed)
    }

    /// Marks the upload as failed. Returns false if it already ended.
    pub fn fail(&self) -> bool {
        self.finish(|percent| UploadProgress::Failed { percent })
    }

    fn finish(&self, terminal: impl FnOnce(u8) -> UploadProgress) -> bool {
        self.tx.send_if_modified(|state| {
            if state.is_terminal() {
                return false;
            }
            *state = terminal(state.percent());
            true
        })
    }
}
