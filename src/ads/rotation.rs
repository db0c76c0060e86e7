//! Ad rotation: cycling through the eligible ads of one placement.
//!
//! [`AdRotator`] is the pure state machine. [`RotationHandle`] drives it on a
//! timer and is cancelled when dropped or when its ad list changes.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Where a rotator is rendered. Each placement has its own cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Sidebar,
    InArticle,
    Generic,
}

impl Placement {
    pub fn default_interval(&self) -> Duration {
        match self {
            Placement::Sidebar => Duration::from_secs(7),
            Placement::InArticle => Duration::from_secs(10),
            Placement::Generic => Duration::from_secs(5),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Placement::Sidebar => "sidebar",
            Placement::InArticle => "in-article",
            Placement::Generic => "generic",
        }
    }
}

/// Index into a list of `len` ads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdRotator {
    len: usize,
    index: usize,
}

impl AdRotator {
    pub fn new(len: usize) -> Self {
        Self { len, index: 0 }
    }

    /// Active ad, `None` for an empty list.
    pub fn current(&self) -> Option<usize> {
        (self.len > 0).then_some(self.index)
    }

    /// A single ad (or none) never rotates.
    pub fn is_rotating(&self) -> bool {
        self.len > 1
    }

    /// Move to the next ad, wrapping around.
    pub fn advance(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        self.index = (self.index + 1) % self.len;
        Some(self.index)
    }
}

/// A running rotation timer.
///
/// No task is spawned for one ad or fewer. Dropping the handle cancels the
/// timer.
pub struct RotationHandle {
    index: watch::Receiver<usize>,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl RotationHandle {
    /// Start rotating over a loaded list of `len` ads.
    ///
    /// The timer is a child of `parent`, so cancelling `parent` stops it too.
    pub fn start(len: usize, every: Duration, parent: &CancellationToken) -> Self {
        let token = parent.child_token();
        let (tx, rx) = watch::channel(0usize);
        let rotator = AdRotator::new(len);

        let task = rotator
            .is_rotating()
            .then(|| tokio::spawn(rotate(rotator, every, token.clone(), tx)));

        Self {
            index: rx,
            token,
            task,
        }
    }

    /// Index of the ad currently shown.
    pub fn current(&self) -> usize {
        *self.index.borrow()
    }

    /// Receiver notified on every rotation step.
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.index.clone()
    }

    /// Whether a timer task is running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Restart over a new ad list. The old timer is cancelled first so it can
    /// never touch the new list.
    pub fn restart(&mut self, len: usize, every: Duration, parent: &CancellationToken) {
        self.stop();
        *self = Self::start(len, every, parent);
    }

    /// Cancel the timer.
    pub fn stop(&self) {
        self.token.cancel();
    }
}

async fn rotate(
    mut rotator: AdRotator,
    every: Duration,
    token: CancellationToken,
    tx: watch::Sender<usize>,
) {
    let mut ticker = interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                let Some(next) = rotator.advance() else { break };
                if tx.send(next).is_err() {
                    break;
                }
            }
        }
    }
    tracing::trace!("Ad rotation stopped");
}

impl Drop for RotationHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
