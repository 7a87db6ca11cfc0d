//! Scripted remote job client for tests

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use stratwatch_client::{ClientError, RemoteJobClient};
use stratwatch_core::domain::job::JobHandle;
use stratwatch_core::domain::log::LogBatch;

/// Replays scripted answers in order
///
/// Once the status script runs out the last scripted status repeats
/// (`STOPPED` if none was scripted); once the log script runs out every
/// fetch returns an empty page without a cursor.
#[derive(Default)]
pub(crate) struct ScriptedClient {
    statuses: Mutex<VecDeque<Result<String, ClientError>>>,
    last_status: Mutex<Option<String>>,
    batches: Mutex<VecDeque<Result<LogBatch, ClientError>>>,
    cursors: Mutex<Vec<Option<String>>>,
    status_calls: AtomicU32,
    log_calls: AtomicU32,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses<I, S>(self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.statuses
            .lock()
            .unwrap()
            .extend(statuses.into_iter().map(|s| Ok(s.into())));
        self
    }

    pub fn status_error(self, err: ClientError) -> Self {
        self.statuses.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn batch<I, S>(self, lines: I, cursor: Option<&str>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let batch = LogBatch::from_lines(lines, cursor.map(str::to_string));
        self.batches.lock().unwrap().push_back(Ok(batch));
        self
    }

    pub fn log_error(self, err: ClientError) -> Self {
        self.batches.lock().unwrap().push_back(Err(err));
        self
    }

    /// Cursor passed to every log fetch, in call order
    pub fn requested_cursors(&self) -> Vec<Option<String>> {
        self.cursors.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn log_calls(&self) -> u32 {
        self.log_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteJobClient for ScriptedClient {
    async fn job_status(&self, _handle: &JobHandle) -> stratwatch_client::Result<String> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);

        let next = self.statuses.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => {
                *self.last_status.lock().unwrap() = Some(text.clone());
                Ok(text)
            }
            Some(Err(err)) => Err(err),
            None => Ok(self
                .last_status
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| "STOPPED".to_string())),
        }
    }

    async fn log_batch(
        &self,
        _handle: &JobHandle,
        cursor: Option<&str>,
    ) -> stratwatch_client::Result<LogBatch> {
        self.log_calls.fetch_add(1, Ordering::SeqCst);
        self.cursors
            .lock()
            .unwrap()
            .push(cursor.map(str::to_string));

        let next = self.batches.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(LogBatch::empty()))
    }
}
