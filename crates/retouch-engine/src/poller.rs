use std::time::Duration;

use retouch_contracts::ResultLocation;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::classifier::{as_code, locate, provider_code_failure, LocatedPayload};
use crate::config::{DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL};
use crate::errors::{DispatchFailure, TransportError};
use crate::transport::{ProviderReply, ProviderTransport};

/// `task_status` as reported by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    Other(i64),
}

impl JobStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Queued,
            1 => Self::Processing,
            2 => Self::Completed,
            3 => Self::Failed,
            other => Self::Other(other),
        }
    }
}

#[derive(Debug)]
pub enum PollState {
    Pending,
    Completed(LocatedPayload),
    Failed(DispatchFailure),
    TimedOut,
}

/// One job being driven to a terminal state.
#[derive(Debug)]
pub struct AsyncJob {
    pub job_id: String,
    /// Status queries issued so far, including ones that failed in transit.
    pub attempts: u32,
    pub max_attempts: u32,
    pub state: PollState,
}

impl AsyncJob {
    pub fn new(job_id: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            job_id: job_id.into(),
            attempts: 0,
            max_attempts: max_attempts.max(1),
            state: PollState::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, PollState::Pending)
    }

    /// Folds one status query into the job. Every call consumes an attempt.
    pub fn observe(
        &mut self,
        reply: Result<ProviderReply, TransportError>,
        location: &ResultLocation,
    ) {
        if !self.is_pending() {
            return;
        }
        self.attempts += 1;

        match reply {
            Err(err) => {
                warn!(
                    job_id = %self.job_id,
                    attempt = self.attempts,
                    error = %err,
                    "status check failed; skipping attempt"
                );
            }
            Ok(reply) if !reply.is_success() => {
                warn!(
                    job_id = %self.job_id,
                    attempt = self.attempts,
                    status = reply.status,
                    "status check rejected; skipping attempt"
                );
            }
            Ok(reply) => self.apply(&reply, location),
        }

        if self.is_pending() && self.attempts >= self.max_attempts {
            self.state = PollState::TimedOut;
        }
    }

    fn apply(&mut self, reply: &ProviderReply, location: &ResultLocation) {
        if let Some(failure) = provider_code_failure(&reply.body) {
            self.state = PollState::Failed(DispatchFailure::JobFailed {
                job_id: self.job_id.clone(),
                detail: failure.to_string(),
            });
            return;
        }

        let status = reply
            .body
            .get("task_status")
            .and_then(as_code)
            .map(JobStatus::from_code);
        debug!(job_id = %self.job_id, attempt = self.attempts, ?status, "job status");

        match status {
            Some(JobStatus::Completed) => {
                self.state = match locate(&reply.body, location) {
                    Ok(payload) => PollState::Completed(payload),
                    Err(DispatchFailure::NoResultPayload { .. }) => {
                        PollState::Failed(DispatchFailure::EmptyResultList {
                            job_id: self.job_id.clone(),
                        })
                    }
                    Err(other) => PollState::Failed(other),
                };
            }
            Some(JobStatus::Failed) => {
                let detail = reply
                    .body
                    .get("error_msg")
                    .or_else(|| reply.body.pointer("/data/error_msg"))
                    .and_then(|value| value.as_str())
                    .filter(|text| !text.trim().is_empty())
                    .unwrap_or("provider reported task_status 3")
                    .to_string();
                self.state = PollState::Failed(DispatchFailure::JobFailed {
                    job_id: self.job_id.clone(),
                    detail,
                });
            }
            _ => {}
        }
    }

    pub fn finish(self) -> Result<LocatedPayload, DispatchFailure> {
        match self.state {
            PollState::Completed(payload) => Ok(payload),
            PollState::Failed(failure) => Err(failure),
            PollState::TimedOut | PollState::Pending => Err(DispatchFailure::JobTimedOut {
                job_id: self.job_id,
                attempts: self.attempts,
            }),
        }
    }
}

/// Drives an async job with a fixed wait before every status query.
#[derive(Debug, Clone, Copy)]
pub struct JobPoller {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for JobPoller {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl JobPoller {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: max_attempts.max(1),
        }
    }

    pub async fn run<T>(
        &self,
        transport: &T,
        job_id: &str,
        location: &ResultLocation,
        cancel: &CancellationToken,
    ) -> Result<LocatedPayload, DispatchFailure>
    where
        T: ProviderTransport + ?Sized,
    {
        let mut job = AsyncJob::new(job_id, self.max_attempts);
        info!(job_id, max_attempts = job.max_attempts, "polling async job");

        while job.is_pending() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(&job)),
                _ = tokio::time::sleep(self.interval) => {}
            }
            let reply = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(&job)),
                reply = transport.query_job(job_id) => reply,
            };
            job.observe(reply, location);
        }

        info!(job_id, attempts = job.attempts, "async job finished");
        job.finish()
    }
}

fn cancelled(job: &AsyncJob) -> DispatchFailure {
    info!(job_id = %job.job_id, attempts = job.attempts, "polling cancelled");
    DispatchFailure::Cancelled
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::builder::ProviderRequest;

    const IMAGES: ResultLocation = ResultLocation::FirstItem(&["data", "images"]);

    /// Replays status replies in order; once the script runs out every
    /// query answers "processing".
    #[derive(Default)]
    struct ScriptedTransport {
        script: Mutex<VecDeque<Result<ProviderReply, TransportError>>>,
        queries: AtomicU32,
    }

    impl ScriptedTransport {
        fn new(script: impl IntoIterator<Item = Result<ProviderReply, TransportError>>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                queries: AtomicU32::new(0),
            }
        }

        fn queries(&self) -> u32 {
            self.queries.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProviderTransport for ScriptedTransport {
        async fn submit(
            &self,
            _request: &ProviderRequest,
        ) -> Result<ProviderReply, TransportError> {
            unreachable!("the poller never submits")
        }

        async fn query_job(&self, _job_id: &str) -> Result<ProviderReply, TransportError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().expect("script lock").pop_front();
            next.unwrap_or_else(|| Ok(status(1)))
        }

        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, TransportError> {
            unreachable!("the poller never fetches")
        }
    }

    fn status(task_status: i64) -> ProviderReply {
        ProviderReply {
            status: 200,
            body: json!({"error_code": 0, "task_status": task_status}),
        }
    }

    fn completed(images: serde_json::Value) -> ProviderReply {
        ProviderReply {
            status: 200,
            body: json!({"error_code": 0, "task_status": 2, "data": {"images": images}}),
        }
    }

    fn fast_poller() -> JobPoller {
        JobPoller::new(Duration::from_millis(1), DEFAULT_MAX_ATTEMPTS)
    }

    #[tokio::test]
    async fn completes_on_sixtieth_query() -> anyhow::Result<()> {
        let mut script: Vec<_> = (0..59).map(|_| Ok(status(1))).collect();
        script.push(Ok(completed(json!(["https://x/z.jpg"]))));
        let transport = ScriptedTransport::new(script);

        let payload = fast_poller()
            .run(&transport, "abc", &IMAGES, &CancellationToken::new())
            .await?;
        assert_eq!(payload, LocatedPayload::Remote("https://x/z.jpg".to_string()));
        assert_eq!(transport.queries(), 60);
        Ok(())
    }

    #[tokio::test]
    async fn times_out_without_a_sixty_first_query() {
        let transport = ScriptedTransport::new(Vec::new());
        let err = fast_poller()
            .run(&transport, "abc", &IMAGES, &CancellationToken::new())
            .await
            .expect_err("never completes");
        assert!(matches!(
            err,
            DispatchFailure::JobTimedOut { attempts: 60, .. }
        ));
        assert_eq!(transport.queries(), 60);
    }

    #[tokio::test]
    async fn failed_status_stops_immediately() {
        let transport = ScriptedTransport::new([Ok(status(0)), Ok(status(1)), Ok(status(3))]);
        let err = fast_poller()
            .run(&transport, "abc", &IMAGES, &CancellationToken::new())
            .await
            .expect_err("job failed");
        assert!(matches!(err, DispatchFailure::JobFailed { .. }));
        assert_eq!(transport.queries(), 3);
    }

    #[tokio::test]
    async fn empty_result_list_is_a_failure() {
        let transport = ScriptedTransport::new([Ok(completed(json!([])))]);
        let err = fast_poller()
            .run(&transport, "abc", &IMAGES, &CancellationToken::new())
            .await
            .expect_err("no images");
        assert!(matches!(err, DispatchFailure::EmptyResultList { .. }));
    }

    #[tokio::test]
    async fn transient_failures_consume_attempts() -> anyhow::Result<()> {
        let flaky = || {
            Ok(ProviderReply {
                status: 502,
                body: json!("bad gateway"),
            })
        };
        let transport = ScriptedTransport::new([
            flaky(),
            Err(TransportError::Body {
                url: "http://status".to_string(),
                reason: "truncated".to_string(),
            }),
            Ok(completed(json!(["aGVsbG8="]))),
        ]);
        let payload = JobPoller::new(Duration::from_millis(1), 3)
            .run(&transport, "abc", &IMAGES, &CancellationToken::new())
            .await?;
        assert_eq!(payload, LocatedPayload::Inline("aGVsbG8=".to_string()));
        assert_eq!(transport.queries(), 3);

        let transport = ScriptedTransport::new([flaky(), flaky()]);
        let err = JobPoller::new(Duration::from_millis(1), 2)
            .run(&transport, "abc", &IMAGES, &CancellationToken::new())
            .await
            .expect_err("budget spent on failures");
        assert!(matches!(err, DispatchFailure::JobTimedOut { attempts: 2, .. }));
        assert_eq!(transport.queries(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn provider_error_code_on_status_is_terminal() {
        let transport = ScriptedTransport::new([Ok(ProviderReply {
            status: 200,
            body: json!({"error_code": 1001, "error_msg": "task expired"}),
        })]);
        let err = fast_poller()
            .run(&transport, "abc", &IMAGES, &CancellationToken::new())
            .await
            .expect_err("error code");
        match err {
            DispatchFailure::JobFailed { detail, .. } => assert!(detail.contains("task expired")),
            other => panic!("unexpected failure: {other:?}"),
        }
        assert_eq!(transport.queries(), 1);
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_querying() {
        let transport = ScriptedTransport::new(Vec::new());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = fast_poller()
            .run(&transport, "abc", &IMAGES, &cancel)
            .await
            .expect_err("cancelled");
        assert!(matches!(err, DispatchFailure::Cancelled));
        assert_eq!(transport.queries(), 0);
    }

    #[tokio::test]
    async fn cancellation_interrupts_the_wait() {
        let transport = ScriptedTransport::new(Vec::new());
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });
        let err = JobPoller::new(Duration::from_secs(30), 60)
            .run(&transport, "abc", &IMAGES, &cancel)
            .await
            .expect_err("cancelled mid-wait");
        assert!(matches!(err, DispatchFailure::Cancelled));
        assert_eq!(transport.queries(), 0);
    }

    #[test]
    fn finished_jobs_ignore_further_replies() {
        let mut job = AsyncJob::new("abc", 5);
        job.observe(Ok(status(3)), &IMAGES);
        job.observe(Ok(completed(json!(["https://x/z.jpg"]))), &IMAGES);
        assert_eq!(job.attempts, 1);
        assert!(matches!(job.state, PollState::Failed(_)));
    }
}
