extern crate futures;
extern crate log;
extern crate tokio;

use crate::{
    error::Result,
    judge::SubmissionRecord,
    poll::{poll_until, Backoff},
    problem::ProblemIdentifier,
};
use futures::future::{AbortHandle, AbortRegistration, Abortable, Aborted};
use log::{debug, info, warn};
use std::{
    collections::HashMap,
    fmt,
    future::Future,
    sync::{Arc, Mutex, MutexGuard},
};
use tokio::sync::watch;

/// Where the tracker reads submission snapshots from.
pub trait SubmissionSource: Send + Sync {
    /// Recent submissions of `handle` for `problem`, in any order.
    fn latest_submissions(
        &self,
        handle: &str,
        problem: &ProblemIdentifier,
    ) -> impl Future<Output = Result<Vec<SubmissionRecord>>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackKey {
    pub problem: ProblemIdentifier,
    pub handle: String,
}
impl TrackKey {
    pub fn new<T: Into<String>>(problem: ProblemIdentifier, handle: T) -> Self {
        Self {
            problem,
            handle: handle.into(),
        }
    }
}
impl fmt::Display for TrackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by {}", self.problem, self.handle)
    }
}

/// Which remote records belong to the submission being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Since {
    /// Ids above the newest one seen before submitting.
    After(u64),
    /// Created at or after this unix time.
    Time(i64),
}
impl Since {
    pub fn admits(self, record: &SubmissionRecord) -> bool {
        match self {
            Since::After(id) => record.id > id,
            Since::Time(t) => record.creation_time >= t,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling {
        key: TrackKey,
        attempt: usize,
        last: Option<SubmissionRecord>,
    },
    Terminal {
        key: TrackKey,
        record: SubmissionRecord,
    },
    TimedOut {
        key: TrackKey,
    },
    Failed {
        key: TrackKey,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Verdict(SubmissionRecord),
    /// Budget ran out while the judge was still busy.
    TimedOut,
    /// A newer poll replaced this one before a verdict arrived.
    Superseded,
}

/// What one probe found.
enum Probe {
    Judged(SubmissionRecord),
    /// A newer poll owns the visible state.
    Stale,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Polls verdicts and publishes the state of the most recent poll.
///
/// Only the newest `track` call may write the visible state. A second
/// `track` for the same key aborts the first one; a poll for another key
/// stops at its next unfinished snapshot.
pub struct Tracker<S> {
    source: Arc<S>,
    policy: Backoff,
    generation: Mutex<u64>,
    state: watch::Sender<PollState>,
    active: Mutex<HashMap<TrackKey, (u64, AbortHandle)>>,
}

impl<S: SubmissionSource> Tracker<S> {
    pub fn new(source: Arc<S>, policy: Backoff) -> Self {
        Self {
            source,
            policy,
            generation: Mutex::new(0),
            state: watch::channel(PollState::Idle).0,
            active: Mutex::new(HashMap::new()),
        }
    }
    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.state.subscribe()
    }
    pub fn state(&self) -> PollState {
        self.state.borrow().clone()
    }

    fn begin(&self, key: &TrackKey) -> (u64, AbortRegistration) {
        let mut generation = lock(&self.generation);
        *generation += 1;
        let (handle, registration) = AbortHandle::new_pair();
        if let Some((_, previous)) = lock(&self.active).insert(key.clone(), (*generation, handle)) {
            info!("Superseding running poll for {}", key);
            previous.abort();
        }
        self.state.send_replace(PollState::Polling {
            key: key.clone(),
            attempt: 0,
            last: None,
        });
        (*generation, registration)
    }
    fn publish(&self, generation: u64, state: PollState) -> bool {
        let current = lock(&self.generation);
        if *current != generation {
            debug!("Dropping stale poll state {:?}", state);
            return false;
        }
        self.state.send_replace(state);
        true
    }
    fn finish(&self, key: &TrackKey, generation: u64) {
        let mut active = lock(&self.active);
        if active.get(key).map(|(g, _)| *g) == Some(generation) {
            active.remove(key);
        }
    }

    /// Waits for the newest submission of `key` admitted by `since` to get a
    /// final verdict.
    pub async fn track(&self, key: TrackKey, since: Since) -> Result<PollOutcome> {
        let (generation, registration) = self.begin(&key);
        let result = Abortable::new(self.run(&key, since, generation), registration).await;
        self.finish(&key, generation);
        match result {
            Ok(outcome) => outcome,
            Err(Aborted) => {
                debug!("Poll for {} was superseded", key);
                Ok(PollOutcome::Superseded)
            }
        }
    }

    async fn run(&self, key: &TrackKey, since: Since, generation: u64) -> Result<PollOutcome> {
        let found = poll_until(&self.policy, move |attempt| {
            self.probe(key, since, generation, attempt)
        })
        .await;
        match found {
            Ok(Some(Probe::Stale)) => {
                debug!("Poll for {} stopped by a newer poll", key);
                Ok(PollOutcome::Superseded)
            }
            Ok(Some(Probe::Judged(record))) => {
                info!("Verdict for {}: {}", key, record);
                self.publish(
                    generation,
                    PollState::Terminal {
                        key: key.clone(),
                        record: record.clone(),
                    },
                );
                Ok(PollOutcome::Verdict(record))
            }
            Ok(None) => {
                warn!("No verdict for {} within the polling budget", key);
                self.publish(generation, PollState::TimedOut { key: key.clone() });
                Ok(PollOutcome::TimedOut)
            }
            Err(e) => {
                self.publish(
                    generation,
                    PollState::Failed {
                        key: key.clone(),
                        message: e.to_string(),
                    },
                );
                Err(e)
            }
        }
    }

    async fn probe(
        &self,
        key: &TrackKey,
        since: Since,
        generation: u64,
        attempt: usize,
    ) -> Result<Option<Probe>> {
        let records = match self.source.latest_submissions(&key.handle, &key.problem).await {
            Ok(r) => r,
            Err(e) if e.is_retryable() => {
                warn!("Polling {} failed, will retry: {}", key, e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let latest = records
            .into_iter()
            .filter(|r| r.problem == key.problem && since.admits(r))
            .max_by_key(|r| (r.creation_time, r.id));
        match latest {
            Some(record) if record.verdict.is_terminal() => Ok(Some(Probe::Judged(record))),
            last => {
                let state = PollState::Polling {
                    key: key.clone(),
                    attempt: attempt + 1,
                    last,
                };
                if self.publish(generation, state) {
                    Ok(None)
                } else {
                    Ok(Some(Probe::Stale))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{Error, Kind},
        judge::Verdict,
    };
    use std::{collections::VecDeque, time::Duration};
    use tokio::sync::Notify;

    fn record(problem: &ProblemIdentifier, id: u64, verdict: Verdict) -> SubmissionRecord {
        SubmissionRecord {
            id,
            problem: problem.clone(),
            verdict,
            passed_test_count: None,
            time_ms: None,
            memory_bytes: None,
            creation_time: 1_700_000_000,
            language: "GNU G++17 7.3.0".to_owned(),
            author_handle: "tourist".to_owned(),
        }
    }

    /// Replays snapshots per problem; the last snapshot repeats forever.
    #[derive(Default)]
    struct Scripted {
        snapshots: Mutex<HashMap<ProblemIdentifier, VecDeque<Result<Vec<SubmissionRecord>>>>>,
        calls: Mutex<HashMap<ProblemIdentifier, usize>>,
        gates: HashMap<ProblemIdentifier, Arc<Notify>>,
    }
    impl Scripted {
        fn script(&self, problem: &ProblemIdentifier, snapshots: Vec<Result<Vec<SubmissionRecord>>>) {
            lock(&self.snapshots).insert(problem.clone(), snapshots.into_iter().collect());
        }
        fn calls(&self, problem: &ProblemIdentifier) -> usize {
            lock(&self.calls).get(problem).copied().unwrap_or_default()
        }
    }
    impl SubmissionSource for Scripted {
        async fn latest_submissions(
            &self,
            _handle: &str,
            problem: &ProblemIdentifier,
        ) -> Result<Vec<SubmissionRecord>> {
            let call = {
                let mut calls = lock(&self.calls);
                let count = calls.entry(problem.clone()).or_default();
                *count += 1;
                *count
            };
            if call == 1 {
                if let Some(gate) = self.gates.get(problem) {
                    gate.notified().await;
                }
            }
            let mut snapshots = lock(&self.snapshots);
            let queue = match snapshots.get_mut(problem) {
                Some(q) => q,
                None => return Ok(Vec::new()),
            };
            if queue.len() > 1 {
                queue.pop_front().unwrap_or_else(|| Ok(Vec::new()))
            } else {
                match queue.front() {
                    Some(Ok(v)) => Ok(v.clone()),
                    Some(Err(e)) => Err(Error::with_description(Kind::Parse, e.to_string())),
                    None => Ok(Vec::new()),
                }
            }
        }
    }

    fn policy(attempts: usize) -> Backoff {
        Backoff::new(vec![Duration::ZERO]).with_attempts(attempts)
    }

    #[tokio::test]
    async fn stops_on_first_terminal_snapshot() {
        let a = ProblemIdentifier::new(1873, "A");
        let source = Arc::new(Scripted::default());
        let mut script: Vec<_> = (0..3)
            .map(|_| Ok(vec![record(&a, 7, Verdict::Testing)]))
            .collect();
        script.push(Ok(vec![record(&a, 7, Verdict::Ok)]));
        source.script(&a, script);
        let tracker = Tracker::new(source.clone(), policy(20));

        let outcome = tracker
            .track(TrackKey::new(a.clone(), "tourist"), Since::Time(0))
            .await
            .unwrap();
        assert_eq!(outcome, PollOutcome::Verdict(record(&a, 7, Verdict::Ok)));
        assert_eq!(source.calls(&a), 4);
        tokio::task::yield_now().await;
        assert_eq!(source.calls(&a), 4);
        assert!(matches!(
            tracker.state(),
            PollState::Terminal { record, .. } if record.verdict == Verdict::Ok
        ));
    }

    #[tokio::test]
    async fn ignores_submissions_before_since() {
        let a = ProblemIdentifier::new(1873, "A");
        let source = Arc::new(Scripted::default());
        let mut old = record(&a, 1, Verdict::WrongAnswer);
        old.creation_time = 10;
        let mut fresh = record(&a, 2, Verdict::Testing);
        fresh.creation_time = 100;
        let mut done = fresh.clone();
        done.verdict = Verdict::Ok;
        source.script(
            &a,
            vec![
                Ok(vec![old.clone()]),
                Ok(vec![fresh, old.clone()]),
                Ok(vec![done.clone(), old]),
            ],
        );
        let tracker = Tracker::new(source.clone(), policy(10));
        let outcome = tracker
            .track(TrackKey::new(a.clone(), "tourist"), Since::Time(50))
            .await
            .unwrap();
        assert_eq!(outcome, PollOutcome::Verdict(done));
        assert_eq!(source.calls(&a), 3);
    }

    #[tokio::test]
    async fn judged_earlier_submission_is_not_the_new_one() {
        let a = ProblemIdentifier::new(1873, "A");
        let source = Arc::new(Scripted::default());
        let mut old = record(&a, 1, Verdict::Ok);
        old.creation_time = 1000;
        let mut fresh = record(&a, 2, Verdict::Testing);
        fresh.creation_time = 1005;
        let mut done = fresh.clone();
        done.verdict = Verdict::WrongAnswer;
        source.script(
            &a,
            vec![
                Ok(vec![old.clone()]),
                Ok(vec![old.clone()]),
                Ok(vec![fresh, old.clone()]),
                Ok(vec![done.clone(), old]),
            ],
        );
        let tracker = Tracker::new(source.clone(), policy(10));
        let outcome = tracker
            .track(TrackKey::new(a.clone(), "tourist"), Since::After(1))
            .await
            .unwrap();
        assert_eq!(outcome, PollOutcome::Verdict(done));
        assert_eq!(source.calls(&a), 4);
    }

    #[test]
    fn since_admits_by_id_or_time() {
        let a = ProblemIdentifier::new(1873, "A");
        let mut r = record(&a, 5, Verdict::Ok);
        r.creation_time = 100;
        assert!(Since::After(4).admits(&r));
        assert!(!Since::After(5).admits(&r));
        assert!(Since::Time(100).admits(&r));
        assert!(!Since::Time(101).admits(&r));
    }

    #[tokio::test]
    async fn times_out_when_judge_is_slow() {
        let a = ProblemIdentifier::new(1873, "A");
        let source = Arc::new(Scripted::default());
        source.script(&a, vec![Ok(vec![record(&a, 7, Verdict::Testing)])]);
        let tracker = Tracker::new(source.clone(), policy(5));
        let key = TrackKey::new(a.clone(), "tourist");
        assert_eq!(
            tracker.track(key.clone(), Since::Time(0)).await.unwrap(),
            PollOutcome::TimedOut
        );
        assert_eq!(source.calls(&a), 5);
        assert_eq!(tracker.state(), PollState::TimedOut { key });
    }

    #[tokio::test]
    async fn hard_errors_fail_the_poll() {
        let a = ProblemIdentifier::new(1873, "A");
        let source = Arc::new(Scripted::default());
        source.script(
            &a,
            vec![Err(Error::with_description(Kind::Parse, "layout changed"))],
        );
        let tracker = Tracker::new(source.clone(), policy(5));
        assert!(tracker
            .track(TrackKey::new(a.clone(), "tourist"), Since::Time(0))
            .await
            .is_err());
        assert_eq!(source.calls(&a), 1);
        assert!(matches!(tracker.state(), PollState::Failed { .. }));
    }

    async fn wait_for_call(source: &Scripted, problem: &ProblemIdentifier) {
        while source.calls(problem) == 0 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn newer_problem_owns_visible_state() {
        let a = ProblemIdentifier::new(1873, "A");
        let b = ProblemIdentifier::new(1873, "B");
        let gate = Arc::new(Notify::new());
        let mut source = Scripted::default();
        source.gates.insert(a.clone(), gate.clone());
        let source = Arc::new(source);
        source.script(&a, vec![Ok(vec![record(&a, 1, Verdict::WrongAnswer)])]);
        source.script(&b, vec![Ok(vec![record(&b, 2, Verdict::Ok)])]);
        let tracker = Arc::new(Tracker::new(source.clone(), policy(5)));

        let first = {
            let tracker = tracker.clone();
            let a = a.clone();
            tokio::spawn(async move {
                tracker
                    .track(TrackKey::new(a, "tourist"), Since::Time(0))
                    .await
            })
        };
        wait_for_call(&source, &a).await;

        let outcome = tracker
            .track(TrackKey::new(b.clone(), "tourist"), Since::Time(0))
            .await
            .unwrap();
        assert_eq!(outcome, PollOutcome::Verdict(record(&b, 2, Verdict::Ok)));

        gate.notify_one();
        let late = first.await.unwrap().unwrap();
        assert_eq!(late, PollOutcome::Verdict(record(&a, 1, Verdict::WrongAnswer)));
        assert_eq!(
            tracker.state(),
            PollState::Terminal {
                key: TrackKey::new(b.clone(), "tourist"),
                record: record(&b, 2, Verdict::Ok),
            }
        );
    }

    #[tokio::test]
    async fn unfinished_poll_stops_once_replaced() {
        let a = ProblemIdentifier::new(1873, "A");
        let b = ProblemIdentifier::new(1873, "B");
        let gate = Arc::new(Notify::new());
        let mut source = Scripted::default();
        source.gates.insert(a.clone(), gate.clone());
        let source = Arc::new(source);
        source.script(&a, vec![Ok(vec![record(&a, 1, Verdict::Testing)])]);
        source.script(&b, vec![Ok(vec![record(&b, 2, Verdict::Ok)])]);
        let tracker = Arc::new(Tracker::new(source.clone(), policy(50)));

        let first = {
            let tracker = tracker.clone();
            let a = a.clone();
            tokio::spawn(async move {
                tracker
                    .track(TrackKey::new(a, "tourist"), Since::Time(0))
                    .await
            })
        };
        wait_for_call(&source, &a).await;
        tracker
            .track(TrackKey::new(b.clone(), "tourist"), Since::Time(0))
            .await
            .unwrap();

        gate.notify_one();
        assert_eq!(first.await.unwrap().unwrap(), PollOutcome::Superseded);
        assert_eq!(source.calls(&a), 1);
        assert!(matches!(tracker.state(), PollState::Terminal { key, .. } if key.problem == b));
    }

    #[tokio::test]
    async fn same_key_aborts_previous_poll() {
        let a = ProblemIdentifier::new(1873, "A");
        let gate = Arc::new(Notify::new());
        let mut source = Scripted::default();
        source.gates.insert(a.clone(), gate.clone());
        let source = Arc::new(source);
        source.script(&a, vec![Ok(vec![record(&a, 3, Verdict::Ok)])]);
        let tracker = Arc::new(Tracker::new(source.clone(), policy(5)));
        let key = TrackKey::new(a.clone(), "tourist");

        let first = {
            let tracker = tracker.clone();
            let key = key.clone();
            tokio::spawn(async move { tracker.track(key, Since::Time(0)).await })
        };
        wait_for_call(&source, &a).await;

        let second = tracker.track(key.clone(), Since::Time(0)).await.unwrap();
        assert_eq!(second, PollOutcome::Verdict(record(&a, 3, Verdict::Ok)));
        assert_eq!(first.await.unwrap().unwrap(), PollOutcome::Superseded);
        assert_eq!(source.calls(&a), 2);
        assert!(matches!(tracker.state(), PollState::Terminal { .. }));
        gate.notify_one();
    }
}
