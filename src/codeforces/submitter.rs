extern crate chrono;
extern crate log;

use crate::{
    cache::SourceHistory,
    config::{
        poll::STATUS_COUNT,
        submitter::{CLOCK_SKEW, SUBMIT_GAP},
    },
    error::{auth_error, Error, Kind, Result},
    judge::{Session, SubmissionRecord},
    language::{Language, LanguageChoice, LanguageOption},
    poll::Backoff,
    problem::{ProblemIdentifier, SourceFile},
    tracker::{PollOutcome, Since, TrackKey, Tracker},
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use log::{info, warn};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

pub use throttle::Throttle;

/// What the caller gets back once the site accepted a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub problem: ProblemIdentifier,
    pub handle: String,
    pub language_id: String,
    /// Same code as the previous submission of this problem.
    pub duplicate_warning: bool,
    /// Local submit time, moved back by the allowed clock skew.
    pub submitted_at: DateTime<Utc>,
    /// Newest submission id of this problem and handle before the submit,
    /// when the status api answered.
    pub last_seen_id: Option<u64>,
}
impl Receipt {
    pub fn since(&self) -> Since {
        match self.last_seen_id {
            Some(id) => Since::After(id),
            None => Since::Time(self.submitted_at.timestamp()),
        }
    }
}

pub struct Submitter {
    session: Arc<Session>,
    history: Mutex<SourceHistory>,
    throttle: Throttle,
    tracker: Tracker<Session>,
    compilers: HashMap<Language, String>,
}

impl Submitter {
    pub fn new(session: Arc<Session>, history: SourceHistory) -> Self {
        Submitter {
            tracker: Tracker::new(session.clone(), Backoff::verdict()),
            session,
            history: Mutex::new(history),
            throttle: Throttle::new(SUBMIT_GAP),
            compilers: HashMap::new(),
        }
    }
    pub fn with_policy(mut self, policy: Backoff) -> Self {
        self.tracker = Tracker::new(self.session.clone(), policy);
        self
    }
    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = throttle;
        self
    }
    /// Fixed compiler ids that bypass the recommendation for a language.
    pub fn with_compilers(mut self, compilers: HashMap<Language, String>) -> Self {
        self.compilers = compilers;
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }
    pub fn tracker(&self) -> &Tracker<Session> {
        &self.tracker
    }
    pub fn history(&self) -> MutexGuard<'_, SourceHistory> {
        self.history.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn choice(&self, language: Language) -> LanguageChoice {
        match self.compilers.get(&language) {
            Some(id) => LanguageChoice::Id(id.clone()),
            None => LanguageChoice::Key(language),
        }
    }

    /// Copies the browser login into the http client.
    fn pull_cookies(&self) {
        let ctx = self.session.context();
        ctx.try_sync_other_store_if_needed();
        ctx.sync_embedded_to_native();
    }
    pub fn logged_in_handle(&self) -> Option<String> {
        self.pull_cookies();
        self.session.context().current_handle()
    }

    pub async fn languages(&self, problem: &ProblemIdentifier) -> Result<Vec<LanguageOption>> {
        self.pull_cookies();
        self.session.fetch_language_options(problem).await
    }

    /// Submits the content of a file named like `1873A.cpp`.
    pub async fn submit_file(&self, name: &str, source: &str) -> Result<Receipt> {
        let file = SourceFile::parse(name).ok_or_else(|| {
            Error::with_description(
                Kind::Unsupported,
                format!("Can't find a problem in file name {}", name),
            )
        })?;
        if !file.language.is_submittable() {
            return Err(Error::with_description(
                Kind::Unsupported,
                format!("{} is not a source file", name),
            ));
        }
        self.submit(&file.problem, source, self.choice(file.language))
            .await
    }

    pub async fn submit(
        &self,
        problem: &ProblemIdentifier,
        source: &str,
        choice: LanguageChoice,
    ) -> Result<Receipt> {
        let handle = self
            .logged_in_handle()
            .ok_or_else(|| auth_error("Log in before submitting"))?;
        let duplicate_warning = self.history().is_duplicate(problem, source);
        if duplicate_warning {
            warn!("Same code as the last submission of {}", problem);
        }
        let last_seen_id = self.last_seen_id(&handle, problem).await;
        self.throttle.wait().await;
        let submitted_at = Utc::now() - ChronoDuration::seconds(CLOCK_SKEW.as_secs() as i64);
        let language_id = self.session.submit(problem, source, &choice).await?;
        info!("Submitted {} as {} with compiler {}", problem, handle, language_id);
        self.history().remember(problem, source);
        self.session.context().sync_native_to_embedded();
        Ok(Receipt {
            problem: problem.clone(),
            handle,
            language_id,
            duplicate_warning,
            submitted_at,
            last_seen_id,
        })
    }

    async fn last_seen_id(&self, handle: &str, problem: &ProblemIdentifier) -> Option<u64> {
        match self
            .session
            .problem_submissions(handle, problem, STATUS_COUNT)
            .await
        {
            Ok(records) => Some(records.iter().map(|r| r.id).max().unwrap_or_default()),
            Err(e) => {
                warn!("Can't read submissions of {} before submitting: {}", problem, e);
                None
            }
        }
    }

    /// Polls until the submission behind `receipt` gets a final verdict.
    pub async fn track(&self, receipt: &Receipt) -> Result<PollOutcome> {
        self.tracker
            .track(
                TrackKey::new(receipt.problem.clone(), receipt.handle.clone()),
                receipt.since(),
            )
            .await
    }

    /// Latest submissions of the logged in user.
    pub async fn recent(&self, count: usize) -> Result<Vec<SubmissionRecord>> {
        let handle = self
            .logged_in_handle()
            .ok_or_else(|| auth_error("Log in to see submissions"))?;
        self.session.user_submissions(&handle, 1, count).await
    }
}

mod throttle;
