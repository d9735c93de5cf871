extern crate reqwest;
extern crate serde;
extern crate serde_json;

use super::{retry::async_retry, verdict::Verdict, Session, SubmissionRecord};
use crate::{
    config::poll::STATUS_COUNT,
    error::{Error, Kind, Result},
    problem::ProblemIdentifier,
    tracker::SubmissionSource,
};
use log::debug;
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Deserialize};

#[derive(Deserialize)]
struct ApiResponse<T> {
    status: String,
    comment: Option<String>,
    result: Option<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiProblem {
    contest_id: Option<u32>,
    index: String,
}
#[derive(Deserialize)]
struct ApiMember {
    handle: String,
}
#[derive(Deserialize)]
struct ApiParty {
    #[serde(default)]
    members: Vec<ApiMember>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSubmission {
    id: u64,
    contest_id: Option<u32>,
    creation_time_seconds: i64,
    problem: ApiProblem,
    author: ApiParty,
    programming_language: String,
    verdict: Option<String>,
    passed_test_count: Option<u32>,
    time_consumed_millis: Option<u64>,
    memory_consumed_bytes: Option<u64>,
}

impl From<ApiSubmission> for SubmissionRecord {
    fn from(s: ApiSubmission) -> Self {
        let contest_id = s.problem.contest_id.or(s.contest_id).unwrap_or_default();
        SubmissionRecord {
            id: s.id,
            problem: ProblemIdentifier::new(contest_id, s.problem.index),
            verdict: Verdict::from_api(s.verdict.as_deref()),
            passed_test_count: s.passed_test_count,
            time_ms: s.time_consumed_millis,
            memory_bytes: s.memory_consumed_bytes,
            creation_time: s.creation_time_seconds,
            language: s.programming_language,
            author_handle: s
                .author
                .members
                .into_iter()
                .next()
                .map(|m| m.handle)
                .unwrap_or_default(),
        }
    }
}

fn parse_api<T: DeserializeOwned>(method: &str, body: &str) -> Result<T> {
    let response: ApiResponse<T> = serde_json::from_str(body).map_err(|e| {
        Error::with_description(Kind::Api, format!("Malformed {} response: {}", method, e))
    })?;
    match response {
        ApiResponse {
            status,
            result: Some(result),
            ..
        } if status == "OK" => Ok(result),
        ApiResponse { comment, .. } => Err(Error::with_description(
            Kind::Api,
            comment.unwrap_or_else(|| format!("{} failed", method)),
        )),
    }
}

pub(super) fn parse_submissions(method: &str, body: &str) -> Result<Vec<SubmissionRecord>> {
    Ok(parse_api::<Vec<ApiSubmission>>(method, body)?
        .into_iter()
        .map(SubmissionRecord::from)
        .collect())
}

impl Session {
    async fn api(&self, method: &str, query: &[(&str, String)]) -> Result<String> {
        let mut url = self.url(&format!("/api/{}", method))?;
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        debug!("GET {}", url);
        let client = &self.client;
        async_retry(move || {
            let request = client.get(url.clone());
            async move {
                let response = request.send().await?;
                let status = response.status();
                // api failures come back as 400 with a json comment
                let response = if status.is_server_error() || status == StatusCode::FORBIDDEN {
                    response.error_for_status()?
                } else {
                    response
                };
                response.text().await
            }
        })
        .await
    }

    /// Newest submissions of `handle` in the problem's contest, filtered to
    /// the problem.
    pub async fn problem_submissions(
        &self,
        handle: &str,
        problem: &ProblemIdentifier,
        count: usize,
    ) -> Result<Vec<SubmissionRecord>> {
        const METHOD: &str = "contest.status";
        let body = self
            .api(
                METHOD,
                &[
                    ("contestId", problem.contest_id.to_string()),
                    ("handle", handle.to_owned()),
                    ("from", String::from("1")),
                    ("count", count.to_string()),
                ],
            )
            .await?;
        Ok(parse_submissions(METHOD, &body)?
            .into_iter()
            .filter(|r| &r.problem == problem)
            .collect())
    }

    /// A page of the handle's submission history, newest first.
    pub async fn user_submissions(
        &self,
        handle: &str,
        from: usize,
        count: usize,
    ) -> Result<Vec<SubmissionRecord>> {
        const METHOD: &str = "user.status";
        let body = self
            .api(
                METHOD,
                &[
                    ("handle", handle.to_owned()),
                    ("from", from.max(1).to_string()),
                    ("count", count.to_string()),
                ],
            )
            .await?;
        parse_submissions(METHOD, &body)
    }
}

impl SubmissionSource for Session {
    async fn latest_submissions(
        &self,
        handle: &str,
        problem: &ProblemIdentifier,
    ) -> Result<Vec<SubmissionRecord>> {
        self.problem_submissions(handle, problem, STATUS_COUNT).await
    }
}
