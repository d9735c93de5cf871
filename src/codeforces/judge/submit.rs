extern crate log;
extern crate reqwest;

use super::{
    page::{find_error, parse_submit_page, SubmitPage},
    session::BFAA,
    Session,
};
use crate::{
    error::{auth_error, network_error, regex_mismatch, Error, Kind, Result},
    language::{pick_recommended, LanguageChoice, LanguageOption},
    problem::ProblemIdentifier,
};
use log::{debug, info};
use reqwest::{multipart::Form, StatusCode, Url};

/// Everything the submit form carries besides the session tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    pub problem: ProblemIdentifier,
    pub source_code: String,
    pub language_id: String,
}

fn is_login_page(url: &Url) -> bool {
    url.path().starts_with("/enter")
}

/// Decides what the response to the submit POST means.
pub(super) fn classify_response(
    url: &Url,
    status: StatusCode,
    body: &str,
    problem: &ProblemIdentifier,
) -> Result<()> {
    let path = url.path();
    if path == problem.my_path() || path.ends_with("/my") || path.contains("/status") {
        return Ok(());
    }
    if is_login_page(url) {
        return Err(auth_error("Session expired while submitting"));
    }
    if let Some(message) = find_error(body) {
        return Err(Error::with_description(Kind::Rejected, message));
    }
    if !status.is_success() {
        return Err(Error::with_description(
            Kind::Api,
            format!("Submit returned HTTP {}", status),
        ));
    }
    Err(regex_mismatch(format!(
        "No redirect to submissions after submit, landed on {}",
        path
    )))
}

impl Session {
    pub async fn fetch_submit_page(&self, problem: &ProblemIdentifier) -> Result<SubmitPage> {
        let (url, body) = self.get_page(self.url(&problem.submit_path())?).await?;
        if is_login_page(&url) {
            return Err(auth_error("Submit page redirected to login"));
        }
        parse_submit_page(&body)
    }

    pub async fn fetch_language_options(
        &self,
        problem: &ProblemIdentifier,
    ) -> Result<Vec<LanguageOption>> {
        let page = self.fetch_submit_page(problem).await?;
        if page.options.is_empty() {
            return Err(regex_mismatch("Can't find compiler list"));
        }
        Ok(page.options)
    }

    /// Submits `source` and returns the compiler id that was used.
    pub async fn submit(
        &self,
        problem: &ProblemIdentifier,
        source: &str,
        choice: &LanguageChoice,
    ) -> Result<String> {
        let page = self.fetch_submit_page(problem).await?;
        let language_id = match choice {
            LanguageChoice::Id(id) => id.clone(),
            LanguageChoice::Key(language) => pick_recommended(&page.options, *language)
                .map(|o| {
                    debug!("Picked compiler {} ({}) for {}", o.id, o.display_text, language);
                    o.id.clone()
                })
                .ok_or_else(|| {
                    regex_mismatch(format!("No compiler for {} on submit page", language))
                })?,
        };
        let request = SubmissionRequest {
            problem: problem.clone(),
            source_code: source.to_owned(),
            language_id,
        };
        self.post_submission(&page.csrf_token, &request).await?;
        Ok(request.language_id)
    }

    async fn post_submission(&self, csrf: &str, request: &SubmissionRequest) -> Result<()> {
        let mut url = self.url(&request.problem.submit_path())?;
        url.query_pairs_mut().append_pair("csrf_token", csrf);
        let form = Form::new()
            .text("csrf_token", csrf.to_owned())
            .text("ftaa", self.ftaa.clone())
            .text("bfaa", BFAA)
            .text("action", "submitSolutionFormSubmitted")
            .text("submittedProblemIndex", request.problem.index.clone())
            .text("programTypeId", request.language_id.clone())
            .text("contestId", request.problem.contest_id.to_string())
            .text("source", request.source_code.clone())
            .text("tabSize", "4")
            .text("sourceFile", "")
            .text("_tta", "594");
        info!(
            "Submitting {} with compiler {}",
            request.problem, request.language_id
        );
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(network_error)?;
        let url = response.url().clone();
        let status = response.status();
        let body = response.text().await.map_err(network_error)?;
        classify_response(&url, status, &body, &request.problem)
    }
}
