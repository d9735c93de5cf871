use cf_submit::{
    cache::SourceHistory,
    cookie::{Cookie, CookieMode, CookieStore, FileStore, MemoryStore, NativeJar, SessionContext},
    judge::{Session, Verdict},
    poll::Backoff,
    submitter::Throttle,
    tracker::PollOutcome,
    Kind, ProblemIdentifier, Submitter,
};
use pretty_assertions::assert_eq;
use reqwest::Url;
use std::{path::Path, sync::Arc, time::Duration};
use tempfile::TempDir;
use wiremock::{
    matchers::{body_string_contains, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

const SUBMIT_PAGE: &str = include_str!("fixtures/submit.html");
const CSRF: &str = "0f1e2d3c4b5a69788796a5b4c3d2e1f0";

struct Site {
    server: MockServer,
    dir: TempDir,
    persistent: Arc<FileStore>,
    submitter: Submitter,
}

async fn site(logged_in: bool) -> Site {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let base = Url::parse(&server.uri()).unwrap();
    let domain = base.host_str().unwrap().to_owned();
    let persistent = Arc::new(FileStore::open(dir.path().join("cookies.yml")).unwrap());
    if logged_in {
        persistent.set_cookies(
            &domain,
            &[Cookie::new("X-User", "tourist"), Cookie::new("JSESSIONID", "F00D")],
        );
    }
    let context = Arc::new(SessionContext::new(
        domain,
        "X-User".to_owned(),
        NativeJar::new(base.clone()),
        persistent.clone(),
        Arc::new(MemoryStore::new()),
        CookieMode::Persistent,
    ));
    let session = Arc::new(Session::new(base, context).unwrap());
    let history = SourceHistory::open(dir.path().join("history.yml")).unwrap();
    let submitter = Submitter::new(session, history)
        .with_throttle(Throttle::new(Duration::ZERO))
        .with_policy(Backoff::new(vec![Duration::ZERO]).with_attempts(5));
    Site {
        server,
        dir,
        persistent,
        submitter,
    }
}

async fn mount_submit_page(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/contest/1873/submit"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SUBMIT_PAGE))
        .mount(server)
        .await;
}

async fn mount_accepting_post(server: &MockServer, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/contest/1873/submit"))
        .and(query_param("csrf_token", CSRF))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", "/contest/1873/my")
                .insert_header("Set-Cookie", "JSESSIONID=BEEF; Path=/"),
        )
        .expect(expected)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/contest/1873/my"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>my</html>"))
        .mount(server)
        .await;
}

fn status_record(id: u64, verdict: Option<&str>) -> String {
    let verdict = verdict
        .map(|v| format!(r#""verdict":"{}","#, v))
        .unwrap_or_default();
    format!(
        r#"{{"id":{},"contestId":1873,"creationTimeSeconds":{},
"problem":{{"contestId":1873,"index":"A","name":"Short Sort"}},
"author":{{"members":[{{"handle":"tourist"}}]}},
"programmingLanguage":"GNU G++23 14.2 (64 bit, msys2)",{}"passedTestCount":7,
"timeConsumedMillis":15,"memoryConsumedBytes":0}}"#,
        id,
        chrono::Utc::now().timestamp(),
        verdict
    )
}

fn status_body(records: &[String]) -> String {
    format!(r#"{{"status":"OK","result":[{}]}}"#, records.join(","))
}

async fn mount_status(server: &MockServer, body: String, times: Option<u64>, priority: u8) {
    let mock = Mock::given(method("GET"))
        .and(path("/api/contest.status"))
        .and(query_param("handle", "tourist"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .with_priority(priority);
    match times {
        Some(n) => mock.up_to_n_times(n).mount(server).await,
        None => mock.mount(server).await,
    }
}

fn read_history(dir: &Path) -> SourceHistory {
    SourceHistory::open(dir.join("history.yml")).unwrap()
}

#[tokio::test]
async fn submit_then_track_until_verdict() {
    let site = site(true).await;
    mount_submit_page(&site.server).await;
    mount_accepting_post(&site.server, 1).await;
    // the earlier judged submission is all the api knows at first
    let old = status_record(221000001, Some("WRONG_ANSWER"));
    mount_status(&site.server, status_body(&[old.clone()]), Some(2), 1).await;
    mount_status(
        &site.server,
        status_body(&[status_record(221000009, Some("TESTING")), old.clone()]),
        Some(1),
        2,
    )
    .await;
    mount_status(
        &site.server,
        status_body(&[status_record(221000009, Some("OK")), old]),
        None,
        3,
    )
    .await;

    let receipt = site
        .submitter
        .submit_file("1873_a.cpp", "int main() {}\n")
        .await
        .unwrap();
    assert_eq!(receipt.problem, ProblemIdentifier::new(1873, "A"));
    assert_eq!(receipt.handle, "tourist");
    assert_eq!(receipt.language_id, "91");
    assert!(!receipt.duplicate_warning);
    assert_eq!(receipt.last_seen_id, Some(221000001));

    let record = match site.submitter.track(&receipt).await.unwrap() {
        PollOutcome::Verdict(r) => r,
        other => panic!("unexpected outcome {:?}", other),
    };
    assert_eq!(record.verdict, Verdict::Ok);
    assert_eq!(record.id, 221000009);

    let requests = site.server.received_requests().await.unwrap();
    let polls = requests
        .iter()
        .filter(|r| r.url.path() == "/api/contest.status")
        .count();
    // one read before the submit, then stale, judging, judged
    assert_eq!(polls, 4);
    let post = requests
        .iter()
        .find(|r| r.method.as_str() == "POST")
        .unwrap();
    let body = String::from_utf8_lossy(&post.body);
    assert!(body.contains("submitSolutionFormSubmitted"));
    assert!(body.contains("int main() {}"));

    // cookies set by the site reach the browser store
    let domain = site.submitter.session().context().domain().to_owned();
    assert!(site
        .persistent
        .cookies(&domain)
        .contains(&Cookie::new("JSESSIONID", "BEEF")));
    assert_eq!(
        read_history(site.dir.path()).last(&receipt.problem),
        Some("int main() {}\n")
    );
}

#[tokio::test]
async fn resubmitting_same_code_warns() {
    let site = site(true).await;
    mount_submit_page(&site.server).await;
    mount_accepting_post(&site.server, 2).await;

    let first = site
        .submitter
        .submit_file("1873A.py", "print(input())")
        .await
        .unwrap();
    assert!(!first.duplicate_warning);
    assert_eq!(first.language_id, "70");
    let second = site
        .submitter
        .submit_file("1873A.py", "print(input())\n\n")
        .await
        .unwrap();
    assert!(second.duplicate_warning);
}

#[tokio::test]
async fn inline_error_is_rejection() {
    let site = site(true).await;
    mount_submit_page(&site.server).await;
    Mock::given(method("POST"))
        .and(path("/contest/1873/submit"))
        .and(body_string_contains("programTypeId"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<form><span class="error for__source">You have submitted exactly the same code before</span></form>"#,
        ))
        .expect(1)
        .mount(&site.server)
        .await;

    let err = site
        .submitter
        .submit_file("1873A.java", "class Main {}")
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), Kind::Rejected));
    assert_eq!(
        err.description(),
        Some("You have submitted exactly the same code before")
    );
    assert_eq!(
        read_history(site.dir.path()).last(&ProblemIdentifier::new(1873, "A")),
        None
    );
}

#[tokio::test]
async fn expired_session_is_auth_error() {
    let site = site(true).await;
    Mock::given(method("GET"))
        .and(path("/contest/1873/submit"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/enter?back=%2F"))
        .mount(&site.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/enter"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&site.server)
        .await;

    let err = site
        .submitter
        .submit_file("1873A.cpp", "int main() {}")
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), Kind::Auth));
}

#[tokio::test]
async fn not_logged_in_never_reaches_the_site() {
    let site = site(false).await;
    let err = site
        .submitter
        .submit_file("1873A.cpp", "int main() {}")
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), Kind::Auth));
    assert!(site.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn plain_text_is_unsupported() {
    let site = site(true).await;
    for name in ["1873A.txt", "notes.cpp"] {
        let err = site.submitter.submit_file(name, "hello").await.unwrap_err();
        assert!(matches!(err.kind(), Kind::Unsupported));
    }
    assert!(site.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn lists_compiler_options() {
    let site = site(true).await;
    mount_submit_page(&site.server).await;
    let options = site
        .submitter
        .languages(&ProblemIdentifier::new(1873, "A"))
        .await
        .unwrap();
    let ids: Vec<&str> = options.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, vec!["43", "54", "91", "70", "87"]);
}

#[tokio::test]
async fn password_login_reaches_browser_store() {
    let site = site(false).await;
    Mock::given(method("GET"))
        .and(path("/enter"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            format!(r#"<meta name="X-Csrf-Token" content="{}"/>"#, CSRF),
        ))
        .mount(&site.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/enter"))
        .and(body_string_contains("handleOrEmail=tourist"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<script>var handle = "tourist";</script>"#),
        )
        .expect(1)
        .mount(&site.server)
        .await;

    let session = site.submitter.session();
    session.login("tourist", "hunter2").await.unwrap();
    assert_eq!(session.context().current_handle().as_deref(), Some("tourist"));
    let domain = session.context().domain().to_owned();
    assert!(site
        .persistent
        .cookies(&domain)
        .contains(&Cookie::new("X-User", "tourist")));
    assert_eq!(site.submitter.logged_in_handle().as_deref(), Some("tourist"));
}
