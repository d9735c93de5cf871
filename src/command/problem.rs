extern crate termcolor;
extern crate tokio;

use crate::{
    read::{read_count, read_problem, read_source},
    write::{write_outcome, write_record},
};
use cf_submit::{
    language::{pick_recommended, Language},
    tracker::{PollOutcome, PollState, Since, TrackKey},
    Result, Submitter,
};
use std::{future::Future, io::Write};
use termcolor::{Color, StandardStream};

/// Prints poll progress until `track` finishes.
#[allow(unused_must_use)]
async fn follow<F: Future<Output = Result<PollOutcome>>>(
    stdout: &mut StandardStream,
    submitter: &Submitter,
    track: F,
) {
    let mut state = submitter.tracker().subscribe();
    tokio::pin!(track);
    let outcome = loop {
        tokio::select! {
            r = &mut track => break r,
            Ok(()) = state.changed() => {
                if let PollState::Polling { attempt, last: Some(r), .. } = &*state.borrow() {
                    write_progress!(stdout, "Polling", "#{} {}", attempt, r);
                }
            }
        }
    };
    write_outcome(stdout, outcome);
}

#[allow(unused_must_use)]
pub async fn submit(stdout: &mut StandardStream, submitter: &Submitter) {
    let (name, source) = match read_source(stdout) {
        Some(v) => v,
        None => return,
    };
    write_info!(stdout, "Info", "Submitting {}", name);
    let receipt = match submitter.submit_file(&name, &source).await {
        Ok(r) => r,
        Err(e) => {
            write_error!(stdout, "Error", "submit: {}", e);
            return;
        }
    };
    if receipt.duplicate_warning {
        write_warn!(
            stdout,
            "Warning",
            "Same code as your last submission of {}",
            receipt.problem
        );
    }
    write_ok!(
        stdout,
        "Success",
        "Submitted {} as {} with compiler {}",
        receipt.problem,
        receipt.handle,
        receipt.language_id
    );
    follow(stdout, submitter, submitter.track(&receipt)).await;
}

#[allow(unused_must_use)]
pub async fn languages(stdout: &mut StandardStream, submitter: &Submitter) {
    let problem = match read_problem(stdout) {
        Some(p) => p,
        None => return,
    };
    let options = match submitter.languages(&problem).await {
        Ok(v) => v,
        Err(e) => {
            write_error!(stdout, "Error", "languages: {}", e);
            return;
        }
    };
    for o in &options {
        writeln!(stdout, "{:>8} {}", o.id, o.display_text);
    }
    for language in [Language::Cpp, Language::Python, Language::Java] {
        if let Some(o) = pick_recommended(&options, language) {
            write_info!(stdout, language.key(), "{} ({})", o.display_text, o.id);
        }
    }
}

#[allow(unused_must_use)]
pub async fn watch(stdout: &mut StandardStream, submitter: &Submitter) {
    let handle = match submitter.logged_in_handle() {
        Some(h) => h,
        None => {
            write_error!(stdout, "Error", "Not logged in");
            return;
        }
    };
    let problem = match read_problem(stdout) {
        Some(p) => p,
        None => return,
    };
    write_info!(stdout, "Info", "Watching {} by {}", problem, handle);
    let key = TrackKey::new(problem, handle);
    follow(stdout, submitter, submitter.tracker().track(key, Since::Time(0))).await;
}

#[allow(unused_must_use)]
pub async fn recent(stdout: &mut StandardStream, submitter: &Submitter) {
    let count = match read_count(stdout, "Count: ", 100) {
        Some(c) => c,
        None => return,
    };
    match submitter.recent(count).await {
        Ok(v) if v.is_empty() => write_info!(stdout, "Info", "No submissions yet"),
        Ok(v) => v.iter().for_each(|r| write_record(stdout, r)),
        Err(e) => write_error!(stdout, "Error", "recent: {}", e),
    }
}

#[allow(unused_must_use)]
pub fn history(stdout: &mut StandardStream, submitter: &Submitter) {
    let history = submitter.history();
    if history.is_empty() {
        write_info!(stdout, "Info", "Nothing submitted yet");
        return;
    }
    for (problem, source) in history.iter() {
        writeln!(stdout, "{:>8} {} lines", problem, source.lines().count());
    }
}
