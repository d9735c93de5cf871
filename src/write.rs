extern crate termcolor;

use cf_submit::{
    judge::SubmissionRecord,
    tracker::PollOutcome,
    Error,
};
use std::io::Write;
use termcolor::{Color, StandardStream};

#[allow(unused_must_use)]
pub fn write_result(stdout: &mut StandardStream, result: Result<(), Error>, success: &str) {
    match result {
        Ok(_) => write_ok!(stdout, "Success", "{}", success),
        Err(e) => write_error!(stdout, "Error", "{}", e),
    }
}

#[allow(unused_must_use)]
pub fn write_record(stdout: &mut StandardStream, record: &SubmissionRecord) {
    if record.verdict.is_accepted() {
        write_ok!(stdout, "Verdict", "{}", record);
    } else if record.verdict.is_terminal() {
        write_error!(stdout, "Verdict", "{}", record);
    } else {
        write_progress!(stdout, "Judging", "{}", record);
    }
}

#[allow(unused_must_use)]
pub fn write_outcome(stdout: &mut StandardStream, outcome: Result<PollOutcome, Error>) {
    match outcome {
        Ok(PollOutcome::Verdict(r)) => write_record(stdout, &r),
        Ok(PollOutcome::TimedOut) => {
            write_warn!(stdout, "Timeout", "Still judging, check later with `recent`")
        }
        Ok(PollOutcome::Superseded) => write_info!(stdout, "Info", "Tracking moved to a newer poll"),
        Err(e) => write_error!(stdout, "Error", "track: {}", e),
    }
}
