extern crate termcolor;

use crate::{read::read_line, write::write_result};
use cf_submit::{poll::Backoff, Submitter};
use std::io::Write;
use termcolor::{Color, StandardStream};

#[allow(unused_must_use)]
pub async fn whoami(stdout: &mut StandardStream, submitter: &Submitter) {
    if let Some(h) = submitter.logged_in_handle() {
        write_ok!(stdout, "Handle", "Logged in as {}", h);
        return;
    }
    match submitter.session().detect_handle().await {
        Ok(Some(h)) => write_info!(stdout, "Handle", "Site knows you as {}, cookies lack it", h),
        Ok(None) => write_info!(stdout, "Handle", "Not logged in"),
        Err(e) => write_error!(stdout, "Error", "whoami: {}", e),
    }
}

#[allow(unused_must_use)]
pub async fn login(stdout: &mut StandardStream, submitter: &Submitter, default: Option<&str>) {
    let ctx = submitter.session().context();
    if let Some(h) = ctx.wait_for_login(&Backoff::login()).await {
        write_ok!(stdout, "Success", "Already logged in as {}", h);
        return;
    }
    let prompt = match default {
        Some(h) => format!("Handle [{}]: ", h),
        None => String::from("Handle: "),
    };
    let handle = match read_line(stdout, &prompt) {
        Some(h) if h.is_empty() => default.unwrap_or_default().to_owned(),
        Some(h) => h,
        None => return,
    };
    let password = match read_line(stdout, "Password: ") {
        Some(p) => p,
        None => return,
    };
    write_info!(stdout, "Info", "Logging into {}", ctx.domain());
    write_result(
        stdout,
        submitter.session().login(&handle, &password).await,
        "Logged in",
    );
}

#[allow(unused_must_use)]
pub async fn logout(stdout: &mut StandardStream, submitter: &Submitter) {
    write_info!(stdout, "Info", "Logging out");
    write_result(stdout, submitter.session().logout().await, "Logged out");
}

#[allow(unused_must_use)]
pub fn switch_mode(stdout: &mut StandardStream, submitter: &Submitter) {
    let ctx = submitter.session().context();
    let mode = ctx.mode().other();
    ctx.set_mode(mode);
    if ctx.try_sync_other_store_if_needed() {
        write_info!(stdout, "Info", "Copied login into the {:?} store", mode);
    }
    write_ok!(stdout, "Mode", "Using {:?} cookies", mode);
}
