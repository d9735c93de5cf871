extern crate clap;
extern crate pretty_env_logger;
extern crate termcolor;
extern crate tokio;

use cf_submit::{profile::Profile, Submitter};
use clap::{crate_description, crate_name, Arg, Command};
use pretty_env_logger::init_timed;
use std::io::Write;
use termcolor::{Color, ColorChoice, StandardStream};

#[macro_use]
mod color;
mod command {
    pub mod problem;
    pub mod session;
}
mod read;
mod write;

use command::{
    problem::{history, languages, recent, submit, watch},
    session::{login, logout, switch_mode, whoami},
};
use read::read_line;

#[allow(unused_must_use)]
fn load(stdout: &mut StandardStream, path: Option<&str>) -> Option<(Profile, Submitter)> {
    let profile = match path.map(Profile::load).unwrap_or_else(|| Ok(Profile::default())) {
        Ok(p) => p,
        Err(e) => {
            write_error!(stdout, "Error", "Error load profile: {}", e);
            return None;
        }
    };
    match profile.submitter() {
        Ok(s) => Some((profile, s)),
        Err(e) => {
            write_error!(stdout, "Error", "Error create session: {}", e);
            None
        }
    }
}

#[allow(unused_must_use)]
#[tokio::main]
async fn main() {
    init_timed();
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let app = Command::new(crate_name!())
        .about(crate_description!())
        .version(get_version!("version"))
        .long_version(get_version!("long_version"))
        .arg(Arg::new("profile").help("Path to profile"))
        .get_matches();
    let (profile, submitter) = match load(&mut stdout, app.value_of("profile")) {
        Some(v) => v,
        None => std::process::exit(1),
    };
    whoami(&mut stdout, &submitter).await;
    loop {
        let line = match read_line(&mut stdout, "cf-submit> ") {
            Some(l) => l,
            None => break,
        };
        match line.as_str() {
            "submit" => submit(&mut stdout, &submitter).await,
            "languages" => languages(&mut stdout, &submitter).await,
            "watch" => watch(&mut stdout, &submitter).await,
            "recent" => recent(&mut stdout, &submitter).await,
            "history" => history(&mut stdout, &submitter),
            "whoami" => whoami(&mut stdout, &submitter).await,
            "login" => login(&mut stdout, &submitter, profile.handle.as_deref()).await,
            "logout" => logout(&mut stdout, &submitter).await,
            "mode" => switch_mode(&mut stdout, &submitter),
            "exit" => break,
            "" => (),
            unknown => write_error!(
                &mut stdout,
                "Error",
                r#"cf-submit: unknown command "{}""#,
                unknown
            ),
        }
    }
}
