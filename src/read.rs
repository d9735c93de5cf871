extern crate termcolor;

use cf_submit::ProblemIdentifier;
use std::{
    fs,
    io::{stdin, Write},
    path::Path,
};
use termcolor::{Color, StandardStream};

/// Prompts for one line. `None` once stdin is closed.
#[allow(unused_must_use)]
pub fn read_line(stdout: &mut StandardStream, prompt: &str) -> Option<String> {
    let mut line = String::new();
    loop {
        stdout.write(prompt.as_bytes());
        stdout.flush();
        match stdin().read_line(&mut line) {
            Ok(0) => return None,
            Ok(_) => return Some(line.trim().to_owned()),
            Err(e) => write_error!(stdout, "Error", "read: {}", e),
        }
        line.clear();
    }
}

/// Keeps asking until `parse` accepts the answer.
#[allow(unused_must_use)]
fn read_parsed<T, F>(stdout: &mut StandardStream, prompt: &str, mut parse: F) -> Option<T>
where
    F: FnMut(&str) -> Result<T, String>,
{
    loop {
        let line = read_line(stdout, prompt)?;
        match parse(&line) {
            Ok(v) => return Some(v),
            Err(e) => write_error!(stdout, "Error", "{}", e),
        }
    }
}

pub fn read_count(stdout: &mut StandardStream, prompt: &str, max: usize) -> Option<usize> {
    read_parsed(stdout, prompt, |s| match s.parse::<usize>() {
        Ok(v) if (1..=max).contains(&v) => Ok(v),
        Ok(v) => Err(format!("{} is not in 1..={}", v, max)),
        Err(e) => Err(format!("{:?}: {}", s, e)),
    })
}

/// Reads a problem written like `1873A` or `1873_a`.
pub fn read_problem(stdout: &mut StandardStream) -> Option<ProblemIdentifier> {
    read_parsed(stdout, "Problem: ", |s| {
        ProblemIdentifier::parse(s).ok_or_else(|| format!("{:?} is not a problem", s))
    })
}

/// Reads a source path and returns its file name with the content.
pub fn read_source(stdout: &mut StandardStream) -> Option<(String, String)> {
    read_parsed(stdout, "File path: ", |s| {
        let name = Path::new(s)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| format!("No file name in {:?}", s))?
            .to_owned();
        let content = fs::read_to_string(s).map_err(|e| format!("open {}: {}", s, e))?;
        Ok((name, content))
    })
}
