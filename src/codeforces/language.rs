extern crate lazy_static;
extern crate regex;
extern crate serde;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

lazy_static! {
    static ref CPP_STANDARD: Regex = Regex::new(r"[cg]\+\+\s*(\d+)").unwrap();
    static ref PYTHON_MAJOR: Regex = Regex::new(r"(?:python|pypy)\s*(\d+)").unwrap();
    static ref JAVA_VERSION: Regex = Regex::new(r"(?:java|jdk)\s*-?(\d+)").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Cpp,
    Python,
    Java,
    Plaintext,
}

impl Language {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "c" | "cc" | "cpp" | "cxx" | "hpp" | "h" => Language::Cpp,
            "py" => Language::Python,
            "java" => Language::Java,
            _ => Language::Plaintext,
        }
    }
    pub fn is_submittable(self) -> bool {
        self != Language::Plaintext
    }
    pub fn key(self) -> &'static str {
        match self {
            Language::Cpp => "cpp",
            Language::Python => "python",
            Language::Java => "java",
            Language::Plaintext => "plaintext",
        }
    }
}
impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
impl FromStr for Language {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpp" | "c++" => Ok(Language::Cpp),
            "python" | "py" => Ok(Language::Python),
            "java" => Ok(Language::Java),
            "plaintext" | "text" => Ok(Language::Plaintext),
            other => Err(format!("unknown language {}", other)),
        }
    }
}

/// One entry of the compiler `<select>` on the submit page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageOption {
    pub id: String,
    pub display_text: String,
}

/// How the caller names the compiler to submit with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageChoice {
    Id(String),
    Key(Language),
}

fn version(regex: &Regex, text: &str) -> Option<u32> {
    regex
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn score_cpp(text: &str) -> i32 {
    let mut score = 0;
    if text.contains("c++") || text.contains("g++") {
        score += 6;
    }
    if text.contains("gnu") {
        score += 3;
    }
    score += match version(&CPP_STANDARD, text) {
        Some(23) => 4,
        Some(20) => 3,
        Some(17) => 2,
        Some(11) => 1,
        _ => 0,
    };
    if text.contains("64") {
        score += 1;
    }
    if text.contains("clang") {
        score -= 4;
    }
    if text.contains("mingw") {
        score -= 2;
    }
    score
}

fn score_python(text: &str) -> i32 {
    let mut score = 0;
    if text.contains("python") || text.contains("pypy") {
        score += 6;
    }
    match version(&PYTHON_MAJOR, text) {
        Some(3) => score += 4,
        Some(2) => score -= 8,
        _ => (),
    }
    if text.contains("pypy") {
        score += 2;
    }
    if text.contains("64") {
        score += 1;
    }
    score
}

fn score_java(text: &str) -> i32 {
    let mut score = 0;
    if text.contains("java") {
        score += 6;
    }
    score += match version(&JAVA_VERSION, text) {
        Some(21) => 3,
        Some(17) => 2,
        Some(11) => 1,
        _ => 0,
    };
    if text.contains("jdk") {
        score += 1;
    }
    score
}

pub fn score(option: &LanguageOption, language: Language) -> i32 {
    let text = option.display_text.to_lowercase();
    match language {
        Language::Cpp => score_cpp(&text),
        Language::Python => score_python(&text),
        Language::Java => score_java(&text),
        Language::Plaintext => 0,
    }
}

/// Best scoring option for `language`; earlier options win ties.
pub fn pick_recommended(options: &[LanguageOption], language: Language) -> Option<&LanguageOption> {
    if !language.is_submittable() {
        return None;
    }
    let mut best: Option<(&LanguageOption, i32)> = None;
    for option in options {
        let s = score(option, language);
        match best {
            Some((_, top)) if top >= s => (),
            _ => best = Some((option, s)),
        }
    }
    best.map(|(option, _)| option)
}
