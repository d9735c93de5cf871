//! Talking to the judge: the http session, submit page scraping, the
//! submit form and the status api.

pub mod page;
mod retry;
mod search;
pub mod session;
pub mod status;
pub mod submit;
pub mod verdict;

pub use page::{parse_submit_page, SubmitPage};
pub use session::Session;
pub use submit::SubmissionRequest;
pub use verdict::{SubmissionRecord, Verdict};
