pub mod retry {
    use std::time::Duration;
    pub const RETRY_COUNT: u32 = 4;
    pub const RETRY_DELAY: Duration = Duration::from_millis(200);
    pub const FORBIDDEN_DELAY: Duration = Duration::from_secs(5);
}
pub mod session {
    use std::time::Duration;
    pub const VERBOSE: bool = false;
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
    pub const BASE_URL: &str = "https://codeforces.com";
}
pub mod submitter {
    use std::time::Duration;
    pub const SUBMIT_GAP: Duration = Duration::from_millis(1200);
    /// Slack subtracted from the local submit time when matching remote records.
    pub const CLOCK_SKEW: Duration = Duration::from_secs(10);
}
pub mod poll {
    use std::time::Duration;
    pub const POLL_DELAYS: [Duration; 4] = [
        Duration::from_secs(0),
        Duration::from_secs(1),
        Duration::from_secs(2),
        Duration::from_secs(3),
    ];
    pub const POLL_ATTEMPTS: usize = 60;
    pub const POLL_BUDGET: Duration = Duration::from_secs(180);
    pub const STATUS_COUNT: usize = 10;
}
pub mod cookie {
    use std::time::Duration;
    pub const AUTH_COOKIE: &str = "X-User";
    pub const MAX_HANDLE_LEN: usize = 24;
    pub const LOGIN_DELAYS: [Duration; 4] = [
        Duration::from_millis(0),
        Duration::from_millis(250),
        Duration::from_millis(600),
        Duration::from_millis(1200),
    ];
}
