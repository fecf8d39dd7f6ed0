use std::time::{Duration, Instant};

/// Position of a record in the frontier's arena. Assigned once at admission,
/// in discovery order, and never reused.
pub type UrlIndex = usize;

/// One discovered link, with provenance and fetch history.
///
/// Records are created by the frontier at first admission and live in its
/// arena for the rest of the process. Handles returned to consumers are
/// clones; the arena copy is the one updated when a fetch fails.
#[derive(Debug, Clone)]
pub struct UrlRecord {
    /// Canonical, fragment-stripped form. Dedup key for first admission.
    pub url: String,
    pub index: UrlIndex,
    /// 0 for seeds, parent depth + 1 otherwise. Fixed at creation.
    pub depth: usize,
    /// Arena index of the record this link was discovered on, if any.
    pub parent: Option<UrlIndex>,
    pub anchor_text: Option<String>,
    pub retry_count: usize,
    pub last_failure: Option<Instant>,
}

impl UrlRecord {
    pub fn new(
        url: String,
        index: UrlIndex,
        depth: usize,
        anchor_text: Option<String>,
        parent: Option<UrlIndex>,
    ) -> Self {
        Self {
            url,
            index,
            depth,
            parent,
            anchor_text,
            retry_count: 0,
            last_failure: None,
        }
    }

    /// Records one failed fetch attempt.
    pub fn failed_once(&mut self) {
        self.retry_count += 1;
        self.last_failure = Some(Instant::now());
    }

    /// A record is ready when it never failed, or its backoff window elapsed.
    pub fn is_ready(&self, retry_wait: Duration) -> bool {
        match self.last_failure {
            None => true,
            Some(failed_at) => failed_at.elapsed() > retry_wait,
        }
    }
}
