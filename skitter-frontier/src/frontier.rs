use crate::config::FrontierConfig;
use crate::domain;
use crate::error::{FrontierError, Result};
use crate::policy::AdmissionPolicy;
use crate::record::{UrlIndex, UrlRecord};
use crate::robots::RobotsCache;
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info, warn};
use url::Url;

/// Traversal direction for [`Frontier::next_ready`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Head-to-tail: oldest pending entries first.
    Fifo,
    /// Tail-to-head: newest pending entries first.
    Lifo,
}

/// The crawl frontier: admission control, dedup, politeness and release
/// order for discovered URLs.
///
/// Designed for a single logical owner. All mutators take `&mut self` and
/// there is no internal locking; concurrent workers must serialize access
/// around it (a channel to an owning task, or an external mutex). The only
/// await point is the robots.txt fetch inside [`Frontier::admit`].
pub struct Frontier {
    config: FrontierConfig,
    policy: AdmissionPolicy,
    robots: RobotsCache,
    /// Every record ever admitted, in index order. Records are never removed.
    records: Vec<UrlRecord>,
    /// Indices admitted but not yet released, in queue order.
    pending: VecDeque<UrlIndex>,
    /// Mirror of `pending` for O(1) membership checks.
    pending_set: HashSet<UrlIndex>,
    /// Canonical strings admitted so far; first-seen dedup key.
    seen_urls: HashSet<String>,
    /// Indices still owned by the crawl: queued or in flight.
    active: HashSet<UrlIndex>,
}

impl Frontier {
    /// Builds a frontier from its configuration.
    ///
    /// Fails when a configured pattern does not compile or the robots HTTP
    /// client cannot be built; both are integration bugs, not crawl-time
    /// conditions.
    pub fn new(config: FrontierConfig) -> Result<Self> {
        let policy = AdmissionPolicy::compile(&config)?;
        let robots = RobotsCache::new(&config.user_agent)?;
        Ok(Self {
            config,
            policy,
            robots,
            records: Vec::new(),
            pending: VecDeque::new(),
            pending_set: HashSet::new(),
            seen_urls: HashSet::new(),
            active: HashSet::new(),
        })
    }

    /// Offers a newly discovered URL string to the frontier.
    ///
    /// The fragment is stripped first; checks then run cheapest-first and
    /// short-circuit, so the robots fetch (the one outbound request) never
    /// fires for a URL a local check already rejected. A rejected candidate
    /// is logged and dropped; rejection is a normal outcome, not an error.
    pub async fn admit(
        &mut self,
        raw_url: &str,
        anchor_text: Option<&str>,
        parent: Option<&UrlRecord>,
    ) {
        let url = match raw_url.split_once('#') {
            Some((without_fragment, _)) => {
                info!("{}: stripped fragment from {}", without_fragment, raw_url);
                without_fragment.to_string()
            }
            None => raw_url.to_string(),
        };
        let depth = parent.map_or(0, |p| p.depth + 1);

        if !self.is_unseen(&url) {
            return;
        }
        if !self.domain_allowed(&url) {
            return;
        }
        if !self.url_allowed(&url) {
            return;
        }
        if !self.syntax_valid(&url) {
            return;
        }
        if !self.robots_allow(&url).await {
            return;
        }
        if !self.within_limits(&url, depth, 0) {
            return;
        }

        let index = self.records.len();
        let record = UrlRecord::new(
            url.clone(),
            index,
            depth,
            anchor_text.map(str::to_string),
            parent.map(|p| p.index),
        );
        self.records.push(record);
        self.pending.push_back(index);
        self.pending_set.insert(index);
        self.active.insert(index);
        self.seen_urls.insert(url.clone());
        info!("{}: queued at index {}", url, index);
    }

    /// Returns a failed record to the queue for another attempt.
    ///
    /// Stamps the failure on the arena record, then re-checks only what can
    /// have changed since first admission: pending membership and the
    /// depth/retry bounds. String-level checks already passed and the string
    /// is immutable. A record that exhausts its retry budget is never
    /// queued again.
    ///
    /// Errors only on a record the frontier never issued — an integration
    /// bug, unlike the logged-and-dropped crawl-time rejections.
    pub fn resubmit(&mut self, record: &UrlRecord) -> Result<()> {
        let index = record.index;
        let (url, depth, retry_count) = {
            let Some(entry) = self.records.get_mut(index) else {
                return Err(FrontierError::UnknownRecord(index));
            };
            entry.failed_once();
            (entry.url.clone(), entry.depth, entry.retry_count)
        };

        if self.pending_set.contains(&index) {
            warn!("{}: already pending, not re-queued", url);
            return Ok(());
        }
        if !self.within_limits(&url, depth, retry_count) {
            return Ok(());
        }

        self.pending.push_back(index);
        self.pending_set.insert(index);
        // Retried entries always settle back into ascending discovery
        // order, whichever traversal the consumer asks for next. Preserved
        // from the original system; flagged in DESIGN.md for review.
        self.pending.make_contiguous().sort_unstable();
        info!("{}: re-queued after failure {}", url, retry_count);
        Ok(())
    }

    /// Releases every currently ready pending record, in `order`.
    ///
    /// Traverses the pending queue head-to-tail (FIFO) or tail-to-head
    /// (LIFO); entries whose backoff window has not elapsed are skipped in
    /// place and stay pending for the next call. Each call re-evaluates the
    /// queue from scratch. Released records leave the pending queue but
    /// remain active until [`Frontier::deactivate`].
    pub fn next_ready(&mut self, order: Order) -> Vec<UrlRecord> {
        let wait = self.config.retry_wait();
        let mut ready: Vec<UrlIndex> = Vec::new();
        let mut still_waiting: VecDeque<UrlIndex> = VecDeque::with_capacity(self.pending.len());

        for &index in &self.pending {
            if self.records[index].is_ready(wait) {
                ready.push(index);
            } else {
                still_waiting.push_back(index);
            }
        }
        self.pending = still_waiting;
        for index in &ready {
            self.pending_set.remove(index);
        }
        if order == Order::Lifo {
            ready.reverse();
        }

        debug!(
            "released {} record(s), {} pending",
            ready.len(),
            self.pending.len()
        );
        ready
            .into_iter()
            .map(|index| self.records[index].clone())
            .collect()
    }

    /// Drops a record from the active set after a terminal outcome.
    ///
    /// Idempotent: deactivating an already-inactive record changes nothing,
    /// so the active count never goes negative.
    pub fn deactivate(&mut self, record: &UrlRecord) {
        if self.active.remove(&record.index) {
            debug!("{}: deactivated", record.url);
        }
    }

    /// Looks up a record by index, e.g. to walk a provenance chain.
    pub fn record(&self, index: UrlIndex) -> Option<&UrlRecord> {
        self.records.get(index)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    fn is_unseen(&self, url: &str) -> bool {
        if self.seen_urls.contains(url) {
            warn!("{}: URL added previously", url);
            return false;
        }
        true
    }

    fn domain_allowed(&self, url: &str) -> bool {
        let host = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string));
        match host {
            Some(host) if self.policy.domain_allowed(&host) => true,
            _ => {
                warn!("{}: not an allowed domain", url);
                false
            }
        }
    }

    fn url_allowed(&self, url: &str) -> bool {
        if self.policy.url_disallowed(url) {
            warn!("{}: matches a disallowed pattern", url);
            return false;
        }
        true
    }

    fn syntax_valid(&self, url: &str) -> bool {
        if url.len() > self.config.max_url_length {
            warn!("{}: length over limit", url);
            return false;
        }
        let Ok(parsed) = Url::parse(url) else {
            warn!("{}: invalid URL", url);
            return false;
        };
        if parsed.path().matches('/').count() > self.config.max_path_slashes {
            warn!("{}: number of slashes over limit", url);
            return false;
        }
        if !self.policy.matches_syntax(url) {
            warn!("{}: does not match the URL pattern", url);
            return false;
        }
        true
    }

    async fn robots_allow(&mut self, url: &str) -> bool {
        // Host already validated, so a missing origin only happens for
        // exotic schemes; treat those as permitted like any failed lookup.
        let Some(origin) = domain::origin_of(url) else {
            return true;
        };
        let path = match Url::parse(url) {
            Ok(parsed) => parsed.path().to_string(),
            Err(_) => "/".to_string(),
        };
        if self.robots.can_fetch(&origin, &path).await {
            return true;
        }
        warn!("{}: not allowed by robots.txt", url);
        false
    }

    fn within_limits(&self, url: &str, depth: usize, retry_count: usize) -> bool {
        if depth > self.config.max_depth {
            warn!("{}: depth over limit", url);
            return false;
        }
        if retry_count > self.config.retry_limit {
            warn!("{}: retry count over limit", url);
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::MockServer;

    fn quick_config() -> FrontierConfig {
        FrontierConfig {
            retry_wait_secs: 0,
            ..FrontierConfig::default()
        }
    }

    // An unmatched MockServer answers 404, so robots.txt degrades to
    // permit-all without leaving the process.
    async fn frontier_and_server() -> (Frontier, MockServer) {
        let server = MockServer::start().await;
        let frontier = Frontier::new(quick_config()).unwrap();
        (frontier, server)
    }

    #[tokio::test]
    async fn duplicate_strings_are_admitted_once() {
        let (mut frontier, server) = frontier_and_server().await;
        let url = format!("{}/a", server.uri());

        frontier.admit(&url, None, None).await;
        frontier.admit(&url, None, None).await;

        assert_eq!(frontier.pending_count(), 1);
        assert_eq!(frontier.active_count(), 1);
    }

    #[tokio::test]
    async fn fragment_is_stripped_before_dedup() {
        let (mut frontier, server) = frontier_and_server().await;
        let base = format!("{}/page", server.uri());

        frontier.admit(&format!("{base}#section-2"), None, None).await;
        frontier.admit(&base, None, None).await;

        assert_eq!(frontier.pending_count(), 1);
        assert_eq!(frontier.record(0).unwrap().url, base);
    }

    #[tokio::test]
    async fn rejected_candidates_leave_no_trace() {
        let server = MockServer::start().await;
        let config = FrontierConfig {
            disallowed_urls: vec!["/forbidden".to_string()],
            ..quick_config()
        };
        let mut frontier = Frontier::new(config).unwrap();

        frontier
            .admit(&format!("{}/forbidden/x", server.uri()), None, None)
            .await;
        frontier.admit("not a url at all", None, None).await;

        assert_eq!(frontier.pending_count(), 0);
        assert_eq!(frontier.active_count(), 0);
    }

    #[tokio::test]
    async fn resubmitted_entries_settle_into_ascending_order() {
        let (mut frontier, server) = frontier_and_server().await;
        for p in ["a", "b", "c"] {
            frontier.admit(&format!("{}/{p}", server.uri()), None, None).await;
        }
        let drained = frontier.next_ready(Order::Fifo);
        assert_eq!(drained.len(), 3);

        // Resubmit newest-first; the queue still comes back ascending, so a
        // LIFO pass sees the highest index first.
        frontier.resubmit(&drained[2]).unwrap();
        frontier.resubmit(&drained[0]).unwrap();

        let released: Vec<_> = frontier
            .next_ready(Order::Lifo)
            .into_iter()
            .map(|r| r.index)
            .collect();
        assert_eq!(released, vec![2, 0]);
    }

    #[tokio::test]
    async fn resubmitting_a_pending_record_does_not_duplicate_it() {
        let (mut frontier, server) = frontier_and_server().await;
        frontier.admit(&format!("{}/a", server.uri()), None, None).await;
        let record = frontier.record(0).unwrap().clone();

        frontier.resubmit(&record).unwrap();

        assert_eq!(frontier.pending_count(), 1);
    }

    #[tokio::test]
    async fn foreign_record_is_an_error() {
        let (mut frontier, server) = frontier_and_server().await;
        frontier.admit(&format!("{}/a", server.uri()), None, None).await;

        let forged = UrlRecord::new("http://example.com/x".into(), 99, 0, None, None);
        match frontier.resubmit(&forged) {
            Err(FrontierError::UnknownRecord(99)) => {}
            other => panic!("expected UnknownRecord, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn deactivate_is_idempotent() {
        let (mut frontier, server) = frontier_and_server().await;
        frontier.admit(&format!("{}/a", server.uri()), None, None).await;
        frontier.admit(&format!("{}/b", server.uri()), None, None).await;
        assert_eq!(frontier.active_count(), 2);

        let released = frontier.next_ready(Order::Fifo);
        frontier.deactivate(&released[0]);
        assert_eq!(frontier.active_count(), 1);
        frontier.deactivate(&released[0]);
        assert_eq!(frontier.active_count(), 1);
    }
}
