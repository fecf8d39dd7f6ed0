//! Per-origin robots.txt policies, fetched once and cached for the process.

use crate::error::Result;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Token robots.txt uses for rules addressed at every crawler.
pub const GENERIC_AGENT: &str = "*";

/// Allow/disallow path prefixes for one user-agent group.
#[derive(Debug, Clone, Default)]
struct RuleGroup {
    allow: Vec<String>,
    disallow: Vec<String>,
}

/// Fetch permissions parsed from one domain's robots.txt.
///
/// A policy with no rules permits everything, which is also what a failed
/// fetch degrades to.
#[derive(Debug, Clone, Default)]
pub struct RobotsPolicy {
    /// Groups for named agents, keyed by lowercase token.
    groups: HashMap<String, RuleGroup>,
    /// Rules addressed at `*`.
    default_group: RuleGroup,
}

impl RobotsPolicy {
    /// The empty, permit-everything policy.
    pub fn permit_all() -> Self {
        Self::default()
    }

    pub fn parse(content: &str) -> Self {
        let mut policy = Self::default();
        let mut agents: Vec<String> = Vec::new();
        let mut rules = RuleGroup::default();
        let mut saw_rule = false;

        for line in content.lines() {
            let line = match line.split_once('#') {
                Some((before_comment, _)) => before_comment,
                None => line,
            }
            .trim();
            if line.is_empty() {
                continue;
            }
            let Some((directive, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match directive.trim().to_ascii_lowercase().as_str() {
                "user-agent" => {
                    // Consecutive user-agent lines share the group that
                    // follows; a rule line ends the group.
                    if saw_rule {
                        policy.store(&agents, &rules);
                        agents.clear();
                        rules = RuleGroup::default();
                        saw_rule = false;
                    }
                    agents.push(value.to_ascii_lowercase());
                }
                "disallow" => {
                    saw_rule = true;
                    // "Disallow:" with no value permits everything.
                    if !value.is_empty() {
                        rules.disallow.push(value.to_string());
                    }
                }
                "allow" => {
                    saw_rule = true;
                    if !value.is_empty() {
                        rules.allow.push(value.to_string());
                    }
                }
                _ => {}
            }
        }
        policy.store(&agents, &rules);
        policy
    }

    fn store(&mut self, agents: &[String], rules: &RuleGroup) {
        for agent in agents {
            if agent == GENERIC_AGENT {
                self.default_group = rules.clone();
            } else {
                self.groups.insert(agent.clone(), rules.clone());
            }
        }
    }

    /// May `agent` fetch `path`? Allow rules override disallow rules.
    pub fn can_fetch(&self, agent: &str, path: &str) -> bool {
        let agent = agent.to_ascii_lowercase();
        let group = self
            .groups
            .get(&agent)
            .or_else(|| {
                self.groups
                    .iter()
                    .find(|(token, _)| agent.contains(token.as_str()))
                    .map(|(_, group)| group)
            })
            .unwrap_or(&self.default_group);

        if group.allow.iter().any(|prefix| path.starts_with(prefix)) {
            return true;
        }
        !group.disallow.iter().any(|prefix| path.starts_with(prefix))
    }
}

/// One cached [`RobotsPolicy`] per origin, resolved on first use and kept
/// for the process lifetime. No expiry, no refresh.
pub struct RobotsCache {
    client: Client,
    policies: HashMap<String, RobotsPolicy>,
}

impl RobotsCache {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            client,
            policies: HashMap::new(),
        })
    }

    /// Is `path` on `origin` permitted for the generic agent?
    ///
    /// The first query for an origin fetches `{origin}/robots.txt`. A fetch
    /// that fails degrades to a cached permit-all policy, so politeness is
    /// best-effort under network trouble.
    pub async fn can_fetch(&mut self, origin: &str, path: &str) -> bool {
        if let Some(policy) = self.policies.get(origin) {
            return policy.can_fetch(GENERIC_AGENT, path);
        }

        debug!("Fetching robots.txt for {}", origin);
        let policy = match self.fetch(origin).await {
            Ok(policy) => policy,
            Err(e) => {
                warn!("robots.txt fetch for {} failed ({}), allowing all", origin, e);
                RobotsPolicy::permit_all()
            }
        };
        let allowed = policy.can_fetch(GENERIC_AGENT, path);
        self.policies.insert(origin.to_string(), policy);
        allowed
    }

    async fn fetch(&self, origin: &str) -> reqwest::Result<RobotsPolicy> {
        let robots_url = format!("{}/robots.txt", origin.trim_end_matches('/'));
        let response = self.client.get(&robots_url).send().await?;
        if !response.status().is_success() {
            // Missing robots.txt is the ordinary permissive case.
            debug!("No robots.txt at {} ({})", robots_url, response.status());
            return Ok(RobotsPolicy::permit_all());
        }
        let body = response.text().await?;
        Ok(RobotsPolicy::parse(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn disallow_prefixes_block_paths() {
        let policy = RobotsPolicy::parse(
            "User-agent: *\nDisallow: /private/\nDisallow: /admin\n",
        );
        assert!(!policy.can_fetch("*", "/private/page"));
        assert!(!policy.can_fetch("*", "/admin"));
        assert!(policy.can_fetch("*", "/public/page"));
    }

    #[test]
    fn allow_overrides_disallow() {
        let policy = RobotsPolicy::parse(
            "User-agent: *\nDisallow: /private/\nAllow: /private/shared/\n",
        );
        assert!(!policy.can_fetch("*", "/private/secret"));
        assert!(policy.can_fetch("*", "/private/shared/page"));
    }

    #[test]
    fn named_agent_rules_do_not_bind_the_generic_agent() {
        let policy = RobotsPolicy::parse(
            "User-agent: greedybot\nDisallow: /\n\nUser-agent: *\nDisallow: /tmp/\n",
        );
        assert!(!policy.can_fetch("greedybot", "/anything"));
        assert!(policy.can_fetch("*", "/anything"));
        assert!(!policy.can_fetch("*", "/tmp/file"));
    }

    #[test]
    fn consecutive_agent_lines_share_a_group() {
        let policy = RobotsPolicy::parse(
            "User-agent: alpha\nUser-agent: beta\nDisallow: /x/\n",
        );
        assert!(!policy.can_fetch("alpha", "/x/1"));
        assert!(!policy.can_fetch("beta", "/x/1"));
        assert!(policy.can_fetch("*", "/x/1"));
    }

    #[test]
    fn empty_policy_permits_everything() {
        let policy = RobotsPolicy::parse("");
        assert!(policy.can_fetch("*", "/any/path"));
        assert!(RobotsPolicy::permit_all().can_fetch("anybot", "/"));
    }

    #[test]
    fn disallow_all_blocks_the_root() {
        let policy = RobotsPolicy::parse("User-agent: *\nDisallow: /\n");
        assert!(!policy.can_fetch("*", "/"));
        assert!(!policy.can_fetch("*", "/anything"));
    }

    #[tokio::test]
    async fn cache_fetches_each_origin_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /blocked/\n"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut cache = RobotsCache::new("test-agent").unwrap();
        let origin = server.uri();
        assert!(!cache.can_fetch(&origin, "/blocked/page").await);
        assert!(cache.can_fetch(&origin, "/open/page").await);
        assert!(!cache.can_fetch(&origin, "/blocked/other").await);
        // MockServer verifies the expect(1) on drop.
    }

    #[tokio::test]
    async fn unreachable_server_defaults_to_allow() {
        let server = MockServer::start().await;
        let origin = server.uri();
        drop(server);

        let mut cache = RobotsCache::new("test-agent").unwrap();
        assert!(cache.can_fetch(&origin, "/anything").await);
    }

    #[tokio::test]
    async fn missing_robots_file_defaults_to_allow() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mut cache = RobotsCache::new("test-agent").unwrap();
        assert!(cache.can_fetch(&server.uri(), "/anything").await);
    }
}
