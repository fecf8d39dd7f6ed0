use crate::config::FrontierConfig;
use crate::error::Result;
use regex::{Regex, RegexSet};

/// Pattern checks from [`FrontierConfig`], compiled once at construction.
///
/// Compilation is the point where a malformed configured pattern fails
/// loudly instead of poisoning every admission decision later.
#[derive(Debug)]
pub struct AdmissionPolicy {
    /// `None` when the config lists no domains: any host is eligible.
    allowed_domains: Option<RegexSet>,
    disallowed_urls: RegexSet,
    url_pattern: Regex,
}

impl AdmissionPolicy {
    pub fn compile(config: &FrontierConfig) -> Result<Self> {
        let allowed_domains = if config.allowed_domains.is_empty() {
            None
        } else {
            Some(RegexSet::new(&config.allowed_domains)?)
        };
        Ok(Self {
            allowed_domains,
            disallowed_urls: RegexSet::new(&config.disallowed_urls)?,
            url_pattern: Regex::new(&config.url_pattern)?,
        })
    }

    /// Does the host match at least one allowed-domain pattern?
    pub fn domain_allowed(&self, host: &str) -> bool {
        match &self.allowed_domains {
            Some(set) => set.is_match(host),
            None => true,
        }
    }

    /// Does the full URL string match any disallow pattern?
    pub fn url_disallowed(&self, url: &str) -> bool {
        self.disallowed_urls.is_match(url)
    }

    pub fn matches_syntax(&self, url: &str) -> bool {
        self.url_pattern.is_match(url)
    }
}
