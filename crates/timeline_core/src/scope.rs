/// Extra record filter layered on top of the domain scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct QueryFilter {
    pub exclude_replies: bool,
    pub exclude_reblogs: bool,
    pub only_media: bool,
    pub exclude_deleted: bool,
}

impl QueryFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Immutable query scope: a remote domain (possibly empty) plus an optional filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ScopeFilter {
    domain: String,
    filter: Option<QueryFilter>,
}

impl ScopeFilter {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            filter: None,
        }
    }

    /// Scope for the instance behind `base_url`, keyed by its host.
    pub fn for_instance(base_url: &str) -> Result<Self, url::ParseError> {
        let parsed = url::Url::parse(base_url.trim())?;
        let host = parsed.host_str().unwrap_or_default();
        Ok(Self::new(host))
    }

    pub fn with_filter(mut self, filter: QueryFilter) -> Self {
        self.filter = (!filter.is_empty()).then_some(filter);
        self
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn filter(&self) -> Option<&QueryFilter> {
        self.filter.as_ref()
    }

    pub fn matches_domain(&self, domain: &str) -> bool {
        self.domain == domain
    }
}

/// Holder of the active scope. Replacing it with an equal value is not a change.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScopeKey {
    current: ScopeFilter,
}

impl ScopeKey {
    pub fn new(initial: ScopeFilter) -> Self {
        Self { current: initial }
    }

    pub fn current(&self) -> &ScopeFilter {
        &self.current
    }

    /// Returns the new scope when it differs from the active one.
    pub fn replace(&mut self, next: ScopeFilter) -> Option<&ScopeFilter> {
        if next == self.current {
            return None;
        }
        self.current = next;
        Some(&self.current)
    }
}
