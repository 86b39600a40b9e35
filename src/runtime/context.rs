//! Owns the process-wide caches explicitly, rather than relying on hidden
//! global singletons. A convenience default context is provided for callers
//! that don't need isolation between introspection sessions.

use lazy_static::lazy_static;

use crate::runtime::cache::IdentityCache;

pub struct IntrospectionContext {
    pub(crate) cache: IdentityCache,
}

impl Default for IntrospectionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl IntrospectionContext {
    pub fn new() -> Self {
        Self {
            cache: IdentityCache::new(),
        }
    }

    pub fn cache(&self) -> &IdentityCache {
        &self.cache
    }
}

lazy_static! {
    static ref DEFAULT_CONTEXT: IntrospectionContext = IntrospectionContext::new();
}

/// The shared default context used by callers that don't construct their own.
pub fn default_context() -> &'static IntrospectionContext {
    &DEFAULT_CONTEXT
}
