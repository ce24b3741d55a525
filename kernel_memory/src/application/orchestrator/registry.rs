// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Core
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! Handler registry with a sealed flag (spec.md §9 "global mutable
//! orchestrator state"): handlers register during setup, `seal()` is
//! called once dispatch begins, and registration after that point is
//! rejected rather than silently racing the dispatch loop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use kernel_memory_domain::error::KmError;
use kernel_memory_domain::repositories::Handler;

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn Handler>>>,
    sealed: AtomicBool,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under its own [`Handler::name`]. Returns
    /// [`KmError::Internal`] if the registry has already been sealed.
    pub fn register(&self, handler: Arc<dyn Handler>) -> Result<(), KmError> {
        if self.sealed.load(Ordering::Acquire) {
            return Err(KmError::internal(format!(
                "handler registry is sealed; cannot register '{}' after dispatch has started",
                handler.name()
            )));
        }
        self.handlers.write().expect("registry lock poisoned").insert(handler.name().to_string(), handler);
        Ok(())
    }

    /// Prevents further registration. Idempotent.
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    pub fn resolve(&self, step: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.read().expect("registry lock poisoned").get(step).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_memory_domain::aggregates::PipelineState;
    use kernel_memory_domain::repositories::HandlerOutcome;
    use async_trait::async_trait;

    struct NoopHandler;

    #[async_trait]
    impl Handler for NoopHandler {
        fn name(&self) -> &str {
            "noop"
        }
        async fn process(&self, state: PipelineState) -> Result<(HandlerOutcome, PipelineState), KmError> {
            Ok((HandlerOutcome::Success, state))
        }
    }

    #[test]
    fn registration_after_seal_is_rejected() {
        let registry = HandlerRegistry::new();
        registry.register(Arc::new(NoopHandler)).unwrap();
        registry.seal();
        assert!(registry.register(Arc::new(NoopHandler)).is_err());
    }

    #[test]
    fn resolves_by_registered_name() {
        let registry = HandlerRegistry::new();
        registry.register(Arc::new(NoopHandler)).unwrap();
        assert!(registry.resolve("noop").is_some());
        assert!(registry.resolve("missing").is_none());
    }
}
