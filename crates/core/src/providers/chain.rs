use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{debug, warn};

use super::error::{ChainExhausted, ProviderError};
use super::traits::Provider;
use crate::metrics::{CHAIN_EXHAUSTIONS, PROVIDER_ATTEMPTS};

/// Ordered providers for one capability, tried until one succeeds.
pub struct FallbackChain<P: ?Sized> {
    capability: &'static str,
    providers: Vec<Arc<P>>,
}

impl<P: ?Sized> Clone for FallbackChain<P> {
    fn clone(&self) -> Self {
        Self {
            capability: self.capability,
            providers: self.providers.clone(),
        }
    }
}

impl<P: Provider + ?Sized> FallbackChain<P> {
    pub fn new(capability: &'static str, providers: Vec<Arc<P>>) -> Self {
        Self {
            capability,
            providers,
        }
    }

    /// A chain that is exhausted before trying anything.
    pub fn empty(capability: &'static str) -> Self {
        Self::new(capability, Vec::new())
    }

    pub fn capability(&self) -> &'static str {
        self.capability
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Provider names in order.
    pub fn names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    /// Invoke `call` on each provider in order and return the first success.
    ///
    /// Individual failures are logged and counted, never returned. Only when
    /// every provider failed does the caller see a [`ChainExhausted`].
    pub async fn run<'r, T, F>(&self, mut call: F) -> Result<T, ChainExhausted>
    where
        F: FnMut(Arc<P>) -> BoxFuture<'r, Result<T, ProviderError>>,
    {
        let mut attempts = Vec::with_capacity(self.providers.len());
        let mut policy_violation = false;

        for provider in &self.providers {
            let name = provider.name().to_string();
            match call(Arc::clone(provider)).await {
                Ok(value) => {
                    debug!("{} provided by {}", self.capability, name);
                    PROVIDER_ATTEMPTS
                        .with_label_values(&[self.capability, &name, "success"])
                        .inc();
                    return Ok(value);
                }
                Err(e) => {
                    warn!("{} provider {} failed: {}", self.capability, name, e);
                    PROVIDER_ATTEMPTS
                        .with_label_values(&[self.capability, &name, "error"])
                        .inc();
                    policy_violation |= e.is_policy_violation();
                    attempts.push((name, e.to_string()));
                }
            }
        }

        CHAIN_EXHAUSTIONS
            .with_label_values(&[self.capability])
            .inc();
        Err(ChainExhausted {
            capability: self.capability,
            attempts,
            policy_violation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Echo {
        name: &'static str,
        fail: Option<ProviderError>,
        calls: AtomicUsize,
    }

    impl Echo {
        fn ok(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                fail: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(name: &'static str, err: ProviderError) -> Arc<Self> {
            Arc::new(Self {
                name,
                fail: Some(err),
                calls: AtomicUsize::new(0),
            })
        }

        async fn call(&self, input: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.fail {
                Some(err) => Err(err.clone()),
                None => Ok(format!("{}:{}", self.name, input)),
            }
        }
    }

    impl Provider for Echo {
        fn name(&self) -> &str {
            self.name
        }
    }

    #[tokio::test]
    async fn test_first_success_wins_and_later_providers_are_skipped() {
        let p1 = Echo::failing("p1", ProviderError::failed("p1", "503"));
        let p2 = Echo::ok("p2");
        let p3 = Echo::ok("p3");
        let chain = FallbackChain::new("test", vec![p1.clone(), p2.clone(), p3.clone()]);

        let input = "hello".to_string();
        let result = chain
            .run(|p| {
                let input = &input;
                async move { p.call(input).await }.boxed()
            })
            .await
            .unwrap();

        assert_eq!(result, "p2:hello");
        assert_eq!(p1.calls.load(Ordering::SeqCst), 1);
        assert_eq!(p2.calls.load(Ordering::SeqCst), 1);
        assert_eq!(p3.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_exhaustion_lists_every_attempt() {
        let chain = FallbackChain::new(
            "test",
            vec![
                Echo::failing("a", ProviderError::failed("a", "timeout")),
                Echo::failing("b", ProviderError::policy_violation("b", "refused")),
            ],
        );

        let err = chain
            .run(|p| async move { p.call("x").await }.boxed())
            .await
            .unwrap_err();

        assert_eq!(err.capability, "test");
        assert_eq!(err.attempts.len(), 2);
        assert_eq!(err.attempts[0].0, "a");
        assert_eq!(err.attempts[1].0, "b");
        assert!(err.policy_violation);
    }

    #[tokio::test]
    async fn test_empty_chain_is_exhausted_immediately() {
        let chain: FallbackChain<Echo> = FallbackChain::empty("test");
        assert!(chain.is_empty());

        let err = chain
            .run(|p| async move { p.call("x").await }.boxed())
            .await
            .unwrap_err();
        assert!(err.attempts.is_empty());
        assert!(!err.policy_violation);
    }

    #[test]
    fn test_names_preserve_order() {
        let chain = FallbackChain::new("test", vec![Echo::ok("x"), Echo::ok("y")]);
        assert_eq!(chain.names(), vec!["x", "y"]);
        assert_eq!(chain.len(), 2);
    }
}
