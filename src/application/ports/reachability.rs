use async_trait::async_trait;

/// Pull-style network reachability check used when the host has no push
/// events for connectivity changes.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn is_reachable(&self) -> bool;
}
