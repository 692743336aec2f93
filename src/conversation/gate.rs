use async_trait::async_trait;

/// Asked before every model call; `false` ends the run.
///
/// Has no timeout: an unanswered gate blocks the loop.
#[async_trait]
pub trait ConfirmationGate: Send + Sync {
    async fn confirm(&self, provider: &str) -> bool;
}

#[async_trait]
impl<F> ConfirmationGate for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    async fn confirm(&self, provider: &str) -> bool {
        self(provider)
    }
}

/// Gate that always proceeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysProceed;

#[async_trait]
impl ConfirmationGate for AlwaysProceed {
    async fn confirm(&self, _provider: &str) -> bool {
        true
    }
}
