use std::sync::Arc;

use crate::types::Attributes;

/// The decision a webhook dispatcher asks for before calling a webhook.
///
/// `true` means the webhook must not be invoked for this request and is
/// treated as not matching it. Implementations are total: they never fail,
/// block, or mutate state.
pub trait WebhookExclusion: Send + Sync {
    fn should_skip(&self, attrs: &dyn Attributes) -> bool;
}

impl<T: WebhookExclusion + ?Sized> WebhookExclusion for Arc<T> {
    fn should_skip(&self, attrs: &dyn Attributes) -> bool {
        (**self).should_skip(attrs)
    }
}

impl<T: WebhookExclusion + ?Sized> WebhookExclusion for &T {
    fn should_skip(&self, attrs: &dyn Attributes) -> bool {
        (**self).should_skip(attrs)
    }
}
