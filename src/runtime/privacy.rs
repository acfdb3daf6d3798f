//! Privacy evaluation. Rules return a tri-state decision; the first non-`Pass`
//! decision wins and an exhausted rule list denies.

use crate::runtime::Ent;
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
    Pass,
}

/// Opaque per-request identity. Rules downcast it through [`ViewerContext::as_any`].
pub trait ViewerContext: Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Send + Sync> ViewerContext for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub type Vc = Arc<dyn ViewerContext>;

#[async_trait]
pub trait PrivacyRule: Send + Sync {
    async fn evaluate(&self, vc: &dyn ViewerContext, ent: &Ent) -> Decision;
}

pub struct AlwaysAllowRule;

#[async_trait]
impl PrivacyRule for AlwaysAllowRule {
    async fn evaluate(&self, _vc: &dyn ViewerContext, _ent: &Ent) -> Decision {
        Decision::Allow
    }
}

pub struct AlwaysDenyRule;

#[async_trait]
impl PrivacyRule for AlwaysDenyRule {
    async fn evaluate(&self, _vc: &dyn ViewerContext, _ent: &Ent) -> Decision {
        Decision::Deny
    }
}

/// Run the rules in order until one decides.
pub async fn evaluate(rules: &[Arc<dyn PrivacyRule>], vc: &dyn ViewerContext, ent: &Ent) -> Decision {
    for rule in rules {
        match rule.evaluate(vc, ent).await {
            Decision::Pass => continue,
            decided => return decided,
        }
    }
    Decision::Deny
}
