use std::sync::Arc;

use crate::access::{AccessPolicy, IdentityResolver, RedirectAdvisor, ResourceOwnership, TenantAccessEvaluator};
use crate::auth::{AuthError, JwtKeys};
use crate::config::AppConfig;
use crate::database::DocumentStore;
use crate::services::RecordService;

/// Shared handles for every request. Nothing in here is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub jwt: JwtKeys,
    pub identity: Arc<IdentityResolver<JwtKeys>>,
    pub evaluator: Arc<TenantAccessEvaluator<ResourceOwnership>>,
    pub policy: Arc<AccessPolicy>,
    pub redirects: Arc<RedirectAdvisor>,
    pub records: Arc<RecordService>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>) -> Result<Self, AuthError> {
        let jwt = JwtKeys::new(&config.security.jwt_secret, config.security.jwt_expiry_hours)?;

        Ok(Self {
            identity: Arc::new(IdentityResolver::new(jwt.clone(), store.clone())),
            evaluator: Arc::new(TenantAccessEvaluator::new(ResourceOwnership::new(store.clone()))),
            policy: Arc::new(AccessPolicy::school_defaults()),
            redirects: Arc::new(RedirectAdvisor::default()),
            records: Arc::new(RecordService::new(store.clone())),
            config: Arc::new(config),
            store,
            jwt,
        })
    }

    /// Replace the route policy, e.g. to widen or narrow the defaults
    pub fn with_policy(mut self, policy: AccessPolicy) -> Self {
        self.policy = Arc::new(policy);
        self
    }
}
