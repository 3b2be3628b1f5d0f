//! Services shared by every handler.

use std::sync::Arc;

use burnout_core::password::CredentialHasher;
use burnout_core::ports::{EvaluationStore, RevocationLedger, TokenIssuer, UserStore};
use burnout_core::{AccessGate, CredentialService, EvaluationService};

#[derive(Clone)]
pub struct Services {
    pub credentials: Arc<CredentialService>,
    pub evaluations: Arc<EvaluationService>,
    pub gate: AccessGate,
}

impl Services {
    pub fn new(
        users: Arc<dyn UserStore>,
        evaluations: Arc<dyn EvaluationStore>,
        ledger: Arc<dyn RevocationLedger>,
        tokens: Arc<dyn TokenIssuer>,
        hasher: CredentialHasher,
    ) -> Self {
        let gate = AccessGate::new(Arc::clone(&users), Arc::clone(&ledger));
        let credentials =
            CredentialService::new(Arc::clone(&users), Arc::clone(&ledger), tokens)
                .with_hasher(hasher);
        let evaluations = EvaluationService::new(users, evaluations, ledger);
        Self {
            credentials: Arc::new(credentials),
            evaluations: Arc::new(evaluations),
            gate,
        }
    }
}
