use serde::{Deserialize, Serialize};

use crate::types::identifiers::MarketplaceId;

/// Per-call request data the targeting predicates are evaluated against.
/// Built fresh for every selection and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// `None` for anonymous customers.
    pub customer_id: Option<String>,
    pub marketplace_id: MarketplaceId,
}

impl RequestContext {
    /// An empty customer id is the same as no customer id.
    pub fn new(customer_id: Option<&str>, marketplace_id: MarketplaceId) -> Self {
        let customer_id = customer_id
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        Self {
            customer_id,
            marketplace_id,
        }
    }

    pub fn is_recognized(&self) -> bool {
        self.customer_id.is_some()
    }
}
