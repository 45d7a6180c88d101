use alloy::primitives::Address;
use std::collections::HashMap;

/// One deployment of the outcome ledger contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub address: Address,
    pub chain_id: u64,
    pub chain_name: String,
}

/// Known deployments keyed by chain id.
#[derive(Debug, Clone, Default)]
pub struct DeploymentRegistry {
    deployments: HashMap<u64, Deployment>,
}

impl DeploymentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, deployment: Deployment) {
        self.deployments.insert(deployment.chain_id, deployment);
    }

    pub fn with(mut self, deployment: Deployment) -> Self {
        self.register(deployment);
        self
    }

    pub fn deployment(&self, chain_id: u64) -> Option<&Deployment> {
        self.deployments.get(&chain_id)
    }

    /// A zero address entry means "not deployed on this chain".
    pub fn is_deployed(&self, chain_id: u64) -> bool {
        self.deployments
            .get(&chain_id)
            .is_some_and(|d| d.address != Address::ZERO)
    }
}
