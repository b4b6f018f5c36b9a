//! Depot injection for the outbound HTTP clients.

use std::sync::Arc;

use salvo::async_trait;
use sphere_core::error::CoreError;
use sphere_service::ai::AiClient;
use sphere_service::storage::StorageClient;

use crate::error::AppResult;

pub struct ClientsHandler {
    pub storage: Arc<StorageClient>,
    pub ai: Arc<AiClient>,
}

#[async_trait]
impl salvo::Handler for ClientsHandler {
    #[tracing::instrument(skip(self, _req, depot, _res, _ctrl))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(Arc::clone(&self.storage));
        depot.inject(Arc::clone(&self.ai));
    }
}

/// ## Summary
/// Retrieves the storage client from the depot.
///
/// ## Errors
/// Returns an error if the client is not found in the depot.
pub fn get_storage_from_depot(depot: &salvo::Depot) -> AppResult<Arc<StorageClient>> {
    depot.obtain::<Arc<StorageClient>>().cloned().map_err(|_err| {
        CoreError::InvariantViolation("Storage client not found in depot").into()
    })
}

/// ## Summary
/// Retrieves the AI client from the depot.
///
/// ## Errors
/// Returns an error if the client is not found in the depot.
pub fn get_ai_from_depot(depot: &salvo::Depot) -> AppResult<Arc<AiClient>> {
    depot
        .obtain::<Arc<AiClient>>()
        .cloned()
        .map_err(|_err| CoreError::InvariantViolation("AI client not found in depot").into())
}
