//! HTTP record store client
//!
//! Implements the [`EncryptedRecordStore`] contract against the service's
//! admin API, going through [`SecureTransport`] so the execute call carries
//! the CSRF token and session credentials like every other admin mutation.

use std::sync::Arc;

use async_trait::async_trait;
use http::Method;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::crypto::event::SignedAuthorizationEvent;
use crate::crypto::pubkey::AdminPubkey;
use crate::store::{
    DecryptedFieldValueRecord, DecryptedUserRecord, EncryptedRecordStore,
    MigrationPrepareResponse, MigrationResult, StoreError,
};
use crate::transport::SecureTransport;

/// Path of the read-only snapshot RPC, relative to the API base
const PREPARE_PATH: &str = "admin/migration/prepare";

/// Path of the atomic execute RPC, relative to the API base
const EXECUTE_PATH: &str = "admin/migration/execute";

/// Request body of the execute RPC
#[derive(Debug, Serialize)]
struct ExecuteRequest {
    new_pubkey: AdminPubkey,
    users: Vec<DecryptedUserRecord>,
    field_values: Vec<DecryptedFieldValueRecord>,
    authorization: SignedAuthorizationEvent,
}

/// Error body the API uses for failed requests
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Record store client over the admin API
pub struct HttpRecordStore {
    transport: Arc<SecureTransport>,
}

impl HttpRecordStore {
    /// Create a store client over a transport
    pub fn new(transport: Arc<SecureTransport>) -> Self {
        Self { transport }
    }

    async fn error_from_response(response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => "no error detail provided".to_string(),
        };

        StoreError::Rpc { status, message }
    }
}

#[async_trait]
impl EncryptedRecordStore for HttpRecordStore {
    async fn prepare(&self) -> Result<MigrationPrepareResponse, StoreError> {
        let url = self
            .transport
            .api_url(PREPARE_PATH)
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        debug!("fetching migration snapshot from {}", url);

        let response = self
            .transport
            .send(self.transport.request(Method::GET, url))
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let snapshot: MigrationPrepareResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Response(e.to_string()))?;

        snapshot.validate()?;

        debug!(
            "snapshot loaded: {} users, {} field values",
            snapshot.user_count, snapshot.field_value_count
        );

        Ok(snapshot)
    }

    async fn execute(
        &self,
        new_pubkey: AdminPubkey,
        users: Vec<DecryptedUserRecord>,
        field_values: Vec<DecryptedFieldValueRecord>,
        authorization: SignedAuthorizationEvent,
    ) -> Result<MigrationResult, StoreError> {
        let url = self
            .transport
            .api_url(EXECUTE_PATH)
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        debug!(
            "submitting migration of {} users and {} field values",
            users.len(),
            field_values.len()
        );

        let body = ExecuteRequest {
            new_pubkey,
            users,
            field_values,
            authorization,
        };

        let response = self
            .transport
            .send(self.transport.request(Method::POST, url).json(&body))
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| StoreError::Response(e.to_string()))
    }
}
