//! Typed client for the PFEHub HTTP API.
//!
//! [`api::ApiClient`] is the generic request layer (bearer token, request
//! ids, `{data}` envelope, error decoding). The [`services`] wrap it per
//! resource, and the [`controllers`] drive the project and defense
//! workflows on top of the services: local guard checks with
//! `pfehub-core`, optimistic updates, rollback and refetch on failure.

pub mod api;
pub mod config;
pub mod controllers;
pub mod error;
pub mod gateway;
pub mod services;
pub mod session;

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::services::{AdminService, AuthService, DefenseService, ProjectService};
use crate::session::{Session, TokenStore};

/// Entry point bundling one [`ApiClient`] and its per-resource services.
#[derive(Clone)]
pub struct PfeHubClient {
    api: ApiClient,
}

impl PfeHubClient {
    /// Open the session stored in `config.token_file` and build the client.
    pub async fn connect(config: &ClientConfig) -> ClientResult<Self> {
        let session = Session::open(TokenStore::new(&config.token_file)).await?;
        let api = ApiClient::new(config, session)?;
        Ok(Self { api })
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.api.clone())
    }

    pub fn projects(&self) -> ProjectService {
        ProjectService::new(self.api.clone())
    }

    pub fn defenses(&self) -> DefenseService {
        DefenseService::new(self.api.clone())
    }

    pub fn admin(&self) -> AdminService {
        AdminService::new(self.api.clone())
    }
}
