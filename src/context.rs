/// Application context and dependency injection
use crate::{
    channels::ChannelHub,
    config::ServerConfig,
    db,
    error::RelayResult,
    remote::{IssuerClient, VerifierClient},
    services::{
        IssuanceService, MessagingService, PresentationRequestService, PresentationService,
        RegistrationService,
    },
    store::{
        CompanyStore, CredentialStore, HolderAppStore, IssuerStore, PresentationRequestStore,
        UserStore, VerifierStore,
    },
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    // Entity stores
    pub companies: CompanyStore,
    pub issuers: IssuerStore,
    pub verifiers: VerifierStore,
    pub users: UserStore,
    pub holder_apps: HolderAppStore,
    pub credentials: CredentialStore,
    pub presentation_requests: PresentationRequestStore,
    // Workflows
    pub registration: RegistrationService,
    pub issuance: IssuanceService,
    pub presentations: PresentationService,
    pub request_service: PresentationRequestService,
    pub messaging: MessagingService,
    // Realtime channels
    pub channels: ChannelHub,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> RelayResult<Self> {
        config.validate()?;

        let options = db::DatabaseOptions {
            max_connections: config.storage.max_connections,
            ..Default::default()
        };
        let pool = db::create_pool(&config.storage.database_url, options).await?;
        db::run_migrations(&pool).await?;
        db::test_connection(&pool).await?;

        Self::with_pool(config, pool)
    }

    /// Wire the stores and workflows over an already migrated pool
    pub fn with_pool(config: ServerConfig, pool: SqlitePool) -> RelayResult<Self> {
        let issuer_client = IssuerClient::new(&config.remote)?;
        let verifier_client = VerifierClient::new(&config.remote)?;
        let channels = ChannelHub::new();

        let companies = CompanyStore::new(pool.clone());
        let issuers = IssuerStore::new(pool.clone());
        let verifiers = VerifierStore::new(pool.clone());
        let users = UserStore::new(pool.clone());
        let holder_apps = HolderAppStore::new(pool.clone());
        let credentials = CredentialStore::new(pool.clone());
        let presentation_requests = PresentationRequestStore::new(pool.clone());

        let registration = RegistrationService::new(
            companies.clone(),
            issuers.clone(),
            verifiers.clone(),
            issuer_client.clone(),
            verifier_client.clone(),
        );
        let issuance = IssuanceService::new(
            issuers.clone(),
            users.clone(),
            credentials.clone(),
            issuer_client,
        );
        let presentations = PresentationService::new(
            verifiers.clone(),
            issuers.clone(),
            users.clone(),
            credentials.clone(),
            presentation_requests.clone(),
            verifier_client.clone(),
            channels.clone(),
        );
        let request_service = PresentationRequestService::new(
            verifiers.clone(),
            holder_apps.clone(),
            presentation_requests.clone(),
            verifier_client.clone(),
        );
        let messaging = MessagingService::new(verifiers.clone(), verifier_client);

        Ok(Self {
            config: Arc::new(config),
            db: pool,
            companies,
            issuers,
            verifiers,
            users,
            holder_apps,
            credentials,
            presentation_requests,
            registration,
            issuance,
            presentations,
            request_service,
            messaging,
            channels,
        })
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
