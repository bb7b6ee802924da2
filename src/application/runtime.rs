//! Runtime facade.
//!
//! The facade is what the host page talks to. It accepts operations before
//! the page configuration is known, resolves the configuration at most once,
//! and forwards every operation to the resulting [`ConfiguredRuntime`].

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{self, BoxFuture, FutureExt, Shared};
use tokio::sync::watch;

use crate::application::callbacks::Callbacks;
use crate::application::command_queue::CommandQueue;
use crate::application::configured_runtime::ConfiguredRuntime;
use crate::application::correlation::FlowCompletion;
use crate::config::{ControlMode, RuntimeSettings};
use crate::domain::entitlements::{Entitlements, PageConfig};
use crate::domain::flow::{LoginRequest, SubscribeResponse};
use crate::domain::foundation::RuntimeError;
use crate::ports::{ActivityPorts, Fetcher, PageConfigResolver};

/// Collaborators a runtime is built from.
#[derive(Clone)]
pub struct RuntimeDeps {
    pub resolver: Arc<dyn PageConfigResolver>,
    pub fetcher: Arc<dyn Fetcher>,
    pub activities: Arc<dyn ActivityPorts>,
    pub settings: RuntimeSettings,
}

type ConfigureResult = Result<Arc<ConfiguredRuntime>, RuntimeError>;
type ConfigureFuture = Shared<BoxFuture<'static, ConfigureResult>>;

enum ConfigurationState {
    /// Nothing committed yet; `init` may still seed the page.
    Unconfigured { page_config: Option<PageConfig> },
    Configuring(ConfigureFuture),
    Configured(Arc<ConfiguredRuntime>),
}

/// The facade installed once per host page.
pub struct Runtime {
    deps: RuntimeDeps,
    callbacks: Arc<Callbacks>,
    state: Arc<Mutex<ConfigurationState>>,
    /// Outcome of configuration, for callers that must not commit.
    resolved: Arc<watch::Sender<Option<ConfigureResult>>>,
    commands: Arc<CommandQueue<Runtime>>,
}

impl Runtime {
    /// Creates a standalone runtime with its own command queue, already
    /// installed.
    pub fn new(deps: RuntimeDeps) -> Arc<Self> {
        let runtime = Self::with_queue(deps, Arc::new(CommandQueue::new()));
        runtime.commands.install(&runtime);
        runtime
    }

    /// Creates a runtime bound to an existing command queue without
    /// installing it.
    pub fn with_queue(deps: RuntimeDeps, commands: Arc<CommandQueue<Runtime>>) -> Arc<Self> {
        let (resolved, _) = watch::channel(None);
        Arc::new(Self {
            deps,
            callbacks: Arc::new(Callbacks::new()),
            state: Arc::new(Mutex::new(ConfigurationState::Unconfigured { page_config: None })),
            resolved: Arc::new(resolved),
            commands,
        })
    }

    fn lock(&self) -> MutexGuard<'_, ConfigurationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn settings(&self) -> &RuntimeSettings {
        &self.deps.settings
    }

    /// Seeds the page configuration from a product or publication id.
    ///
    /// # Errors
    ///
    /// `AlreadyConfigured` once configuration has been committed, or a
    /// validation error for a malformed id.
    pub fn init(&self, product_or_publication_id: &str) -> Result<(), RuntimeError> {
        let mut state = self.lock();
        match &mut *state {
            ConfigurationState::Unconfigured { page_config } => {
                *page_config = Some(PageConfig::new(product_or_publication_id, false)?);
                tracing::debug!(id = product_or_publication_id, "page configuration seeded");
                Ok(())
            }
            _ => {
                tracing::error!(id = product_or_publication_id, "init after configuration");
                Err(RuntimeError::AlreadyConfigured)
            }
        }
    }

    /// Returns the configured runtime.
    ///
    /// With `commit` the configuration is resolved now if it has not been
    /// already. Without it the call only waits for someone else to commit.
    /// Resolution runs at most once; its failure is returned to every caller.
    ///
    /// Inside a tokio runtime a committed resolution is driven by its own
    /// task, so passive waiters complete even if the committing caller drops
    /// the returned future. Outside one it advances only while polled.
    pub fn configured(&self, commit: bool) -> BoxFuture<'static, ConfigureResult> {
        let mut state = self.lock();
        match &mut *state {
            ConfigurationState::Configured(runtime) => future::ready(Ok(Arc::clone(runtime))).boxed(),
            ConfigurationState::Configuring(pending) => pending.clone().boxed(),
            ConfigurationState::Unconfigured { page_config } if commit => {
                tracing::debug!(seeded = page_config.is_some(), "committing configuration");
                let pending = self.resolve(page_config.take()).boxed().shared();
                *state = ConfigurationState::Configuring(pending.clone());
                if let Ok(handle) = tokio::runtime::Handle::try_current() {
                    handle.spawn(pending.clone().map(drop));
                }
                pending.boxed()
            }
            ConfigurationState::Unconfigured { .. } => {
                let mut resolved = self.resolved.subscribe();
                async move {
                    match resolved.wait_for(Option::is_some).await {
                        Ok(outcome) => outcome
                            .clone()
                            .unwrap_or_else(|| Err(RuntimeError::config_resolution("no outcome"))),
                        Err(_) => Err(RuntimeError::config_resolution("runtime dropped")),
                    }
                }
                .boxed()
            }
        }
    }

    fn resolve(&self, seeded: Option<PageConfig>) -> impl Future<Output = ConfigureResult> + Send + 'static {
        let deps = self.deps.clone();
        let callbacks = Arc::clone(&self.callbacks);
        let state = Arc::clone(&self.state);
        let resolved = Arc::clone(&self.resolved);

        async move {
            let outcome: ConfigureResult = async {
                let page_config = match seeded {
                    Some(page_config) => page_config,
                    None => deps.resolver.resolve_config().await?,
                };
                ConfiguredRuntime::new(
                    page_config,
                    deps.settings,
                    deps.fetcher,
                    deps.activities,
                    callbacks,
                )
            }
            .await;

            match &outcome {
                Ok(runtime) => {
                    *state.lock().unwrap_or_else(PoisonError::into_inner) =
                        ConfigurationState::Configured(Arc::clone(runtime));
                }
                Err(e) => tracing::warn!(error = %e, "configuration failed"),
            }
            resolved.send_replace(Some(outcome.clone()));
            outcome
        }
    }

    /// Checks entitlements and notifies the host, if the page is gated.
    pub async fn start(&self) -> Result<(), RuntimeError> {
        self.configured(true).await?.start().await
    }

    /// Starts only when the runtime is configured for automatic control.
    /// Returns whether it started.
    pub async fn start_if_needed(&self) -> Result<bool, RuntimeError> {
        match self.deps.settings.control {
            ControlMode::Auto => {
                self.start().await?;
                Ok(true)
            }
            ControlMode::Manual => {
                tracing::debug!("manual control, not starting");
                Ok(false)
            }
        }
    }

    pub async fn reset(&self) -> Result<(), RuntimeError> {
        self.configured(true).await?.reset();
        Ok(())
    }

    pub async fn get_entitlements(&self) -> Result<Entitlements, RuntimeError> {
        self.configured(true).await?.get_entitlements().await
    }

    pub async fn show_offers(&self) -> Result<FlowCompletion, RuntimeError> {
        self.configured(true).await?.show_offers()
    }

    pub async fn subscribe(&self, sku: &str) -> Result<FlowCompletion, RuntimeError> {
        self.configured(true).await?.subscribe(sku)
    }

    pub async fn link_account(&self) -> Result<FlowCompletion, RuntimeError> {
        self.configured(true).await?.link_account()
    }

    // Registering a callback never commits configuration; the callback
    // registry outlives it and is shared with the configured runtime.

    pub fn set_on_entitlements_response<F>(&self, callback: F)
    where
        F: Fn(Result<Entitlements, RuntimeError>) + Send + Sync + 'static,
    {
        self.callbacks.set_on_entitlements_response(callback);
    }

    pub fn set_on_subscribe_response<F>(&self, callback: F)
    where
        F: Fn(Result<SubscribeResponse, RuntimeError>) + Send + Sync + 'static,
    {
        self.callbacks.set_on_subscribe_response(callback);
    }

    pub fn set_on_login_request<F>(&self, callback: F)
    where
        F: Fn(LoginRequest) + Send + Sync + 'static,
    {
        self.callbacks.set_on_login_request(callback);
    }

    pub fn set_on_link_complete<F>(&self, callback: F)
    where
        F: Fn(Result<(), RuntimeError>) + Send + Sync + 'static,
    {
        self.callbacks.set_on_link_complete(callback);
    }

    pub fn callbacks(&self) -> &Callbacks {
        &self.callbacks
    }

    /// Queues a command behind those already pushed.
    pub fn push<F>(&self, command: F)
    where
        F: FnOnce(&Arc<Runtime>) + Send + 'static,
    {
        self.commands.push(command);
    }

    /// Resolves once every command pushed so far has run.
    pub fn when_ready(&self) -> impl Future<Output = ()> + Send + 'static {
        self.commands.when_ready()
    }
}
