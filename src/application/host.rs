//! Host page context.
//!
//! A `HostPage` stands for one embedding page. It owns the command buffer the
//! page pushes into and the slot holding the page's only runtime. Pass it
//! explicitly to whatever needs "the" runtime of a page.

use std::sync::{Arc, OnceLock};

use crate::application::command_queue::CommandQueue;
use crate::application::runtime::{Runtime, RuntimeDeps};
use crate::domain::foundation::HostId;

pub struct HostPage {
    id: HostId,
    commands: Arc<CommandQueue<Runtime>>,
    runtime: OnceLock<Arc<Runtime>>,
}

impl HostPage {
    pub fn new() -> Self {
        Self {
            id: HostId::new(),
            commands: Arc::new(CommandQueue::new()),
            runtime: OnceLock::new(),
        }
    }

    pub fn id(&self) -> HostId {
        self.id
    }

    /// Pushes a command; it runs once a runtime is installed.
    pub fn push<F>(&self, command: F)
    where
        F: FnOnce(&Arc<Runtime>) + Send + 'static,
    {
        self.commands.push(command);
    }

    /// The installed runtime, if any.
    pub fn runtime(&self) -> Option<Arc<Runtime>> {
        self.runtime.get().cloned()
    }

    pub fn pending_commands(&self) -> usize {
        self.commands.pending_len()
    }
}

impl Default for HostPage {
    fn default() -> Self {
        Self::new()
    }
}

/// Installs the runtime for `host`, or returns the one already installed.
///
/// The first installation drains the commands pushed so far before
/// returning. Later calls ignore `deps`.
pub fn install_runtime(host: &HostPage, deps: RuntimeDeps) -> Arc<Runtime> {
    let mut created = false;
    let runtime = host
        .runtime
        .get_or_init(|| {
            created = true;
            Runtime::with_queue(deps, Arc::clone(&host.commands))
        })
        .clone();

    if created {
        tracing::info!(host_id = %host.id, buffered = host.commands.pending_len(), "runtime installed");
        host.commands.install(&runtime);
    } else {
        tracing::debug!(host_id = %host.id, "runtime already installed");
    }
    runtime
}
