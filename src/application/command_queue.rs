//! Deferred command queue.
//!
//! The host page pushes commands before or after the runtime exists. Until a
//! target is installed they are only buffered; installing drains them in
//! push order, and later pushes are executed by the drain they trigger.
//!
//! Draining is a work-list loop: commands are popped one at a time with the
//! lock released while the command runs, so a running command may push more
//! commands. Those land at the back of the list and run in the same drain.
//!
//! Readiness is tracked by generation: every executed command bumps a
//! counter, and `when_ready` waits until the counter covers every command
//! pushed before the call and no drain is running.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::watch;

/// A unit of deferred work, run once against the installed target.
pub type Command<T> = Box<dyn FnOnce(&Arc<T>) + Send + 'static>;

struct QueueState<T> {
    pending: VecDeque<Command<T>>,
    target: Option<Weak<T>>,
    draining: bool,
    /// Total number of commands ever pushed.
    pushed: u64,
}

#[derive(Debug, Clone, Copy)]
struct Progress {
    executed: u64,
    draining: bool,
}

/// FIFO buffer of commands awaiting the runtime.
pub struct CommandQueue<T> {
    state: Mutex<QueueState<T>>,
    progress: watch::Sender<Progress>,
}

impl<T> CommandQueue<T> {
    /// Creates an empty queue with no target.
    pub fn new() -> Self {
        let (progress, _) = watch::channel(Progress {
            executed: 0,
            draining: false,
        });
        Self {
            state: Mutex::new(QueueState {
                pending: VecDeque::new(),
                target: None,
                draining: false,
                pushed: 0,
            }),
            progress,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        // Commands never run under the lock, so the state is consistent
        // even if a previous holder panicked.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a command.
    ///
    /// Before installation the command is only buffered. Afterwards it runs
    /// before this call returns, unless a drain is already in progress, in
    /// which case that drain picks it up.
    pub fn push<F>(&self, command: F)
    where
        F: FnOnce(&Arc<T>) + Send + 'static,
    {
        let should_drain = {
            let mut state = self.lock();
            state.pending.push_back(Box::new(command));
            state.pushed += 1;
            state.target.is_some() && !state.draining
        };
        if should_drain {
            self.drain();
        }
    }

    /// Installs the target and drains everything buffered so far.
    ///
    /// Only the first installation takes effect.
    pub fn install(&self, target: &Arc<T>) {
        {
            let mut state = self.lock();
            if state.target.is_some() {
                tracing::debug!("command queue already installed");
                return;
            }
            state.target = Some(Arc::downgrade(target));
            tracing::debug!(buffered = state.pending.len(), "command queue installed");
        }
        self.drain();
    }

    /// Whether a target has been installed.
    pub fn is_installed(&self) -> bool {
        self.lock().target.is_some()
    }

    /// Number of commands waiting to run.
    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    /// Runs queued commands until the list is observed empty.
    ///
    /// Re-entrant calls (a command pushing another command) return
    /// immediately; the outer loop runs the new command.
    pub fn drain(&self) {
        let target = {
            let mut state = self.lock();
            if state.draining {
                return;
            }
            let Some(target) = state.target.as_ref().and_then(Weak::upgrade) else {
                return;
            };
            self.set_draining(&mut state, true);
            target
        };

        let mut guard = DrainGuard {
            queue: self,
            armed: true,
        };
        let mut ran = 0usize;
        loop {
            let command = {
                let mut state = self.lock();
                match state.pending.pop_front() {
                    Some(command) => command,
                    None => {
                        // Cleared under the lock that saw the list empty: a
                        // concurrent push either landed before this or will
                        // start its own drain.
                        self.set_draining(&mut state, false);
                        guard.armed = false;
                        break;
                    }
                }
            };
            let _executed = ExecutedGuard {
                progress: &self.progress,
            };
            command(&target);
            ran += 1;
        }
        tracing::trace!(ran, "command queue drained");
    }

    /// Updates both draining flags while the state lock is held.
    fn set_draining(&self, state: &mut QueueState<T>, draining: bool) {
        state.draining = draining;
        self.progress.send_modify(|p| p.draining = draining);
    }

    /// Resolves once every command pushed before this call has run.
    ///
    /// May be called any number of times; each call covers the commands
    /// enqueued up to that point, including commands they push while the
    /// same drain is running.
    pub fn when_ready(&self) -> impl Future<Output = ()> + Send + 'static {
        let target = self.lock().pushed;
        let mut progress = self.progress.subscribe();
        async move {
            // The sender lives as long as the queue; a dropped queue has
            // nothing left to wait for.
            let _ = progress
                .wait_for(|p| p.executed >= target && !p.draining)
                .await;
        }
    }
}

impl<T> Default for CommandQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts a popped command as executed, even if it panics.
struct ExecutedGuard<'a> {
    progress: &'a watch::Sender<Progress>,
}

impl Drop for ExecutedGuard<'_> {
    fn drop(&mut self) {
        self.progress.send_modify(|p| p.executed += 1);
    }
}

/// Ends a drain that unwound out of a panicking command.
struct DrainGuard<'a, T> {
    queue: &'a CommandQueue<T>,
    armed: bool,
}

impl<T> Drop for DrainGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.queue.lock();
            self.queue.set_draining(&mut state, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    struct Target {
        log: StdMutex<String>,
        queue: Arc<CommandQueue<Target>>,
    }

    impl Target {
        fn new(queue: Arc<CommandQueue<Target>>) -> Arc<Self> {
            Arc::new(Self {
                log: StdMutex::new(String::new()),
                queue,
            })
        }

        fn append(&self, s: &str) {
            self.log.lock().unwrap().push_str(s);
        }

        fn log(&self) -> String {
            self.log.lock().unwrap().clone()
        }
    }

    fn append(s: &'static str) -> impl FnOnce(&Arc<Target>) + Send + 'static {
        move |t: &Arc<Target>| t.append(s)
    }

    #[test]
    fn commands_wait_for_install() {
        let queue = Arc::new(CommandQueue::new());
        let target = Target::new(queue.clone());

        queue.push(append("1"));
        queue.push(append("2"));
        assert_eq!(target.log(), "");
        assert_eq!(queue.pending_len(), 2);

        queue.install(&target);
        assert_eq!(target.log(), "12");
        assert_eq!(queue.pending_len(), 0);
    }

    #[test]
    fn pushes_after_install_run_in_order() {
        let queue = Arc::new(CommandQueue::new());
        let target = Target::new(queue.clone());
        queue.push(append("1"));
        queue.install(&target);
        queue.push(append("2"));
        queue.push(append("3"));
        assert_eq!(target.log(), "123");
    }

    #[test]
    fn recursive_pushes_run_in_fifo_order() {
        let queue = Arc::new(CommandQueue::new());
        let target = Target::new(queue.clone());

        queue.push(|t: &Arc<Target>| {
            t.append("1");
            t.queue.push(|t: &Arc<Target>| {
                t.append("2");
                t.queue.push(append("3"));
            });
        });
        queue.push(append("a"));
        queue.install(&target);

        // "a" was queued before the nested pushes happened.
        assert_eq!(target.log(), "1a23");
    }

    #[test]
    fn second_install_is_ignored() {
        let queue = Arc::new(CommandQueue::new());
        let first = Target::new(queue.clone());
        let second = Target::new(queue.clone());
        queue.install(&first);
        queue.install(&second);
        queue.push(append("x"));
        assert_eq!(first.log(), "x");
        assert_eq!(second.log(), "");
    }

    #[tokio::test]
    async fn when_ready_resolves_after_recursive_commands() {
        let queue = Arc::new(CommandQueue::new());
        let target = Target::new(queue.clone());
        queue.install(&target);

        queue.push(|t: &Arc<Target>| {
            t.append("1");
            t.queue.push(|t: &Arc<Target>| {
                t.append("2");
                t.queue.push(append("3"));
            });
        });

        queue.when_ready().await;
        assert_eq!(target.log(), "123");
    }

    #[tokio::test]
    async fn when_ready_waits_for_install() {
        let queue = Arc::new(CommandQueue::new());
        let target = Target::new(queue.clone());
        queue.push(append("1"));

        let ready = queue.when_ready();
        tokio::pin!(ready);
        assert!(futures::poll!(&mut ready).is_pending());

        queue.install(&target);
        ready.await;
        assert_eq!(target.log(), "1");
    }

    #[tokio::test]
    async fn when_ready_is_reusable() {
        let queue = Arc::new(CommandQueue::new());
        let target = Target::new(queue.clone());
        queue.install(&target);

        queue.when_ready().await;
        queue.push(append("5"));
        queue.when_ready().await;
        queue.push(append("6"));
        queue.when_ready().await;
        assert_eq!(target.log(), "56");
    }

    #[tokio::test]
    async fn panicking_command_does_not_wedge_the_queue() {
        let queue = Arc::new(CommandQueue::new());
        let target = Target::new(queue.clone());
        queue.install(&target);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            queue.push(|_: &Arc<Target>| panic!("boom"));
        }));
        assert!(result.is_err());

        queue.push(append("ok"));
        assert_eq!(target.log(), "ok");

        let ready = tokio::time::timeout(std::time::Duration::from_secs(2), queue.when_ready());
        assert!(ready.await.is_ok());
    }

    #[test]
    fn concurrent_pushes_are_never_stranded() {
        for _ in 0..2_000 {
            let queue = Arc::new(CommandQueue::new());
            let target = Target::new(queue.clone());
            queue.install(&target);

            let other = queue.clone();
            let handle = std::thread::spawn(move || other.push(append("b")));
            queue.push(append("a"));
            handle.join().unwrap();

            assert_eq!(queue.pending_len(), 0);
            assert_eq!(target.log().len(), 2);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn when_ready_resolves_after_pushes_from_other_threads() {
        let queue = Arc::new(CommandQueue::new());
        let target = Target::new(queue.clone());
        queue.install(&target);

        let pushers: Vec<_> = (0..4)
            .map(|_| {
                let queue = queue.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        queue.push(append("x"));
                    }
                })
            })
            .collect();
        for pusher in pushers {
            pusher.join().unwrap();
        }

        let ready = tokio::time::timeout(std::time::Duration::from_secs(2), queue.when_ready());
        assert!(ready.await.is_ok());
        assert_eq!(target.log().len(), 200);
    }
}
