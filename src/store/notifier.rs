use crate::action::Action;
use crate::error::{Result, StoreError};
use crate::listener::{Entry, Listener, Notify};
use crate::state::State;
use log::{debug, error, trace};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

/// One notification pass over a snapshot of a listener registry.
pub(crate) enum Delivery {
    State {
        entries: Vec<Arc<Entry<dyn Notify>>>,
        old: Arc<State>,
        new: Arc<State>,
        force: bool,
    },
    Action {
        entries: Vec<Arc<Entry<Listener<Action>>>>,
        action: Action,
    },
    /// Replay of the current value to a single subscription.
    Inform {
        entry: Arc<Entry<dyn Notify>>,
        state: Arc<State>,
    },
}

impl Delivery {
    pub fn run(self) {
        match self {
            Delivery::State {
                entries,
                old,
                new,
                force,
            } => {
                for entry in entries.iter().filter(|entry| entry.is_active()) {
                    isolate(entry.id(), || entry.target().notify(&old, &new, force));
                }
            }
            Delivery::Action { entries, action } => {
                for entry in entries.iter().filter(|entry| entry.is_active()) {
                    isolate(entry.id(), || entry.target().call(&action));
                }
            }
            Delivery::Inform { entry, state } => {
                if entry.is_active() {
                    isolate(entry.id(), || entry.target().inform(&state));
                }
            }
        }
    }
}

/// Run one listener, keeping its panic away from the rest of the pass.
fn isolate(id: u64, f: impl FnOnce()) {
    if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(f)) {
        error!("listener {} panicked: {}", id, panic_message(&*panic));
    }
}

pub(super) fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}

/// The notification thread of a background store.
pub(crate) struct Worker {
    sender: Mutex<Option<mpsc::Sender<Delivery>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

/// Where notification passes run.
pub(crate) enum Notifier {
    /// On the dispatching thread, before `dispatch` returns.
    Inline,
    /// On a dedicated thread, in the order the passes were produced.
    Background(Worker),
}

impl Notifier {
    pub fn background(name: String) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<Delivery>();
        let handle = thread::Builder::new()
            .name(name)
            .spawn(move || {
                for delivery in rx {
                    delivery.run();
                }
                trace!("notification thread stopped");
            })
            .map_err(StoreError::NotifierSpawn)?;
        Ok(Notifier::Background(Worker {
            sender: Mutex::new(Some(tx)),
            handle: Mutex::new(Some(handle)),
        }))
    }

    pub fn deliver(&self, delivery: Delivery) {
        let rejected = match self {
            Notifier::Inline => Some(delivery),
            Notifier::Background(worker) => {
                let sender = worker.sender.lock().unwrap_or_else(PoisonError::into_inner);
                let rejected = match sender.as_ref() {
                    Some(tx) => tx.send(delivery).err().map(|mpsc::SendError(delivery)| delivery),
                    None => Some(delivery),
                };
                rejected
            }
        };
        if let Some(delivery) = rejected {
            delivery.run();
        }
    }

    /// Stop the notification thread after it has run the passes already
    /// queued. Later passes run inline.
    ///
    /// Returns `true` if a running thread was stopped.
    pub fn close(&self) -> bool {
        let Notifier::Background(worker) = self else {
            return false;
        };
        let sender = worker.sender.lock().unwrap_or_else(PoisonError::into_inner).take();
        if sender.is_none() {
            return false;
        }
        drop(sender);

        let handle = worker.handle.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                debug!("notification thread closed from one of its listeners");
            } else if handle.join().is_err() {
                error!("notification thread panicked");
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::ListenerRegistry;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn panicking_listener_does_not_stop_the_pass() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry: ListenerRegistry<Listener<Action>> = ListenerRegistry::new();
        registry.register(
            0,
            Box::new(Listener::new(|_: &Action| panic!("listener failed"))),
        );
        let counter = calls.clone();
        registry.register(
            1,
            Box::new(Listener::new(move |_: &Action| {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
        );

        Notifier::Inline.deliver(Delivery::Action {
            entries: registry.snapshot(),
            action: Action::new("PING"),
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn inactive_entries_are_skipped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry: ListenerRegistry<Listener<Action>> = ListenerRegistry::new();
        let counter = calls.clone();
        let entry = registry.register(
            0,
            Box::new(Listener::new(move |_: &Action| {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
        );
        let snapshot = registry.snapshot();
        registry.remove(&entry);

        Notifier::Inline.deliver(Delivery::Action {
            entries: snapshot,
            action: Action::new("PING"),
        });

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn background_delivery_keeps_order() {
        let (tx, rx) = mpsc::channel();
        let registry: ListenerRegistry<Listener<Action>> = ListenerRegistry::new();
        let tx = std::sync::Mutex::new(tx);
        registry.register(
            0,
            Box::new(Listener::new(move |action: &Action| {
                let _ = tx.lock().unwrap().send(action.action_type().to_string());
            })),
        );

        let notifier = Notifier::background("notifier-test".to_string()).unwrap();
        for name in ["A", "B", "C"] {
            notifier.deliver(Delivery::Action {
                entries: registry.snapshot(),
                action: Action::new(name),
            });
        }

        let received: Vec<String> = (0..3)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        assert_eq!(received, vec!["A", "B", "C"]);
    }

    #[test]
    fn closed_worker_delivers_inline() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry: ListenerRegistry<Listener<Action>> = ListenerRegistry::new();
        let counter = calls.clone();
        registry.register(
            0,
            Box::new(Listener::new(move |_: &Action| {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
        );

        let notifier = Notifier::background("notifier-close-test".to_string()).unwrap();
        notifier.deliver(Delivery::Action {
            entries: registry.snapshot(),
            action: Action::new("QUEUED"),
        });
        assert!(notifier.close());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!notifier.close());

        notifier.deliver(Delivery::Action {
            entries: registry.snapshot(),
            action: Action::new("INLINE"),
        });
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!Notifier::Inline.close());
    }

    #[test]
    fn panic_messages() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42u8), "<non-string panic payload>");
    }
}
