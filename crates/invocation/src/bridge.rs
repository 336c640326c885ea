//! Blocking bridge over asynchronous outcome delivery.
//!
//! A call creates one [`OutcomeSlot`] (the watcher side) and one
//! [`OutcomeWait`] (the waiter side) joined by a oneshot channel. The first
//! delivery fills the slot and wakes the waiter; later deliveries are rejected.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use workbench_worker::TaskClass;

use crate::{Delivery, InvocationDescriptor, InvocationError, InvocationOutcome, Invoke, RemoteValue, ResultWatcher};

/// Watcher side of a single-outcome handoff.
#[derive(Debug)]
pub struct OutcomeSlot {
	tx: Mutex<Option<oneshot::Sender<InvocationOutcome>>>,
}

/// Waiter side of a single-outcome handoff.
#[derive(Debug)]
pub struct OutcomeWait {
	rx: oneshot::Receiver<InvocationOutcome>,
}

/// Creates a connected slot/wait pair.
pub fn outcome_slot() -> (Arc<OutcomeSlot>, OutcomeWait) {
	let (tx, rx) = oneshot::channel();
	(Arc::new(OutcomeSlot { tx: Mutex::new(Some(tx)) }), OutcomeWait { rx })
}

impl OutcomeSlot {
	/// Stores `outcome` if the slot is still empty and wakes the waiter.
	pub fn deliver(&self, outcome: InvocationOutcome) -> Delivery {
		let Some(tx) = self.tx.lock().take() else {
			warn!(?outcome, "outcome delivered twice, keeping the first");
			return Delivery::Rejected;
		};
		if tx.send(outcome).is_err() {
			debug!("waiter gone before outcome arrived");
		}
		Delivery::Accepted
	}

	/// Returns true once an outcome has been delivered.
	pub fn is_delivered(&self) -> bool {
		self.tx.lock().is_none()
	}
}

impl ResultWatcher for OutcomeSlot {
	fn put_result(&self, value: RemoteValue, binding: Option<String>) -> Delivery {
		self.deliver(InvocationOutcome::Success { value, binding })
	}

	fn put_error(&self, error: InvocationError) -> Delivery {
		self.deliver(InvocationOutcome::Failure(error))
	}
}

impl OutcomeWait {
	/// Blocks the current thread until the outcome arrives.
	///
	/// A slot dropped without delivery means the invocation was abandoned by
	/// the target side and yields [`InvocationError::TargetTerminated`].
	///
	/// # Panics
	///
	/// Panics when called from inside an async runtime; use [`Self::wait_async`]
	/// there.
	pub fn wait(self) -> InvocationOutcome {
		self.rx.blocking_recv().unwrap_or(InvocationOutcome::Failure(InvocationError::TargetTerminated))
	}

	/// Waits for the outcome without blocking the thread.
	pub async fn wait_async(self) -> InvocationOutcome {
		self.rx.await.unwrap_or(InvocationOutcome::Failure(InvocationError::TargetTerminated))
	}
}

/// Turns an [`Invoke`] implementation into synchronous calls.
#[derive(Debug)]
pub struct CompletionBridge<I> {
	invoker: Arc<I>,
	timeout: Option<Duration>,
}

impl<I: Invoke + 'static> CompletionBridge<I> {
	/// Creates a bridge that waits indefinitely.
	pub fn new(invoker: I) -> Self {
		Self {
			invoker: Arc::new(invoker),
			timeout: None,
		}
	}

	/// Fails calls with [`InvocationError::TimedOut`] after `timeout`.
	///
	/// On expiry the invocation is first abandoned with the invoker, so a late
	/// answer is dropped rather than applied.
	#[must_use]
	pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn invoker(&self) -> &I {
		&self.invoker
	}

	/// Runs one invocation and blocks until its outcome is available.
	///
	/// # Panics
	///
	/// Panics when called from inside an async runtime; use
	/// [`Self::call_async`] there.
	pub fn call(&self, descriptor: InvocationDescriptor) -> InvocationOutcome {
		let (wait, watchdog) = self.start(descriptor);
		let outcome = wait.wait();
		if let Some(watchdog) = watchdog {
			watchdog.abort();
		}
		outcome
	}

	/// Runs one invocation and awaits its outcome.
	pub async fn call_async(&self, descriptor: InvocationDescriptor) -> InvocationOutcome {
		let (wait, watchdog) = self.start(descriptor);
		let outcome = wait.wait_async().await;
		if let Some(watchdog) = watchdog {
			watchdog.abort();
		}
		outcome
	}

	fn start(&self, descriptor: InvocationDescriptor) -> (OutcomeWait, Option<tokio::task::JoinHandle<()>>) {
		let (slot, wait) = outcome_slot();
		debug!(call = %descriptor.describe(), "bridge.call");
		self.invoker.invoke(descriptor, slot.clone());
		// Armed after `invoke` so the invoker already tracks the call.
		let watchdog = self.timeout.map(|timeout| arm_watchdog(Arc::downgrade(&self.invoker), Arc::downgrade(&slot), timeout));
		(wait, watchdog)
	}
}

fn arm_watchdog<I: Invoke + 'static>(invoker: Weak<I>, slot: Weak<OutcomeSlot>, timeout: Duration) -> tokio::task::JoinHandle<()> {
	workbench_worker::spawn(TaskClass::Watchdog, async move {
		tokio::time::sleep(timeout).await;
		let Some(slot) = slot.upgrade() else {
			return;
		};
		if slot.is_delivered() {
			return;
		}
		let watcher: Arc<dyn ResultWatcher> = slot;
		if let Some(invoker) = invoker.upgrade()
			&& !invoker.abandon(&watcher)
		{
			debug!(?timeout, "timeout raced a completion already being delivered");
			return;
		}
		if watcher.put_error(InvocationError::TimedOut(timeout)) == Delivery::Accepted {
			warn!(?timeout, "invocation timed out");
		}
	})
}
