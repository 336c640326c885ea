use std::sync::Arc;

use parking_lot::Mutex;
use workbench_graph::InteractionGraph;

use crate::ObjectScope;

/// Registries shared by one session, guarded together by a single lock.
#[derive(Debug)]
pub struct SessionState {
	pub graph: InteractionGraph,
	pub scope: ObjectScope,
}

pub(crate) type SharedState = Arc<Mutex<SessionState>>;

impl SessionState {
	pub(crate) fn shared(bench_event_buffer: usize) -> SharedState {
		Arc::new(Mutex::new(Self {
			graph: InteractionGraph::new(),
			scope: ObjectScope::new(bench_event_buffer),
		}))
	}
}
