//! Interaction graph for recorded invocations.
//!
//! Every constructor or method call made during a session can be recorded as a
//! [`RecordedCall`]. Each argument is stored either as literal text or as a
//! reference to the earlier call whose result it names, so the graph can later
//! be replayed as program text via [`render_script`].

mod call;
mod graph;
mod resolve;
mod script;

pub use call::{CallArgument, CallId, CallKind, RecordedCall};
pub use graph::{GraphError, InteractionGraph};
pub use resolve::{BindingTable, resolve_argument, resolve_arguments};
pub use script::render_script;
