use std::fmt;

/// Stable index of a recorded call inside its [`InteractionGraph`](crate::InteractionGraph).
///
/// Ids stay valid after the call's binding name is displaced; they are only
/// invalidated by a graph reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallId(pub(crate) usize);

impl CallId {
	pub const fn index(self) -> usize {
		self.0
	}
}

impl fmt::Display for CallId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "call#{}", self.0)
	}
}

/// Provenance of one argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CallArgument {
	/// Source text that named no recorded call when it was resolved.
	Literal(String),
	/// The result of an earlier recorded call.
	Reference(CallId),
}

/// What kind of invocation a call node records.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CallKind {
	Constructor,
	Method {
		/// Call that produced the receiving object.
		receiver: CallId,
		method: String,
	},
}

/// One node of the interaction graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
	pub(crate) id: CallId,
	pub(crate) binding: String,
	pub(crate) bound: bool,
	pub(crate) type_name: String,
	pub(crate) kind: CallKind,
	pub(crate) args: Vec<CallArgument>,
	pub(crate) children: Vec<CallId>,
}

impl RecordedCall {
	pub fn id(&self) -> CallId {
		self.id
	}

	/// Unique name of this call.
	///
	/// Method calls whose result was not bound get a generated
	/// `receiver.method#n` name that can never be matched by argument text.
	pub fn binding(&self) -> &str {
		&self.binding
	}

	/// True when the call was registered under its binding name.
	pub fn is_bound(&self) -> bool {
		self.bound
	}

	/// Declaring type of the constructor or method.
	pub fn type_name(&self) -> &str {
		&self.type_name
	}

	pub fn kind(&self) -> &CallKind {
		&self.kind
	}

	pub fn args(&self) -> &[CallArgument] {
		&self.args
	}

	/// Receiver call and method name, for method calls.
	pub fn receiver(&self) -> Option<(CallId, &str)> {
		match &self.kind {
			CallKind::Constructor => None,
			CallKind::Method { receiver, method } => Some((*receiver, method)),
		}
	}

	/// Method calls made on this call's result, in recording order.
	pub fn children(&self) -> &[CallId] {
		&self.children
	}
}
