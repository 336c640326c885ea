//! Object storage and call execution for [`LocalTarget`](super::LocalTarget).

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use workbench_invocation::{InvocationKind, ObjectHandle, ObjectId, RemoteValue};
use workbench_worker::catch_panic;

use super::{ClassTable, LocalArg, Returned};
use crate::target::{MarshalledArg, MarshalledCall, RawCompletion, RemoteFailure};

/// Type name of the holder object wrapping constructor results.
pub const RESULT_HOLDER_TYPE: &str = "__ResultHolder";

struct LocalObject {
	type_name: String,
	state: Value,
}

pub(super) struct Heap {
	classes: Arc<ClassTable>,
	objects: HashMap<ObjectId, LocalObject>,
	next_id: u64,
}

impl Heap {
	pub(super) fn new(classes: Arc<ClassTable>) -> Self {
		Self {
			classes,
			objects: HashMap::new(),
			next_id: 1,
		}
	}

	pub(super) fn execute(&mut self, call: MarshalledCall) -> RawCompletion {
		let args = self.lower_args(&call.args)?;
		match call.kind {
			InvocationKind::Constructor => self.construct(&call.type_name, &args),
			InvocationKind::Method => {
				let receiver = call.receiver.ok_or_else(|| RemoteFailure::Marshalling("method call without a receiver".into()))?;
				let method = call.method.ok_or_else(|| RemoteFailure::Marshalling("method call without a method name".into()))?;
				self.call_method(receiver.id(), &method, &args)
			}
		}
	}

	fn lower_args(&self, args: &[MarshalledArg]) -> Result<Vec<LocalArg>, RemoteFailure> {
		args.iter()
			.map(|arg| match arg {
				MarshalledArg::Source(text) => Ok(LocalArg::Text(text.clone())),
				MarshalledArg::Object(handle) => {
					let object = self
						.objects
						.get(&handle.id())
						.ok_or_else(|| RemoteFailure::Marshalling(format!("object {} does not exist in this target", handle.id())))?;
					Ok(LocalArg::Object {
						id: handle.id(),
						state: object.state.clone(),
					})
				}
			})
			.collect()
	}

	fn construct(&mut self, type_name: &str, args: &[LocalArg]) -> RawCompletion {
		let ctor = self
			.classes
			.constructors
			.get(type_name)
			.cloned()
			.ok_or_else(|| RemoteFailure::Marshalling(format!("no constructor for {type_name}")))?;
		let state = run_user_code(type_name, "new", || (*ctor)(args))?;
		let instance = self.alloc(type_name, state);
		let holder = ObjectHandle::new(self.fresh_id(), RESULT_HOLDER_TYPE).with_fields(vec![RemoteValue::Object(instance)]);
		Ok(RemoteValue::Object(holder))
	}

	fn call_method(&mut self, receiver: ObjectId, method: &str, args: &[LocalArg]) -> RawCompletion {
		let type_name = self
			.objects
			.get(&receiver)
			.map(|object| object.type_name.clone())
			.ok_or_else(|| RemoteFailure::Marshalling(format!("object {receiver} does not exist in this target")))?;
		let body = self
			.classes
			.methods
			.get(&(type_name.clone(), method.to_owned()))
			.cloned()
			.ok_or_else(|| RemoteFailure::Marshalling(format!("{type_name} has no method {method}")))?;

		let returned = {
			let Some(object) = self.objects.get_mut(&receiver) else {
				return Err(RemoteFailure::Marshalling(format!("object {receiver} does not exist in this target")));
			};
			run_user_code(&type_name, method, || (*body)(&mut object.state, args))?
		};

		Ok(match returned {
			Returned::Void => RemoteValue::Null,
			Returned::Value(value) => RemoteValue::Primitive(display(&value)),
			Returned::New { type_name, state } => RemoteValue::Object(self.alloc(&type_name, state)),
		})
	}

	fn alloc(&mut self, type_name: &str, state: Value) -> ObjectHandle {
		let id = self.fresh_id();
		self.objects.insert(
			id,
			LocalObject {
				type_name: type_name.to_owned(),
				state,
			},
		);
		self.handle(id, type_name)
	}

	/// Exposes the state's top-level values as fields, in the order the class
	/// code inserted them.
	fn handle(&self, id: ObjectId, type_name: &str) -> ObjectHandle {
		let fields = match self.objects.get(&id).map(|object| &object.state) {
			Some(Value::Object(map)) => map.values().map(|v| RemoteValue::Primitive(display(v))).collect(),
			_ => Vec::new(),
		};
		ObjectHandle::new(id, type_name).with_fields(fields)
	}

	fn fresh_id(&mut self) -> ObjectId {
		let id = ObjectId(self.next_id);
		self.next_id += 1;
		id
	}

	#[cfg(test)]
	pub(super) fn state_of(&self, id: ObjectId) -> Option<&Value> {
		self.objects.get(&id).map(|object| &object.state)
	}
}

fn run_user_code<T>(type_name: &str, member: &str, f: impl FnOnce() -> Result<T, String>) -> Result<T, RemoteFailure> {
	match catch_panic(f) {
		Ok(Ok(value)) => Ok(value),
		Ok(Err(msg)) => Err(RemoteFailure::Exception(msg)),
		Err(panic) => Err(RemoteFailure::Exception(format!("{type_name}.{member} panicked: {panic}"))),
	}
}

/// Display text of a JSON value; strings lose their quotes.
pub(super) fn display(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}
