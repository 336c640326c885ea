/// Whether an invocation constructs a new object or calls a method on one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InvocationKind {
	Constructor,
	Method,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
enum Callee {
	Constructor,
	Method {
		/// Binding name of the object the method runs on.
		receiver: String,
		name: String,
	},
}

/// Immutable description of one constructor or method invocation.
///
/// Arguments are kept as unevaluated source text. Turning them into live
/// values (or into graph references) is the job of whoever consumes the
/// descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InvocationDescriptor {
	callee: Callee,
	type_name: String,
	args: Vec<String>,
	binding: Option<String>,
}

impl InvocationDescriptor {
	/// Creates a constructor invocation of `type_name`.
	pub fn constructor<I, S>(type_name: impl Into<String>, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			callee: Callee::Constructor,
			type_name: type_name.into(),
			args: args.into_iter().map(Into::into).collect(),
			binding: None,
		}
	}

	/// Creates a method invocation on the object bound as `receiver`.
	pub fn method<I, S>(receiver: impl Into<String>, type_name: impl Into<String>, method: impl Into<String>, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			callee: Callee::Method {
				receiver: receiver.into(),
				name: method.into(),
			},
			type_name: type_name.into(),
			args: args.into_iter().map(Into::into).collect(),
			binding: None,
		}
	}

	/// Names the result so later invocations can pass it as an argument.
	#[must_use]
	pub fn bind_as(mut self, name: impl Into<String>) -> Self {
		self.binding = Some(name.into());
		self
	}

	pub fn kind(&self) -> InvocationKind {
		match self.callee {
			Callee::Constructor => InvocationKind::Constructor,
			Callee::Method { .. } => InvocationKind::Method,
		}
	}

	/// Declaring type of the constructor or method.
	pub fn type_name(&self) -> &str {
		&self.type_name
	}

	/// Method name; `None` for constructors.
	pub fn method_name(&self) -> Option<&str> {
		match &self.callee {
			Callee::Constructor => None,
			Callee::Method { name, .. } => Some(name),
		}
	}

	/// Receiver binding name; `None` for constructors.
	pub fn receiver(&self) -> Option<&str> {
		match &self.callee {
			Callee::Constructor => None,
			Callee::Method { receiver, .. } => Some(receiver),
		}
	}

	pub fn args(&self) -> &[String] {
		&self.args
	}

	/// Requested result binding name, if any.
	pub fn binding(&self) -> Option<&str> {
		self.binding.as_deref()
	}

	/// Short description for tracing/logging.
	pub fn describe(&self) -> String {
		let args = self.args.join(", ");
		match &self.callee {
			Callee::Constructor => format!("new {}({args})", self.type_name),
			Callee::Method { receiver, name } => format!("{receiver}.{name}({args})"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn constructor_has_no_method_or_receiver() {
		let d = InvocationDescriptor::constructor("Account", ["10"]).bind_as("a1");
		assert_eq!(d.kind(), InvocationKind::Constructor);
		assert_eq!(d.method_name(), None);
		assert_eq!(d.receiver(), None);
		assert_eq!(d.binding(), Some("a1"));
		assert_eq!(d.describe(), "new Account(10)");
	}

	#[test]
	fn method_keeps_argument_order() {
		let d = InvocationDescriptor::method("a1", "Account", "transfer", ["a2", "50"]);
		assert_eq!(d.kind(), InvocationKind::Method);
		assert_eq!(d.method_name(), Some("transfer"));
		assert_eq!(d.receiver(), Some("a1"));
		assert_eq!(d.args(), ["a2", "50"]);
		assert_eq!(d.describe(), "a1.transfer(a2, 50)");
	}

	#[cfg(feature = "serde")]
	#[test]
	fn serde_preserves_descriptor() {
		let d = InvocationDescriptor::method("a1", "Account", "deposit", ["100"]);
		let json = serde_json::to_string(&d).unwrap();
		let back: InvocationDescriptor = serde_json::from_str(&json).unwrap();
		assert_eq!(back, d);
	}
}
