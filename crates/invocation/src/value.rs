use std::fmt;

/// Identity of an object living inside an execution target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Handle to a live object in the target.
///
/// Fields are the object's declared instance fields in declaration order, as
/// far as the target chose to expose them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectHandle {
	id: ObjectId,
	type_name: String,
	fields: Vec<RemoteValue>,
}

impl ObjectHandle {
	pub fn new(id: ObjectId, type_name: impl Into<String>) -> Self {
		Self {
			id,
			type_name: type_name.into(),
			fields: Vec::new(),
		}
	}

	#[must_use]
	pub fn with_fields(mut self, fields: Vec<RemoteValue>) -> Self {
		self.fields = fields;
		self
	}

	pub fn id(&self) -> ObjectId {
		self.id
	}

	/// Runtime type of the object.
	pub fn type_name(&self) -> &str {
		&self.type_name
	}

	pub fn fields(&self) -> &[RemoteValue] {
		&self.fields
	}

	/// Returns the instance field at `index` in declaration order.
	pub fn field(&self, index: usize) -> Option<&RemoteValue> {
		self.fields.get(index)
	}
}

/// Opaque result handle produced by the target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RemoteValue {
	/// No value (void return or a null reference).
	Null,
	/// A primitive or string, carried as its display text.
	Primitive(String),
	Object(ObjectHandle),
}

impl RemoteValue {
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	pub fn as_object(&self) -> Option<&ObjectHandle> {
		match self {
			Self::Object(obj) => Some(obj),
			_ => None,
		}
	}

	pub fn into_object(self) -> Option<ObjectHandle> {
		match self {
			Self::Object(obj) => Some(obj),
			_ => None,
		}
	}
}

impl fmt::Display for RemoteValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Null => f.write_str("null"),
			Self::Primitive(text) => f.write_str(text),
			Self::Object(obj) => write!(f, "<{} {}>", obj.type_name, obj.id),
		}
	}
}
