use std::collections::HashMap;

use crate::{CallArgument, CallId};

/// Binding name to call lookup, the snapshot argument resolution runs against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingTable {
	names: HashMap<String, CallId>,
}

impl BindingTable {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, name: &str) -> Option<CallId> {
		self.names.get(name).copied()
	}

	pub fn contains(&self, name: &str) -> bool {
		self.names.contains_key(name)
	}

	/// Maps `name` to `call`, returning the call it displaced.
	pub fn insert(&mut self, name: impl Into<String>, call: CallId) -> Option<CallId> {
		self.names.insert(name.into(), call)
	}

	pub fn len(&self) -> usize {
		self.names.len()
	}

	pub fn is_empty(&self) -> bool {
		self.names.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, CallId)> {
		self.names.iter().map(|(name, id)| (name.as_str(), *id))
	}

	pub fn clear(&mut self) {
		self.names.clear();
	}
}

/// Resolves one argument string by exact match against bound names.
///
/// Text naming no call stays a literal; a dangling name is not an error.
pub fn resolve_argument(table: &BindingTable, text: &str) -> CallArgument {
	match table.get(text) {
		Some(id) => CallArgument::Reference(id),
		None => CallArgument::Literal(text.to_owned()),
	}
}

/// Resolves every argument string in order.
pub fn resolve_arguments<S: AsRef<str>>(table: &BindingTable, args: &[S]) -> Vec<CallArgument> {
	args.iter().map(|arg| resolve_argument(table, arg.as_ref())).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn exact_match_becomes_reference() {
		let mut table = BindingTable::new();
		table.insert("a1", CallId(0));
		assert_eq!(resolve_argument(&table, "a1"), CallArgument::Reference(CallId(0)));
	}

	#[test]
	fn near_miss_stays_literal() {
		let mut table = BindingTable::new();
		table.insert("a1", CallId(0));
		for text in ["A1", "a1 ", " a1", "a", "a10", "\"a1\""] {
			assert_eq!(resolve_argument(&table, text), CallArgument::Literal(text.to_owned()), "{text:?}");
		}
	}

	#[test]
	fn order_is_preserved() {
		let mut table = BindingTable::new();
		table.insert("w", CallId(3));
		let args = resolve_arguments(&table, &["1", "w", "x"]);
		assert_eq!(
			args,
			vec![CallArgument::Literal("1".into()), CallArgument::Reference(CallId(3)), CallArgument::Literal("x".into())]
		);
	}
}
