//! Regenerates program text from an interaction graph.

use std::collections::HashSet;
use std::fmt::Write as _;

use crate::{CallArgument, CallKind, InteractionGraph, RecordedCall};

/// Renders every recorded call as one statement, in recording order.
///
/// Constructors become `Type name = new Type(args);`. Method calls become
/// `receiver.method(args);`, or `var name = receiver.method(args);` when the
/// result was bound. A name declared earlier in the script is re-assigned
/// without a type. Reference arguments render as the binding name of the
/// referenced call.
pub fn render_script(graph: &InteractionGraph) -> String {
	let mut out = String::new();
	let mut declared = HashSet::new();
	for call in graph.calls() {
		let args = render_args(graph, call);
		let rhs = match call.kind() {
			CallKind::Constructor => format!("new {}({args})", call.type_name()),
			CallKind::Method { receiver, method } => {
				let receiver = graph.get(*receiver).map_or("?", RecordedCall::binding);
				format!("{receiver}.{method}({args})")
			}
		};

		if !call.is_bound() {
			let _ = writeln!(out, "{rhs};");
			continue;
		}
		let name = call.binding();
		if declared.insert(name) {
			let decl = match call.kind() {
				CallKind::Constructor => call.type_name(),
				CallKind::Method { .. } => "var",
			};
			let _ = writeln!(out, "{decl} {name} = {rhs};");
		} else {
			let _ = writeln!(out, "{name} = {rhs};");
		}
	}
	out
}

fn render_args(graph: &InteractionGraph, call: &RecordedCall) -> String {
	let rendered: Vec<&str> = call
		.args()
		.iter()
		.map(|arg| match arg {
			CallArgument::Literal(text) => text.as_str(),
			CallArgument::Reference(id) => graph.get(*id).map_or("?", RecordedCall::binding),
		})
		.collect();
	rendered.join(", ")
}
