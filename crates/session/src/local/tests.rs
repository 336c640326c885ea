use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use workbench_invocation::{InvocationKind, ObjectHandle, RemoteValue};

use super::heap::Heap;
use super::*;
use crate::target::{MarshalledArg, RemoteFailure};

fn bank_classes() -> Arc<ClassTable> {
	let target = LocalTarget::builder()
		.constructor("Account", |args| {
			let balance = match args.first() {
				Some(arg) => arg.parse::<i64>()?,
				None => 0,
			};
			Ok(json!({ "balance": balance }))
		})
		.constructor("Broken", |_| panic!("constructor exploded"))
		.method("Account", "deposit", |state, args| {
			let amount = args.first().ok_or("deposit needs an amount")?.parse::<i64>()?;
			let balance = state["balance"].as_i64().unwrap_or(0) + amount;
			state["balance"] = json!(balance);
			Ok(Returned::Void)
		})
		.method("Account", "balance", |state, _| Ok(Returned::Value(state["balance"].clone())))
		.method("Account", "withdraw", |state, args| {
			let amount = args.first().ok_or("withdraw needs an amount")?.parse::<i64>()?;
			let balance = state["balance"].as_i64().unwrap_or(0);
			if amount > balance {
				return Err(format!("insufficient funds: {balance} < {amount}"));
			}
			state["balance"] = json!(balance - amount);
			Ok(Returned::Void)
		})
		.method("Account", "split", |state, _| {
			let half = state["balance"].as_i64().unwrap_or(0) / 2;
			state["balance"] = json!(half);
			Ok(Returned::New {
				type_name: "Account".into(),
				state: json!({ "balance": half }),
			})
		})
		.build();
	Arc::clone(&target.classes)
}

fn construct(type_name: &str, args: &[&str]) -> MarshalledCall {
	MarshalledCall {
		kind: InvocationKind::Constructor,
		type_name: type_name.into(),
		method: None,
		receiver: None,
		args: args.iter().map(|a| MarshalledArg::Source((*a).to_owned())).collect(),
	}
}

fn call(receiver: &ObjectHandle, method: &str, args: Vec<MarshalledArg>) -> MarshalledCall {
	MarshalledCall {
		kind: InvocationKind::Method,
		type_name: receiver.type_name().into(),
		method: Some(method.into()),
		receiver: Some(receiver.clone()),
		args,
	}
}

fn new_account(heap: &mut Heap, balance: &str) -> ObjectHandle {
	let holder = heap.execute(construct("Account", &[balance])).unwrap();
	let holder = holder.as_object().unwrap();
	assert_eq!(holder.type_name(), RESULT_HOLDER_TYPE);
	holder.field(0).and_then(RemoteValue::as_object).unwrap().clone()
}

#[test]
fn constructor_result_is_wrapped_in_holder() {
	let mut heap = Heap::new(bank_classes());
	let account = new_account(&mut heap, "25");
	assert_eq!(account.type_name(), "Account");
	assert_eq!(account.fields(), [RemoteValue::Primitive("25".into())]);
	assert_eq!(heap.state_of(account.id()), Some(&json!({ "balance": 25 })));
}

#[test]
fn fields_follow_insertion_order() {
	let target = LocalTarget::builder()
		.constructor("Person", |_| Ok(json!({ "name": "ann", "age": 41, "city": "Oslo" })))
		.build();
	let mut heap = Heap::new(Arc::clone(&target.classes));
	let holder = heap.execute(construct("Person", &[])).unwrap();
	let person = holder.as_object().and_then(|h| h.field(0)).and_then(RemoteValue::as_object).unwrap();
	assert_eq!(
		person.fields(),
		[
			RemoteValue::Primitive("ann".into()),
			RemoteValue::Primitive("41".into()),
			RemoteValue::Primitive("Oslo".into()),
		]
	);
}

#[test]
fn unknown_constructor_is_marshalling_failure() {
	let mut heap = Heap::new(bank_classes());
	assert_eq!(
		heap.execute(construct("Nope", &[])),
		Err(RemoteFailure::Marshalling("no constructor for Nope".into()))
	);
}

#[test]
fn bad_argument_text_is_an_exception() {
	let mut heap = Heap::new(bank_classes());
	let err = heap.execute(construct("Account", &["lots"])).unwrap_err();
	assert_eq!(err, RemoteFailure::Exception("expected i64 but got `lots`".into()));
}

#[test]
fn methods_mutate_state_and_return_values() {
	let mut heap = Heap::new(bank_classes());
	let account = new_account(&mut heap, "10");
	assert_eq!(heap.execute(call(&account, "deposit", vec![MarshalledArg::Source("5".into())])), Ok(RemoteValue::Null));
	assert_eq!(heap.execute(call(&account, "balance", vec![])), Ok(RemoteValue::Primitive("15".into())));
}

#[test]
fn method_error_and_panic_become_exceptions() {
	let mut heap = Heap::new(bank_classes());
	let account = new_account(&mut heap, "10");
	assert_eq!(
		heap.execute(call(&account, "withdraw", vec![MarshalledArg::Source("50".into())])),
		Err(RemoteFailure::Exception("insufficient funds: 10 < 50".into()))
	);
	match heap.execute(construct("Broken", &[])) {
		Err(RemoteFailure::Exception(msg)) => assert!(msg.contains("Broken.new panicked: constructor exploded"), "{msg}"),
		other => panic!("unexpected {other:?}"),
	}
}

#[test]
fn missing_method_is_marshalling_failure() {
	let mut heap = Heap::new(bank_classes());
	let account = new_account(&mut heap, "1");
	assert_eq!(
		heap.execute(call(&account, "fly", vec![])),
		Err(RemoteFailure::Marshalling("Account has no method fly".into()))
	);
}

#[test]
fn method_can_create_new_objects() {
	let mut heap = Heap::new(bank_classes());
	let account = new_account(&mut heap, "40");
	let split = heap.execute(call(&account, "split", vec![])).unwrap();
	let split = split.as_object().unwrap();
	assert_ne!(split.id(), account.id());
	assert_eq!(heap.state_of(split.id()), Some(&json!({ "balance": 20 })));
	assert_eq!(heap.state_of(account.id()), Some(&json!({ "balance": 20 })));
}

#[test]
fn object_arguments_must_live_in_this_target() {
	let mut heap = Heap::new(bank_classes());
	let account = new_account(&mut heap, "1");
	let stranger = ObjectHandle::new(ObjectId(4242), "Account");
	assert_eq!(
		heap.execute(call(&account, "deposit", vec![MarshalledArg::Object(stranger)])),
		Err(RemoteFailure::Marshalling("object #4242 does not exist in this target".into()))
	);
}

#[test]
fn local_arg_parse_reports_objects() {
	let arg = LocalArg::Object {
		id: ObjectId(3),
		state: json!({}),
	};
	assert_eq!(arg.parse::<i32>(), Err("expected i32 but got object #3".into()));
	assert_eq!(LocalArg::Text(" 12 ".into()).parse::<i32>(), Ok(12));
	assert_eq!(arg.object_id(), Some(ObjectId(3)));
	assert_eq!(arg.text(), None);
}

#[test]
fn dispatch_before_start_is_disconnected() {
	let target = LocalTarget::builder().build();
	assert!(!target.is_running());
	assert_eq!(target.dispatch(InvocationId(0), construct("Account", &[])), Err(TargetError::Disconnected));
}
