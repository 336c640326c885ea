use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Extracts a readable message from a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(msg) = payload.downcast_ref::<&'static str>() {
		(*msg).to_string()
	} else if let Some(msg) = payload.downcast_ref::<String>() {
		msg.clone()
	} else {
		"panic with non-string payload".to_string()
	}
}

/// Runs `f`, turning a panic into `Err(message)`.
///
/// Used wherever foreign code (target startup, invoked constructors and
/// methods) runs on a workbench-owned thread that must survive it.
pub fn catch_panic<R>(f: impl FnOnce() -> R) -> Result<R, String> {
	catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(payload.as_ref()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn extracts_static_str_payload() {
		let err = catch_panic(|| panic!("boom-str")).unwrap_err();
		assert_eq!(err, "boom-str");
	}

	#[test]
	fn extracts_string_payload() {
		let err = catch_panic(|| panic!("{}", String::from("boom-string"))).unwrap_err();
		assert_eq!(err, "boom-string");
	}

	#[test]
	fn opaque_payload_gets_placeholder() {
		let err = catch_panic(|| std::panic::panic_any(42u32)).unwrap_err();
		assert_eq!(err, "panic with non-string payload");
	}

	#[test]
	fn passes_through_normal_return() {
		assert_eq!(catch_panic(|| 7), Ok(7));
	}
}
