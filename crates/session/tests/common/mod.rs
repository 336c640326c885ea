#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use workbench_session::{LocalArg, LocalTarget, Returned, TargetState, Workbench, WorkbenchConfig};

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt::try_init();
}

/// Accounts, wallets holding an account, and a sleeper for slow calls.
pub fn bank(config: &WorkbenchConfig) -> LocalTarget {
	LocalTarget::builder_for(config)
		.constructor("Account", |args| {
			let balance = match args.first() {
				Some(arg) => arg.parse::<i64>()?,
				None => 0,
			};
			Ok(json!({ "balance": balance }))
		})
		.method("Account", "deposit", |state, args| {
			let amount = args.first().ok_or("deposit needs an amount")?.parse::<i64>()?;
			state["balance"] = json!(state["balance"].as_i64().unwrap_or(0) + amount);
			Ok(Returned::Void)
		})
		.method("Account", "withdraw", |state, args| {
			let amount = args.first().ok_or("withdraw needs an amount")?.parse::<i64>()?;
			let balance = state["balance"].as_i64().unwrap_or(0);
			if amount > balance {
				return Err(format!("insufficient funds: {balance} < {amount}"));
			}
			state["balance"] = json!(balance - amount);
			Ok(Returned::Void)
		})
		.method("Account", "balance", |state, _| Ok(Returned::Value(state["balance"].clone())))
		.method("Account", "split", |state, _| {
			let half = state["balance"].as_i64().unwrap_or(0) / 2;
			state["balance"] = json!(half);
			Ok(Returned::New {
				type_name: "Account".into(),
				state: json!({ "balance": half }),
			})
		})
		.constructor("Wallet", |args| match args.first() {
			Some(LocalArg::Object { id, state }) => Ok(json!({ "account": id.0, "funds": state["balance"].clone() })),
			Some(other) => Err(format!("Wallet needs an account, got {other:?}")),
			None => Err("Wallet needs an account".into()),
		})
		.method("Wallet", "funds", |state, _| Ok(Returned::Value(state["funds"].clone())))
		.constructor("Slow", |args| {
			let millis = args.first().ok_or("Slow needs a duration")?.parse::<u64>()?;
			std::thread::sleep(Duration::from_millis(millis));
			Ok(json!({ "millis": millis }))
		})
		.constructor("Sleeper", |_| Ok(json!({})))
		.method("Sleeper", "nap", |_, args| {
			let millis = args.first().ok_or("nap needs a duration")?.parse::<u64>()?;
			std::thread::sleep(Duration::from_millis(millis));
			Ok(Returned::Void)
		})
		.build()
}

/// A workbench over [`bank`] whose target has finished loading.
pub fn ready_workbench(config: WorkbenchConfig) -> Workbench {
	let target = bank(&config);
	let bench = Workbench::new(config, Arc::new(target));
	bench.start();
	assert_eq!(bench.handle().wait_settled_blocking(), TargetState::Ready);
	bench
}
