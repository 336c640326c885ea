/// Execution classes used to label workbench threads and tasks in traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// One-shot startup of an execution target.
	Startup,
	/// Long-lived thread that runs invoked code inside a target.
	Execution,
	/// Timers that fail invocations whose answer never arrives.
	Watchdog,
}

impl TaskClass {
	/// Stable label used as the `worker_class` tracing field.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Startup => "startup",
			Self::Execution => "execution",
			Self::Watchdog => "watchdog",
		}
	}
}
