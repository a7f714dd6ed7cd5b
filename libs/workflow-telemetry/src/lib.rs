//! Logging bootstrap split out of the engine itself: `workflow-core` only
//! emits `tracing` spans/events through its `EventSink`/`TracingEventSink`
//! plumbing, never configures a subscriber. A host binary that wants the
//! default pretty/JSON setup calls [`init_tracing`] once at startup.

pub mod telemetry;

pub use telemetry::init_tracing;
