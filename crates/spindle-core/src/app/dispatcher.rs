//! Dispatcher - attach the resolved command to a warmed-up worker and start it.

use std::collections::{BTreeMap, BTreeSet};

use super::resolver::WorkUnit;
use super::worker::{InvocationHandle, ReadyWorker, Worker};
use crate::domain::{BatchOptions, DiagnosticSink, Invocation, Stream};

/// Everything the dispatcher attaches besides the element itself.
#[derive(Debug, Clone, Default)]
pub struct DispatchPlan {
    pub binding_name: Option<String>,
    pub extra_parameters: BTreeMap<String, serde_json::Value>,
    pub extra_flags: BTreeSet<String>,
}

impl DispatchPlan {
    pub fn from_options(options: &BatchOptions) -> Self {
        Self {
            binding_name: options.binding_name.clone(),
            extra_parameters: options.extra_parameters.clone(),
            extra_flags: options.extra_flags.clone(),
        }
    }

    /// Build the invocation for one element.
    pub fn invocation_for(&self, unit: &WorkUnit, element: serde_json::Value) -> Invocation {
        let mut invocation = Invocation::default();
        invocation.reset(unit.display_name());

        match &self.binding_name {
            Some(name) => invocation.push_named(name.clone(), element),
            None => invocation.push_positional(element),
        }
        for (name, value) in &self.extra_parameters {
            invocation.push_named(name.clone(), value.clone());
        }
        for flag in &self.extra_flags {
            invocation.push_flag(flag.clone());
        }
        invocation
    }
}

/// Start `unit` on a harvested worker without waiting for it.
///
/// Emits the reconstructed command line on the verbose stream.
pub fn dispatch(worker: ReadyWorker, unit: &WorkUnit, plan: &DispatchPlan, sink: &DiagnosticSink) -> Worker {
    let invocation = plan.invocation_for(unit, worker.input().value().clone());

    let command_line = invocation.command_line();
    tracing::debug!(index = worker.index(), command = %command_line, "dispatching");
    sink.record(Stream::Verbose, Some(worker.index()), command_line);

    let unit = unit.clone();
    let handle = worker
        .context()
        .spawn(move |host| unit.run(invocation, host));
    worker.start(InvocationHandle::new(handle))
}
