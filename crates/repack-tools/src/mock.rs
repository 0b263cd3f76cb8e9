//! Scripted tool runner for tests
//!
//! Records every invocation in order and answers it from a per-program
//! handler. A handler may touch the filesystem to emulate the tool (an
//! unzip handler materializing a payload, a PlistBuddy handler editing a
//! file). Programs without a handler succeed with empty output.

use std::sync::Mutex;

use crate::{Invocation, ToolError, ToolOutput, ToolRunner};

type Handler = Box<dyn Fn(&Invocation) -> ToolOutput + Send + Sync>;

/// A [`ToolRunner`] that never spawns processes.
#[derive(Default)]
pub struct ScriptedRunner {
    handlers: Vec<(String, Handler)>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer invocations of `program` (matched on file name) with `handler`.
    ///
    /// A later registration for the same program takes precedence.
    pub fn on<F>(mut self, program: &str, handler: F) -> Self
    where
        F: Fn(&Invocation) -> ToolOutput + Send + Sync + 'static,
    {
        self.handlers.push((program.to_string(), Box::new(handler)));
        self
    }

    /// Make every invocation of `program` exit with `code`.
    pub fn fail(self, program: &str, code: i32) -> Self {
        let message = format!("{program}: simulated failure");
        self.on(program, move |_| ToolOutput::failure(code, message.clone()))
    }

    /// All invocations so far, in execution order.
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Invocations of a single program, in execution order.
    pub fn calls_to(&self, program: &str) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|inv| inv.program_name() == program)
            .collect()
    }
}

impl ToolRunner for ScriptedRunner {
    fn output(&self, invocation: &Invocation) -> Result<ToolOutput, ToolError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(invocation.clone());
        }

        let name = invocation.program_name();
        let output = self
            .handlers
            .iter()
            .rev()
            .find(|(program, _)| *program == name)
            .map(|(_, handler)| handler(invocation))
            .unwrap_or_else(|| ToolOutput::success(""));

        Ok(output)
    }
}
