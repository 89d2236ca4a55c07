//! A scripted stand-in for the sandbox.
//!
//! Each snippet's behaviour is registered up front as a list of steps keyed by
//! its source code. Every `start` is recorded, including the namespace it was
//! given, so tests can check exactly what an execution could see.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use sandbox_rlm::{
    Namespace, Object, PrintWriter, Program, ResourceLimits, RunProgress, Sandbox, SandboxError, Snapshot,
};

#[derive(Debug, Clone)]
pub enum Step {
    /// `print(text)`
    Print(String),
    /// A call to a host function.
    Call {
        name: String,
        args: Vec<Object>,
        kwargs: Vec<(Object, Object)>,
    },
    /// Stops the snippet with an error.
    Fail(SandboxError),
    /// Blocks on unresolved async calls.
    Await(Vec<u32>),
}

pub fn print(text: &str) -> Step {
    Step::Print(text.to_owned())
}

pub fn call(name: &str, args: Vec<Object>, kwargs: Vec<(&str, Object)>) -> Step {
    Step::Call {
        name: name.to_owned(),
        args,
        kwargs: kwargs
            .into_iter()
            .map(|(key, value)| (Object::String(key.to_owned()), value))
            .collect(),
    }
}

/// What one `Sandbox::start` received, plus the host's answers to its calls.
#[derive(Debug, Clone, Default)]
pub struct Execution {
    pub code: String,
    pub namespace: Namespace,
    pub external_functions: Vec<String>,
    pub type_check: bool,
    pub type_check_stubs: Option<String>,
    pub limits: Option<ResourceLimits>,
    pub returns: Vec<Object>,
}

#[derive(Debug, Default)]
pub struct ScriptedSandbox {
    scripts: HashMap<String, Vec<Step>>,
    executions: Rc<RefCell<Vec<Execution>>>,
}

impl ScriptedSandbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the steps run for `code`. Unregistered code completes without output.
    pub fn script(mut self, code: &str, steps: Vec<Step>) -> Self {
        self.scripts.insert(code.to_owned(), steps);
        self
    }

    pub fn executions(&self) -> Vec<Execution> {
        self.executions.borrow().clone()
    }

    pub fn last(&self) -> Execution {
        self.executions.borrow().last().cloned().expect("no execution recorded")
    }
}

impl Sandbox for ScriptedSandbox {
    type Snapshot = ScriptedSnapshot;

    fn start(
        &mut self,
        program: Program<'_>,
        inputs: Vec<Object>,
        limits: Option<&ResourceLimits>,
        print: &mut dyn PrintWriter,
    ) -> Result<RunProgress<ScriptedSnapshot>, SandboxError> {
        assert_eq!(program.input_names.len(), inputs.len(), "names and inputs must line up");
        self.executions.borrow_mut().push(Execution {
            code: program.code.to_owned(),
            namespace: program.input_names.iter().cloned().zip(inputs).collect(),
            external_functions: program.external_functions.to_vec(),
            type_check: program.type_check,
            type_check_stubs: program.type_check_stubs.map(str::to_owned),
            limits: limits.cloned(),
            returns: Vec::new(),
        });
        let steps = self.scripts.get(program.code).cloned().unwrap_or_default();
        ScriptedSnapshot {
            steps: steps.into_iter(),
            next_call_id: 0,
            executions: Rc::clone(&self.executions),
        }
        .run(print)
    }
}

#[derive(Debug)]
pub struct ScriptedSnapshot {
    steps: std::vec::IntoIter<Step>,
    next_call_id: u32,
    executions: Rc<RefCell<Vec<Execution>>>,
}

impl ScriptedSnapshot {
    fn run(mut self, print: &mut dyn PrintWriter) -> Result<RunProgress<Self>, SandboxError> {
        while let Some(step) = self.steps.next() {
            match step {
                Step::Print(text) => {
                    print.stdout_write(text.into());
                    print.stdout_push('\n');
                }
                Step::Call { name, args, kwargs } => {
                    let call_id = self.next_call_id;
                    self.next_call_id += 1;
                    return Ok(RunProgress::FunctionCall {
                        function_name: name,
                        args,
                        kwargs,
                        call_id,
                        state: self,
                    });
                }
                Step::Fail(error) => return Err(error),
                Step::Await(pending) => return Ok(RunProgress::ResolveFutures(pending)),
            }
        }
        Ok(RunProgress::Complete(Object::None))
    }
}

impl Snapshot for ScriptedSnapshot {
    fn resume(self, return_value: Object, print: &mut dyn PrintWriter) -> Result<RunProgress<Self>, SandboxError> {
        if let Some(execution) = self.executions.borrow_mut().last_mut() {
            execution.returns.push(return_value);
        }
        self.run(print)
    }
}

/// Builds a namespace from name/value pairs.
pub fn namespace(pairs: Vec<(&str, Object)>) -> Namespace {
    pairs.into_iter().map(|(name, value)| (name.to_owned(), value)).collect()
}
