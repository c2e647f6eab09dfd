use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use corso_capabilities::CapabilityRegistry;
use corso_core::error::CorsoError;

use crate::condition::evaluate;
use crate::context::ExecutionContext;
use crate::flow::Flow;
use crate::step::Step;
use crate::substitute::{substitute, substitute_str};

/// Default maximum steps per run. Closes the cyclic-flow gap: a
/// misauthored cycle aborts instead of looping forever.
pub const DEFAULT_STEP_BUDGET: usize = 64;

/// Trace entry for one executed step.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    /// Which step was executed.
    pub step_id: String,
    /// Step kind label ("operation", "branch", "response").
    pub kind: &'static str,
    /// Whether the step succeeded (a branch or response step always does;
    /// an operation step reports its reply's `success` flag).
    pub succeeded: bool,
    /// Execution time in milliseconds.
    pub elapsed_ms: u64,
}

/// Result of one interpreter run.
///
/// The context is always returned; on failure it is frozen at the point
/// the run stopped, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Whether the run completed without a run-level failure.
    pub succeeded: bool,
    /// The last response step's expanded text, if any ran.
    pub response: Option<String>,
    /// Run-level error naming the originating step, when failed.
    pub error: Option<String>,
    /// Final (or frozen) execution context.
    pub context: ExecutionContext,
    /// Per-step trace in execution order.
    pub steps: Vec<StepRecord>,
}

impl RunOutcome {
    fn success(context: ExecutionContext, steps: Vec<StepRecord>) -> Self {
        Self {
            succeeded: true,
            response: context.response.clone(),
            error: None,
            context,
            steps,
        }
    }

    fn failure(error: String, context: ExecutionContext, steps: Vec<StepRecord>) -> Self {
        Self {
            succeeded: false,
            response: context.response.clone(),
            error: Some(error),
            context,
            steps,
        }
    }
}

/// Walks a flow step by step.
///
/// An explicit loop with a step budget, not recursion: each iteration
/// resolves the current step, substitutes variables into its declared
/// arguments or template, executes it, and follows the successor id until
/// none is given. Provider-level failures (`success: false` replies) are
/// routed through `on_failure` branching; infrastructure failures
/// (missing step, provider error, timeout, exhausted budget) end the run
/// as a failed outcome and never escape as errors.
pub struct Interpreter<'a> {
    capabilities: &'a CapabilityRegistry,
    step_budget: usize,
}

impl<'a> Interpreter<'a> {
    pub fn new(capabilities: &'a CapabilityRegistry) -> Self {
        Self {
            capabilities,
            step_budget: DEFAULT_STEP_BUDGET,
        }
    }

    /// Override the step budget.
    pub fn with_step_budget(mut self, budget: usize) -> Self {
        self.step_budget = budget;
        self
    }

    /// Run a flow from `start_step` with the given context.
    pub async fn run(
        &self,
        flow: &Flow,
        start_step: &str,
        mut ctx: ExecutionContext,
    ) -> RunOutcome {
        let mut steps: Vec<StepRecord> = Vec::new();
        let mut current = start_step.to_string();

        loop {
            if steps.len() >= self.step_budget {
                let err = CorsoError::StepBudgetExhausted {
                    flow: flow.id.clone(),
                    budget: self.step_budget,
                };
                warn!(flow_id = %flow.id, budget = self.step_budget, "Step budget exhausted");
                return RunOutcome::failure(err.to_string(), ctx, steps);
            }

            let Some(step) = flow.steps.get(&current) else {
                let err = CorsoError::MissingStep {
                    flow: flow.id.clone(),
                    step: current.clone(),
                };
                error!(flow_id = %flow.id, step_id = %current, "Step not found in flow");
                return RunOutcome::failure(err.to_string(), ctx, steps);
            };

            debug!(flow_id = %flow.id, step_id = %current, kind = step.kind(), "Executing step");
            let started = Instant::now();

            let (succeeded, next) = match step {
                Step::Operation {
                    operation,
                    args,
                    variables,
                    on_success,
                    on_failure,
                    next_step,
                } => {
                    let resolved = substitute(&Value::Object(args.clone()), &ctx.variables);
                    info!(flow_id = %flow.id, step_id = %current, operation = %operation, "Invoking operation");

                    let reply = match self
                        .capabilities
                        .dispatch(operation, resolved, ctx.caller.clone())
                        .await
                    {
                        Ok(reply) => reply,
                        Err(e) => {
                            error!(step_id = %current, error = %e, "Operation step failed");
                            steps.push(StepRecord {
                                step_id: current.clone(),
                                kind: step.kind(),
                                succeeded: false,
                                elapsed_ms: started.elapsed().as_millis() as u64,
                            });
                            return RunOutcome::failure(
                                format!("step '{}': {}", current, e),
                                ctx,
                                steps,
                            );
                        }
                    };

                    let ok = reply.success;
                    if ok {
                        for name in variables {
                            if let Some(value) = reply.field(name) {
                                ctx.set_variable(name.clone(), value.clone());
                            }
                        }
                    }
                    let reply_error = reply.error.clone();
                    ctx.result = Some(reply.into_value());

                    if ok {
                        (true, on_success.clone().or_else(|| next_step.clone()))
                    } else if let Some(handler) = on_failure {
                        // No implicit next_step fallback on failure
                        debug!(step_id = %current, handler = %handler, "Operation failed, taking on_failure branch");
                        (false, Some(handler.clone()))
                    } else {
                        let message = reply_error
                            .unwrap_or_else(|| format!("operation '{}' failed", operation));
                        warn!(step_id = %current, message = %message, "Operation failed with no on_failure handler");
                        steps.push(StepRecord {
                            step_id: current.clone(),
                            kind: step.kind(),
                            succeeded: false,
                            elapsed_ms: started.elapsed().as_millis() as u64,
                        });
                        return RunOutcome::failure(
                            format!("step '{}': {}", current, message),
                            ctx,
                            steps,
                        );
                    }
                }

                Step::Branch {
                    condition,
                    on_true,
                    on_false,
                    next_step,
                } => {
                    let holds = evaluate(condition, &ctx);
                    debug!(step_id = %current, field = %condition.field, holds, "Branch evaluated");
                    let next = if holds {
                        on_true.clone().or_else(|| next_step.clone())
                    } else {
                        on_false.clone()
                    };
                    (true, next)
                }

                Step::Response {
                    template,
                    next_step,
                } => {
                    let text = substitute_str(template, &ctx.variables);
                    debug!(step_id = %current, "Response rendered");
                    ctx.response = Some(text);
                    (true, next_step.clone())
                }
            };

            steps.push(StepRecord {
                step_id: current.clone(),
                kind: step.kind(),
                succeeded,
                elapsed_ms: started.elapsed().as_millis() as u64,
            });

            match next {
                Some(next_id) => current = next_id,
                None => return RunOutcome::success(ctx, steps),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{Condition, ConditionOperator};
    use crate::step::Step;
    use corso_core::error::Result;
    use corso_core::traits::Capability;
    use corso_core::types::{CallerId, CapabilityReply, ConversationId};
    use futures::future::BoxFuture;

    struct NameLookup;

    impl Capability for NameLookup {
        fn name(&self) -> &str {
            "name_lookup"
        }

        fn description(&self) -> &str {
            "Returns a client name for recognized queries"
        }

        fn invoke(
            &self,
            args: serde_json::Value,
            _caller: CallerId,
        ) -> BoxFuture<'_, Result<CapabilityReply>> {
            Box::pin(async move {
                let query = args["query"].as_str().unwrap_or_default();
                if query.contains("Ada") {
                    let mut data = serde_json::Map::new();
                    data.insert("client_name".into(), serde_json::json!("Ada"));
                    data.insert("orders".into(), serde_json::json!(12));
                    Ok(CapabilityReply::ok(data))
                } else {
                    Ok(CapabilityReply::failure("unknown client"))
                }
            })
        }
    }

    struct Broken;

    impl Capability for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn description(&self) -> &str {
            "Always errors"
        }

        fn invoke(
            &self,
            _args: serde_json::Value,
            _caller: CallerId,
        ) -> BoxFuture<'_, Result<CapabilityReply>> {
            Box::pin(async {
                Err(CorsoError::Capability {
                    capability: "broken".into(),
                    message: "backend unreachable".into(),
                })
            })
        }
    }

    fn registry() -> CapabilityRegistry {
        let mut registry = CapabilityRegistry::new();
        registry.register(NameLookup);
        registry.register(Broken);
        registry
    }

    fn ctx(message: &str, flow: &Flow) -> ExecutionContext {
        ExecutionContext::new(
            message,
            CallerId::from_str("tester"),
            ConversationId::from_str("conv-1"),
            flow.id.clone(),
            flow.name.clone(),
        )
    }

    fn lookup_step(on_success: &str, on_failure: Option<&str>, next_step: Option<&str>) -> Step {
        let mut args = serde_json::Map::new();
        args.insert("query".into(), serde_json::json!("${message}"));
        Step::Operation {
            operation: "name_lookup".into(),
            args,
            variables: vec!["client_name".into(), "orders".into()],
            on_success: Some(on_success.into()),
            on_failure: on_failure.map(String::from),
            next_step: next_step.map(String::from),
        }
    }

    fn response_step(template: &str) -> Step {
        Step::Response {
            template: template.into(),
            next_step: None,
        }
    }

    #[tokio::test]
    async fn test_operation_then_response() {
        let flow = Flow::new("f", "F", "lookup")
            .with_step("lookup", lookup_step("greet", None, None))
            .with_step("greet", response_step("Hello ${client_name}"));

        let registry = registry();
        let context = ctx("details for Ada", &flow);
        let outcome = Interpreter::new(&registry).run(&flow, "lookup", context).await;

        assert!(outcome.succeeded);
        assert_eq!(outcome.response.as_deref(), Some("Hello Ada"));
        assert_eq!(outcome.steps.len(), 2);
        assert_eq!(outcome.context.variables["orders"], serde_json::json!(12));
        assert_eq!(outcome.context.result.as_ref().unwrap()["success"], serde_json::json!(true));
    }

    #[tokio::test]
    async fn test_missing_initial_step_fails_naming_it() {
        let flow = Flow::new("f", "F", "nowhere");
        let registry = registry();
        let context = ctx("hi", &flow);
        let outcome = Interpreter::new(&registry).run(&flow, "nowhere", context).await;

        assert!(!outcome.succeeded);
        assert!(outcome.error.unwrap().contains("nowhere"));
        assert!(outcome.steps.is_empty());
    }

    #[tokio::test]
    async fn test_failed_operation_without_handler_ignores_next_step() {
        let flow = Flow::new("f", "F", "lookup")
            .with_step("lookup", lookup_step("greet", None, Some("greet")))
            .with_step("greet", response_step("Hello ${client_name}"));

        let registry = registry();
        let context = ctx("details for nobody", &flow);
        let outcome = Interpreter::new(&registry).run(&flow, "lookup", context).await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.response, None);
        assert!(outcome.error.unwrap().contains("unknown client"));
        // Context is frozen at the failure point, reply still recorded
        assert_eq!(outcome.context.result.as_ref().unwrap()["success"], serde_json::json!(false));
    }

    #[tokio::test]
    async fn test_failed_operation_takes_on_failure_branch() {
        let flow = Flow::new("f", "F", "lookup")
            .with_step("lookup", lookup_step("greet", Some("apologize"), None))
            .with_step("greet", response_step("Hello ${client_name}"))
            .with_step("apologize", response_step("Sorry, I could not find that client."));

        let registry = registry();
        let context = ctx("details for nobody", &flow);
        let outcome = Interpreter::new(&registry).run(&flow, "lookup", context).await;

        assert!(outcome.succeeded);
        assert_eq!(
            outcome.response.as_deref(),
            Some("Sorry, I could not find that client.")
        );
    }

    #[tokio::test]
    async fn test_unknown_operation_routes_through_on_failure() {
        let mut args = serde_json::Map::new();
        args.insert("x".into(), serde_json::json!(1));
        let flow = Flow::new("f", "F", "op")
            .with_step(
                "op",
                Step::Operation {
                    operation: "does_not_exist".into(),
                    args,
                    variables: vec![],
                    on_success: Some("done".into()),
                    on_failure: Some("fallback".into()),
                    next_step: None,
                },
            )
            .with_step("done", response_step("ok"))
            .with_step("fallback", response_step("that operation is unavailable"));

        let registry = registry();
        let context = ctx("hi", &flow);
        let outcome = Interpreter::new(&registry).run(&flow, "op", context).await;

        assert!(outcome.succeeded);
        assert_eq!(outcome.response.as_deref(), Some("that operation is unavailable"));
        let result = outcome.context.result.unwrap();
        assert!(result["error"]
            .as_str()
            .unwrap()
            .contains("operation not implemented: does_not_exist"));
    }

    #[tokio::test]
    async fn test_provider_error_caught_at_step_boundary() {
        let flow = Flow::new("f", "F", "op")
            .with_step(
                "op",
                Step::Operation {
                    operation: "broken".into(),
                    args: serde_json::Map::new(),
                    variables: vec![],
                    on_success: None,
                    on_failure: Some("fallback".into()),
                    next_step: None,
                },
            )
            .with_step("fallback", response_step("never reached"));

        let registry = registry();
        let context = ctx("hi", &flow);
        let outcome = Interpreter::new(&registry).run(&flow, "op", context).await;

        // Infrastructure failure, not a provider-level one: on_failure does
        // not apply.
        assert!(!outcome.succeeded);
        let error = outcome.error.unwrap();
        assert!(error.contains("step 'op'"));
        assert!(error.contains("backend unreachable"));
    }

    #[tokio::test]
    async fn test_branch_steps() {
        let flow = Flow::new("f", "F", "lookup")
            .with_step("lookup", lookup_step("check", None, None))
            .with_step(
                "check",
                Step::Branch {
                    condition: Condition {
                        field: "variables.orders".into(),
                        operator: ConditionOperator::GreaterThan,
                        value: serde_json::json!(10),
                    },
                    on_true: Some("vip".into()),
                    on_false: Some("regular".into()),
                    next_step: None,
                },
            )
            .with_step("vip", response_step("${client_name} is a key account"))
            .with_step("regular", response_step("${client_name} is a standard account"));

        let registry = registry();
        let context = ctx("details for Ada", &flow);
        let outcome = Interpreter::new(&registry).run(&flow, "lookup", context).await;

        assert!(outcome.succeeded);
        assert_eq!(outcome.response.as_deref(), Some("Ada is a key account"));
        let kinds: Vec<&str> = outcome.steps.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec!["operation", "branch", "response"]);
    }

    #[tokio::test]
    async fn test_branch_false_without_target_terminates() {
        let flow = Flow::new("f", "F", "check").with_step(
            "check",
            Step::Branch {
                condition: Condition {
                    field: "variables.absent".into(),
                    operator: ConditionOperator::Exists,
                    value: serde_json::Value::Null,
                },
                on_true: Some("somewhere".into()),
                on_false: None,
                next_step: None,
            },
        );

        let registry = registry();
        let context = ctx("hi", &flow);
        let outcome = Interpreter::new(&registry).run(&flow, "check", context).await;

        assert!(outcome.succeeded);
        assert_eq!(outcome.response, None);
    }

    #[tokio::test]
    async fn test_intermediate_response_continues() {
        let flow = Flow::new("f", "F", "ack")
            .with_step(
                "ack",
                Step::Response {
                    template: "Working on it...".into(),
                    next_step: Some("final".into()),
                },
            )
            .with_step("final", response_step("All done."));

        let registry = registry();
        let context = ctx("hi", &flow);
        let outcome = Interpreter::new(&registry).run(&flow, "ack", context).await;

        assert!(outcome.succeeded);
        // The last response step wins
        assert_eq!(outcome.response.as_deref(), Some("All done."));
        assert_eq!(outcome.steps.len(), 2);
    }

    #[tokio::test]
    async fn test_cyclic_flow_aborts_on_step_budget() {
        let flow = Flow::new("f", "F", "a")
            .with_step(
                "a",
                Step::Response {
                    template: "ping".into(),
                    next_step: Some("b".into()),
                },
            )
            .with_step(
                "b",
                Step::Response {
                    template: "pong".into(),
                    next_step: Some("a".into()),
                },
            );

        let registry = registry();
        let context = ctx("hi", &flow);
        let outcome = Interpreter::new(&registry)
            .with_step_budget(10)
            .run(&flow, "a", context)
            .await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.steps.len(), 10);
        assert!(outcome.error.unwrap().contains("step budget"));
    }
}
