//! Scripted scenario executors
//!
//! [`ScriptedExecutor`] decides each scenario's fate from a script keyed by
//! scenario id or tag, and records what it ran. It exercises the scheduler and
//! service without any collaborator.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use vigil_engine::{ExecutionContext, Scenario, ScenarioExecutor, ScenarioFault};

/// What a scripted scenario does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Behavior {
    /// Pass immediately
    Pass,
    /// Fail with an assertion message
    Fail(String),
    /// Panic with a message
    Panic(String),
    /// Sleep on the tokio clock, then pass
    Sleep(u64),
    /// Never finish
    Hang,
}

#[derive(Debug, Default)]
struct Script {
    by_id: HashMap<String, Behavior>,
    by_tag: Vec<(String, Behavior)>,
}

/// Executor driven by a script
///
/// Id rules win over tag rules; tag rules apply in insertion order; anything
/// unscripted passes.
#[derive(Debug, Clone, Default)]
pub struct ScriptedExecutor {
    script: Arc<Mutex<Script>>,
    executed: Arc<Mutex<Vec<ExecutedScenario>>>,
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

/// Record of one execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedScenario {
    /// Scenario id
    pub scenario_id: String,
    /// Run id from the context
    pub run_id: String,
    /// Environment from the context
    pub environment: String,
}

impl ScriptedExecutor {
    /// Executor that passes everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the scenario with identifier `id`
    pub fn on_id(self, id: impl Into<String>, behavior: Behavior) -> Self {
        self.script.lock().by_id.insert(id.into(), behavior);
        self
    }

    /// Script every scenario carrying `tag`
    pub fn on_tag(self, tag: impl Into<String>, behavior: Behavior) -> Self {
        self.script.lock().by_tag.push((tag.into(), behavior));
        self
    }

    /// Shorthand for failing one scenario
    pub fn fail(self, id: impl Into<String>, message: impl Into<String>) -> Self {
        self.on_id(id, Behavior::Fail(message.into()))
    }

    /// Shorthand for panicking in one scenario
    pub fn panic(self, id: impl Into<String>, message: impl Into<String>) -> Self {
        self.on_id(id, Behavior::Panic(message.into()))
    }

    /// Every execution so far, in completion order
    pub fn executed(&self) -> Vec<ExecutedScenario> {
        self.executed.lock().clone()
    }

    /// Identifiers of executed scenarios, sorted
    pub fn executed_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .executed
            .lock()
            .iter()
            .map(|e| e.scenario_id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Highest number of scenarios observed running at once
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn behavior_for(&self, scenario: &Scenario) -> Behavior {
        let script = self.script.lock();
        if let Some(behavior) = script.by_id.get(scenario.id()) {
            return behavior.clone();
        }
        script
            .by_tag
            .iter()
            .find(|(tag, _)| scenario.has_tag(tag))
            .map(|(_, behavior)| behavior.clone())
            .unwrap_or(Behavior::Pass)
    }
}

struct RunningGuard<'a>(&'a AtomicUsize);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ScenarioExecutor for ScriptedExecutor {
    async fn execute(&self, scenario: &Scenario, context: &ExecutionContext) -> Result<(), ScenarioFault> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _guard = RunningGuard(&self.running);

        // Yield so concurrently scheduled workers overlap.
        tokio::task::yield_now().await;

        let behavior = self.behavior_for(scenario);
        match &behavior {
            Behavior::Sleep(ms) => tokio::time::sleep(Duration::from_millis(*ms)).await,
            Behavior::Hang => std::future::pending::<()>().await,
            _ => {}
        }

        self.executed.lock().push(ExecutedScenario {
            scenario_id: scenario.id().to_string(),
            run_id: context.run_id.clone(),
            environment: context.environment.clone(),
        });

        match behavior {
            Behavior::Fail(message) => Err(ScenarioFault::assertion(message)),
            Behavior::Panic(message) => panic!("{message}"),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn id_rules_win_over_tag_rules() {
        let executor = ScriptedExecutor::new()
            .on_tag("@flaky", Behavior::Fail("tagged".to_string()))
            .on_id("a.toml", Behavior::Pass);
        let context = ExecutionContext::for_environment("run", "dev");

        let a = Scenario::tagged("a.toml", ["@flaky"]);
        let b = Scenario::tagged("b.toml", ["flaky"]);

        assert_matches!(executor.execute(&a, &context).await, Ok(()));
        assert_matches!(
            executor.execute(&b, &context).await,
            Err(ScenarioFault::Assertion(message)) if message == "tagged"
        );
        assert_eq!(executor.executed_ids(), vec!["a.toml", "b.toml"]);
        assert_eq!(executor.executed()[0].environment, "dev");
    }
}
