//! Step interpreter
//!
//! Runs a scenario's steps in order against the injected [`Capabilities`].
//! The first failing step ends the scenario.

use crate::capabilities::Capabilities;
use crate::error::ScenarioFault;
use crate::executor::{ExecutionContext, ScenarioExecutor};
use crate::scenario::{Scenario, Step};
use async_trait::async_trait;
use tracing::{debug, trace};
use vigil_core::effects::UserMetadata;
use vigil_core::DynamicValue;

/// [`ScenarioExecutor`] for declarative step scenarios
#[derive(Debug, Clone)]
pub struct StepInterpreter {
    capabilities: Capabilities,
}

impl StepInterpreter {
    /// Interpreter over a capability set
    pub fn new(capabilities: Capabilities) -> Self {
        Self { capabilities }
    }

    /// The capability set scenarios run against
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    async fn run_step(&self, step: &Step, ctx: &ExecutionContext) -> Result<(), ScenarioFault> {
        let caps = &self.capabilities;
        match step {
            Step::PutObject {
                bucket,
                key,
                content,
                metadata,
            } => {
                let content = expand(content, ctx)?;
                let metadata = metadata
                    .iter()
                    .map(|(name, value)| expand(value, ctx).map(|value| (name.clone(), value)))
                    .collect::<Result<UserMetadata, _>>()?;
                caps.object_store
                    .write_object_with_metadata(&ctx.qualify(bucket), key, &content, &metadata)
                    .await?;
            }

            Step::HeadObject {
                bucket,
                key,
                expect_length,
                expect_metadata,
            } => {
                let head = caps
                    .object_store
                    .object_metadata(&ctx.qualify(bucket), key)
                    .await?;
                if let Some(expected) = expect_length {
                    if head.content_length != *expected {
                        return Err(ScenarioFault::assertion(format!(
                            "object {bucket}/{key}: expected length {expected}, got {}",
                            head.content_length
                        )));
                    }
                }
                for (name, expected) in expect_metadata {
                    let expected = expand(expected, ctx)?;
                    let actual = head.user_metadata.get(name);
                    if actual != Some(&expected) {
                        return Err(ScenarioFault::assertion(format!(
                            "object {bucket}/{key}: metadata {name}: expected {expected:?}, got {actual:?}"
                        )));
                    }
                }
            }

            Step::ReadObject {
                bucket,
                key,
                expect,
            } => {
                let content = caps.object_store.read_object(&ctx.qualify(bucket), key).await?;
                if let Some(expected) = expect {
                    let expected = expand(expected, ctx)?;
                    if content != expected {
                        return Err(ScenarioFault::assertion(format!(
                            "object {bucket}/{key}: expected {expected:?}, got {content:?}"
                        )));
                    }
                }
            }

            Step::ObjectExists {
                bucket,
                key,
                expect,
            } => {
                let exists = caps
                    .object_store
                    .object_exists(&ctx.qualify(bucket), key)
                    .await?;
                if exists != *expect {
                    return Err(ScenarioFault::assertion(format!(
                        "object {bucket}/{key}: expected exists={expect}, got exists={exists}"
                    )));
                }
            }

            Step::ListObjects {
                bucket,
                prefix,
                expect,
                expect_count,
            } => {
                let keys = caps
                    .object_store
                    .list_objects(&ctx.qualify(bucket), prefix.as_deref())
                    .await?;
                check_count("objects", *expect_count, keys.len())?;
                if let Some(expected) = expect {
                    if &keys != expected {
                        return Err(ScenarioFault::assertion(format!(
                            "bucket {bucket}: expected keys {expected:?}, got {keys:?}"
                        )));
                    }
                }
            }

            Step::CopyObject {
                source_bucket,
                source_key,
                dest_bucket,
                dest_key,
            } => {
                caps.object_store
                    .copy_object(
                        &ctx.qualify(source_bucket),
                        source_key,
                        &ctx.qualify(dest_bucket),
                        dest_key,
                    )
                    .await?;
            }

            Step::DeleteObject { bucket, key } => {
                caps.object_store
                    .delete_object(&ctx.qualify(bucket), key)
                    .await?;
            }

            Step::DeleteObjects { bucket, keys } => {
                caps.object_store
                    .delete_objects(&ctx.qualify(bucket), keys)
                    .await?;
            }

            Step::PutItem { table, key, item } => {
                caps.table(ctx.qualify(table), key).put(item).await?;
            }

            Step::GetItem {
                table,
                key,
                value,
                expect,
                expect_missing,
            } => {
                let found = caps.table(ctx.qualify(table), key).get(value).await?;
                match (found, expect_missing) {
                    (Some(_), true) => {
                        return Err(ScenarioFault::assertion(format!(
                            "table {table}: expected no item with {key}={value}"
                        )))
                    }
                    (None, true) => {}
                    (None, false) => {
                        return Err(ScenarioFault::assertion(format!(
                            "table {table}: no item with {key}={value}"
                        )))
                    }
                    (Some(item), false) => {
                        let item = DynamicValue::Map(item);
                        if let Some(expected) = expect {
                            if !item.contains(expected) {
                                return Err(ScenarioFault::assertion(format!(
                                    "table {table}: item {item} does not contain {expected}"
                                )));
                            }
                        }
                    }
                }
            }

            Step::DeleteItem { table, key, value } => {
                let existed = caps.table(ctx.qualify(table), key).delete(value).await?;
                debug!(table = %table, existed, "item deleted");
            }

            Step::QueryItems {
                table,
                attribute,
                value,
                expect_count,
            } => {
                // The key attribute is irrelevant for attribute queries.
                let items = caps
                    .table(ctx.qualify(table), attribute)
                    .query(attribute, value)
                    .await?;
                check_count("items", *expect_count, items.len())?;
            }

            Step::ScanItems {
                table,
                expect_count,
            } => {
                let items = caps.table(ctx.qualify(table), "").scan().await?;
                check_count("items", *expect_count, items.len())?;
            }

            Step::InvokeFunction {
                function,
                payload,
                expect,
            } => {
                let payload = match payload {
                    DynamicValue::String(raw) => expand(raw, ctx)?,
                    other => other.to_json().to_string(),
                };
                let response = caps.functions.invoke(function, &payload).await?;
                if let Some(expected) = expect {
                    let actual = serde_json::from_str::<serde_json::Value>(&response)
                        .map(DynamicValue::from)
                        .unwrap_or(DynamicValue::String(response));
                    if !actual.contains(expected) {
                        return Err(ScenarioFault::assertion(format!(
                            "function {function}: response {actual} does not contain {expected}"
                        )));
                    }
                }
            }

            Step::SendMessage { queue, body } => {
                let body = expand(body, ctx)?;
                let id = caps.queues.send_message(&ctx.qualify(queue), &body).await?;
                trace!(queue = %queue, message_id = %id, "message sent");
            }

            Step::ReceiveMessages {
                queue,
                max,
                expect_bodies,
                expect_count,
                delete,
            } => {
                let queue_name = ctx.qualify(queue);
                let messages = caps.queues.receive_messages(&queue_name, *max).await?;
                if *delete {
                    for message in &messages {
                        caps.queues
                            .delete_message(&queue_name, &message.receipt_handle)
                            .await?;
                    }
                }
                check_count("messages", *expect_count, messages.len())?;
                if let Some(expected) = expect_bodies {
                    let expected = expected
                        .iter()
                        .map(|body| expand(body, ctx))
                        .collect::<Result<Vec<_>, _>>()?;
                    let bodies: Vec<&str> = messages.iter().map(|m| m.body.as_str()).collect();
                    if bodies != expected {
                        return Err(ScenarioFault::assertion(format!(
                            "queue {queue}: expected bodies {expected:?}, got {bodies:?}"
                        )));
                    }
                }
            }

            Step::Publish { topic, message } => {
                let message = expand(message, ctx)?;
                caps.pubsub.publish(&ctx.qualify(topic), &message).await?;
            }

            Step::SqlQuery {
                statement,
                params,
                expect_count,
                expect,
            } => {
                let rows = caps.relational.query(statement, params).await?;
                check_count("rows", *expect_count, rows.len())?;
                if let Some(expected) = expect {
                    check_count("rows", Some(expected.len()), rows.len())?;
                    for (index, (row, want)) in rows.into_iter().zip(expected).enumerate() {
                        let row = DynamicValue::Map(row);
                        if !row.contains(want) {
                            return Err(ScenarioFault::assertion(format!(
                                "row {index}: {row} does not contain {want}"
                            )));
                        }
                    }
                }
            }

            Step::SqlUpdate {
                statement,
                params,
                expect_affected,
            } => {
                let affected = caps.relational.update(statement, params).await?;
                if let Some(expected) = expect_affected {
                    if affected != *expected {
                        return Err(ScenarioFault::assertion(format!(
                            "expected {expected} affected rows, got {affected}"
                        )));
                    }
                }
            }

            Step::Sleep { ms } => caps.time.sleep_ms(*ms).await,

            Step::Fail { reason } => return Err(ScenarioFault::Failed(expand(reason, ctx)?)),
        }
        Ok(())
    }
}

#[async_trait]
impl ScenarioExecutor for StepInterpreter {
    async fn execute(&self, scenario: &Scenario, context: &ExecutionContext) -> Result<(), ScenarioFault> {
        for (index, step) in scenario.steps().iter().enumerate() {
            trace!(step = index + 1, action = step.action(), "running step");
            self.run_step(step, context)
                .await
                .map_err(|fault| fault.at_step(index + 1, step.action()))?;
        }
        Ok(())
    }
}

fn check_count(what: &str, expected: Option<usize>, actual: usize) -> Result<(), ScenarioFault> {
    match expected {
        Some(expected) if expected != actual => Err(ScenarioFault::assertion(format!(
            "expected {expected} {what}, got {actual}"
        ))),
        _ => Ok(()),
    }
}

/// Replace `${name}` placeholders with context variables
fn expand(template: &str, ctx: &ExecutionContext) -> Result<String, ScenarioFault> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| ScenarioFault::Failed(format!("unterminated placeholder in {template:?}")))?;
        let name = &after[..end];
        let value = ctx
            .variable(name)
            .ok_or_else(|| ScenarioFault::Failed(format!("undefined variable '{name}'")))?;
        out.push_str(value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ScenarioFile;
    use std::sync::Arc;
    use vigil_core::config::EnvironmentProfile;
    use vigil_core::effects::{ObjectStoreEffects, RelationalError, Row};
    use vigil_effects::{
        FunctionRegistryHandler, MemoryKeyValueHandler, MemoryObjectStoreHandler,
        MemoryPubSubHandler, MemoryQueueHandler, RealTimeHandler, StatementRegistryHandler,
    };

    struct Harness {
        interpreter: StepInterpreter,
        objects: MemoryObjectStoreHandler,
        pubsub: MemoryPubSubHandler,
    }

    fn harness() -> Harness {
        let objects = MemoryObjectStoreHandler::new();
        let pubsub = MemoryPubSubHandler::new();
        let functions = FunctionRegistryHandler::with_builtins();
        functions.register("greet", |payload| {
            let value: serde_json::Value = serde_json::from_str(payload).map_err(|e| e.to_string())?;
            let name = value["name"].as_str().unwrap_or("nobody");
            Ok(serde_json::json!({ "greeting": format!("hello {name}") }).to_string())
        });
        let relational = StatementRegistryHandler::new();
        relational.register_query("SELECT id FROM users", |_| {
            Ok(vec![
                Row::from([("id".to_string(), DynamicValue::from(1))]),
                Row::from([("id".to_string(), DynamicValue::from(2))]),
            ])
        });
        relational.register_update("DELETE FROM users WHERE id = ?", |params| match params {
            [DynamicValue::Number(_)] => Ok(1),
            _ => Err(RelationalError::InvalidParameters("expected one id".to_string())),
        });

        let capabilities = Capabilities {
            object_store: Arc::new(objects.clone()),
            key_value: Arc::new(MemoryKeyValueHandler::new()),
            functions: Arc::new(functions),
            queues: Arc::new(MemoryQueueHandler::new()),
            pubsub: Arc::new(pubsub.clone()),
            relational: Arc::new(relational),
            time: Arc::new(RealTimeHandler::new()),
        };
        Harness {
            interpreter: StepInterpreter::new(capabilities),
            objects,
            pubsub,
        }
    }

    fn context() -> ExecutionContext {
        let mut profile = EnvironmentProfile::named("qa");
        profile
            .variables
            .insert("region".to_string(), "eu-west-1".to_string());
        ExecutionContext {
            run_id: "run-7".to_string(),
            environment: "qa".to_string(),
            profile,
        }
    }

    fn scenario(steps: &str) -> Scenario {
        let file: ScenarioFile = toml::from_str(steps).unwrap();
        Scenario::new("test.toml", file)
    }

    async fn run(harness: &Harness, steps: &str) -> Result<(), ScenarioFault> {
        harness.interpreter.execute(&scenario(steps), &context()).await
    }

    #[tokio::test]
    async fn object_steps_use_prefixed_buckets() {
        let harness = harness();
        run(
            &harness,
            r#"
[[steps]]
action = "put_object"
bucket = "fixtures"
key = "hello.txt"
content = "hi from ${region}"

[[steps]]
action = "read_object"
bucket = "fixtures"
key = "hello.txt"
expect = "hi from eu-west-1"

[[steps]]
action = "copy_object"
source_bucket = "fixtures"
source_key = "hello.txt"
dest_bucket = "archive"
dest_key = "copy.txt"

[[steps]]
action = "list_objects"
bucket = "archive"
expect = ["copy.txt"]

[[steps]]
action = "delete_object"
bucket = "fixtures"
key = "hello.txt"

[[steps]]
action = "object_exists"
bucket = "fixtures"
key = "hello.txt"
expect = false
"#,
        )
        .await
        .unwrap();

        assert!(harness.objects.object_exists("qa-archive", "copy.txt").await.unwrap());
    }

    #[tokio::test]
    async fn head_object_checks_length_and_metadata() {
        let harness = harness();
        run(
            &harness,
            r#"
[[steps]]
action = "put_object"
bucket = "fixtures"
key = "report.csv"
content = "id,total"
metadata = { owner = "qa-team", region = "${region}" }

[[steps]]
action = "copy_object"
source_bucket = "fixtures"
source_key = "report.csv"
dest_bucket = "archive"
dest_key = "report.csv"

[[steps]]
action = "head_object"
bucket = "archive"
key = "report.csv"
expect_length = 8
expect_metadata = { region = "eu-west-1" }
"#,
        )
        .await
        .unwrap();

        let err = run(
            &harness,
            r#"
[[steps]]
action = "head_object"
bucket = "archive"
key = "report.csv"
expect_metadata = { owner = "ops" }
"#,
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "step 1 (head_object): assertion failed: object archive/report.csv: metadata owner: expected \"ops\", got Some(\"qa-team\")"
        );
    }

    #[tokio::test]
    async fn delete_objects_removes_listed_keys() {
        let harness = harness();
        for key in ["a.txt", "b.txt", "keep.txt"] {
            harness.objects.write_object("qa-fixtures", key, "x").await.unwrap();
        }

        run(
            &harness,
            r#"
[[steps]]
action = "delete_objects"
bucket = "fixtures"
keys = ["a.txt", "b.txt", "never-written.txt"]

[[steps]]
action = "list_objects"
bucket = "fixtures"
expect = ["keep.txt"]
"#,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn item_steps_round_trip_through_codec() {
        let harness = harness();
        run(
            &harness,
            r#"
[[steps]]
action = "put_item"
table = "orders"
key = "id"
item = { id = "o-1", status = "open", total = 12.5 }

[[steps]]
action = "put_item"
table = "orders"
key = "id"
item = { id = "o-2", status = "open", total = 3 }

[[steps]]
action = "get_item"
table = "orders"
key = "id"
value = "o-1"
expect = { total = 12.5 }

[[steps]]
action = "query_items"
table = "orders"
attribute = "status"
value = "open"
expect_count = 2

[[steps]]
action = "delete_item"
table = "orders"
key = "id"
value = "o-1"

[[steps]]
action = "get_item"
table = "orders"
key = "id"
value = "o-1"
expect_missing = true

[[steps]]
action = "scan_items"
table = "orders"
expect_count = 1
"#,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn messaging_function_and_sql_steps() {
        let harness = harness();
        run(
            &harness,
            r#"
[[steps]]
action = "send_message"
queue = "jobs"
body = "job for ${run_id}"

[[steps]]
action = "receive_messages"
queue = "jobs"
expect_bodies = ["job for run-7"]

[[steps]]
action = "receive_messages"
queue = "jobs"
expect_count = 0

[[steps]]
action = "publish"
topic = "alerts"
message = "deployed to ${environment}"

[[steps]]
action = "invoke_function"
function = "greet"
payload = { name = "vigil" }
expect = { greeting = "hello vigil" }

[[steps]]
action = "sql_query"
statement = "SELECT id FROM users"
expect = [{ id = 1 }, { id = 2 }]

[[steps]]
action = "sql_update"
statement = "DELETE FROM users WHERE id = ?"
params = [1]
expect_affected = 1
"#,
        )
        .await
        .unwrap();

        assert_eq!(harness.pubsub.published("qa-alerts"), vec!["deployed to qa"]);
    }

    #[tokio::test]
    async fn mismatch_reports_the_failing_step() {
        let harness = harness();
        let fault = run(
            &harness,
            r#"
[[steps]]
action = "put_object"
bucket = "fixtures"
key = "a"
content = "actual"

[[steps]]
action = "read_object"
bucket = "fixtures"
key = "a"
expect = "expected"
"#,
        )
        .await
        .unwrap_err();

        assert_eq!(
            fault.to_string(),
            "step 2 (read_object): assertion failed: object fixtures/a: expected \"expected\", got \"actual\""
        );
    }

    #[tokio::test]
    async fn collaborator_errors_fail_the_scenario() {
        let harness = harness();
        let fault = run(&harness, "[[steps]]\naction = \"invoke_function\"\nfunction = \"absent\"\n")
            .await
            .unwrap_err();
        assert_eq!(fault.to_string(), "step 1 (invoke_function): Function not found: absent");

        let fault = run(&harness, "[[steps]]\naction = \"fail\"\nreason = \"bad ${missing}\"\n")
            .await
            .unwrap_err();
        assert_eq!(fault.to_string(), "step 1 (fail): undefined variable 'missing'");
    }

    #[test]
    fn expands_placeholders() {
        let ctx = context();
        assert_eq!(expand("${environment}/${region}", &ctx).unwrap(), "qa/eu-west-1");
        assert_eq!(expand("no placeholders", &ctx).unwrap(), "no placeholders");
        assert!(expand("${unterminated", &ctx).is_err());
    }
}
