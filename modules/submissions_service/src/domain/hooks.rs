//! Extension points
//!
//! Operations expose named interception points. At each point the in-scope
//! request state is snapshotted into a JSON context and run through the
//! registered stages in order. A stage returns a partial patch; a key is
//! applied only if the call site allows it and the stage declared it writable.

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Request state visible to stages
pub type HookContext = Map<String, Value>;

/// Operation a stage attaches to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    ProcessForm,
    CreateSubmission,
    GetSubmission,
    UpdateSubmission,
    DeleteSubmission,
    DeleteSubmissions,
}

/// Where within the operation the stage runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    Start,
    End,
    ManageFiles,
}

type StageFn = dyn Fn(&HookContext) -> anyhow::Result<HookContext> + Send + Sync;

/// One registered interception
pub struct HookStage {
    name: String,
    point: HookPoint,
    phase: HookPhase,
    writable: Vec<String>,
    apply: Box<StageFn>,
}

impl HookStage {
    pub fn new<F>(
        name: impl Into<String>,
        point: HookPoint,
        phase: HookPhase,
        writable: &[&str],
        apply: F,
    ) -> Self
    where
        F: Fn(&HookContext) -> anyhow::Result<HookContext> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            point,
            phase,
            writable: writable.iter().map(|key| key.to_string()).collect(),
            apply: Box::new(apply),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn writes(&self, key: &str) -> bool {
        self.writable.iter().any(|k| k == key)
    }
}

/// Ordered chain of stages
#[derive(Clone, Default)]
pub struct HookRegistry {
    stages: Arc<RwLock<Vec<Arc<HookStage>>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, stage: HookStage) {
        self.stages.write().push(Arc::new(stage));
    }

    pub fn len(&self) -> usize {
        self.stages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.read().is_empty()
    }

    /// Run every stage registered for `point`/`phase` over `context`.
    ///
    /// Stages see the patches of earlier stages. A failing stage is logged
    /// and skipped. Returns the keys some stage actually wrote.
    pub fn dispatch(
        &self,
        point: HookPoint,
        phase: HookPhase,
        context: &mut HookContext,
        whitelist: &[&str],
    ) -> Vec<String> {
        let stages: Vec<Arc<HookStage>> = self
            .stages
            .read()
            .iter()
            .filter(|stage| stage.point == point && stage.phase == phase)
            .cloned()
            .collect();

        let mut written: Vec<String> = Vec::new();
        for stage in stages {
            let patch = match (stage.apply)(context) {
                Ok(patch) => patch,
                Err(e) => {
                    tracing::warn!(stage = %stage.name, ?point, ?phase, "Hook stage failed: {}", e);
                    continue;
                }
            };

            for (key, value) in patch {
                if whitelist.contains(&key.as_str()) && stage.writes(&key) {
                    if !written.contains(&key) {
                        written.push(key.clone());
                    }
                    context.insert(key, value);
                } else {
                    tracing::debug!(stage = %stage.name, key = %key, "Ignoring non-writable hook key");
                }
            }
        }
        written
    }
}

/// Snapshot a value for a hook context; unserializable values become `null`
pub fn to_context_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Read a possibly patched key back out of a context, keeping `current` when
/// the key is gone or no longer has the expected shape
pub fn take_patched<T: DeserializeOwned>(context: &mut HookContext, key: &str, current: T) -> T {
    let Some(value) = context.remove(key) else {
        return current;
    };
    match serde_json::from_value(value) {
        Ok(patched) => patched,
        Err(e) => {
            tracing::warn!(key, "Discarding malformed hook patch: {}", e);
            current
        }
    }
}
