//! Task and plugin descriptors captured from one build invocation

use std::sync::Arc;

/// How a plugin was brought into the build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginType {
    Unknown,
    Script,
    BuildLocal,
    Binary,
}

/// A plugin observed during the build
///
/// Identity is the plugin id name; two descriptors with the same id name
/// describe the same plugin. Immutable after capture.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PluginDescriptor {
    pub id_name: String,
    pub plugin_type: PluginType,
}

impl PluginDescriptor {
    pub fn new(id_name: impl Into<String>, plugin_type: PluginType) -> Self {
        Self {
            id_name: id_name.into(),
            plugin_type,
        }
    }
}

/// How a task execution was satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskExecutionMode {
    FromCache,
    UpToDate,
    Incremental,
    Full,
}

/// A task executed (or skipped) during the build
///
/// Identity is the task path, `<project path>:<task name>`. Immutable after
/// capture; timestamps are epoch milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDescriptor {
    pub task_name: String,
    pub project_path: String,
    pub origin_plugin: Arc<PluginDescriptor>,
    pub execution_start_time: i64,
    pub execution_end_time: i64,
    pub execution_mode: TaskExecutionMode,
    pub execution_reasons: Vec<String>,
}

impl TaskDescriptor {
    /// The identity key: `<project path>:<task name>`
    pub fn task_path(&self) -> String {
        format!("{}:{}", self.project_path, self.task_name)
    }

    pub fn execution_time_ms(&self) -> i64 {
        self.execution_end_time - self.execution_start_time
    }
}
