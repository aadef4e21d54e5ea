//! Per-analyzer result types
//!
//! One type per analyzer. Results that are "exactly one of a fixed set of
//! shapes" (downloads, jetifier status, configuration-cache compatibility)
//! are sum types so that every consumer, the codec included, has to handle
//! each shape explicitly.

use crate::descriptors::{PluginDescriptor, TaskDescriptor};
use indexmap::IndexMap;
use std::sync::Arc;
use std::time::Duration;

/// One annotation processor and the compile time attributed to it
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationProcessorData {
    pub class_name: String,
    pub compilation_duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnnotationProcessorsResult {
    pub annotation_processors: Vec<AnnotationProcessorData>,
    pub non_incremental_annotation_processors: Vec<AnnotationProcessorData>,
}

/// Why a task re-runs on every build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlwaysRunReason {
    NoOutputsWithActions,
    UpToDateWhenFalse,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlwaysRunTaskData {
    pub task: Arc<TaskDescriptor>,
    pub reason: AlwaysRunReason,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlwaysRunTasksResult {
    pub tasks: Vec<AlwaysRunTaskData>,
}

/// Build time attributed to one plugin on the critical path
#[derive(Debug, Clone, PartialEq)]
pub struct PluginBuildData {
    pub plugin: Arc<PluginDescriptor>,
    pub build_duration_ms: i64,
}

/// The longest dependency chain driving total build duration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CriticalPathResult {
    /// Tasks on the critical path, in execution order
    pub tasks_determining_build_duration: Vec<Arc<TaskDescriptor>>,
    pub plugins_determining_build_duration: Vec<PluginBuildData>,
    pub build_started_timestamp_ms: i64,
    pub build_finished_timestamp_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoncacheableTasksResult {
    pub tasks: Vec<Arc<TaskDescriptor>>,
}

/// One garbage collector and its accumulated pause time
#[derive(Debug, Clone, PartialEq)]
pub struct GarbageCollectionData {
    pub name: String,
    pub collection_time_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GarbageCollectionResult {
    pub events: Vec<GarbageCollectionData>,
    pub java_version: Option<i32>,
    /// Whether the GC setting was explicitly configured; `None` when the
    /// build did not report it.
    pub is_setting_set: Option<bool>,
}

impl GarbageCollectionResult {
    pub fn total_collection_time_ms(&self) -> i64 {
        self.events.iter().map(|e| e.collection_time_ms).sum()
    }
}

/// Where time went while configuring one project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigurationStepKind {
    NotifyingBuildListeners,
    ResolvingDependencies,
    CompilingBuildScripts,
    ExecutingBuildScriptBlocks,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationStep {
    pub kind: ConfigurationStepKind,
    pub configuration_time_ms: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PluginConfigurationData {
    pub plugin: Arc<PluginDescriptor>,
    pub configuration_time_ms: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectConfigurationData {
    pub project_path: String,
    pub total_configuration_time_ms: i64,
    pub plugins_configuration: Vec<PluginConfigurationData>,
    pub configuration_steps: Vec<ConfigurationStep>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectConfigurationResult {
    /// Configuration time accumulated per plugin across all projects
    pub plugin_configuration_times: Vec<PluginConfigurationData>,
    pub projects_configuration: Vec<ProjectConfigurationData>,
    /// Plugins applied per project, in application order
    pub applied_plugins: IndexMap<String, Vec<Arc<PluginDescriptor>>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TasksSharingOutputData {
    pub output_file_path: String,
    pub tasks: Vec<Arc<TaskDescriptor>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TasksSharingOutputResult {
    pub entries: Vec<TasksSharingOutputData>,
}

/// Jetifier usage as determined for the whole project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JetifierUsageStatus {
    AnalyzerNotRun,
    NotUsed,
    UsedCheckRequired,
    CanBeRemoved,
    RequiredForLibraries,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JetifierUsageResult {
    pub status: JetifierUsageStatus,
    pub last_check_timestamp_ms: Option<i64>,
    /// True when this build itself was a jetifier check build
    pub check_jetifier_build: bool,
}

impl Default for JetifierUsageResult {
    fn default() -> Self {
        Self {
            status: JetifierUsageStatus::AnalyzerNotRun,
            last_check_timestamp_ms: None,
            check_jetifier_build: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    Unknown,
    Google,
    MavenCentral,
    JCenter,
    Other,
}

/// An artifact repository downloads were observed against
///
/// `host` is only captured for repositories outside the known set.
#[derive(Debug, Clone, PartialEq)]
pub struct Repository {
    pub repository_type: RepositoryType,
    pub host: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    Success,
    Missed,
    Failure,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadResult {
    pub timestamp_ms: i64,
    pub repository: Repository,
    pub url: String,
    pub status: DownloadStatus,
    pub duration_ms: i64,
    pub bytes: i64,
    pub failure_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryResult {
    pub repository: Repository,
    pub downloads: Vec<DownloadResult>,
}

/// Outcome of the downloads analyzer
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadsResult {
    Active { repositories: Vec<RepositoryResult> },
    /// The build tool in use does not emit download events
    EventsNotProvided,
    AnalyzerDisabled,
}

impl Default for DownloadsResult {
    fn default() -> Self {
        DownloadsResult::AnalyzerDisabled
    }
}

/// Configuration-cache compatibility as of this build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationCachingCompatibility {
    /// The configuration cache was on for this build
    TurnedOn,
    /// This build was the dedicated compatibility trial run
    CompatibilityTestFlow,
    NoIncompatiblePlugins,
    IncompatiblePluginsDetected,
    /// Nothing known, e.g. the result was reloaded from disk
    NoData,
}

impl Default for ConfigurationCachingCompatibility {
    fn default() -> Self {
        ConfigurationCachingCompatibility::NoData
    }
}

/// Project-level build hygiene issues surfaced per task category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskCategoryIssue {
    NonTransitiveRClassDisabled,
    NonFinalResIdsDisabled,
    MinificationEnabledInDebugBuild,
    NonIncrementalAnnotationProcessor,
    ResourceValidationEnabled,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskCategoryWarningsResult {
    pub issues: Vec<TaskCategoryIssue>,
}
