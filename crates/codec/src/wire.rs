//! Wire-level record layout and the enum tag space
//!
//! Everything in this module is plain serde data. Descriptor references are
//! identity keys (task path, plugin id name) into the record's two tables;
//! enum-like fields are raw `u32` tags. Tag 0 is the explicit "unspecified"
//! sentinel in every tag space and is only accepted on decode where the
//! field allows absence; any tag above the known range is "unrecognized"
//! and fails the decode.

use crate::errors::{CodecError, Result};
use buildlens_core::BuildSessionId;
use buildlens_model::{
    AlwaysRunReason, BuildMode, ConfigurationStepKind, DownloadStatus, JetifierUsageStatus,
    PluginType, RepositoryType, TaskCategoryIssue, TaskExecutionMode,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The unspecified sentinel shared by every tag space
pub(crate) const TAG_UNSPECIFIED: u32 = 0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireRecord {
    pub request: WireRequest,
    pub annotation_processors: Option<WireAnnotationProcessors>,
    pub always_run_tasks: Option<WireAlwaysRunTasks>,
    pub critical_path: Option<WireCriticalPath>,
    pub noncacheable_tasks: Option<WireNoncacheableTasks>,
    pub garbage_collection: Option<WireGarbageCollection>,
    pub project_configuration: Option<WireProjectConfiguration>,
    pub tasks_sharing_output: Option<WireTasksSharingOutput>,
    pub jetifier_usage: Option<WireJetifierUsage>,
    pub downloads: Option<WireDownloads>,
    pub task_category_warnings: Option<WireTaskCategoryWarnings>,
    pub session_id: BuildSessionId,
    pub plugin_table: Vec<WirePlugin>,
    pub task_table: Vec<WireTask>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireRequest {
    pub build_mode: u32,
    pub root_project_path: String,
    pub tasks: Vec<String>,
    pub jvm_arguments: Vec<String>,
    pub command_line_arguments: Vec<String>,
    pub env: Vec<(String, String)>,
    pub pass_parent_env: bool,
}

/// A duration as a whole-seconds / nanos-remainder pair, reconstructed
/// exactly on decode
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub(crate) struct WireDuration {
    pub seconds: u64,
    pub nanos: u32,
}

impl From<Duration> for WireDuration {
    fn from(duration: Duration) -> Self {
        Self {
            seconds: duration.as_secs(),
            nanos: duration.subsec_nanos(),
        }
    }
}

impl WireDuration {
    pub(crate) fn to_duration(self) -> Duration {
        Duration::new(self.seconds, self.nanos)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WirePlugin {
    pub id_name: String,
    pub plugin_type: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireTask {
    pub task_name: String,
    pub project_path: String,
    pub origin_plugin_id: String,
    pub execution_start_time: i64,
    pub execution_end_time: i64,
    pub execution_mode: u32,
    pub execution_reasons: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireAnnotationProcessor {
    pub class_name: String,
    pub compilation_duration: WireDuration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireAnnotationProcessors {
    pub annotation_processors: Vec<WireAnnotationProcessor>,
    pub non_incremental_annotation_processors: Vec<WireAnnotationProcessor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireAlwaysRunTask {
    pub task_id: String,
    pub reason: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireAlwaysRunTasks {
    pub tasks: Vec<WireAlwaysRunTask>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WirePluginBuildData {
    pub plugin_id: String,
    pub build_duration_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireCriticalPath {
    pub task_ids: Vec<String>,
    pub plugins: Vec<WirePluginBuildData>,
    pub build_started_timestamp_ms: i64,
    pub build_finished_timestamp_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireNoncacheableTasks {
    pub task_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireGarbageCollectionEvent {
    pub name: String,
    pub collection_time_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireGarbageCollection {
    pub events: Vec<WireGarbageCollectionEvent>,
    pub java_version: Option<i32>,
    /// True/false/unknown as a tag, since absence was historically allowed
    pub is_setting_set: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WirePluginConfiguration {
    pub plugin_id: String,
    pub configuration_time_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireConfigurationStep {
    pub kind: u32,
    pub configuration_time_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireProjectConfigurationData {
    pub project_path: String,
    pub total_configuration_time_ms: i64,
    pub plugins_configuration: Vec<WirePluginConfiguration>,
    pub configuration_steps: Vec<WireConfigurationStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireAppliedPlugins {
    pub project_path: String,
    pub plugin_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireProjectConfiguration {
    pub plugin_configuration_times: Vec<WirePluginConfiguration>,
    pub projects: Vec<WireProjectConfigurationData>,
    pub applied_plugins: Vec<WireAppliedPlugins>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireTasksSharingOutputEntry {
    pub output_file_path: String,
    pub task_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireTasksSharingOutput {
    pub entries: Vec<WireTasksSharingOutputEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireJetifierUsage {
    pub status: u32,
    pub last_check_timestamp_ms: Option<i64>,
    pub check_jetifier_build: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireRepository {
    pub repository_type: u32,
    pub host: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireDownload {
    pub timestamp_ms: i64,
    pub repository: WireRepository,
    pub url: String,
    pub status: u32,
    pub duration_ms: i64,
    pub bytes: i64,
    pub failure_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireRepositoryResult {
    pub repository: WireRepository,
    pub downloads: Vec<WireDownload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireDownloads {
    pub status: u32,
    pub repositories: Vec<WireRepositoryResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireTaskCategoryWarnings {
    pub issues: Vec<u32>,
}

// --- Tag space conversions -------------------------------------------------
//
// Each pair below is the single source of truth for one tag space. Encoding
// never writes the unspecified sentinel except for genuinely absent values;
// decoding distinguishes "unspecified" (tag 0), a known tag, and
// "unrecognized" (anything else).

pub(crate) fn build_mode_tag(mode: Option<BuildMode>) -> u32 {
    match mode {
        None => TAG_UNSPECIFIED,
        Some(BuildMode::Clean) => 1,
        Some(BuildMode::Assemble) => 2,
        Some(BuildMode::Rebuild) => 3,
        Some(BuildMode::CompileJava) => 4,
        Some(BuildMode::SourceGen) => 5,
        Some(BuildMode::Bundle) => 6,
        Some(BuildMode::ApkFromBundle) => 7,
    }
}

/// Build mode historically allowed absence, so tag 0 decodes to `None`
pub(crate) fn build_mode_from_tag(tag: u32) -> Result<Option<BuildMode>> {
    match tag {
        TAG_UNSPECIFIED => Ok(None),
        1 => Ok(Some(BuildMode::Clean)),
        2 => Ok(Some(BuildMode::Assemble)),
        3 => Ok(Some(BuildMode::Rebuild)),
        4 => Ok(Some(BuildMode::CompileJava)),
        5 => Ok(Some(BuildMode::SourceGen)),
        6 => Ok(Some(BuildMode::Bundle)),
        7 => Ok(Some(BuildMode::ApkFromBundle)),
        tag => Err(CodecError::UnrecognizedTag {
            field: "build mode",
            tag,
        }),
    }
}

pub(crate) fn plugin_type_tag(plugin_type: PluginType) -> u32 {
    match plugin_type {
        PluginType::Unknown => 1,
        PluginType::Script => 2,
        PluginType::BuildLocal => 3,
        PluginType::Binary => 4,
    }
}

pub(crate) fn plugin_type_from_tag(tag: u32) -> Result<PluginType> {
    match tag {
        TAG_UNSPECIFIED => Err(CodecError::MissingValue {
            field: "plugin type",
        }),
        1 => Ok(PluginType::Unknown),
        2 => Ok(PluginType::Script),
        3 => Ok(PluginType::BuildLocal),
        4 => Ok(PluginType::Binary),
        tag => Err(CodecError::UnrecognizedTag {
            field: "plugin type",
            tag,
        }),
    }
}

pub(crate) fn execution_mode_tag(mode: TaskExecutionMode) -> u32 {
    match mode {
        TaskExecutionMode::FromCache => 1,
        TaskExecutionMode::UpToDate => 2,
        TaskExecutionMode::Incremental => 3,
        TaskExecutionMode::Full => 4,
    }
}

pub(crate) fn execution_mode_from_tag(tag: u32) -> Result<TaskExecutionMode> {
    match tag {
        TAG_UNSPECIFIED => Err(CodecError::MissingValue {
            field: "task execution mode",
        }),
        1 => Ok(TaskExecutionMode::FromCache),
        2 => Ok(TaskExecutionMode::UpToDate),
        3 => Ok(TaskExecutionMode::Incremental),
        4 => Ok(TaskExecutionMode::Full),
        tag => Err(CodecError::UnrecognizedTag {
            field: "task execution mode",
            tag,
        }),
    }
}

pub(crate) fn always_run_reason_tag(reason: AlwaysRunReason) -> u32 {
    match reason {
        AlwaysRunReason::NoOutputsWithActions => 1,
        AlwaysRunReason::UpToDateWhenFalse => 2,
    }
}

pub(crate) fn always_run_reason_from_tag(tag: u32) -> Result<AlwaysRunReason> {
    match tag {
        TAG_UNSPECIFIED => Err(CodecError::MissingValue {
            field: "always-run reason",
        }),
        1 => Ok(AlwaysRunReason::NoOutputsWithActions),
        2 => Ok(AlwaysRunReason::UpToDateWhenFalse),
        tag => Err(CodecError::UnrecognizedTag {
            field: "always-run reason",
            tag,
        }),
    }
}

pub(crate) fn setting_state_tag(state: Option<bool>) -> u32 {
    match state {
        None => TAG_UNSPECIFIED,
        Some(true) => 1,
        Some(false) => 2,
    }
}

/// The GC setting flag historically allowed absence, so tag 0 decodes to
/// `None`
pub(crate) fn setting_state_from_tag(tag: u32) -> Result<Option<bool>> {
    match tag {
        TAG_UNSPECIFIED => Ok(None),
        1 => Ok(Some(true)),
        2 => Ok(Some(false)),
        tag => Err(CodecError::UnrecognizedTag {
            field: "gc setting state",
            tag,
        }),
    }
}

pub(crate) fn configuration_step_kind_tag(kind: ConfigurationStepKind) -> u32 {
    match kind {
        ConfigurationStepKind::NotifyingBuildListeners => 1,
        ConfigurationStepKind::ResolvingDependencies => 2,
        ConfigurationStepKind::CompilingBuildScripts => 3,
        ConfigurationStepKind::ExecutingBuildScriptBlocks => 4,
        ConfigurationStepKind::Other => 5,
    }
}

pub(crate) fn configuration_step_kind_from_tag(tag: u32) -> Result<ConfigurationStepKind> {
    match tag {
        TAG_UNSPECIFIED => Err(CodecError::MissingValue {
            field: "configuration step kind",
        }),
        1 => Ok(ConfigurationStepKind::NotifyingBuildListeners),
        2 => Ok(ConfigurationStepKind::ResolvingDependencies),
        3 => Ok(ConfigurationStepKind::CompilingBuildScripts),
        4 => Ok(ConfigurationStepKind::ExecutingBuildScriptBlocks),
        5 => Ok(ConfigurationStepKind::Other),
        tag => Err(CodecError::UnrecognizedTag {
            field: "configuration step kind",
            tag,
        }),
    }
}

pub(crate) fn jetifier_status_tag(status: JetifierUsageStatus) -> u32 {
    match status {
        JetifierUsageStatus::AnalyzerNotRun => 1,
        JetifierUsageStatus::NotUsed => 2,
        JetifierUsageStatus::UsedCheckRequired => 3,
        JetifierUsageStatus::CanBeRemoved => 4,
        JetifierUsageStatus::RequiredForLibraries => 5,
    }
}

pub(crate) fn jetifier_status_from_tag(tag: u32) -> Result<JetifierUsageStatus> {
    match tag {
        TAG_UNSPECIFIED => Err(CodecError::MissingValue {
            field: "jetifier usage status",
        }),
        1 => Ok(JetifierUsageStatus::AnalyzerNotRun),
        2 => Ok(JetifierUsageStatus::NotUsed),
        3 => Ok(JetifierUsageStatus::UsedCheckRequired),
        4 => Ok(JetifierUsageStatus::CanBeRemoved),
        5 => Ok(JetifierUsageStatus::RequiredForLibraries),
        tag => Err(CodecError::UnrecognizedTag {
            field: "jetifier usage status",
            tag,
        }),
    }
}

pub(crate) fn repository_type_tag(repository_type: RepositoryType) -> u32 {
    match repository_type {
        RepositoryType::Unknown => 1,
        RepositoryType::Google => 2,
        RepositoryType::MavenCentral => 3,
        RepositoryType::JCenter => 4,
        RepositoryType::Other => 5,
    }
}

pub(crate) fn repository_type_from_tag(tag: u32) -> Result<RepositoryType> {
    match tag {
        TAG_UNSPECIFIED => Err(CodecError::MissingValue {
            field: "repository type",
        }),
        1 => Ok(RepositoryType::Unknown),
        2 => Ok(RepositoryType::Google),
        3 => Ok(RepositoryType::MavenCentral),
        4 => Ok(RepositoryType::JCenter),
        5 => Ok(RepositoryType::Other),
        tag => Err(CodecError::UnrecognizedTag {
            field: "repository type",
            tag,
        }),
    }
}

pub(crate) fn download_status_tag(status: DownloadStatus) -> u32 {
    match status {
        DownloadStatus::Success => 1,
        DownloadStatus::Missed => 2,
        DownloadStatus::Failure => 3,
    }
}

pub(crate) fn download_status_from_tag(tag: u32) -> Result<DownloadStatus> {
    match tag {
        TAG_UNSPECIFIED => Err(CodecError::MissingValue {
            field: "download status",
        }),
        1 => Ok(DownloadStatus::Success),
        2 => Ok(DownloadStatus::Missed),
        3 => Ok(DownloadStatus::Failure),
        tag => Err(CodecError::UnrecognizedTag {
            field: "download status",
            tag,
        }),
    }
}

/// Tag space for the downloads analyzer outcome shape
pub(crate) const DOWNLOADS_ACTIVE: u32 = 1;
pub(crate) const DOWNLOADS_NO_EVENTS: u32 = 2;
pub(crate) const DOWNLOADS_DISABLED: u32 = 3;

pub(crate) fn task_category_issue_tag(issue: TaskCategoryIssue) -> u32 {
    match issue {
        TaskCategoryIssue::NonTransitiveRClassDisabled => 1,
        TaskCategoryIssue::NonFinalResIdsDisabled => 2,
        TaskCategoryIssue::MinificationEnabledInDebugBuild => 3,
        TaskCategoryIssue::NonIncrementalAnnotationProcessor => 4,
        TaskCategoryIssue::ResourceValidationEnabled => 5,
    }
}

pub(crate) fn task_category_issue_from_tag(tag: u32) -> Result<TaskCategoryIssue> {
    match tag {
        TAG_UNSPECIFIED => Err(CodecError::MissingValue {
            field: "task category issue",
        }),
        1 => Ok(TaskCategoryIssue::NonTransitiveRClassDisabled),
        2 => Ok(TaskCategoryIssue::NonFinalResIdsDisabled),
        3 => Ok(TaskCategoryIssue::MinificationEnabledInDebugBuild),
        4 => Ok(TaskCategoryIssue::NonIncrementalAnnotationProcessor),
        5 => Ok(TaskCategoryIssue::ResourceValidationEnabled),
        tag => Err(CodecError::UnrecognizedTag {
            field: "task category issue",
            tag,
        }),
    }
}
