//! Model → wire lowering

use crate::errors::{CodecError, Result};
use crate::frame;
use crate::wire::{self, WireRecord};
use buildlens_model::{
    AlwaysRunTasksResult, AnalyzerResultView, AnnotationProcessorData, AnnotationProcessorsResult,
    BuildAnalysisResults, BuildRequest, CriticalPathResult, DownloadResult, DownloadsResult,
    GarbageCollectionResult, JetifierUsageResult, NoncacheableTasksResult, PluginDescriptor,
    ProjectConfigurationData, ProjectConfigurationResult, Repository, TaskCategoryWarningsResult,
    TaskDescriptor, TasksSharingOutputResult,
};
use indexmap::IndexMap;
use std::sync::Arc;

/// Encode one results bundle into a self-describing byte record
pub fn encode(results: &BuildAnalysisResults) -> Result<Vec<u8>> {
    let record = lower_record(results);
    let payload = bincode::serialize(&record).map_err(|source| CodecError::Encode { source })?;
    frame::write_record(&payload)
}

/// Ordered descriptor tables built by the flattening pass
///
/// A descriptor referenced from several analyzer results (or nested inside
/// another descriptor, like a task's origin plugin) is entered exactly once,
/// keyed by its identity.
#[derive(Default)]
struct EntityTables {
    plugins: IndexMap<String, Arc<PluginDescriptor>>,
    tasks: IndexMap<String, Arc<TaskDescriptor>>,
}

impl EntityTables {
    fn add_plugin(&mut self, plugin: &Arc<PluginDescriptor>) {
        self.plugins
            .entry(plugin.id_name.clone())
            .or_insert_with(|| Arc::clone(plugin));
    }

    fn add_task(&mut self, task: &Arc<TaskDescriptor>) {
        self.add_plugin(&task.origin_plugin);
        self.tasks
            .entry(task.task_path())
            .or_insert_with(|| Arc::clone(task));
    }

    fn collect(&mut self, view: AnalyzerResultView<'_>) {
        match view {
            AnalyzerResultView::AlwaysRunTasks(result) => {
                for entry in &result.tasks {
                    self.add_task(&entry.task);
                }
            }
            AnalyzerResultView::CriticalPath(result) => {
                for task in &result.tasks_determining_build_duration {
                    self.add_task(task);
                }
                for plugin_data in &result.plugins_determining_build_duration {
                    self.add_plugin(&plugin_data.plugin);
                }
            }
            AnalyzerResultView::NoncacheableTasks(result) => {
                for task in &result.tasks {
                    self.add_task(task);
                }
            }
            AnalyzerResultView::ProjectConfiguration(result) => {
                for plugin_data in &result.plugin_configuration_times {
                    self.add_plugin(&plugin_data.plugin);
                }
                for project in &result.projects_configuration {
                    for plugin_data in &project.plugins_configuration {
                        self.add_plugin(&plugin_data.plugin);
                    }
                }
                for plugins in result.applied_plugins.values() {
                    for plugin in plugins {
                        self.add_plugin(plugin);
                    }
                }
            }
            AnalyzerResultView::TasksSharingOutput(result) => {
                for entry in &result.entries {
                    for task in &entry.tasks {
                        self.add_task(task);
                    }
                }
            }
            // No descriptor references in these categories.
            AnalyzerResultView::AnnotationProcessors(_)
            | AnalyzerResultView::GarbageCollection(_)
            | AnalyzerResultView::JetifierUsage(_)
            | AnalyzerResultView::Downloads(_)
            | AnalyzerResultView::ConfigurationCaching(_)
            | AnalyzerResultView::TaskCategoryWarnings(_) => {}
        }
    }
}

fn lower_record(results: &BuildAnalysisResults) -> WireRecord {
    // One interning pass: seed from the pools so table order matches the
    // capture order, then walk every analyzer category for anything the
    // pools missed.
    let mut tables = EntityTables::default();
    for plugin in results.plugin_pool().iter() {
        tables.add_plugin(plugin);
    }
    for task in results.task_pool().iter() {
        tables.add_task(task);
    }
    for view in results.analyzers().views() {
        tables.collect(view);
    }

    let analyzers = results.analyzers();
    WireRecord {
        request: lower_request(results.request()),
        annotation_processors: Some(lower_annotation_processors(&analyzers.annotation_processors)),
        always_run_tasks: Some(lower_always_run_tasks(&analyzers.always_run_tasks)),
        critical_path: Some(lower_critical_path(&analyzers.critical_path)),
        noncacheable_tasks: Some(lower_noncacheable_tasks(&analyzers.noncacheable_tasks)),
        garbage_collection: Some(lower_garbage_collection(&analyzers.garbage_collection)),
        project_configuration: Some(lower_project_configuration(
            &analyzers.project_configuration,
        )),
        tasks_sharing_output: Some(lower_tasks_sharing_output(&analyzers.tasks_sharing_output)),
        jetifier_usage: Some(lower_jetifier_usage(&analyzers.jetifier_usage)),
        downloads: Some(lower_downloads(&analyzers.downloads)),
        task_category_warnings: Some(lower_task_category_warnings(
            &analyzers.task_category_warnings,
        )),
        session_id: results.session_id().clone(),
        plugin_table: tables
            .plugins
            .values()
            .map(|plugin| wire::WirePlugin {
                id_name: plugin.id_name.clone(),
                plugin_type: wire::plugin_type_tag(plugin.plugin_type),
            })
            .collect(),
        task_table: tables.tasks.values().map(|task| lower_task(task)).collect(),
    }
}

fn lower_request(request: &BuildRequest) -> wire::WireRequest {
    wire::WireRequest {
        build_mode: wire::build_mode_tag(request.mode),
        root_project_path: request.root_project_path.to_string_lossy().into_owned(),
        tasks: request.tasks.clone(),
        jvm_arguments: request.jvm_arguments.clone(),
        command_line_arguments: request.command_line_arguments.clone(),
        env: request
            .env
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
        pass_parent_env: request.pass_parent_env,
    }
}

fn lower_task(task: &TaskDescriptor) -> wire::WireTask {
    wire::WireTask {
        task_name: task.task_name.clone(),
        project_path: task.project_path.clone(),
        origin_plugin_id: task.origin_plugin.id_name.clone(),
        execution_start_time: task.execution_start_time,
        execution_end_time: task.execution_end_time,
        execution_mode: wire::execution_mode_tag(task.execution_mode),
        execution_reasons: task.execution_reasons.clone(),
    }
}

fn lower_annotation_processor(data: &AnnotationProcessorData) -> wire::WireAnnotationProcessor {
    wire::WireAnnotationProcessor {
        class_name: data.class_name.clone(),
        compilation_duration: data.compilation_duration.into(),
    }
}

fn lower_annotation_processors(
    result: &AnnotationProcessorsResult,
) -> wire::WireAnnotationProcessors {
    wire::WireAnnotationProcessors {
        annotation_processors: result
            .annotation_processors
            .iter()
            .map(lower_annotation_processor)
            .collect(),
        non_incremental_annotation_processors: result
            .non_incremental_annotation_processors
            .iter()
            .map(lower_annotation_processor)
            .collect(),
    }
}

fn lower_always_run_tasks(result: &AlwaysRunTasksResult) -> wire::WireAlwaysRunTasks {
    wire::WireAlwaysRunTasks {
        tasks: result
            .tasks
            .iter()
            .map(|entry| wire::WireAlwaysRunTask {
                task_id: entry.task.task_path(),
                reason: wire::always_run_reason_tag(entry.reason),
            })
            .collect(),
    }
}

fn lower_critical_path(result: &CriticalPathResult) -> wire::WireCriticalPath {
    wire::WireCriticalPath {
        task_ids: result
            .tasks_determining_build_duration
            .iter()
            .map(|task| task.task_path())
            .collect(),
        plugins: result
            .plugins_determining_build_duration
            .iter()
            .map(|plugin_data| wire::WirePluginBuildData {
                plugin_id: plugin_data.plugin.id_name.clone(),
                build_duration_ms: plugin_data.build_duration_ms,
            })
            .collect(),
        build_started_timestamp_ms: result.build_started_timestamp_ms,
        build_finished_timestamp_ms: result.build_finished_timestamp_ms,
    }
}

fn lower_noncacheable_tasks(result: &NoncacheableTasksResult) -> wire::WireNoncacheableTasks {
    wire::WireNoncacheableTasks {
        task_ids: result.tasks.iter().map(|task| task.task_path()).collect(),
    }
}

fn lower_garbage_collection(result: &GarbageCollectionResult) -> wire::WireGarbageCollection {
    wire::WireGarbageCollection {
        events: result
            .events
            .iter()
            .map(|event| wire::WireGarbageCollectionEvent {
                name: event.name.clone(),
                collection_time_ms: event.collection_time_ms,
            })
            .collect(),
        java_version: result.java_version,
        is_setting_set: wire::setting_state_tag(result.is_setting_set),
    }
}

fn lower_project_configuration_data(
    project: &ProjectConfigurationData,
) -> wire::WireProjectConfigurationData {
    wire::WireProjectConfigurationData {
        project_path: project.project_path.clone(),
        total_configuration_time_ms: project.total_configuration_time_ms,
        plugins_configuration: project
            .plugins_configuration
            .iter()
            .map(|plugin_data| wire::WirePluginConfiguration {
                plugin_id: plugin_data.plugin.id_name.clone(),
                configuration_time_ms: plugin_data.configuration_time_ms,
            })
            .collect(),
        configuration_steps: project
            .configuration_steps
            .iter()
            .map(|step| wire::WireConfigurationStep {
                kind: wire::configuration_step_kind_tag(step.kind),
                configuration_time_ms: step.configuration_time_ms,
            })
            .collect(),
    }
}

fn lower_project_configuration(
    result: &ProjectConfigurationResult,
) -> wire::WireProjectConfiguration {
    wire::WireProjectConfiguration {
        plugin_configuration_times: result
            .plugin_configuration_times
            .iter()
            .map(|plugin_data| wire::WirePluginConfiguration {
                plugin_id: plugin_data.plugin.id_name.clone(),
                configuration_time_ms: plugin_data.configuration_time_ms,
            })
            .collect(),
        projects: result
            .projects_configuration
            .iter()
            .map(lower_project_configuration_data)
            .collect(),
        applied_plugins: result
            .applied_plugins
            .iter()
            .map(|(project_path, plugins)| wire::WireAppliedPlugins {
                project_path: project_path.clone(),
                plugin_ids: plugins.iter().map(|p| p.id_name.clone()).collect(),
            })
            .collect(),
    }
}

fn lower_tasks_sharing_output(result: &TasksSharingOutputResult) -> wire::WireTasksSharingOutput {
    wire::WireTasksSharingOutput {
        entries: result
            .entries
            .iter()
            .map(|entry| wire::WireTasksSharingOutputEntry {
                output_file_path: entry.output_file_path.clone(),
                task_ids: entry.tasks.iter().map(|task| task.task_path()).collect(),
            })
            .collect(),
    }
}

fn lower_jetifier_usage(result: &JetifierUsageResult) -> wire::WireJetifierUsage {
    wire::WireJetifierUsage {
        status: wire::jetifier_status_tag(result.status),
        last_check_timestamp_ms: result.last_check_timestamp_ms,
        check_jetifier_build: result.check_jetifier_build,
    }
}

fn lower_repository(repository: &Repository) -> wire::WireRepository {
    wire::WireRepository {
        repository_type: wire::repository_type_tag(repository.repository_type),
        host: repository.host.clone(),
    }
}

fn lower_download(download: &DownloadResult) -> wire::WireDownload {
    wire::WireDownload {
        timestamp_ms: download.timestamp_ms,
        repository: lower_repository(&download.repository),
        url: download.url.clone(),
        status: wire::download_status_tag(download.status),
        duration_ms: download.duration_ms,
        bytes: download.bytes,
        failure_message: download.failure_message.clone(),
    }
}

fn lower_downloads(result: &DownloadsResult) -> wire::WireDownloads {
    match result {
        DownloadsResult::Active { repositories } => wire::WireDownloads {
            status: wire::DOWNLOADS_ACTIVE,
            repositories: repositories
                .iter()
                .map(|repository_result| wire::WireRepositoryResult {
                    repository: lower_repository(&repository_result.repository),
                    downloads: repository_result.downloads.iter().map(lower_download).collect(),
                })
                .collect(),
        },
        DownloadsResult::EventsNotProvided => wire::WireDownloads {
            status: wire::DOWNLOADS_NO_EVENTS,
            repositories: vec![],
        },
        DownloadsResult::AnalyzerDisabled => wire::WireDownloads {
            status: wire::DOWNLOADS_DISABLED,
            repositories: vec![],
        },
    }
}

fn lower_task_category_warnings(
    result: &TaskCategoryWarningsResult,
) -> wire::WireTaskCategoryWarnings {
    wire::WireTaskCategoryWarnings {
        issues: result
            .issues
            .iter()
            .map(|issue| wire::task_category_issue_tag(*issue))
            .collect(),
    }
}
