//! Wire → model lifting

use crate::errors::{CodecError, Result};
use crate::frame;
use crate::wire::{self, WireRecord};
use buildlens_model::{
    AlwaysRunTaskData, AlwaysRunTasksResult, AnalyzerResults, AnnotationProcessorData,
    AnnotationProcessorsResult, BuildAnalysisResults, BuildRequest,
    ConfigurationCachingCompatibility, ConfigurationStep, CriticalPathResult, DescriptorPools,
    DownloadResult, DownloadsResult, GarbageCollectionData, GarbageCollectionResult,
    JetifierUsageResult, NoncacheableTasksResult, PluginBuildData, PluginConfigurationData,
    PluginDescriptor, ProjectConfigurationData, ProjectConfigurationResult, Repository,
    RepositoryResult, TaskCategoryWarningsResult, TaskDescriptor, TasksSharingOutputData,
    TasksSharingOutputResult,
};
use indexmap::IndexMap;
use std::path::PathBuf;
use tracing::warn;

/// Decode one byte record back into a results bundle
pub fn decode(bytes: &[u8]) -> Result<BuildAnalysisResults> {
    let (results, _) = decode_prefix(bytes)?;
    Ok(results)
}

/// Decode one record from the front of `bytes`
///
/// Returns the consumed length alongside the results, so concatenated
/// records can be walked.
pub fn decode_prefix(bytes: &[u8]) -> Result<(BuildAnalysisResults, usize)> {
    let (payload, consumed) = frame::read_record(bytes)?;
    let record: WireRecord =
        bincode::deserialize(&payload).map_err(|source| CodecError::Decode { source })?;
    Ok((lift_record(record)?, consumed))
}

fn lift_record(record: WireRecord) -> Result<BuildAnalysisResults> {
    // Both descriptor tables are rebuilt before any analyzer payload is
    // touched: plugins first, then tasks resolving their origin plugin.
    let mut pools = DescriptorPools::new();
    for wire_plugin in &record.plugin_table {
        pools.plugins.intern(PluginDescriptor::new(
            wire_plugin.id_name.clone(),
            wire::plugin_type_from_tag(wire_plugin.plugin_type)?,
        ));
    }
    for wire_task in &record.task_table {
        let origin_plugin = pools.plugins.resolve(&wire_task.origin_plugin_id).ok_or(
            CodecError::MissingPoolEntry {
                kind: "plugin",
                key: wire_task.origin_plugin_id.clone(),
            },
        )?;
        pools.tasks.intern(TaskDescriptor {
            task_name: wire_task.task_name.clone(),
            project_path: wire_task.project_path.clone(),
            origin_plugin,
            execution_start_time: wire_task.execution_start_time,
            execution_end_time: wire_task.execution_end_time,
            execution_mode: wire::execution_mode_from_tag(wire_task.execution_mode)?,
            execution_reasons: wire_task.execution_reasons.clone(),
        });
    }

    // Analyzer sections absent from older records fall back to that
    // analyzer's conservative empty result rather than failing the decode.
    let analyzers = AnalyzerResults {
        annotation_processors: record
            .annotation_processors
            .map(lift_annotation_processors)
            .unwrap_or_default(),
        always_run_tasks: match record.always_run_tasks {
            Some(section) => lift_always_run_tasks(section, &pools)?,
            None => AlwaysRunTasksResult::default(),
        },
        critical_path: match record.critical_path {
            Some(section) => lift_critical_path(section, &pools)?,
            None => CriticalPathResult::default(),
        },
        noncacheable_tasks: match record.noncacheable_tasks {
            Some(section) => lift_noncacheable_tasks(section, &pools)?,
            None => NoncacheableTasksResult::default(),
        },
        garbage_collection: match record.garbage_collection {
            Some(section) => lift_garbage_collection(section)?,
            None => GarbageCollectionResult::default(),
        },
        project_configuration: match record.project_configuration {
            Some(section) => lift_project_configuration(section, &pools)?,
            None => ProjectConfigurationResult::default(),
        },
        tasks_sharing_output: match record.tasks_sharing_output {
            Some(section) => lift_tasks_sharing_output(section, &pools)?,
            None => TasksSharingOutputResult::default(),
        },
        jetifier_usage: match record.jetifier_usage {
            Some(section) => lift_jetifier_usage(section)?,
            None => JetifierUsageResult::default(),
        },
        downloads: match record.downloads {
            Some(section) => lift_downloads(section)?,
            None => DownloadsResult::AnalyzerDisabled,
        },
        // Never persisted; a reloaded result knows nothing about it.
        configuration_caching: ConfigurationCachingCompatibility::NoData,
        task_category_warnings: match record.task_category_warnings {
            Some(section) => lift_task_category_warnings(section)?,
            None => TaskCategoryWarningsResult::default(),
        },
    };

    let request = lift_request(record.request)?;
    Ok(BuildAnalysisResults::new(
        request,
        analyzers,
        record.session_id,
        pools,
    ))
}

fn lift_request(request: wire::WireRequest) -> Result<BuildRequest> {
    Ok(BuildRequest {
        mode: wire::build_mode_from_tag(request.build_mode)?,
        root_project_path: PathBuf::from(request.root_project_path),
        tasks: request.tasks,
        jvm_arguments: request.jvm_arguments,
        command_line_arguments: request.command_line_arguments,
        env: request.env.into_iter().collect(),
        pass_parent_env: request.pass_parent_env,
    })
}

fn lift_annotation_processors(
    section: wire::WireAnnotationProcessors,
) -> AnnotationProcessorsResult {
    let lift = |data: wire::WireAnnotationProcessor| AnnotationProcessorData {
        class_name: data.class_name,
        compilation_duration: data.compilation_duration.to_duration(),
    };
    AnnotationProcessorsResult {
        annotation_processors: section.annotation_processors.into_iter().map(lift).collect(),
        non_incremental_annotation_processors: section
            .non_incremental_annotation_processors
            .into_iter()
            .map(lift)
            .collect(),
    }
}

/// Lenient by design: an entry whose task is gone from the table is dropped
/// instead of failing the whole record.
fn lift_always_run_tasks(
    section: wire::WireAlwaysRunTasks,
    pools: &DescriptorPools,
) -> Result<AlwaysRunTasksResult> {
    let mut tasks = Vec::with_capacity(section.tasks.len());
    for entry in section.tasks {
        let reason = wire::always_run_reason_from_tag(entry.reason)?;
        match pools.tasks.resolve(&entry.task_id) {
            Some(task) => tasks.push(AlwaysRunTaskData { task, reason }),
            None => {
                warn!(task_id = %entry.task_id, "dropping always-run entry for unknown task");
            }
        }
    }
    Ok(AlwaysRunTasksResult { tasks })
}

fn lift_critical_path(
    section: wire::WireCriticalPath,
    pools: &DescriptorPools,
) -> Result<CriticalPathResult> {
    // Task references share the always-run leniency; plugin references do
    // not, a missing plugin here is corruption.
    let mut tasks_determining_build_duration = Vec::with_capacity(section.task_ids.len());
    for task_id in section.task_ids {
        match pools.tasks.resolve(&task_id) {
            Some(task) => tasks_determining_build_duration.push(task),
            None => {
                warn!(task_id = %task_id, "dropping critical-path entry for unknown task");
            }
        }
    }
    let mut plugins_determining_build_duration = Vec::with_capacity(section.plugins.len());
    for plugin_data in section.plugins {
        let plugin =
            pools
                .plugins
                .resolve(&plugin_data.plugin_id)
                .ok_or(CodecError::MissingPoolEntry {
                    kind: "plugin",
                    key: plugin_data.plugin_id.clone(),
                })?;
        plugins_determining_build_duration.push(PluginBuildData {
            plugin,
            build_duration_ms: plugin_data.build_duration_ms,
        });
    }
    Ok(CriticalPathResult {
        tasks_determining_build_duration,
        plugins_determining_build_duration,
        build_started_timestamp_ms: section.build_started_timestamp_ms,
        build_finished_timestamp_ms: section.build_finished_timestamp_ms,
    })
}

fn lift_noncacheable_tasks(
    section: wire::WireNoncacheableTasks,
    pools: &DescriptorPools,
) -> Result<NoncacheableTasksResult> {
    let mut tasks = Vec::with_capacity(section.task_ids.len());
    for task_id in section.task_ids {
        let task = pools
            .tasks
            .resolve(&task_id)
            .ok_or(CodecError::MissingPoolEntry {
                kind: "task",
                key: task_id.clone(),
            })?;
        tasks.push(task);
    }
    Ok(NoncacheableTasksResult { tasks })
}

fn lift_garbage_collection(
    section: wire::WireGarbageCollection,
) -> Result<GarbageCollectionResult> {
    Ok(GarbageCollectionResult {
        events: section
            .events
            .into_iter()
            .map(|event| GarbageCollectionData {
                name: event.name,
                collection_time_ms: event.collection_time_ms,
            })
            .collect(),
        java_version: section.java_version,
        is_setting_set: wire::setting_state_from_tag(section.is_setting_set)?,
    })
}

fn lift_plugin_configuration(
    data: wire::WirePluginConfiguration,
    pools: &DescriptorPools,
) -> Result<PluginConfigurationData> {
    let plugin = pools
        .plugins
        .resolve(&data.plugin_id)
        .ok_or(CodecError::MissingPoolEntry {
            kind: "plugin",
            key: data.plugin_id.clone(),
        })?;
    Ok(PluginConfigurationData {
        plugin,
        configuration_time_ms: data.configuration_time_ms,
    })
}

fn lift_project_configuration(
    section: wire::WireProjectConfiguration,
    pools: &DescriptorPools,
) -> Result<ProjectConfigurationResult> {
    let mut plugin_configuration_times = Vec::with_capacity(section.plugin_configuration_times.len());
    for data in section.plugin_configuration_times {
        plugin_configuration_times.push(lift_plugin_configuration(data, pools)?);
    }

    let mut projects_configuration = Vec::with_capacity(section.projects.len());
    for project in section.projects {
        let mut plugins_configuration = Vec::with_capacity(project.plugins_configuration.len());
        for data in project.plugins_configuration {
            plugins_configuration.push(lift_plugin_configuration(data, pools)?);
        }
        let mut configuration_steps = Vec::with_capacity(project.configuration_steps.len());
        for step in project.configuration_steps {
            configuration_steps.push(ConfigurationStep {
                kind: wire::configuration_step_kind_from_tag(step.kind)?,
                configuration_time_ms: step.configuration_time_ms,
            });
        }
        projects_configuration.push(ProjectConfigurationData {
            project_path: project.project_path,
            total_configuration_time_ms: project.total_configuration_time_ms,
            plugins_configuration,
            configuration_steps,
        });
    }

    let mut applied_plugins = IndexMap::new();
    for entry in section.applied_plugins {
        let mut plugins = Vec::with_capacity(entry.plugin_ids.len());
        for plugin_id in entry.plugin_ids {
            let plugin =
                pools
                    .plugins
                    .resolve(&plugin_id)
                    .ok_or(CodecError::MissingPoolEntry {
                        kind: "plugin",
                        key: plugin_id.clone(),
                    })?;
            plugins.push(plugin);
        }
        applied_plugins.insert(entry.project_path, plugins);
    }

    Ok(ProjectConfigurationResult {
        plugin_configuration_times,
        projects_configuration,
        applied_plugins,
    })
}

fn lift_tasks_sharing_output(
    section: wire::WireTasksSharingOutput,
    pools: &DescriptorPools,
) -> Result<TasksSharingOutputResult> {
    let mut entries = Vec::with_capacity(section.entries.len());
    for entry in section.entries {
        let mut tasks = Vec::with_capacity(entry.task_ids.len());
        for task_id in entry.task_ids {
            let task = pools
                .tasks
                .resolve(&task_id)
                .ok_or(CodecError::MissingPoolEntry {
                    kind: "task",
                    key: task_id.clone(),
                })?;
            tasks.push(task);
        }
        entries.push(TasksSharingOutputData {
            output_file_path: entry.output_file_path,
            tasks,
        });
    }
    Ok(TasksSharingOutputResult { entries })
}

fn lift_jetifier_usage(section: wire::WireJetifierUsage) -> Result<JetifierUsageResult> {
    Ok(JetifierUsageResult {
        status: wire::jetifier_status_from_tag(section.status)?,
        last_check_timestamp_ms: section.last_check_timestamp_ms,
        check_jetifier_build: section.check_jetifier_build,
    })
}

fn lift_repository(repository: wire::WireRepository) -> Result<Repository> {
    Ok(Repository {
        repository_type: wire::repository_type_from_tag(repository.repository_type)?,
        host: repository.host,
    })
}

fn lift_downloads(section: wire::WireDownloads) -> Result<DownloadsResult> {
    match section.status {
        wire::DOWNLOADS_ACTIVE => {
            let mut repositories = Vec::with_capacity(section.repositories.len());
            for repository_result in section.repositories {
                let repository = lift_repository(repository_result.repository)?;
                let mut downloads = Vec::with_capacity(repository_result.downloads.len());
                for download in repository_result.downloads {
                    downloads.push(DownloadResult {
                        timestamp_ms: download.timestamp_ms,
                        repository: lift_repository(download.repository)?,
                        url: download.url,
                        status: wire::download_status_from_tag(download.status)?,
                        duration_ms: download.duration_ms,
                        bytes: download.bytes,
                        failure_message: download.failure_message,
                    });
                }
                repositories.push(RepositoryResult {
                    repository,
                    downloads,
                });
            }
            Ok(DownloadsResult::Active { repositories })
        }
        wire::DOWNLOADS_NO_EVENTS => Ok(DownloadsResult::EventsNotProvided),
        wire::DOWNLOADS_DISABLED => Ok(DownloadsResult::AnalyzerDisabled),
        wire::TAG_UNSPECIFIED => Err(CodecError::MissingValue {
            field: "downloads result status",
        }),
        tag => Err(CodecError::UnrecognizedTag {
            field: "downloads result status",
            tag,
        }),
    }
}

fn lift_task_category_warnings(
    section: wire::WireTaskCategoryWarnings,
) -> Result<TaskCategoryWarningsResult> {
    let mut issues = Vec::with_capacity(section.issues.len());
    for tag in section.issues {
        issues.push(wire::task_category_issue_from_tag(tag)?);
    }
    Ok(TaskCategoryWarningsResult { issues })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame;
    use buildlens_core::BuildSessionId;
    use buildlens_model::JetifierUsageStatus;

    fn wire_plugin(id: &str) -> wire::WirePlugin {
        wire::WirePlugin {
            id_name: id.to_string(),
            plugin_type: 4,
        }
    }

    fn wire_task(project: &str, name: &str, plugin_id: &str) -> wire::WireTask {
        wire::WireTask {
            task_name: name.to_string(),
            project_path: project.to_string(),
            origin_plugin_id: plugin_id.to_string(),
            execution_start_time: 1_000,
            execution_end_time: 1_500,
            execution_mode: 4,
            execution_reasons: vec![],
        }
    }

    /// A minimal record with every analyzer section absent, as an old
    /// writer that predates them all would have produced.
    fn bare_record() -> WireRecord {
        WireRecord {
            request: wire::WireRequest {
                build_mode: wire::TAG_UNSPECIFIED,
                root_project_path: "/work/project".to_string(),
                tasks: vec![],
                jvm_arguments: vec![],
                command_line_arguments: vec![],
                env: vec![],
                pass_parent_env: false,
            },
            annotation_processors: None,
            always_run_tasks: None,
            critical_path: None,
            noncacheable_tasks: None,
            garbage_collection: None,
            project_configuration: None,
            tasks_sharing_output: None,
            jetifier_usage: None,
            downloads: None,
            task_category_warnings: None,
            session_id: BuildSessionId::new("old-record"),
            plugin_table: vec![wire_plugin("com.android.application")],
            task_table: vec![wire_task(":app", "compileDebug", "com.android.application")],
        }
    }

    fn encode_raw(record: &WireRecord) -> Vec<u8> {
        frame::write_record(&bincode::serialize(record).unwrap()).unwrap()
    }

    #[test]
    fn missing_categories_fall_back_to_empty_results() {
        let results = decode(&encode_raw(&bare_record())).unwrap();

        assert_eq!(results.downloads(), &DownloadsResult::AnalyzerDisabled);
        assert_eq!(
            results.configuration_caching(),
            &ConfigurationCachingCompatibility::NoData
        );
        assert_eq!(
            results.jetifier_usage().status,
            JetifierUsageStatus::AnalyzerNotRun
        );
        assert!(results.annotation_processors().annotation_processors.is_empty());
        assert!(results.always_run_tasks().tasks.is_empty());
        assert!(results
            .critical_path()
            .tasks_determining_build_duration
            .is_empty());
        assert!(results.garbage_collection().events.is_empty());
        assert_eq!(results.task_pool().len(), 1);
        assert_eq!(results.plugin_pool().len(), 1);
    }

    #[test]
    fn unrecognized_execution_mode_fails_the_decode() {
        let mut record = bare_record();
        record.task_table[0].execution_mode = 250;
        assert!(matches!(
            decode(&encode_raw(&record)),
            Err(CodecError::UnrecognizedTag {
                field: "task execution mode",
                tag: 250,
            })
        ));
    }

    #[test]
    fn unspecified_execution_mode_fails_the_decode() {
        let mut record = bare_record();
        record.task_table[0].execution_mode = wire::TAG_UNSPECIFIED;
        assert!(matches!(
            decode(&encode_raw(&record)),
            Err(CodecError::MissingValue {
                field: "task execution mode",
            })
        ));
    }

    #[test]
    fn task_with_unknown_origin_plugin_is_corruption() {
        let mut record = bare_record();
        record.task_table[0].origin_plugin_id = "org.gone.plugin".to_string();
        assert!(matches!(
            decode(&encode_raw(&record)),
            Err(CodecError::MissingPoolEntry { kind: "plugin", .. })
        ));
    }

    #[test]
    fn always_run_and_critical_path_drop_unknown_tasks() {
        let mut record = bare_record();
        record.always_run_tasks = Some(wire::WireAlwaysRunTasks {
            tasks: vec![
                wire::WireAlwaysRunTask {
                    task_id: ":app:compileDebug".to_string(),
                    reason: 1,
                },
                wire::WireAlwaysRunTask {
                    task_id: ":gone:task".to_string(),
                    reason: 2,
                },
            ],
        });
        record.critical_path = Some(wire::WireCriticalPath {
            task_ids: vec![":gone:task".to_string(), ":app:compileDebug".to_string()],
            plugins: vec![],
            build_started_timestamp_ms: 0,
            build_finished_timestamp_ms: 10,
        });

        let results = decode(&encode_raw(&record)).unwrap();
        assert_eq!(results.always_run_tasks().tasks.len(), 1);
        assert_eq!(
            results.always_run_tasks().tasks[0].task.task_path(),
            ":app:compileDebug"
        );
        let critical_tasks = &results.critical_path().tasks_determining_build_duration;
        assert_eq!(critical_tasks.len(), 1);
        assert_eq!(critical_tasks[0].task_path(), ":app:compileDebug");
    }

    #[test]
    fn noncacheable_reference_to_unknown_task_is_corruption() {
        let mut record = bare_record();
        record.noncacheable_tasks = Some(wire::WireNoncacheableTasks {
            task_ids: vec![":gone:task".to_string()],
        });
        assert!(matches!(
            decode(&encode_raw(&record)),
            Err(CodecError::MissingPoolEntry { kind: "task", .. })
        ));
    }

    #[test]
    fn tasks_sharing_output_reference_to_unknown_task_is_corruption() {
        let mut record = bare_record();
        record.tasks_sharing_output = Some(wire::WireTasksSharingOutput {
            entries: vec![wire::WireTasksSharingOutputEntry {
                output_file_path: "/out/classes".to_string(),
                task_ids: vec![":gone:task".to_string()],
            }],
        });
        assert!(matches!(
            decode(&encode_raw(&record)),
            Err(CodecError::MissingPoolEntry { kind: "task", .. })
        ));
    }

    #[test]
    fn critical_path_plugin_references_stay_strict() {
        let mut record = bare_record();
        record.critical_path = Some(wire::WireCriticalPath {
            task_ids: vec![],
            plugins: vec![wire::WirePluginBuildData {
                plugin_id: "org.gone.plugin".to_string(),
                build_duration_ms: 100,
            }],
            build_started_timestamp_ms: 0,
            build_finished_timestamp_ms: 10,
        });
        assert!(matches!(
            decode(&encode_raw(&record)),
            Err(CodecError::MissingPoolEntry { kind: "plugin", .. })
        ));
    }

    #[test]
    fn unrecognized_downloads_status_fails_the_decode() {
        let mut record = bare_record();
        record.downloads = Some(wire::WireDownloads {
            status: 9,
            repositories: vec![],
        });
        assert!(matches!(
            decode(&encode_raw(&record)),
            Err(CodecError::UnrecognizedTag {
                field: "downloads result status",
                tag: 9,
            })
        ));
    }

    #[test]
    fn unparsable_payload_is_a_decode_error() {
        let record = frame::write_record(&[0xFF; 16]).unwrap();
        assert!(matches!(decode(&record), Err(CodecError::Decode { .. })));
    }
}
