//! End-to-end round-trip coverage for the record codec

use buildlens_codec::{decode, decode_prefix, encode};
use buildlens_core::BuildSessionId;
use buildlens_model::{
    AlwaysRunReason, AlwaysRunTaskData, AlwaysRunTasksResult, AnalyzerResults,
    AnnotationProcessorData, AnnotationProcessorsResult, BuildAnalysisResults, BuildMode,
    BuildRequest, ConfigurationCachingCompatibility, ConfigurationStep, ConfigurationStepKind,
    CriticalPathResult, DescriptorPools, DownloadResult, DownloadStatus, DownloadsResult,
    GarbageCollectionData, GarbageCollectionResult, JetifierUsageResult, JetifierUsageStatus,
    NoncacheableTasksResult, PluginBuildData, PluginConfigurationData, PluginDescriptor,
    PluginType, ProjectConfigurationData, ProjectConfigurationResult, Repository,
    RepositoryResult, RepositoryType, TaskCategoryIssue, TaskCategoryWarningsResult,
    TaskDescriptor, TaskExecutionMode, TasksSharingOutputData, TasksSharingOutputResult,
};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn task(
    pools: &mut DescriptorPools,
    project: &str,
    name: &str,
    plugin: &Arc<PluginDescriptor>,
    start: i64,
    end: i64,
    mode: TaskExecutionMode,
) -> Arc<TaskDescriptor> {
    pools.intern_task(TaskDescriptor {
        task_name: name.to_string(),
        project_path: project.to_string(),
        origin_plugin: Arc::clone(plugin),
        execution_start_time: start,
        execution_end_time: end,
        execution_mode: mode,
        execution_reasons: vec!["Task has not declared any outputs".to_string()],
    })
}

/// A results bundle exercising every analyzer category and every shared
/// descriptor path.
fn full_fixture() -> BuildAnalysisResults {
    let mut pools = DescriptorPools::new();
    let android_plugin = pools.intern_plugin(PluginDescriptor::new(
        "com.android.application",
        PluginType::Binary,
    ));
    let script_plugin = pools.intern_plugin(PluginDescriptor::new("build.gradle", PluginType::Script));

    let compile_app = task(
        &mut pools,
        ":app",
        "compileDebug",
        &android_plugin,
        11_000,
        11_500,
        TaskExecutionMode::Full,
    );
    let compile_lib = task(
        &mut pools,
        ":lib",
        "compileDebug",
        &android_plugin,
        10_400,
        10_400,
        TaskExecutionMode::UpToDate,
    );
    let merge_resources = task(
        &mut pools,
        ":app",
        "mergeDebugResources",
        &script_plugin,
        10_600,
        10_900,
        TaskExecutionMode::Incremental,
    );

    let analyzers = AnalyzerResults {
        annotation_processors: AnnotationProcessorsResult {
            annotation_processors: vec![AnnotationProcessorData {
                class_name: "com.google.dagger.processor.ComponentProcessor".to_string(),
                compilation_duration: Duration::new(2, 345_678_901),
            }],
            non_incremental_annotation_processors: vec![AnnotationProcessorData {
                class_name: "org.example.LegacyProcessor".to_string(),
                compilation_duration: Duration::from_millis(410),
            }],
        },
        always_run_tasks: AlwaysRunTasksResult {
            tasks: vec![AlwaysRunTaskData {
                task: Arc::clone(&merge_resources),
                reason: AlwaysRunReason::NoOutputsWithActions,
            }],
        },
        critical_path: CriticalPathResult {
            tasks_determining_build_duration: vec![
                Arc::clone(&compile_app),
                Arc::clone(&compile_lib),
            ],
            plugins_determining_build_duration: vec![PluginBuildData {
                plugin: Arc::clone(&android_plugin),
                build_duration_ms: 500,
            }],
            build_started_timestamp_ms: 10_000,
            build_finished_timestamp_ms: 12_000,
        },
        noncacheable_tasks: NoncacheableTasksResult {
            tasks: vec![Arc::clone(&merge_resources)],
        },
        garbage_collection: GarbageCollectionResult {
            events: vec![GarbageCollectionData {
                name: "G1 Young Generation".to_string(),
                collection_time_ms: 64,
            }],
            java_version: Some(17),
            is_setting_set: Some(false),
        },
        project_configuration: ProjectConfigurationResult {
            plugin_configuration_times: vec![PluginConfigurationData {
                plugin: Arc::clone(&android_plugin),
                configuration_time_ms: 180,
            }],
            projects_configuration: vec![ProjectConfigurationData {
                project_path: ":app".to_string(),
                total_configuration_time_ms: 260,
                plugins_configuration: vec![PluginConfigurationData {
                    plugin: Arc::clone(&android_plugin),
                    configuration_time_ms: 180,
                }],
                configuration_steps: vec![ConfigurationStep {
                    kind: ConfigurationStepKind::ResolvingDependencies,
                    configuration_time_ms: 70,
                }],
            }],
            applied_plugins: [(
                ":app".to_string(),
                vec![Arc::clone(&android_plugin), Arc::clone(&script_plugin)],
            )]
            .into_iter()
            .collect(),
        },
        tasks_sharing_output: TasksSharingOutputResult {
            entries: vec![TasksSharingOutputData {
                output_file_path: "/work/project/app/build/out".to_string(),
                tasks: vec![Arc::clone(&compile_app), Arc::clone(&merge_resources)],
            }],
        },
        jetifier_usage: JetifierUsageResult {
            status: JetifierUsageStatus::CanBeRemoved,
            last_check_timestamp_ms: Some(9_000),
            check_jetifier_build: true,
        },
        downloads: DownloadsResult::Active {
            repositories: vec![RepositoryResult {
                repository: Repository {
                    repository_type: RepositoryType::Google,
                    host: None,
                },
                downloads: vec![DownloadResult {
                    timestamp_ms: 10_050,
                    repository: Repository {
                        repository_type: RepositoryType::Google,
                        host: None,
                    },
                    url: "https://dl.google.com/android/gradle.pom".to_string(),
                    status: DownloadStatus::Success,
                    duration_ms: 35,
                    bytes: 4_096,
                    failure_message: None,
                }],
            }],
        },
        configuration_caching: ConfigurationCachingCompatibility::NoData,
        task_category_warnings: TaskCategoryWarningsResult {
            issues: vec![
                TaskCategoryIssue::NonTransitiveRClassDisabled,
                TaskCategoryIssue::ResourceValidationEnabled,
            ],
        },
    };

    let request = BuildRequest {
        mode: Some(BuildMode::Assemble),
        root_project_path: "/work/project".into(),
        tasks: vec!["assembleDebug".to_string()],
        jvm_arguments: vec!["-Xmx4g".to_string()],
        command_line_arguments: vec!["--stacktrace".to_string()],
        env: [("JAVA_HOME".to_string(), "/opt/jdk17".to_string())]
            .into_iter()
            .collect(),
        pass_parent_env: true,
    };

    BuildAnalysisResults::new(request, analyzers, BuildSessionId::new("b-full"), pools)
}

#[test]
fn full_fixture_round_trips_field_for_field() {
    let original = full_fixture();
    let decoded = decode(&encode(&original).unwrap()).unwrap();
    assert_eq!(decoded, original);
}

#[test]
fn derived_accessors_survive_the_round_trip() {
    let original = full_fixture();
    let decoded = decode(&encode(&original).unwrap()).unwrap();

    assert_eq!(decoded.total_build_time_ms(), original.total_build_time_ms());
    assert_eq!(
        decoded.configuration_phase_time_ms(),
        original.configuration_phase_time_ms()
    );
    assert_eq!(
        decoded.total_configuration_data(),
        original.total_configuration_data()
    );
    assert!(!decoded.build_uses_configuration_cache());
}

#[test]
fn shared_plugin_is_written_once() {
    // The android plugin is referenced from the critical path, the project
    // configuration and two task descriptors; the decoded pool must still
    // hold exactly one copy of it.
    let decoded = decode(&encode(&full_fixture()).unwrap()).unwrap();

    assert_eq!(decoded.plugin_pool().len(), 2);
    let android = decoded.plugin_pool().resolve("com.android.application").unwrap();
    let from_critical_path = &decoded.critical_path().plugins_determining_build_duration[0].plugin;
    let from_configuration = &decoded.project_configuration().plugin_configuration_times[0].plugin;
    let from_task = &decoded
        .task_pool()
        .resolve(":app:compileDebug")
        .unwrap()
        .origin_plugin;
    assert!(Arc::ptr_eq(&android, from_critical_path));
    assert!(Arc::ptr_eq(&android, from_configuration));
    assert!(Arc::ptr_eq(&android, from_task));
}

#[test]
fn critical_path_order_is_preserved() {
    let decoded = decode(&encode(&full_fixture()).unwrap()).unwrap();
    let order: Vec<String> = decoded
        .critical_path()
        .tasks_determining_build_duration
        .iter()
        .map(|task| task.task_path())
        .collect();
    assert_eq!(order, vec![":app:compileDebug", ":lib:compileDebug"]);
}

#[test]
fn decode_prefix_reports_consumed_length() {
    let record = encode(&full_fixture()).unwrap();
    let mut buffer = record.clone();
    buffer.extend_from_slice(b"trailing garbage");

    let (decoded, consumed) = decode_prefix(&buffer).unwrap();
    assert_eq!(consumed, record.len());
    assert_eq!(decoded.session_id().as_str(), "b-full");
}

// --- Property-based round trip --------------------------------------------

fn execution_mode_strategy() -> impl Strategy<Value = TaskExecutionMode> {
    prop_oneof![
        Just(TaskExecutionMode::FromCache),
        Just(TaskExecutionMode::UpToDate),
        Just(TaskExecutionMode::Incremental),
        Just(TaskExecutionMode::Full),
    ]
}

fn build_mode_strategy() -> impl Strategy<Value = Option<BuildMode>> {
    prop_oneof![
        Just(None),
        Just(Some(BuildMode::Clean)),
        Just(Some(BuildMode::Assemble)),
        Just(Some(BuildMode::Rebuild)),
        Just(Some(BuildMode::CompileJava)),
        Just(Some(BuildMode::SourceGen)),
        Just(Some(BuildMode::Bundle)),
        Just(Some(BuildMode::ApkFromBundle)),
    ]
}

#[derive(Debug, Clone)]
struct TaskSpec {
    name: String,
    project: String,
    start: i64,
    duration: i64,
    mode: TaskExecutionMode,
}

fn task_spec_strategy() -> impl Strategy<Value = TaskSpec> {
    (
        "[a-z][a-zA-Z0-9]{0,12}",
        "(:[a-z]{1,8}){1,2}",
        0i64..1_000_000,
        0i64..100_000,
        execution_mode_strategy(),
    )
        .prop_map(|(name, project, start, duration, mode)| TaskSpec {
            name,
            project,
            start,
            duration,
            mode,
        })
}

fn results_from_specs(
    session: String,
    mode: Option<BuildMode>,
    specs: Vec<TaskSpec>,
    gc_setting: Option<bool>,
) -> BuildAnalysisResults {
    let mut pools = DescriptorPools::new();
    let plugin = pools.intern_plugin(PluginDescriptor::new(
        "com.android.application",
        PluginType::Binary,
    ));
    let tasks: Vec<_> = specs
        .iter()
        .map(|spec| {
            pools.intern_task(TaskDescriptor {
                task_name: spec.name.clone(),
                project_path: spec.project.clone(),
                origin_plugin: Arc::clone(&plugin),
                execution_start_time: spec.start,
                execution_end_time: spec.start + spec.duration,
                execution_mode: spec.mode,
                execution_reasons: vec![],
            })
        })
        .collect();

    let analyzers = AnalyzerResults {
        critical_path: CriticalPathResult {
            tasks_determining_build_duration: tasks.clone(),
            plugins_determining_build_duration: vec![],
            build_started_timestamp_ms: 0,
            build_finished_timestamp_ms: 2_000_000,
        },
        garbage_collection: GarbageCollectionResult {
            events: vec![],
            java_version: None,
            is_setting_set: gc_setting,
        },
        ..Default::default()
    };

    let request = BuildRequest {
        mode,
        root_project_path: "/work/project".into(),
        ..Default::default()
    };
    BuildAnalysisResults::new(request, analyzers, BuildSessionId::new(session), pools)
}

proptest! {
    #[test]
    fn generated_results_round_trip(
        session in "[a-z0-9-]{1,24}",
        mode in build_mode_strategy(),
        specs in prop::collection::vec(task_spec_strategy(), 0..8),
        gc_setting in prop_oneof![Just(None), Just(Some(true)), Just(Some(false))],
    ) {
        let original = results_from_specs(session, mode, specs, gc_setting);
        let decoded = decode(&encode(&original).unwrap()).unwrap();
        prop_assert_eq!(decoded, original);
    }
}
