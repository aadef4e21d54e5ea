//! The per-build analysis results bundle and its derived computations

use crate::analyzers::{
    AlwaysRunTasksResult, AnnotationProcessorsResult, ConfigurationCachingCompatibility,
    ConfigurationStep, ConfigurationStepKind, CriticalPathResult, DownloadsResult,
    GarbageCollectionResult, JetifierUsageResult, NoncacheableTasksResult, PluginConfigurationData,
    ProjectConfigurationResult, TaskCategoryWarningsResult, TasksSharingOutputResult,
};
use crate::descriptors::PluginDescriptor;
use crate::pool::{DescriptorPools, Pool};
use buildlens_core::BuildSessionId;
use indexmap::IndexMap;
use std::path::PathBuf;
use std::sync::Arc;

/// What kind of build was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Clean,
    Assemble,
    Rebuild,
    CompileJava,
    SourceGen,
    Bundle,
    ApkFromBundle,
}

/// Metadata of the build invocation the results were captured from
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BuildRequest {
    pub mode: Option<BuildMode>,
    pub root_project_path: PathBuf,
    /// Tasks named on the invocation
    pub tasks: Vec<String>,
    pub jvm_arguments: Vec<String>,
    pub command_line_arguments: Vec<String>,
    pub env: IndexMap<String, String>,
    pub pass_parent_env: bool,
}

/// One result per analyzer
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalyzerResults {
    pub annotation_processors: AnnotationProcessorsResult,
    pub always_run_tasks: AlwaysRunTasksResult,
    pub critical_path: CriticalPathResult,
    pub noncacheable_tasks: NoncacheableTasksResult,
    pub garbage_collection: GarbageCollectionResult,
    pub project_configuration: ProjectConfigurationResult,
    pub tasks_sharing_output: TasksSharingOutputResult,
    pub jetifier_usage: JetifierUsageResult,
    pub downloads: DownloadsResult,
    pub configuration_caching: ConfigurationCachingCompatibility,
    pub task_category_warnings: TaskCategoryWarningsResult,
}

/// Borrowed view of a single analyzer's result
///
/// Exactly one variant per analyzer, so a pass over all categories (such as
/// the codec's descriptor-flattening walk) is an exhaustive match the
/// compiler checks when an analyzer is added.
#[derive(Debug, Clone, Copy)]
pub enum AnalyzerResultView<'a> {
    AnnotationProcessors(&'a AnnotationProcessorsResult),
    AlwaysRunTasks(&'a AlwaysRunTasksResult),
    CriticalPath(&'a CriticalPathResult),
    NoncacheableTasks(&'a NoncacheableTasksResult),
    GarbageCollection(&'a GarbageCollectionResult),
    ProjectConfiguration(&'a ProjectConfigurationResult),
    TasksSharingOutput(&'a TasksSharingOutputResult),
    JetifierUsage(&'a JetifierUsageResult),
    Downloads(&'a DownloadsResult),
    ConfigurationCaching(&'a ConfigurationCachingCompatibility),
    TaskCategoryWarnings(&'a TaskCategoryWarningsResult),
}

impl AnalyzerResults {
    /// All analyzer results, one view per category
    pub fn views(&self) -> [AnalyzerResultView<'_>; 11] {
        [
            AnalyzerResultView::AnnotationProcessors(&self.annotation_processors),
            AnalyzerResultView::AlwaysRunTasks(&self.always_run_tasks),
            AnalyzerResultView::CriticalPath(&self.critical_path),
            AnalyzerResultView::NoncacheableTasks(&self.noncacheable_tasks),
            AnalyzerResultView::GarbageCollection(&self.garbage_collection),
            AnalyzerResultView::ProjectConfiguration(&self.project_configuration),
            AnalyzerResultView::TasksSharingOutput(&self.tasks_sharing_output),
            AnalyzerResultView::JetifierUsage(&self.jetifier_usage),
            AnalyzerResultView::Downloads(&self.downloads),
            AnalyzerResultView::ConfigurationCaching(&self.configuration_caching),
            AnalyzerResultView::TaskCategoryWarnings(&self.task_category_warnings),
        ]
    }
}

/// Per-project configuration data merged across the whole build
#[derive(Debug, Clone, PartialEq)]
pub struct TotalConfigurationData {
    pub total_configuration_time_ms: i64,
    /// Plugin breakdowns merged by plugin identity
    pub plugins_configuration: Vec<PluginConfigurationData>,
    /// Step breakdowns merged by step kind, durations summed on collision
    pub configuration_steps: Vec<ConfigurationStep>,
}

/// Everything captured for one completed build
///
/// Constructed once, right after a build finishes, and immutable afterwards.
/// Consumers go through the accessors; descriptor references resolve against
/// the pools carried alongside the analyzer results.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildAnalysisResults {
    request: BuildRequest,
    analyzers: AnalyzerResults,
    session_id: BuildSessionId,
    pools: DescriptorPools,
}

impl BuildAnalysisResults {
    pub fn new(
        request: BuildRequest,
        analyzers: AnalyzerResults,
        session_id: BuildSessionId,
        pools: DescriptorPools,
    ) -> Self {
        Self {
            request,
            analyzers,
            session_id,
            pools,
        }
    }

    pub fn request(&self) -> &BuildRequest {
        &self.request
    }

    pub fn session_id(&self) -> &BuildSessionId {
        &self.session_id
    }

    pub fn analyzers(&self) -> &AnalyzerResults {
        &self.analyzers
    }

    pub fn task_pool(&self) -> &Pool<crate::descriptors::TaskDescriptor> {
        &self.pools.tasks
    }

    pub fn plugin_pool(&self) -> &Pool<PluginDescriptor> {
        &self.pools.plugins
    }

    pub fn annotation_processors(&self) -> &AnnotationProcessorsResult {
        &self.analyzers.annotation_processors
    }

    pub fn always_run_tasks(&self) -> &AlwaysRunTasksResult {
        &self.analyzers.always_run_tasks
    }

    pub fn critical_path(&self) -> &CriticalPathResult {
        &self.analyzers.critical_path
    }

    pub fn noncacheable_tasks(&self) -> &NoncacheableTasksResult {
        &self.analyzers.noncacheable_tasks
    }

    pub fn garbage_collection(&self) -> &GarbageCollectionResult {
        &self.analyzers.garbage_collection
    }

    pub fn project_configuration(&self) -> &ProjectConfigurationResult {
        &self.analyzers.project_configuration
    }

    pub fn tasks_sharing_output(&self) -> &TasksSharingOutputResult {
        &self.analyzers.tasks_sharing_output
    }

    pub fn jetifier_usage(&self) -> &JetifierUsageResult {
        &self.analyzers.jetifier_usage
    }

    pub fn downloads(&self) -> &DownloadsResult {
        &self.analyzers.downloads
    }

    pub fn configuration_caching(&self) -> &ConfigurationCachingCompatibility {
        &self.analyzers.configuration_caching
    }

    pub fn task_category_warnings(&self) -> &TaskCategoryWarningsResult {
        &self.analyzers.task_category_warnings
    }

    /// Wall-clock build duration: build end minus build start
    pub fn total_build_time_ms(&self) -> i64 {
        let cp = &self.analyzers.critical_path;
        cp.build_finished_timestamp_ms - cp.build_started_timestamp_ms
    }

    /// Time between build start and the first task starting to execute
    ///
    /// When no task ran at all, the whole build counts as configuration.
    pub fn configuration_phase_time_ms(&self) -> i64 {
        let cp = &self.analyzers.critical_path;
        let first_task_start = self
            .pools
            .tasks
            .iter()
            .map(|t| t.execution_start_time)
            .min()
            .unwrap_or(cp.build_finished_timestamp_ms);
        first_task_start - cp.build_started_timestamp_ms
    }

    /// Configuration data summed over every project
    pub fn total_configuration_data(&self) -> TotalConfigurationData {
        let projects = &self.analyzers.project_configuration.projects_configuration;

        let total_configuration_time_ms = projects
            .iter()
            .map(|p| p.total_configuration_time_ms)
            .sum();

        let mut plugins: IndexMap<String, PluginConfigurationData> = IndexMap::new();
        let mut steps: IndexMap<ConfigurationStepKind, i64> = IndexMap::new();
        for project in projects {
            for plugin_data in &project.plugins_configuration {
                plugins
                    .entry(plugin_data.plugin.id_name.clone())
                    .and_modify(|merged| {
                        merged.configuration_time_ms += plugin_data.configuration_time_ms;
                    })
                    .or_insert_with(|| plugin_data.clone());
            }
            for step in &project.configuration_steps {
                *steps.entry(step.kind).or_insert(0) += step.configuration_time_ms;
            }
        }

        TotalConfigurationData {
            total_configuration_time_ms,
            plugins_configuration: plugins.into_values().collect(),
            configuration_steps: steps
                .into_iter()
                .map(|(kind, configuration_time_ms)| ConfigurationStep {
                    kind,
                    configuration_time_ms,
                })
                .collect(),
        }
    }

    /// Whether this build ran with the configuration cache on
    ///
    /// True only for the two "turned on" shapes; every other compatibility
    /// state, `NoData` included, counts as off.
    pub fn build_uses_configuration_cache(&self) -> bool {
        matches!(
            self.analyzers.configuration_caching,
            ConfigurationCachingCompatibility::TurnedOn
                | ConfigurationCachingCompatibility::CompatibilityTestFlow
        )
    }
}

/// What went wrong when an attempt produced no usable results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    BuildFailure,
    AnalysisFailure,
}

/// Marker for a build whose analysis produced nothing consumable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureResult {
    pub session_id: BuildSessionId,
    pub kind: FailureKind,
}

/// What the storage layer holds as the latest outcome of a build
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    Results(Arc<BuildAnalysisResults>),
    Failure(FailureResult),
}

impl AnalysisOutcome {
    pub fn session_id(&self) -> &BuildSessionId {
        match self {
            AnalysisOutcome::Results(results) => results.session_id(),
            AnalysisOutcome::Failure(failure) => &failure.session_id,
        }
    }

    pub fn as_results(&self) -> Option<&Arc<BuildAnalysisResults>> {
        match self {
            AnalysisOutcome::Results(results) => Some(results),
            AnalysisOutcome::Failure(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::ProjectConfigurationData;
    use crate::descriptors::{PluginType, TaskDescriptor, TaskExecutionMode};

    fn results_with(
        analyzers: AnalyzerResults,
        pools: DescriptorPools,
    ) -> BuildAnalysisResults {
        BuildAnalysisResults::new(
            BuildRequest::default(),
            analyzers,
            BuildSessionId::new("test-session"),
            pools,
        )
    }

    fn task(pools: &mut DescriptorPools, name: &str, start: i64, end: i64) {
        let plugin = pools.intern_plugin(PluginDescriptor::new("p", PluginType::Binary));
        pools.intern_task(TaskDescriptor {
            task_name: name.to_string(),
            project_path: ":app".to_string(),
            origin_plugin: plugin,
            execution_start_time: start,
            execution_end_time: end,
            execution_mode: TaskExecutionMode::Full,
            execution_reasons: vec![],
        });
    }

    #[test]
    fn total_build_time_is_end_minus_start() {
        let analyzers = AnalyzerResults {
            critical_path: CriticalPathResult {
                build_started_timestamp_ms: 1_000,
                build_finished_timestamp_ms: 9_500,
                ..Default::default()
            },
            ..Default::default()
        };
        let results = results_with(analyzers, DescriptorPools::new());
        assert_eq!(results.total_build_time_ms(), 8_500);
    }

    #[test]
    fn configuration_phase_ends_at_first_task_start() {
        let analyzers = AnalyzerResults {
            critical_path: CriticalPathResult {
                build_started_timestamp_ms: 1_000,
                build_finished_timestamp_ms: 9_000,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut pools = DescriptorPools::new();
        task(&mut pools, "late", 5_000, 6_000);
        task(&mut pools, "early", 3_000, 4_000);
        let results = results_with(analyzers, pools);
        assert_eq!(results.configuration_phase_time_ms(), 2_000);
    }

    #[test]
    fn configuration_phase_spans_whole_build_without_tasks() {
        let analyzers = AnalyzerResults {
            critical_path: CriticalPathResult {
                build_started_timestamp_ms: 1_000,
                build_finished_timestamp_ms: 9_000,
                ..Default::default()
            },
            ..Default::default()
        };
        let results = results_with(analyzers, DescriptorPools::new());
        assert_eq!(results.configuration_phase_time_ms(), 8_000);
    }

    #[test]
    fn total_configuration_data_merges_plugins_and_steps() {
        let mut pools = DescriptorPools::new();
        let plugin = pools.intern_plugin(PluginDescriptor::new("p", PluginType::Binary));
        let project = |path: &str, time: i64| ProjectConfigurationData {
            project_path: path.to_string(),
            total_configuration_time_ms: time,
            plugins_configuration: vec![PluginConfigurationData {
                plugin: plugin.clone(),
                configuration_time_ms: time / 2,
            }],
            configuration_steps: vec![ConfigurationStep {
                kind: ConfigurationStepKind::ResolvingDependencies,
                configuration_time_ms: time / 4,
            }],
        };
        let analyzers = AnalyzerResults {
            project_configuration: ProjectConfigurationResult {
                projects_configuration: vec![project(":app", 400), project(":lib", 200)],
                ..Default::default()
            },
            ..Default::default()
        };
        let results = results_with(analyzers, pools);

        let total = results.total_configuration_data();
        assert_eq!(total.total_configuration_time_ms, 600);
        assert_eq!(total.plugins_configuration.len(), 1);
        assert_eq!(total.plugins_configuration[0].configuration_time_ms, 300);
        assert_eq!(total.configuration_steps.len(), 1);
        assert_eq!(total.configuration_steps[0].configuration_time_ms, 150);
    }

    #[test]
    fn configuration_cache_flag_requires_a_turned_on_variant() {
        for (state, expected) in [
            (ConfigurationCachingCompatibility::TurnedOn, true),
            (ConfigurationCachingCompatibility::CompatibilityTestFlow, true),
            (ConfigurationCachingCompatibility::NoIncompatiblePlugins, false),
            (
                ConfigurationCachingCompatibility::IncompatiblePluginsDetected,
                false,
            ),
            (ConfigurationCachingCompatibility::NoData, false),
        ] {
            let analyzers = AnalyzerResults {
                configuration_caching: state,
                ..Default::default()
            };
            let results = results_with(analyzers, DescriptorPools::new());
            assert_eq!(results.build_uses_configuration_cache(), expected);
        }
    }
}
