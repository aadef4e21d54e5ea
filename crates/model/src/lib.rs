//! In-memory model of build-performance analysis results
//!
//! One [`BuildAnalysisResults`] is produced per completed build. It bundles
//! the build request metadata, one result per analyzer, and the descriptor
//! pools the analyzer results reference into. Descriptors are interned:
//! a task or plugin mentioned by several analyzers exists exactly once,
//! behind an `Arc`, inside the pools scoped to that build.

pub mod analyzers;
pub mod descriptors;
pub mod pool;
pub mod results;

pub use analyzers::{
    AlwaysRunReason, AlwaysRunTaskData, AlwaysRunTasksResult, AnnotationProcessorData,
    AnnotationProcessorsResult, ConfigurationCachingCompatibility, ConfigurationStep,
    ConfigurationStepKind, CriticalPathResult, DownloadResult, DownloadStatus, DownloadsResult,
    GarbageCollectionData, GarbageCollectionResult, JetifierUsageResult, JetifierUsageStatus,
    NoncacheableTasksResult, PluginBuildData, PluginConfigurationData, ProjectConfigurationData,
    ProjectConfigurationResult, Repository, RepositoryResult, RepositoryType, TaskCategoryIssue,
    TaskCategoryWarningsResult, TasksSharingOutputData, TasksSharingOutputResult,
};
pub use descriptors::{PluginDescriptor, PluginType, TaskDescriptor, TaskExecutionMode};
pub use pool::{DescriptorPools, Pool, PoolEntity};
pub use results::{
    AnalysisOutcome, AnalyzerResultView, AnalyzerResults, BuildAnalysisResults, BuildMode,
    BuildRequest, FailureKind, FailureResult, TotalConfigurationData,
};
