/// Background tasks that run independently of request traffic
mod enrichment_scheduler;

pub use enrichment_scheduler::{
    CycleSummary, EnrichmentScheduler, SchedulerHandle, SchedulerSettings,
};
