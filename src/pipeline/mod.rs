pub mod orchestrator;
pub mod publisher;
pub mod source;
pub mod state;
pub mod worker;

pub use orchestrator::{JobProgress, SummarizerJob};
pub use publisher::{ChannelPublisher, FanoutPublisher, JobResultPublisher, WebhookPublisher};
pub use source::{ResultPage, ResultPaginator, ResultSource, SummarySink};
pub use state::{JobRequest, JobResult, JobStatus};
pub use worker::JobWorker;
