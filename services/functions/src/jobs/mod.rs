pub mod dispatcher;
pub mod scheduler;

pub use dispatcher::{run_change_events, DispatchStats};
pub use scheduler::{run_schedule, AiFetchJob, DailyTrendingJob, ScheduledJob};
