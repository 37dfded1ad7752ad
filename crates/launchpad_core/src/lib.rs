pub mod ai_fetch;
pub mod callable;
pub mod domain;
pub mod memory;
pub mod notifications;
pub mod ports;
pub mod schedule;
pub mod trending;

pub use ai_fetch::{AiContentFetcher, FetchOutcome, FetchReport};
pub use callable::{CallableError, TrendingCallable};
pub use domain::{
    ActorInfo, AiProduct, CallerIdentity, DailyRanking, Engagement, EngagementKind, NewAiProduct,
    NewDailyRanking, NewNotification, Notification, Product, ProductStatus, RankEntry,
    UserProfile,
};
pub use memory::InMemoryStore;
pub use notifications::NotificationWriter;
pub use ports::{
    ChangeEvent, ChangeEventSource, DatabaseService, PortError, PortResult,
    TextGenerationService,
};
pub use schedule::Schedule;
pub use trending::TrendingAggregator;
