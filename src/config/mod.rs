pub mod settings;

pub use settings::{
    AppConfig, BotSettings, RatingSettings, ReportSettings, SessionSettings, StoreSettings,
    TiePolicy,
};
