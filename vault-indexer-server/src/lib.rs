mod indexer;
mod server;
mod settings;

pub use server::run;
pub use settings::Settings;
