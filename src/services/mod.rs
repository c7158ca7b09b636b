// Tabfix services
// Services provide the core behavior: URL normalization, settings, duplicate
// cleanup, focus mode and the inactivity sweep.

pub mod auto_close;
pub mod duplicate_resolver;
pub mod focus_engine;
pub mod settings_engine;
pub mod tab_cleanup;
pub mod url_normalizer;
