mod migration;
mod username;

pub use migration::{
    ExportConfig, LegacyConfig, MigrationConfig, TOKEN_ENV_VAR, TargetConfig, TokenConfig,
};
pub use username::UsernameTransform;
