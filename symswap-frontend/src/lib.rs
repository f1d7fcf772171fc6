pub mod cli;
pub mod errors;
pub mod loader;
pub mod resolver;

use errors::FrontendError;
use symswap_config::ReplaceConfig;
use tracing::info;

/// 启动 CLI 演示或返回错误。
pub fn run_cli_demo(
    config: &ReplaceConfig,
    overrides: &cli::CliOverrides,
) -> Result<(), FrontendError> {
    info!("启动 CLI 演示前端");
    cli::run_demo(config, overrides)
}
