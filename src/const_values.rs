use anyhow::{self, Context};
use serde::Deserialize;
use std::path::Path;

use crate::session::DEFAULT_CHANGE_LOG_SIZE;

#[derive(Deserialize, Debug)]
pub struct DebugConfig {
    /// 会话保留的变更记录条数
    #[serde(default = "default_change_log_size")]
    pub change_log_size: usize,
}

#[derive(Deserialize, Debug)]
pub struct PublishConfig {
    /// 打开会话时是否先把工作区中的断点下发一次
    #[serde(default = "default_true")]
    pub publish_on_load: bool,
}

#[derive(Deserialize, Debug)]
pub struct WorkspaceConfig {
    /// 工作区文件路径（相对于配置文件目录解析）
    pub path: String,
}

fn default_true() -> bool {
    true
}

fn default_change_log_size() -> usize {
    DEFAULT_CHANGE_LOG_SIZE
}

/// 主配置（来自 profile/config.toml）
#[derive(Deserialize, Debug)]
pub struct SyncConfig {
    pub debug: DebugConfig,
    pub sync: PublishConfig,
    pub workspace: WorkspaceConfig,
}

impl SyncConfig {
    pub fn new(path: impl AsRef<Path>) -> anyhow::Result<SyncConfig> {
        let toml_str = std::fs::read_to_string(&path)
            .with_context(|| format!("无法读取配置文件: {:?}", &path.as_ref().as_os_str()))?;
        let config: SyncConfig = toml::from_str(&toml_str)
            .with_context(|| format!("无法解析配置文件: {:?}", &path.as_ref().as_os_str()))?;
        anyhow::Ok(config)
    }
}
