//! 调试工作区：把断点列表保存到 TOML 文件

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::breakpoint::Breakpoint;
use crate::store::BreakpointEntry;

/// 工作区错误类型
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("无法读写工作区文件 {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("无法解析工作区文件 {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("无法序列化工作区: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// 调试工作区
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    #[serde(default)]
    pub breakpoints: Vec<Breakpoint>,
}

impl Workspace {
    /// 读取工作区，文件不存在时返回空工作区
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WorkspaceError> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "工作区文件不存在，使用空工作区");
            return Ok(Self::default());
        }
        let toml_str = std::fs::read_to_string(path).map_err(|source| WorkspaceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let workspace: Workspace =
            toml::from_str(&toml_str).map_err(|source| WorkspaceError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        info!(path = %path.display(), count = workspace.breakpoints.len(), "加载工作区");
        Ok(workspace)
    }

    /// 保存工作区
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), WorkspaceError> {
        let path = path.as_ref();
        let toml_str = toml::to_string(self)?;
        std::fs::write(path, toml_str).map_err(|source| WorkspaceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), count = self.breakpoints.len(), "保存工作区");
        Ok(())
    }

    /// 按仓库顺序收集断点
    pub fn from_entries(entries: &[BreakpointEntry]) -> Self {
        Self {
            breakpoints: entries.iter().map(|e| e.breakpoint.clone()).collect(),
        }
    }

    pub fn into_breakpoints(self) -> Vec<Breakpoint> {
        self.breakpoints
    }
}
