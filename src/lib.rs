//! 调试器断点管理与同步库
pub mod breakpoint;
pub mod const_values;
pub mod session;
pub mod store;
pub mod sync;
pub mod utils;
pub mod workspace;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use colored::Colorize;
use engine_trait::NativeEngine;
use recorder::RecordingEngine;
use tracing::{debug, info};

pub use breakpoint::{Breakpoint, BreakpointId};
pub use session::{BreakpointEditor, ChangeRecord, DebugSession};
pub use store::{BreakpointEntry, BreakpointStore, ToggleOutcome};
pub use sync::{ObserverId, SyncBridge, SyncError};
pub use workspace::{Workspace, WorkspaceError};

use const_values::SyncConfig;

/// 调试器断点管理工具
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// 配置文件地址
    #[arg(short, long, default_value = "profile/config.toml")]
    pub config: String,

    /// 工作区文件路径，覆盖配置文件中的设置
    #[arg(short, long)]
    pub workspace: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 快速切换地址上的断点
    Toggle {
        /// 地址，支持 0x / $ 前缀的十六进制；负数被忽略
        #[arg(value_parser = parse_address, allow_negative_numbers = true)]
        address: i64,
        /// 已有断点时删除它，而不是翻转启用状态
        #[arg(short, long)]
        remove: bool,
    },
    /// 添加一个完整指定的断点
    Add(AddArgs),
    /// 修改断点的条件表达式，空串表示清除
    Edit {
        index: usize,
        #[arg(long)]
        condition: String,
    },
    /// 按列表序号删除断点
    Remove {
        #[arg(required = true)]
        indices: Vec<usize>,
    },
    /// 启用断点
    Enable { index: usize },
    /// 禁用断点
    Disable { index: usize },
    /// 列出所有断点
    List,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct AddArgs {
    #[arg(short, long, value_parser = parse_address)]
    pub address: i64,
    /// 绝对（物理）地址
    #[arg(long)]
    pub absolute: bool,
    /// 匹配任意地址
    #[arg(long)]
    pub any: bool,
    #[arg(long)]
    pub read: bool,
    #[arg(long)]
    pub write: bool,
    /// 不在执行时触发
    #[arg(long)]
    pub no_exec: bool,
    /// 以禁用状态添加
    #[arg(long)]
    pub disabled: bool,
    #[arg(long, default_value = "")]
    pub condition: String,
}

impl AddArgs {
    fn to_breakpoint(&self) -> Result<Breakpoint> {
        let address = u32::try_from(self.address)
            .with_context(|| format!("地址超出范围: {}", self.address))?;
        Ok(Breakpoint {
            address,
            is_absolute_address: self.absolute,
            specific_address: !self.any,
            break_on_exec: !self.no_exec,
            break_on_read: self.read,
            break_on_write: self.write,
            enabled: !self.disabled,
            condition: self.condition.clone(),
        })
    }
}

/// 解析地址：`0x1A2B`、`$1A2B` 或十进制
pub fn parse_address(s: &str) -> Result<i64, String> {
    let s = s.trim();
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix('$')) {
        i64::from_str_radix(hex, 16)
    } else {
        s.parse::<i64>()
    };
    parsed.map_err(|e| format!("无效地址 '{}': {}", s, e))
}

fn resolve_path(base: &Path, path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

fn entry_id<E: NativeEngine>(session: &DebugSession<E>, index: usize) -> Result<BreakpointId> {
    session
        .list()
        .get(index)
        .map(|entry| entry.id)
        .with_context(|| format!("没有序号为 {} 的断点", index))
}

/// 在会话上执行一条命令
pub fn apply_command<E: NativeEngine>(session: &mut DebugSession<E>, command: &Command) -> Result<()> {
    match command {
        Command::Toggle { address, remove } => {
            if !session.quick_toggle(*address, *remove)? {
                info!(address, "地址无效，忽略");
            }
        }
        Command::Add(add) => {
            let breakpoint = add.to_breakpoint()?;
            let mut dialog = |_: &Breakpoint| Some(breakpoint.clone());
            session.add_with(&mut dialog)?;
        }
        Command::Edit { index, condition } => {
            let id = entry_id(session, *index)?;
            let mut dialog = |current: &Breakpoint| {
                let mut edited = current.clone();
                edited.condition = condition.clone();
                Some(edited)
            };
            session.edit_with(id, &mut dialog)?;
        }
        Command::Remove { indices } => {
            let ids = indices
                .iter()
                .map(|index| entry_id(session, *index))
                .collect::<Result<Vec<_>>>()?;
            session.remove(&ids)?;
        }
        Command::Enable { index } => {
            let id = entry_id(session, *index)?;
            session.set_enabled(id, true)?;
        }
        Command::Disable { index } => {
            let id = entry_id(session, *index)?;
            session.set_enabled(id, false)?;
        }
        Command::List => {}
    }
    Ok(())
}

/// 打印断点列表
pub fn print_list(entries: &[BreakpointEntry]) {
    if entries.is_empty() {
        println!("{}", "(no breakpoints)".dimmed());
        return;
    }
    for (index, entry) in entries.iter().enumerate() {
        let bp = &entry.breakpoint;
        let line = format!(
            "{:>3} {} {:<10} {:<10} {}",
            index,
            if bp.enabled { "[x]" } else { "[ ]" },
            bp.kind_label(),
            bp.address_label(),
            bp.condition
        );
        if bp.enabled {
            println!("{}", line.green());
        } else {
            println!("{}", line.dimmed());
        }
    }
}

pub fn build_session_run_blocking(args: Args) -> Result<()> {
    let prj_base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let config_path = resolve_path(&prj_base, &args.config);
    let config = SyncConfig::new(&config_path)?;

    let config_dir = config_path.parent().unwrap_or(&prj_base).to_path_buf();
    let workspace_path = match &args.workspace {
        Some(path) => PathBuf::from(path),
        None => resolve_path(&config_dir, &config.workspace.path),
    };
    let workspace = Workspace::load(&workspace_path)?;

    let (engine, recording) = RecordingEngine::new("recorder".to_string());
    let mut session = DebugSession::with_breakpoints(
        engine,
        workspace.into_breakpoints(),
        config.debug.change_log_size,
    );
    session.subscribe(|| debug!("断点列表已变更"));

    if config.sync.publish_on_load {
        let count = session.resync()?;
        info!(count, "已下发工作区断点");
    }

    apply_command(&mut session, &args.command)?;
    print_list(session.list());

    info!(
        engine = session.engine().name(),
        active = recording.active().len(),
        publishes = recording.publish_count(),
        "引擎断点集合"
    );
    for change in session.recent_changes() {
        debug!(?change, "变更记录");
    }

    Workspace::from_entries(session.list()).save(&workspace_path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use recorder::Recording;

    fn session() -> (DebugSession<RecordingEngine>, Recording) {
        let (engine, recording) = RecordingEngine::new("test".to_string());
        (DebugSession::new(engine, 8), recording)
    }

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn address_formats() {
        assert_eq!(parse_address("0x8000"), Ok(0x8000));
        assert_eq!(parse_address("$C000"), Ok(0xC000));
        assert_eq!(parse_address("100"), Ok(100));
        assert_eq!(parse_address("-1"), Ok(-1));
        assert!(parse_address("zz").is_err());
    }

    #[test]
    fn toggle_accepts_negative_address() {
        let args = parse(&["bpsync", "toggle", "-1"]);
        let (mut session, recording) = session();
        apply_command(&mut session, &args.command).unwrap();
        assert!(session.list().is_empty());
        assert_eq!(recording.publish_count(), 0);
    }

    #[test]
    fn toggle_then_remove() {
        let (mut session, recording) = session();
        apply_command(&mut session, &parse(&["bpsync", "toggle", "$100"]).command).unwrap();
        assert_eq!(recording.active()[0].address, 0x100);

        apply_command(&mut session, &parse(&["bpsync", "toggle", "--remove", "0x100"]).command)
            .unwrap();
        assert!(session.list().is_empty());
        assert!(recording.active().is_empty());
    }

    #[test]
    fn add_enable_disable_remove_by_index() {
        let (mut session, recording) = session();
        let add = parse(&[
            "bpsync", "add", "--address", "0x2000", "--no-exec", "--write", "--absolute",
            "--condition", "A == 1",
        ]);
        apply_command(&mut session, &add.command).unwrap();
        let bp = &session.list()[0].breakpoint;
        assert!(bp.break_on_write && !bp.break_on_exec && bp.is_absolute_address);
        assert_eq!(bp.condition, "A == 1");

        apply_command(&mut session, &parse(&["bpsync", "disable", "0"]).command).unwrap();
        assert!(recording.active().is_empty());
        apply_command(&mut session, &parse(&["bpsync", "enable", "0"]).command).unwrap();
        assert_eq!(recording.active().len(), 1);

        apply_command(&mut session, &parse(&["bpsync", "edit", "0", "--condition", ""]).command)
            .unwrap();
        assert!(session.list()[0].breakpoint.condition.is_empty());

        apply_command(&mut session, &parse(&["bpsync", "remove", "0"]).command).unwrap();
        assert!(session.list().is_empty());
    }

    #[test]
    fn bad_index_is_an_error() {
        let (mut session, _) = session();
        let err = apply_command(&mut session, &parse(&["bpsync", "enable", "3"]).command)
            .unwrap_err();
        assert!(err.to_string().contains("3"));
    }

    #[test]
    fn add_rejects_negative_address() {
        // 分开写时 -5 被当成未知选项
        assert!(Args::try_parse_from(["bpsync", "add", "--address", "-5"]).is_err());

        // 用 = 连写时能解析，但转换为 32 位地址时失败，仓库不变
        let (mut session, recording) = session();
        let args = parse(&["bpsync", "add", "--address=-5"]);
        let err = apply_command(&mut session, &args.command).unwrap_err();
        assert!(err.to_string().contains("地址超出范围"));
        assert!(session.list().is_empty());
        assert_eq!(recording.publish_count(), 0);
    }

    #[test]
    fn run_against_temp_workspace() {
        let ws = std::env::temp_dir().join(format!("bpsync-run-{}.toml", std::process::id()));
        std::fs::remove_file(&ws).ok();
        let ws_arg = ws.to_string_lossy().to_string();

        build_session_run_blocking(parse(&["bpsync", "-w", &ws_arg, "toggle", "0x8000"])).unwrap();
        build_session_run_blocking(parse(&["bpsync", "-w", &ws_arg, "toggle", "0x9000"])).unwrap();
        build_session_run_blocking(parse(&["bpsync", "-w", &ws_arg, "toggle", "0x8000"])).unwrap();

        let loaded = Workspace::load(&ws).unwrap();
        std::fs::remove_file(&ws).ok();
        let state: Vec<(u32, bool)> = loaded
            .breakpoints
            .iter()
            .map(|bp| (bp.address, bp.enabled))
            .collect();
        assert_eq!(state, vec![(0x8000, false), (0x9000, true)]);
    }
}
