//! 断点仓库
//!
//! 按插入顺序保存断点。快速切换按地址查找，不区分触发类型，
//! 所以同一地址上的执行断点和读写断点不能共存。

use tracing::debug;

use crate::breakpoint::{Breakpoint, BreakpointId};

/// 仓库中的一条断点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointEntry {
    pub id: BreakpointId,
    pub breakpoint: Breakpoint,
}

/// 快速切换的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// 地址无效，什么都没做
    Ignored,
    Created(BreakpointId),
    /// 翻转了启用状态，附带新的状态
    Flipped(BreakpointId, bool),
    Removed(BreakpointId),
}

/// 断点仓库
#[derive(Debug, Default)]
pub struct BreakpointStore {
    entries: Vec<BreakpointEntry>,
    next_id: u32,
}

impl BreakpointStore {
    /// 创建空仓库
    pub fn new() -> Self {
        Self::default()
    }

    /// 快速切换
    ///
    /// 负地址表示“没有地址”，直接忽略；超出 32 位的地址同样忽略。
    pub fn quick_toggle(&mut self, address: i64, remove_mode: bool) -> ToggleOutcome {
        let Ok(address) = u32::try_from(address) else {
            debug!(address, "忽略无效地址");
            return ToggleOutcome::Ignored;
        };

        match self.position_by_address(address) {
            Some(index) if remove_mode => {
                let entry = self.entries.remove(index);
                ToggleOutcome::Removed(entry.id)
            }
            Some(index) => {
                let entry = &mut self.entries[index];
                entry.breakpoint.enabled = !entry.breakpoint.enabled;
                ToggleOutcome::Flipped(entry.id, entry.breakpoint.enabled)
            }
            None => ToggleOutcome::Created(self.add(Breakpoint::at(address))),
        }
    }

    /// 追加断点
    ///
    /// 不检查地址唯一性，调用方需要自己保证。
    pub fn add(&mut self, breakpoint: Breakpoint) -> BreakpointId {
        let id = BreakpointId(self.next_id);
        self.next_id += 1;
        self.entries.push(BreakpointEntry { id, breakpoint });
        id
    }

    /// 按句柄移除断点，返回实际移除的数量
    pub fn remove(&mut self, ids: &[BreakpointId]) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| !ids.contains(&entry.id));
        before - self.entries.len()
    }

    /// 启用/禁用断点
    ///
    /// 只有状态真的改变时才返回 true。
    pub fn set_enabled(&mut self, id: BreakpointId, value: bool) -> bool {
        match self.get_mut(id) {
            Some(bp) if bp.enabled != value => {
                bp.enabled = value;
                true
            }
            _ => false,
        }
    }

    /// 原地替换断点内容，保留句柄和位置
    pub fn replace(&mut self, id: BreakpointId, breakpoint: Breakpoint) -> bool {
        match self.get_mut(id) {
            Some(bp) => {
                *bp = breakpoint;
                true
            }
            None => false,
        }
    }

    /// 获取所有断点
    pub fn list(&self) -> &[BreakpointEntry] {
        &self.entries
    }

    /// 启用的断点，按仓库顺序
    pub fn enabled(&self) -> impl Iterator<Item = &Breakpoint> {
        self.entries
            .iter()
            .map(|entry| &entry.breakpoint)
            .filter(|bp| bp.enabled)
    }

    pub fn get(&self, id: BreakpointId) -> Option<&Breakpoint> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| &entry.breakpoint)
    }

    /// 按地址查找，忽略触发类型
    pub fn find_by_address(&self, address: u32) -> Option<&BreakpointEntry> {
        self.position_by_address(address).map(|i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get_mut(&mut self, id: BreakpointId) -> Option<&mut Breakpoint> {
        self.entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .map(|entry| &mut entry.breakpoint)
    }

    fn position_by_address(&self, address: u32) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.breakpoint.address == address)
    }
}
