//! 调试会话
//!
//! 会话独占断点仓库和同步桥。所有修改都经过这里，
//! 修改成功后立即把启用的断点整体下发给引擎。

use engine_trait::NativeEngine;
use tracing::{info, warn};

use crate::breakpoint::{Breakpoint, BreakpointId};
use crate::store::{BreakpointEntry, BreakpointStore, ToggleOutcome};
use crate::sync::{ObserverId, SyncBridge, SyncError};
use crate::utils::ringbuf::RingBuffer;

/// 默认保留的变更记录条数
pub const DEFAULT_CHANGE_LOG_SIZE: usize = 64;

/// 变更记录，仅用于诊断，观察者收到的通知不带这些信息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangeRecord {
    /// 重新下发了当前状态
    #[default]
    Resync,
    Created(BreakpointId, u32),
    Added(BreakpointId),
    Edited(BreakpointId),
    Enabled(BreakpointId, bool),
    Removed(BreakpointId),
}

/// 编辑/新建断点对话框
pub trait BreakpointEditor {
    /// 返回确认后的完整断点，取消时返回 None
    fn edit(&mut self, current: &Breakpoint) -> Option<Breakpoint>;
}

impl<F> BreakpointEditor for F
where
    F: FnMut(&Breakpoint) -> Option<Breakpoint>,
{
    fn edit(&mut self, current: &Breakpoint) -> Option<Breakpoint> {
        self(current)
    }
}

/// 调试会话
pub struct DebugSession<E: NativeEngine> {
    store: BreakpointStore,
    bridge: SyncBridge<E>,
    changes: RingBuffer<ChangeRecord>,
}

impl<E: NativeEngine> DebugSession<E> {
    /// 创建新的调试会话，不会立即下发
    pub fn new(engine: E, change_log_size: usize) -> Self {
        Self {
            store: BreakpointStore::new(),
            bridge: SyncBridge::new(engine),
            changes: RingBuffer::new(change_log_size),
        }
    }

    /// 用已有断点（例如从工作区读取的）创建会话，不会立即下发
    pub fn with_breakpoints(
        engine: E,
        breakpoints: impl IntoIterator<Item = Breakpoint>,
        change_log_size: usize,
    ) -> Self {
        let mut session = Self::new(engine, change_log_size);
        for bp in breakpoints {
            session.store.add(bp);
        }
        session
    }

    /// 快速切换：不存在则创建，存在则翻转启用状态或删除
    ///
    /// 负地址直接忽略，返回 `Ok(false)`。
    pub fn quick_toggle(&mut self, address: i64, remove_mode: bool) -> Result<bool, SyncError> {
        let record = match self.store.quick_toggle(address, remove_mode) {
            ToggleOutcome::Ignored => return Ok(false),
            ToggleOutcome::Created(id) => {
                info!(%id, address, "创建断点");
                ChangeRecord::Created(id, address as u32)
            }
            ToggleOutcome::Flipped(id, enabled) => {
                info!(%id, address, enabled, "切换断点");
                ChangeRecord::Enabled(id, enabled)
            }
            ToggleOutcome::Removed(id) => {
                info!(%id, address, "删除断点");
                ChangeRecord::Removed(id)
            }
        };
        self.commit(record)?;
        Ok(true)
    }

    /// 追加外部构造好的断点
    ///
    /// 不检查地址唯一性。无法转换为引擎记录的断点不会进入仓库；
    /// 下发失败时断点仍然留在仓库里。
    pub fn add(&mut self, breakpoint: Breakpoint) -> Result<BreakpointId, SyncError> {
        check_convertible(&breakpoint)?;
        if self.store.find_by_address(breakpoint.address).is_some() {
            warn!(address = breakpoint.address, "地址上已有断点");
        }
        info!(%breakpoint, "添加断点");
        let id = self.store.add(breakpoint);
        self.commit(ChangeRecord::Added(id))?;
        Ok(id)
    }

    /// 按句柄删除断点，未知句柄被忽略
    pub fn remove(&mut self, ids: &[BreakpointId]) -> Result<bool, SyncError> {
        let present: Vec<BreakpointId> = ids
            .iter()
            .copied()
            .filter(|id| self.store.get(*id).is_some())
            .collect();
        if self.store.remove(&present) == 0 {
            return Ok(false);
        }
        for id in &present {
            info!(%id, "删除断点");
            self.changes.push_overwrite(ChangeRecord::Removed(*id));
        }
        self.bridge.publish(&self.store)?;
        Ok(true)
    }

    /// 启用/禁用断点，状态不变时不下发也不通知
    pub fn set_enabled(&mut self, id: BreakpointId, value: bool) -> Result<bool, SyncError> {
        if !self.store.set_enabled(id, value) {
            return Ok(false);
        }
        info!(%id, enabled = value, "设置断点启用状态");
        self.commit(ChangeRecord::Enabled(id, value))?;
        Ok(true)
    }

    /// 通过对话框新建断点，取消时返回 `Ok(None)`
    pub fn add_with(
        &mut self,
        editor: &mut impl BreakpointEditor,
    ) -> Result<Option<BreakpointId>, SyncError> {
        match editor.edit(&Breakpoint::default()) {
            Some(bp) => self.add(bp).map(Some),
            None => Ok(None),
        }
    }

    /// 通过对话框编辑已有断点
    ///
    /// 确认后总会下发一次，即便内容没有变化。
    /// 无法转换为引擎记录的修改被拒绝，原断点保持不变。
    pub fn edit_with(
        &mut self,
        id: BreakpointId,
        editor: &mut impl BreakpointEditor,
    ) -> Result<bool, SyncError> {
        let Some(current) = self.store.get(id) else {
            return Ok(false);
        };
        let Some(edited) = editor.edit(current) else {
            return Ok(false);
        };
        check_convertible(&edited)?;
        if self
            .store
            .find_by_address(edited.address)
            .is_some_and(|entry| entry.id != id)
        {
            warn!(%id, address = edited.address, "地址上已有断点");
        }
        info!(%id, breakpoint = %edited, "编辑断点");
        self.store.replace(id, edited);
        self.commit(ChangeRecord::Edited(id))?;
        Ok(true)
    }

    /// 重新下发当前状态，返回下发的记录数
    pub fn resync(&mut self) -> Result<usize, SyncError> {
        self.changes.push_overwrite(ChangeRecord::Resync);
        self.bridge.publish(&self.store)
    }

    /// 获取所有断点
    pub fn list(&self) -> &[BreakpointEntry] {
        self.store.list()
    }

    pub fn get(&self, id: BreakpointId) -> Option<&Breakpoint> {
        self.store.get(id)
    }

    pub fn subscribe(&mut self, observer: impl FnMut() + 'static) -> ObserverId {
        self.bridge.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.bridge.unsubscribe(id)
    }

    /// 最近的变更，从旧到新
    pub fn recent_changes(&self) -> impl Iterator<Item = &ChangeRecord> + '_ {
        self.changes.iter()
    }

    pub fn engine(&self) -> &E {
        self.bridge.engine()
    }

    fn commit(&mut self, record: ChangeRecord) -> Result<usize, SyncError> {
        self.changes.push_overwrite(record);
        self.bridge.publish(&self.store)
    }
}

fn check_convertible(breakpoint: &Breakpoint) -> Result<(), SyncError> {
    breakpoint
        .to_wire()
        .map(|_| ())
        .map_err(|source| SyncError::Convert {
            address: breakpoint.address,
            source,
        })
        .inspect_err(|e| warn!("{}", e))
}
