//! 断点数据模型

use std::fmt;

use engine_trait::{EngineError, WireBreakpoint};
use serde::{Deserialize, Serialize};

/// 断点句柄，由断点仓库在插入时分配
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BreakpointId(pub(crate) u32);

impl fmt::Display for BreakpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 断点信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Breakpoint {
    /// 断点地址
    pub address: u32,
    /// 是否为绝对（物理）地址
    pub is_absolute_address: bool,
    /// 是否绑定到具体地址，false 表示匹配任意地址
    pub specific_address: bool,
    pub break_on_exec: bool,
    pub break_on_read: bool,
    pub break_on_write: bool,
    /// 是否启用
    pub enabled: bool,
    /// 条件表达式，空串表示无条件
    pub condition: String,
}

impl Default for Breakpoint {
    /// 新建对话框的初始记录
    fn default() -> Self {
        Self {
            address: 0,
            is_absolute_address: false,
            specific_address: true,
            break_on_exec: true,
            break_on_read: false,
            break_on_write: false,
            enabled: true,
            condition: String::new(),
        }
    }
}

impl Breakpoint {
    /// 快速切换时创建的断点：启用、执行触发、逻辑地址、绑定具体地址
    pub fn at(address: u32) -> Self {
        Self {
            address,
            ..Default::default()
        }
    }

    /// 触发类型描述，例如 "Exec" 或 "Read+Write"
    pub fn kind_label(&self) -> String {
        let kinds: Vec<&str> = [
            (self.break_on_exec, "Exec"),
            (self.break_on_read, "Read"),
            (self.break_on_write, "Write"),
        ]
        .iter()
        .filter(|(set, _)| *set)
        .map(|(_, name)| *name)
        .collect();

        if kinds.is_empty() {
            "None".to_string()
        } else {
            kinds.join("+")
        }
    }

    /// 地址描述：`$1A2B`，绝对地址为 `[$1A2B]`，任意地址为 `<any>`
    pub fn address_label(&self) -> String {
        if !self.specific_address {
            return "<any>".to_string();
        }
        let address = format!("${:X}", self.address);
        if self.is_absolute_address {
            format!("[{}]", address)
        } else {
            address
        }
    }

    /// 转换为下发给引擎的记录
    pub fn to_wire(&self) -> Result<WireBreakpoint, EngineError> {
        WireBreakpoint::check_condition(&self.condition)?;
        Ok(WireBreakpoint {
            is_absolute_address: self.is_absolute_address,
            specific_address: self.specific_address,
            address: self.address,
            break_on_exec: self.break_on_exec,
            break_on_read: self.break_on_read,
            break_on_write: self.break_on_write,
            enabled: self.enabled,
            condition: self.condition.clone(),
        })
    }
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind_label(), self.address_label())?;
        if !self.condition.is_empty() {
            write!(f, " if {}", self.condition)?;
        }
        if !self.enabled {
            write!(f, " (disabled)")?;
        }
        Ok(())
    }
}
