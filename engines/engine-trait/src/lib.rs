//! 调试引擎 trait 定义
//!
//! 这里是与原生调试引擎之间的边界：断点以 `WireBreakpoint` 数组加数量的形式
//! 整体下发，引擎用它完全替换之前已知的断点集合。

use thiserror::Error;

/// 条件表达式缓冲区大小（含结尾的 NUL）
pub const CONDITION_CAPACITY: usize = 1000;

/// 引擎错误类型
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("引擎拒绝了断点集合: {0}")]
    Rejected(String),
    #[error("断点数量不一致: 声明 {declared}, 实际 {actual}")]
    CountMismatch { declared: u32, actual: usize },
    #[error("条件表达式过长: {len} 字节, 上限 {capacity} 字节")]
    ConditionTooLong { len: usize, capacity: usize },
}

/// 下发给引擎的断点记录
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireBreakpoint {
    pub is_absolute_address: bool,
    pub specific_address: bool,
    pub address: u32,
    pub break_on_exec: bool,
    pub break_on_read: bool,
    pub break_on_write: bool,
    /// 下发数组里的记录总是启用的
    pub enabled: bool,
    /// 可能为空
    pub condition: String,
}

impl WireBreakpoint {
    /// 检查条件表达式能否放进引擎的定长缓冲区
    pub fn check_condition(condition: &str) -> Result<(), EngineError> {
        // 需要给 NUL 留一个字节
        if condition.len() >= CONDITION_CAPACITY {
            return Err(EngineError::ConditionTooLong {
                len: condition.len(),
                capacity: CONDITION_CAPACITY,
            });
        }
        Ok(())
    }
}

/// 原生调试引擎 trait
/// 所有引擎实现（真实引擎或测试替身）都必须实现此 trait
pub trait NativeEngine {
    /// 用给定的断点集合整体替换引擎当前的断点集合
    ///
    /// # 参数
    /// - records: 已过滤为启用状态的断点记录
    /// - count: 记录数量，必须等于 `records.len()`
    fn set_breakpoints(&mut self, records: &[WireBreakpoint], count: u32)
        -> Result<(), EngineError>;

    /// 获取引擎名称（用于日志）
    fn name(&self) -> &str {
        "unknown"
    }
}

impl<E: NativeEngine + ?Sized> NativeEngine for Box<E> {
    fn set_breakpoints(&mut self, records: &[WireBreakpoint], count: u32)
        -> Result<(), EngineError> {
        (**self).set_breakpoints(records, count)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// 校验声明数量与数组长度一致
pub fn check_count(records: &[WireBreakpoint], count: u32) -> Result<(), EngineError> {
    if records.len() != count as usize {
        return Err(EngineError::CountMismatch {
            declared: count,
            actual: records.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nop;

    impl NativeEngine for Nop {
        fn set_breakpoints(&mut self, records: &[WireBreakpoint], count: u32)
            -> Result<(), EngineError> {
            check_count(records, count)
        }
    }

    #[test]
    fn default_name() {
        assert_eq!(Nop.name(), "unknown");
    }

    #[test]
    fn count_mismatch() {
        let records = vec![WireBreakpoint::default(); 2];
        assert!(Nop.set_breakpoints(&records, 2).is_ok());
        assert_eq!(
            Nop.set_breakpoints(&records, 3),
            Err(EngineError::CountMismatch { declared: 3, actual: 2 })
        );
    }

    #[test]
    fn boxed_engine_forwards() {
        let mut engine: Box<dyn NativeEngine> = Box::new(Nop);
        assert!(engine.set_breakpoints(&[], 0).is_ok());
        assert_eq!(engine.name(), "unknown");
    }

    #[test]
    fn condition_capacity() {
        assert!(WireBreakpoint::check_condition("").is_ok());
        assert!(WireBreakpoint::check_condition(&"a".repeat(CONDITION_CAPACITY - 1)).is_ok());
        assert_eq!(
            WireBreakpoint::check_condition(&"a".repeat(CONDITION_CAPACITY)),
            Err(EngineError::ConditionTooLong {
                len: CONDITION_CAPACITY,
                capacity: CONDITION_CAPACITY,
            })
        );
    }
}
