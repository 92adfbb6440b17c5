//! Random Port - 随机源抽象
//!
//! 焦点角色选择与事件评分扰动都通过此端口取随机数，测试可注入确定性实现

/// Random Port
pub trait RandomPort: Send + Sync {
    /// [0, 1) 内均匀分布的浮点数
    fn random_f64(&self) -> f64;

    /// [min, max] 内均匀分布的整数
    fn random_range(&self, min: usize, max: usize) -> usize;

    /// 从 0..len 中无放回抽取 amount 个下标（amount 超过 len 时取 len 个）
    fn sample_indices(&self, len: usize, amount: usize) -> Vec<usize>;
}
