//! 测试辅助：确定性随机源

use std::sync::Mutex;

use crate::application::ports::RandomPort;

/// 按脚本返回随机值
///
/// `random_f64` 依次弹出预设值（耗尽后返回 0.0），`random_range` 返回夹到区间内的固定值，
/// `sample_indices` 总是取前 amount 个下标。
pub(crate) struct FixedRandom {
    floats: Mutex<Vec<f64>>,
    range_value: usize,
}

impl FixedRandom {
    pub(crate) fn new(floats: Vec<f64>, range_value: usize) -> Self {
        Self {
            floats: Mutex::new(floats),
            range_value,
        }
    }
}

impl RandomPort for FixedRandom {
    fn random_f64(&self) -> f64 {
        let mut floats = self.floats.lock().unwrap();
        if floats.is_empty() {
            0.0
        } else {
            floats.remove(0)
        }
    }

    fn random_range(&self, min: usize, max: usize) -> usize {
        self.range_value.clamp(min, max)
    }

    fn sample_indices(&self, len: usize, amount: usize) -> Vec<usize> {
        (0..len.min(amount)).collect()
    }
}
