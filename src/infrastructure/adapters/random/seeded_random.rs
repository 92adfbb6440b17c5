//! Seeded Random - 基于 StdRng 的随机源
//!
//! 指定种子时序列可复现，否则从系统熵初始化。

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, MutexGuard};

use crate::application::ports::RandomPort;

pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// 配置了种子则可复现
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::from_entropy(),
        }
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RandomPort for SeededRandom {
    fn random_f64(&self) -> f64 {
        self.rng().gen::<f64>()
    }

    fn random_range(&self, min: usize, max: usize) -> usize {
        if min >= max {
            return min;
        }
        self.rng().gen_range(min..=max)
    }

    fn sample_indices(&self, len: usize, amount: usize) -> Vec<usize> {
        let amount = amount.min(len);
        index::sample(&mut *self.rng(), len, amount).into_vec()
    }
}
