use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Exponentially weighted moving average.
///
/// Standard period-based smoothing: alpha = 2 / (period + 1). The first
/// sample initialises the average; every later sample blends in with
/// `value = alpha * sample + (1 - alpha) * value`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ewma {
    value: Decimal,
    alpha: Decimal,
    initialized: bool,
}

impl Ewma {
    pub fn from_period(period: usize) -> Self {
        Ewma {
            value: Decimal::ZERO,
            alpha: Decimal::TWO / Decimal::from(period + 1),
            initialized: false,
        }
    }

    pub fn with_alpha(alpha: Decimal) -> Self {
        Ewma {
            value: Decimal::ZERO,
            alpha,
            initialized: false,
        }
    }

    pub fn push(&mut self, sample: Decimal) {
        if !self.initialized {
            self.value = sample;
            self.initialized = true;
        } else {
            self.value = self.alpha * sample + (Decimal::ONE - self.alpha) * self.value;
        }
    }

    pub fn value(&self) -> Option<Decimal> {
        if self.initialized {
            Some(self.value)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn first_sample_initialises() {
        let mut ewma = Ewma::from_period(9);
        assert_eq!(ewma.value(), None);

        ewma.push(dec!(100));
        assert_eq!(ewma.value(), Some(dec!(100)));

        // alpha = 0.2: 0.2 * 200 + 0.8 * 100 = 120
        ewma.push(dec!(200));
        assert_eq!(ewma.value(), Some(dec!(120)));
    }

    #[test]
    fn converges_on_a_constant_series() {
        let mut ewma = Ewma::from_period(9);
        for _ in 0..50 {
            ewma.push(dec!(42));
        }
        assert_eq!(ewma.value(), Some(dec!(42)));
    }
}
