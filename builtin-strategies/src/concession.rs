use serde::{Deserialize, Serialize};

/// Time dependent concession. Target utility starts at 1 and falls to
/// reservation value at the deadline; `discount_factor` shapes the curve
/// (1 is linear, below 1 concedes early, above 1 holds out until the end).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConcessionPolicy {
    pub discount_factor: f64,
    pub reservation_value: f64,
}

impl ConcessionPolicy {
    pub fn new(discount_factor: f64, reservation_value: f64) -> ConcessionPolicy {
        ConcessionPolicy {
            discount_factor,
            reservation_value,
        }
    }

    /// Minimal own utility acceptable after `elapsed_fraction` of negotiation time.
    /// Result is always in range [reservation_value, 1].
    pub fn threshold(&self, elapsed_fraction: f64) -> f64 {
        let reservation = self.reservation_value.clamp(0.0, 1.0);
        let elapsed = if elapsed_fraction.is_nan() {
            1.0
        } else {
            elapsed_fraction.clamp(0.0, 1.0)
        };

        // 0^0 would concede everything at the very start.
        if elapsed <= 0.0 {
            return 1.0;
        }

        let target = 1.0 - elapsed.powf(self.discount_factor) * (1.0 - reservation);
        if target.is_nan() {
            return reservation;
        }
        target.clamp(reservation, 1.0)
    }
}
