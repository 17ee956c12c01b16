//! Edge cost functions for the bipartite reaction graph.
//!
//! `rexp` grows as `exp(38.94 ΔG)` for uphill steps and overflows `f64`
//! above roughly 18 eV, so it is carried as a [`WideWeight`], a positive
//! real stored by its natural logarithm.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Add;

/// Ratio applied inside the softplus cost.
pub const SOFTPLUS_SCALE: f64 = 273.0 / 500.0;
/// Scale applied to uphill free energies by the `rexp` cost.
pub const REXP_UPHILL_SCALE: f64 = 38.94;

/// Non-negative real number stored as `ln(value)`.
///
/// Zero is represented by `ln = -inf`, which is also the [`Default`], so
/// sums start from zero. Addition is log-sum-exp and never overflows.
#[derive(Clone, Copy, PartialEq)]
pub struct WideWeight {
    ln: f64,
}

impl WideWeight {
    pub const ZERO: WideWeight = WideWeight {
        ln: f64::NEG_INFINITY,
    };

    pub fn from_ln(ln: f64) -> Self {
        Self { ln }
    }

    /// Wraps an ordinary non-negative value.
    pub fn from_value(value: f64) -> Self {
        Self { ln: value.ln() }
    }

    pub fn ln(self) -> f64 {
        self.ln
    }

    /// The value as `f64`, saturating to infinity when it does not fit.
    pub fn to_f64(self) -> f64 {
        self.ln.exp()
    }

    pub fn is_zero(self) -> bool {
        self.ln == f64::NEG_INFINITY
    }
}

impl Default for WideWeight {
    fn default() -> Self {
        Self::ZERO
    }
}

impl PartialOrd for WideWeight {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.ln.partial_cmp(&other.ln)
    }
}

impl Add for WideWeight {
    type Output = WideWeight;

    fn add(self, rhs: WideWeight) -> WideWeight {
        if self.is_zero() {
            return rhs;
        }
        if rhs.is_zero() {
            return self;
        }
        let (hi, lo) = if self.ln >= rhs.ln {
            (self.ln, rhs.ln)
        } else {
            (rhs.ln, self.ln)
        };
        WideWeight::from_ln(hi + (lo - hi).exp().ln_1p())
    }
}

impl fmt::Debug for WideWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WideWeight(exp({}))", self.ln)
    }
}

impl fmt::Display for WideWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.to_f64();
        if value.is_finite() {
            write!(f, "{value}")
        } else {
            write!(f, "exp({})", self.ln)
        }
    }
}

/// `ln(1 + (273/500) e^ΔG)`, evaluated without overflow.
pub fn softplus(free_energy: f64) -> f64 {
    let x = free_energy + SOFTPLUS_SCALE.ln();
    if x > 0.0 {
        x + (-x).exp().ln_1p()
    } else {
        x.exp().ln_1p()
    }
}

pub fn exponent(free_energy: f64) -> f64 {
    free_energy.exp()
}

/// `e^ΔG` downhill, `e^(38.94 ΔG)` uphill.
pub fn rexp(free_energy: f64) -> WideWeight {
    if free_energy <= 0.0 {
        WideWeight::from_ln(free_energy)
    } else {
        WideWeight::from_ln(REXP_UPHILL_SCALE * free_energy)
    }
}
