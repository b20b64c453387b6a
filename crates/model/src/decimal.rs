use std::fmt::{Debug, Display};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const DECIMALS: u32 = 2;
const SCALE: i64 = 10i64.pow(DECIMALS);

/// Fixed point number with two fractional digits.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decimal(i64);

impl Decimal {
    pub fn int(value: i64) -> Decimal {
        Decimal(value * SCALE)
    }

    pub fn from_hundredths(value: i64) -> Decimal {
        Decimal(value)
    }

    pub fn zero() -> Decimal {
        Decimal(0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn hundredths(&self) -> i64 {
        self.0
    }
}

// Rounds half away from zero, saturating at the i64 bounds.
fn div_round(num: i128, den: i128) -> i64 {
    let half = den.abs() / 2;
    let adjusted = if (num < 0) == (den < 0) {
        num + half * den.signum()
    } else {
        num - half * den.signum()
    };
    let value = adjusted / den;
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

impl Debug for Decimal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Decimal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(
            f,
            "{}{}.{:02}",
            sign,
            abs / SCALE as u64,
            abs % SCALE as u64
        )
    }
}

impl From<f64> for Decimal {
    fn from(value: f64) -> Self {
        Decimal((value * SCALE as f64).round() as i64)
    }
}

impl std::ops::Mul for Decimal {
    type Output = Decimal;

    fn mul(self, other: Decimal) -> Decimal {
        Decimal(div_round(self.0 as i128 * other.0 as i128, SCALE as i128))
    }
}

impl std::ops::Div for Decimal {
    type Output = Decimal;

    fn div(self, other: Decimal) -> Decimal {
        Decimal(div_round(self.0 as i128 * SCALE as i128, other.0 as i128))
    }
}

impl Serialize for Decimal {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(self.0)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = i64::deserialize(deserializer)?;
        Ok(Decimal(value))
    }
}
