use super::*;

/// Satoshis per virtual byte. Serialized as a JSON number.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "f64")]
pub struct FeeRate(f64);

impl FromStr for FeeRate {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::try_from(f64::from_str(s)?)
  }
}

impl TryFrom<f64> for FeeRate {
  type Error = anyhow::Error;

  fn try_from(rate: f64) -> Result<Self, Self::Error> {
    if rate.is_sign_negative() | rate.is_nan() | rate.is_infinite() {
      anyhow::bail!("invalid fee rate: {rate}")
    }
    Ok(Self(rate))
  }
}

impl Display for FeeRate {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl Default for FeeRate {
  fn default() -> Self {
    Self(1.0)
  }
}

impl FeeRate {
  pub fn fee(&self, vsize: usize) -> Amount {
    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::cast_sign_loss)]
    #[allow(clippy::cast_precision_loss)]
    Amount::from_sat((self.0 * vsize as f64).round() as u64)
  }

  pub fn n(&self) -> f64 {
    self.0
  }
}
