use super::*;

#[derive(Debug, Parser)]
pub(crate) struct EstimateFee {
  #[command(flatten)]
  pub(crate) build: build::Build,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Output {
  pub fee: u64,
}

impl EstimateFee {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    Ok(Some(Box::new(Output {
      fee: self.build.built(&settings)?.skeleton.fee()?.to_sat(),
    })))
  }
}
