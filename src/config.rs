use super::*;

#[derive(Deserialize, Default, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
  pub(crate) chain: Option<Chain>,
  pub(crate) fee_rate: Option<FeeRate>,
  pub(crate) enable_rbf: Option<bool>,
}

impl Config {
  pub(crate) fn load(path: &std::path::Path) -> anyhow::Result<Self> {
    use anyhow::Context;

    serde_yaml::from_reader(
      File::open(path)
        .with_context(|| format!("failed to open config file `{}`", path.display()))?,
    )
    .with_context(|| format!("failed to deserialize config file `{}`", path.display()))
  }
}
