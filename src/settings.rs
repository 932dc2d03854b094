use super::*;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
  chain: Chain,
  fee_rate: FeeRate,
  enable_rbf: bool,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      chain: Chain::Mainnet,
      fee_rate: FeeRate::default(),
      enable_rbf: true,
    }
  }
}

impl Settings {
  pub(crate) fn load(options: Options) -> anyhow::Result<Self> {
    let config = match &options.config {
      Some(path) => Config::load(path)?,
      None => match &options.config_dir {
        Some(dir) if dir.join("ordtx.yaml").exists() => Config::load(&dir.join("ordtx.yaml"))?,
        Some(_) | None => Config::default(),
      },
    };

    Self::merge(options, config)
  }

  /// Command-line options take precedence over `ORDTX_` environment
  /// variables, which take precedence over the config file.
  pub(crate) fn merge(options: Options, config: Config) -> anyhow::Result<Self> {
    let chain = Self::setting_typed(
      options
        .signet
        .then_some(Chain::Signet)
        .or(options.regtest.then_some(Chain::Regtest))
        .or(options.testnet.then_some(Chain::Testnet))
        .or(options.chain_argument),
      Some("CHAIN"),
      config.chain,
      Chain::Mainnet,
    )?;

    let fee_rate = Self::setting_typed(
      options.fee_rate,
      Some("FEE_RATE"),
      config.fee_rate,
      FeeRate::default(),
    )?;

    let enable_rbf = Self::setting_typed(
      options.no_rbf.then_some(false),
      Some("RBF"),
      config.enable_rbf,
      true,
    )?;

    log::debug!("settings: chain {chain}, fee rate {fee_rate}, rbf {enable_rbf}");

    Ok(Self {
      chain,
      fee_rate,
      enable_rbf,
    })
  }

  pub fn chain(&self) -> Chain {
    self.chain
  }

  pub fn fee_rate(&self) -> FeeRate {
    self.fee_rate
  }

  pub fn enable_rbf(&self) -> bool {
    self.enable_rbf
  }

  fn setting_typed<T>(
    arg_value: Option<T>,
    env_key: Option<&str>,
    config_value: Option<T>,
    default_value: T,
  ) -> anyhow::Result<T>
  where
    T: FromStr,
    T::Err: Into<anyhow::Error>,
  {
    use anyhow::Context;

    if let Some(arg_value) = arg_value {
      return Ok(arg_value);
    }

    if let Some(env_key) = env_key {
      let key = format!("ORDTX_{env_key}");
      match env::var(&key) {
        Ok(env_value) => {
          return env_value
            .parse()
            .map_err(Into::<anyhow::Error>::into)
            .with_context(|| format!("failed to parse {key}"))
        }
        Err(err @ env::VarError::NotUnicode(_)) => return Err(err.into()),
        Err(env::VarError::NotPresent) => {}
      }
    }

    if let Some(config_value) = config_value {
      return Ok(config_value);
    }

    Ok(default_value)
  }
}
