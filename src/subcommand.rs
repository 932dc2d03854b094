use {super::*, serde::de::DeserializeOwned, std::io};

pub mod build;
pub mod estimate_fee;
pub mod sign;
pub mod signing_inputs;

#[derive(Debug, Parser)]
pub(crate) enum Subcommand {
  #[command(about = "Build an unsigned transaction from an intent")]
  Build(build::Build),
  #[command(about = "Estimate the fee an intent would pay")]
  EstimateFee(estimate_fee::EstimateFee),
  #[command(about = "Sign a PSBT with a WIF key from ORDTX_WIF")]
  Sign(sign::Sign),
  #[command(about = "List the PSBT inputs an account would sign")]
  SigningInputs(signing_inputs::SigningInputs),
}

impl Subcommand {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    match self {
      Self::Build(build) => build.run(settings),
      Self::EstimateFee(estimate_fee) => estimate_fee.run(settings),
      Self::Sign(sign) => sign.run(settings),
      Self::SigningInputs(signing_inputs) => signing_inputs.run(settings),
    }
  }
}

pub trait Output: Send {
  fn print_json(&self);
}

impl<T> Output for T
where
  T: Serialize + Send,
{
  fn print_json(&self) {
    serde_json::to_writer_pretty(io::stdout(), self).ok();
    println!();
  }
}

pub(crate) type SubcommandResult = anyhow::Result<Option<Box<dyn Output>>>;

fn load_json<T: DeserializeOwned>(path: &std::path::Path) -> anyhow::Result<T> {
  use anyhow::Context;

  serde_json::from_reader(
    File::open(path).with_context(|| format!("failed to open `{}`", path.display()))?,
  )
  .with_context(|| format!("failed to deserialize `{}`", path.display()))
}

fn decode_psbt(psbt: &str) -> anyhow::Result<Psbt> {
  Ok(Psbt::deserialize(&base64_decode(psbt)?)?)
}

fn encode_psbt(psbt: &Psbt) -> String {
  base64_encode(&psbt.serialize())
}

/// Parse `<INDEX>:<ADDRESS|PUBLIC_KEY>`.
fn parse_signer_request(s: &str) -> anyhow::Result<SignerRequest> {
  let Some((index, signer)) = s.split_once(':') else {
    anyhow::bail!("expected `<INDEX>:<SIGNER>`, got `{s}`");
  };

  Ok(SignerRequest::new(index.parse()?, signer.parse()?))
}
