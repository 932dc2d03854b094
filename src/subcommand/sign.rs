use super::*;

#[derive(Debug, Parser)]
pub(crate) struct Sign {
  #[arg(long, help = "Sign base64-encoded <PSBT>.")]
  pub(crate) psbt: String,
  #[arg(long, value_enum, help = "Sign as the <ADDRESS_TYPE> account of the WIF key.")]
  pub(crate) address_type: AddressType,
  #[arg(long, help = "Leave signed inputs unfinalized.")]
  pub(crate) no_finalize: bool,
  #[arg(
    long = "signer",
    value_parser = parse_signer_request,
    help = "Sign input as <INDEX>:<ADDRESS|PUBLIC_KEY> instead of detecting owned inputs. May be repeated."
  )]
  pub(crate) signers: Vec<SignerRequest>,
  #[arg(long, env = "ORDTX_WIF", hide_env_values = true, help = "Sign with <WIF>.")]
  pub(crate) wif: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Output {
  pub psbt: String,
  pub signed: Vec<usize>,
  pub unresolved: Vec<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub transaction: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub txid: Option<Txid>,
}

impl Sign {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    let output = Runtime::new()?.block_on(self.output(&settings))?;
    Ok(Some(Box::new(output)))
  }

  async fn output(&self, settings: &Settings) -> anyhow::Result<Output> {
    let mut psbt = decode_psbt(&self.psbt)?;

    let oracle = LocalKeyOracle::from_wif(&self.wif)?;

    let account = Account::new(oracle.public_key(), self.address_type, settings.chain());

    let coordinator = SigningCoordinator::new(&account, &oracle);

    let requests = (!self.signers.is_empty()).then_some(self.signers.as_slice());

    let inputs = coordinator.signing_inputs(&psbt, requests)?;

    let outcome = coordinator.sign(&mut psbt, &inputs, !self.no_finalize).await?;

    let finalized = psbt
      .inputs
      .iter()
      .all(|input| InputState::of(input) == InputState::Finalized);

    let transaction = if finalized {
      Some(SignedTransaction::extract(&psbt)?)
    } else {
      None
    };

    Ok(Output {
      psbt: encode_psbt(&psbt),
      signed: outcome.signed,
      unresolved: outcome.unresolved,
      txid: transaction.as_ref().map(SignedTransaction::txid),
      transaction: transaction.as_ref().map(SignedTransaction::raw_hex),
    })
  }
}
