use super::*;

#[derive(Debug, Parser)]
pub(crate) struct SigningInputs {
  #[arg(long, help = "Resolve inputs of base64-encoded <PSBT>.")]
  pub(crate) psbt: String,
  #[arg(long, help = "Resolve inputs for the account of <PUBLIC_KEY>.")]
  pub(crate) public_key: PublicKey,
  #[arg(long, value_enum, help = "Use addresses of <ADDRESS_TYPE>.")]
  pub(crate) address_type: AddressType,
  #[arg(
    long = "signer",
    value_parser = parse_signer_request,
    help = "Sign input as <INDEX>:<ADDRESS|PUBLIC_KEY> instead of detecting owned inputs. May be repeated."
  )]
  pub(crate) signers: Vec<SignerRequest>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Output {
  pub inputs: Vec<usize>,
}

impl SigningInputs {
  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    Ok(Some(Box::new(self.output(&settings)?)))
  }

  fn output(&self, settings: &Settings) -> anyhow::Result<Output> {
    let psbt = decode_psbt(&self.psbt)?;

    let account = Account::new(self.public_key, self.address_type, settings.chain());

    let coordinator = SigningCoordinator::new(&account, &UnavailableOracle);

    let requests = (!self.signers.is_empty()).then_some(self.signers.as_slice());

    Ok(Output {
      inputs: coordinator
        .signing_inputs(&psbt, requests)?
        .into_iter()
        .map(|input| input.index)
        .collect(),
    })
  }
}

/// Input resolution never signs.
struct UnavailableOracle;

#[async_trait]
impl SigningOracle for UnavailableOracle {
  async fn sign(&self, _request: SignRequest) -> Result<OracleSignature, OracleError> {
    Err(OracleError::Failed {
      message: "no signing key available".into(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn psbt(account: &Account) -> String {
    let utxos = [utxo_for(account, 1, 10_000), utxo_for(account, 2, 10_000)];

    encode_psbt(
      &TransactionBuilder::new(account, &utxos)
        .build(&intent(Operation::Send {
          to: recipient_unchecked(),
          amount: Amount::from_sat(15_000),
        }))
        .unwrap()
        .skeleton
        .to_psbt()
        .unwrap(),
    )
  }

  fn testnet() -> Settings {
    Settings::merge(
      Options {
        testnet: true,
        ..default()
      },
      Config::default(),
    )
    .unwrap()
  }

  fn inputs(signing_inputs: SigningInputs) -> Output {
    signing_inputs.output(&testnet()).unwrap()
  }

  #[test]
  fn implicit() {
    let account = account(AddressType::P2wpkh);

    let output = inputs(SigningInputs {
      psbt: psbt(&account),
      public_key: public_key(1),
      address_type: AddressType::P2wpkh,
      signers: Vec::new(),
    });

    assert_eq!(output.inputs, [0, 1]);
  }

  #[test]
  fn foreign_account_resolves_nothing() {
    let account = account(AddressType::P2wpkh);

    let output = inputs(SigningInputs {
      psbt: psbt(&account),
      public_key: public_key(2),
      address_type: AddressType::P2wpkh,
      signers: Vec::new(),
    });

    assert!(output.inputs.is_empty());
  }

  #[test]
  fn explicit() {
    let account = account(AddressType::P2tr);

    let output = inputs(SigningInputs {
      psbt: psbt(&account),
      public_key: public_key(1),
      address_type: AddressType::P2tr,
      signers: vec![SignerRequest::new(1, Signer::PublicKey(public_key(1)))],
    });

    assert_eq!(output.inputs, [1]);
  }
}
