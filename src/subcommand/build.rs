use super::*;

#[derive(Debug, Parser)]
pub(crate) struct Build {
  #[arg(long, help = "Load the transaction intent from <INTENT>.")]
  pub(crate) intent: PathBuf,
  #[arg(long, help = "Load the account's UTXO snapshot from <UTXOS>.")]
  pub(crate) utxos: PathBuf,
  #[arg(long, help = "Load indexer attachment records from <ATTACHMENTS>.")]
  pub(crate) attachments: Option<PathBuf>,
  #[arg(long, help = "Build for the account of <PUBLIC_KEY>.")]
  pub(crate) public_key: PublicKey,
  #[arg(long, value_enum, help = "Use addresses of <ADDRESS_TYPE>.")]
  pub(crate) address_type: AddressType,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Output {
  pub psbt: String,
  pub fee: u64,
  pub vsize: usize,
  pub change: Option<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub split_count: Option<usize>,
}

impl Build {
  pub(crate) fn built(&self, settings: &Settings) -> anyhow::Result<Built> {
    let account = Account::new(self.public_key, self.address_type, settings.chain());

    let intent = TransactionIntent::load(&self.intent, settings)?;

    let utxos = load_json::<Vec<Utxo>>(&self.utxos)?;

    let records = match &self.attachments {
      Some(path) => load_json::<Vec<AttachmentRecord>>(path)?,
      None => Vec::new(),
    };

    let classification = Classification::classify(&utxos, &records)?;

    let assets = classification
      .inscription_bearing
      .iter()
      .chain(&classification.fungible_bearing)
      .cloned()
      .collect::<Vec<Utxo>>();

    // asset-bearing outputs stay visible to selection so shortfalls name them
    let utxos = classification
      .plain
      .iter()
      .chain(&assets)
      .cloned()
      .collect::<Vec<Utxo>>();

    Ok(
      TransactionBuilder::new(&account, &utxos)
        .assets(&assets)
        .build(&intent)?,
    )
  }

  pub(crate) fn run(self, settings: Settings) -> SubcommandResult {
    let built = self.built(&settings)?;

    Ok(Some(Box::new(Output {
      psbt: encode_psbt(&built.skeleton.to_psbt()?),
      fee: built.skeleton.fee()?.to_sat(),
      vsize: built.skeleton.estimate_vsize(),
      change: built.skeleton.change,
      split_count: built.split_count,
    })))
  }
}

#[cfg(test)]
mod tests {
  use {super::*, tempfile::TempDir};

  fn write_inputs(tempdir: &TempDir, operation: Operation, utxos: &[Utxo]) -> Build {
    let intent = tempdir.path().join("intent.json");
    let utxos_path = tempdir.path().join("utxos.json");

    fs::write(
      &intent,
      serde_json::to_string(&intent_json(operation)).unwrap(),
    )
    .unwrap();

    fs::write(&utxos_path, serde_json::to_string(utxos).unwrap()).unwrap();

    Build {
      intent,
      utxos: utxos_path,
      attachments: None,
      public_key: public_key(1),
      address_type: AddressType::P2tr,
    }
  }

  fn intent_json(operation: Operation) -> serde_json::Value {
    serde_json::json!({ "operation": operation })
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

  #[test]
  fn build_send() {
    let tempdir = TempDir::new().unwrap();

    let build = write_inputs(
      &tempdir,
      Operation::Send {
        to: recipient_unchecked(),
        amount: Amount::from_sat(5_000),
      },
      &[utxo(1, 10_000)],
    );

    let built = build.built(&testnet()).unwrap();

    assert_eq!(built.skeleton.inputs.len(), 1);
    assert_eq!(built.skeleton.outputs[0].value, Amount::from_sat(5_000));
    assert_eq!(built.skeleton.change, Some(1));
  }

  #[test]
  fn attachments_protect_outputs() {
    let tempdir = TempDir::new().unwrap();

    let mut build = write_inputs(
      &tempdir,
      Operation::Send {
        to: recipient_unchecked(),
        amount: Amount::from_sat(5_000),
      },
      &[utxo(1, 10_000), utxo(2, 10_000)],
    );

    let attachments = tempdir.path().join("attachments.json");

    fs::write(
      &attachments,
      serde_json::to_string(&[AttachmentRecord::Inscription {
        outpoint: outpoint(1),
        attachment: InscriptionAttachment {
          inscription_id: inscription_id(1),
          offset: 0,
        },
      }])
      .unwrap(),
    )
    .unwrap();

    build.attachments = Some(attachments);

    let built = build.built(&testnet()).unwrap();

    assert!(!built.skeleton.spends(outpoint(1)));
    assert!(built.skeleton.spends(outpoint(2)));
  }

  #[test]
  fn testnet_recipient_is_rejected_on_mainnet() {
    let tempdir = TempDir::new().unwrap();

    let build = write_inputs(
      &tempdir,
      Operation::SendAll {
        to: recipient_unchecked(),
      },
      &[utxo(1, 10_000)],
    );

    assert!(build.built(&Settings::default()).is_err());
  }

  #[test]
  fn output_reports_split_count() {
    let tempdir = TempDir::new().unwrap();

    let build = write_inputs(
      &tempdir,
      Operation::SplitInscription {
        inscription_id: inscription_id(1),
        output_value: Amount::from_sat(546),
      },
      &[utxo(1, 5_000), inscribed_utxo(2, 10_000, &[(1, 0), (2, 5_000)])],
    );

    let built = build.built(&testnet()).unwrap();

    assert_eq!(built.split_count, Some(2));
  }
}
