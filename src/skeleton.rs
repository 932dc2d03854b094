use {super::*, snafu::ResultExt};

/// Asset metadata carried along with an output for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum OutputAsset {
  Inscription {
    inscription_id: InscriptionId,
    offset: u64,
  },
  Fungible {
    ticker: String,
    amount: u64,
  },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkeletonInput {
  pub utxo: Utxo,
  pub sequence: Sequence,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkeletonOutput {
  pub script_pubkey: ScriptBuf,
  #[serde(with = "bitcoin::amount::serde::as_sat")]
  pub value: Amount,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub assets: Vec<OutputAsset>,
}

impl SkeletonOutput {
  pub fn new(script_pubkey: ScriptBuf, value: Amount) -> Self {
    Self {
      script_pubkey,
      value,
      assets: Vec::new(),
    }
  }

  pub fn tx_out(&self) -> TxOut {
    TxOut {
      value: self.value,
      script_pubkey: self.script_pubkey.clone(),
    }
  }
}

/// An unsigned transaction together with the UTXOs it spends. Built by the
/// transaction builder, settled by the fee estimator, and turned into a PSBT
/// for signing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Skeleton {
  pub inputs: Vec<SkeletonInput>,
  pub outputs: Vec<SkeletonOutput>,
  pub change: Option<usize>,
  pub chain: Chain,
}

impl Skeleton {
  pub fn new(chain: Chain) -> Self {
    Self {
      inputs: Vec::new(),
      outputs: Vec::new(),
      change: None,
      chain,
    }
  }

  pub fn push_input(&mut self, utxo: Utxo, sequence: Sequence) {
    self.inputs.push(SkeletonInput { utxo, sequence });
  }

  pub fn spends(&self, outpoint: OutPoint) -> bool {
    self
      .inputs
      .iter()
      .any(|input| input.utxo.outpoint == outpoint)
  }

  pub fn input_value(&self) -> Result<Amount> {
    self
      .inputs
      .iter()
      .try_fold(Amount::ZERO, |total, input| {
        total.checked_add(input.utxo.value)
      })
      .ok_or(Error::ValueOverflow)
  }

  pub fn output_value(&self) -> Result<Amount> {
    self
      .outputs
      .iter()
      .try_fold(Amount::ZERO, |total, output| total.checked_add(output.value))
      .ok_or(Error::ValueOverflow)
  }

  /// Value of every output except change.
  pub fn fixed_output_value(&self) -> Result<Amount> {
    self
      .outputs
      .iter()
      .enumerate()
      .filter(|(i, _)| Some(*i) != self.change)
      .try_fold(Amount::ZERO, |total, (_, output)| {
        total.checked_add(output.value)
      })
      .ok_or(Error::ValueOverflow)
  }

  pub fn fee(&self) -> Result<Amount> {
    self
      .input_value()?
      .checked_sub(self.output_value()?)
      .ok_or(Error::ValueOverflow)
  }

  pub fn change_output(&self) -> Option<&SkeletonOutput> {
    self.change.map(|i| &self.outputs[i])
  }

  pub fn unsigned_transaction(&self) -> Transaction {
    Transaction {
      version: Version(2),
      lock_time: LockTime::ZERO,
      input: self
        .inputs
        .iter()
        .map(|input| TxIn {
          previous_output: input.utxo.outpoint,
          script_sig: ScriptBuf::new(),
          sequence: input.sequence,
          witness: Witness::new(),
        })
        .collect(),
      output: self.outputs.iter().map(SkeletonOutput::tx_out).collect(),
    }
  }

  /// Virtual size of the transaction once every input carries a
  /// signature.
  pub fn estimate_vsize(&self) -> usize {
    let mut transaction = self.unsigned_transaction();

    for (tx_in, input) in transaction.input.iter_mut().zip(&self.inputs) {
      let (script_sig, witness) = input.utxo.address_type.placeholder_spend();
      tx_in.script_sig = script_sig;
      tx_in.witness = witness;
    }

    transaction.vsize()
  }

  /// PSBT carrying every prevout. Taproot inputs only get an internal key
  /// if the wallet's single-key output script for the input's key matches
  /// the prevout script exactly.
  pub fn to_psbt(&self) -> Result<Psbt> {
    let mut psbt = Psbt::from_unsigned_tx(self.unsigned_transaction()).context(error::Psbt)?;

    for (psbt_input, input) in psbt.inputs.iter_mut().zip(&self.inputs) {
      let utxo = &input.utxo;

      psbt_input.witness_utxo = Some(utxo.tx_out());
      psbt_input.redeem_script = utxo.address_type.redeem_script(&utxo.public_key)?;

      if utxo.address_type.is_taproot() {
        let derived = utxo
          .address_type
          .address(&utxo.public_key, self.chain)?
          .script_pubkey();

        if derived == utxo.script_pubkey {
          psbt_input.tap_internal_key = Some(XOnlyPublicKey::from(utxo.public_key.inner));
        } else {
          log::warn!(
            "taproot input {} does not pay to the single-key output of {}, leaving internal key unset",
            utxo.outpoint,
            utxo.public_key,
          );
        }
      }
    }

    Ok(psbt)
  }

  /// Panics if the skeleton breaks a construction rule. Called on every
  /// skeleton the builder returns.
  pub(crate) fn assert_invariants(&self, fee_rate: FeeRate) {
    let outpoints = self
      .inputs
      .iter()
      .map(|input| input.utxo.outpoint)
      .collect::<BTreeSet<OutPoint>>();

    assert_eq!(
      outpoints.len(),
      self.inputs.len(),
      "invariant: inputs are unique"
    );

    assert!(!self.inputs.is_empty(), "invariant: transaction has inputs");
    assert!(!self.outputs.is_empty(), "invariant: transaction has outputs");

    if let Some(change) = self.change {
      assert!(
        change < self.outputs.len(),
        "invariant: change index is in range"
      );
    }

    for output in &self.outputs {
      assert!(
        output.value >= DUST_THRESHOLD,
        "invariant: all outputs are above dust limit: {} < {}",
        output.value.to_sat(),
        DUST_THRESHOLD.to_sat(),
      );
    }

    let fee = self.fee();

    assert!(fee.is_ok(), "invariant: inputs cover outputs");

    if let Ok(fee) = fee {
      assert!(
        fee >= fee_rate.fee(self.estimate_vsize()),
        "invariant: fee covers estimated size: {} < {}",
        fee.to_sat(),
        fee_rate.fee(self.estimate_vsize()).to_sat(),
      );
    }
  }
}
