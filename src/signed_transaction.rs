use {super::*, snafu::ResultExt};

/// A fully finalized transaction, ready for broadcast.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedTransaction {
  pub transaction: Transaction,
  pub fee: Amount,
}

impl SignedTransaction {
  /// Extract the network transaction from `psbt`. Fails if any input is
  /// not finalized.
  pub fn extract(psbt: &Psbt) -> Result<Self> {
    let unresolved = psbt
      .inputs
      .iter()
      .enumerate()
      .filter(|(_, input)| InputState::of(input) != InputState::Finalized)
      .map(|(index, _)| index)
      .collect::<Vec<usize>>();

    if !unresolved.is_empty() {
      return Err(Error::Unresolved {
        indices: unresolved,
      });
    }

    let fee = psbt.fee().context(error::Psbt)?;

    Ok(Self {
      transaction: psbt.clone().extract_tx_unchecked_fee_rate(),
      fee,
    })
  }

  pub fn txid(&self) -> Txid {
    self.transaction.compute_txid()
  }

  pub fn raw_hex(&self) -> String {
    consensus::encode::serialize_hex(&self.transaction)
  }

  pub fn vsize(&self) -> usize {
    self.transaction.vsize()
  }
}
