use super::*;

/// Builds, signs, and broadcasts transactions for one account, fetching
/// fresh snapshots from its sources for every transaction. Transactions are
/// handled one at a time. Broadcast retries are the sink's concern.
pub struct Wallet<U, F, B, O> {
  account: Account,
  utxos: U,
  fees: F,
  broadcast: B,
  oracle: O,
}

impl<U, F, B, O> Wallet<U, F, B, O>
where
  U: UtxoSource,
  F: FeeSource,
  B: BroadcastSink,
  O: SigningOracle,
{
  pub fn new(account: Account, utxos: U, fees: F, broadcast: B, oracle: O) -> Self {
    Self {
      account,
      utxos,
      fees,
      broadcast,
      oracle,
    }
  }

  pub fn account(&self) -> &Account {
    &self.account
  }

  fn source_error(err: anyhow::Error) -> Error {
    Error::Source { err }
  }

  /// Plain UTXOs for `operation`. Splits and token sends may pay their fee
  /// from the surplus sats of the outputs they spend, every other operation
  /// needs at least one plain UTXO.
  async fn plain_utxos(&self, operation: &Operation) -> Result<Vec<Utxo>> {
    let utxos = self
      .utxos
      .plain_utxos(&self.account.address()?)
      .await
      .map_err(Self::source_error)?;

    let needed = match operation {
      Operation::Send { amount, .. } => Some(*amount),
      Operation::SendAll { .. }
      | Operation::SendInscription { .. }
      | Operation::SendInscriptions { .. }
      | Operation::SendNft { .. } => Some(DUST_THRESHOLD),
      Operation::SplitInscription { .. } | Operation::SendFungible { .. } => None,
    };

    if let Some(needed) = needed {
      if utxos.is_empty() {
        return Err(Error::InsufficientFunds {
          needed,
          available: Amount::ZERO,
          protected: Vec::new(),
        });
      }
    }

    Ok(utxos)
  }

  async fn assets(&self, operation: &Operation) -> Result<Vec<Utxo>> {
    match operation {
      Operation::SendInscription { inscription_id, .. }
      | Operation::SplitInscription { inscription_id, .. }
      | Operation::SendNft {
        nft_id: inscription_id,
        ..
      } => Ok(vec![self
        .utxos
        .inscription_utxo(*inscription_id)
        .await
        .map_err(Self::source_error)?
        .ok_or(Error::InscriptionNotFound {
          inscription_id: *inscription_id,
        })?]),
      Operation::SendInscriptions {
        inscription_ids, ..
      } => self
        .utxos
        .inscription_utxos(inscription_ids)
        .await
        .map_err(Self::source_error),
      Operation::SendFungible { ticker, .. } => self
        .utxos
        .fungible_utxos(&self.account.address()?, ticker)
        .await
        .map_err(Self::source_error),
      Operation::Send { .. } | Operation::SendAll { .. } => Ok(Vec::new()),
    }
  }

  /// Build `intent` against fresh snapshots without signing.
  pub async fn build(&self, intent: &TransactionIntent) -> Result<Built> {
    let utxos = self.plain_utxos(&intent.operation).await?;
    let assets = self.assets(&intent.operation).await?;

    TransactionBuilder::new(&self.account, &utxos)
      .assets(&assets)
      .build(intent)
  }

  pub async fn estimate_fee(&self, intent: &TransactionIntent) -> Result<Amount> {
    self.build(intent).await?.skeleton.fee()
  }

  /// Sign the account's inputs of `psbt`, resolving them from `requests`
  /// when given. On failure `psbt` keeps the signatures attached so far and
  /// should be discarded.
  pub async fn sign_psbt(
    &self,
    psbt: &mut Psbt,
    requests: Option<&[SignerRequest]>,
    auto_finalize: bool,
  ) -> Result<SignOutcome> {
    let coordinator = SigningCoordinator::new(&self.account, &self.oracle);
    let inputs = coordinator.signing_inputs(psbt, requests)?;
    coordinator.sign(psbt, &inputs, auto_finalize).await
  }

  async fn execute(&self, intent: TransactionIntent) -> Result<(SignedTransaction, Option<usize>)> {
    let built = self.build(&intent).await?;

    let mut psbt = built.skeleton.to_psbt()?;

    self.sign_psbt(&mut psbt, None, true).await?;

    let signed = SignedTransaction::extract(&psbt)?;

    log::info!(
      "signed transaction {} paying {} sats fee",
      signed.txid(),
      signed.fee.to_sat()
    );

    Ok((signed, built.split_count))
  }

  pub async fn send_btc(
    &self,
    to: Address<NetworkUnchecked>,
    amount: Amount,
    fee_rate: FeeRate,
    enable_rbf: bool,
  ) -> Result<SignedTransaction> {
    let intent = TransactionIntent::new(Operation::Send { to, amount }, fee_rate, enable_rbf);
    Ok(self.execute(intent).await?.0)
  }

  pub async fn send_all_btc(
    &self,
    to: Address<NetworkUnchecked>,
    fee_rate: FeeRate,
    enable_rbf: bool,
  ) -> Result<SignedTransaction> {
    let intent = TransactionIntent::new(Operation::SendAll { to }, fee_rate, enable_rbf);
    Ok(self.execute(intent).await?.0)
  }

  pub async fn send_inscription(
    &self,
    to: Address<NetworkUnchecked>,
    inscription_id: InscriptionId,
    output_value: Amount,
    fee_rate: FeeRate,
    enable_rbf: bool,
  ) -> Result<SignedTransaction> {
    let intent = TransactionIntent::new(
      Operation::SendInscription {
        to,
        inscription_id,
        output_value,
      },
      fee_rate,
      enable_rbf,
    );
    Ok(self.execute(intent).await?.0)
  }

  pub async fn send_inscriptions(
    &self,
    to: Address<NetworkUnchecked>,
    inscription_ids: Vec<InscriptionId>,
    fee_rate: FeeRate,
    enable_rbf: bool,
  ) -> Result<SignedTransaction> {
    let intent = TransactionIntent::new(
      Operation::SendInscriptions {
        to,
        inscription_ids,
      },
      fee_rate,
      enable_rbf,
    );
    Ok(self.execute(intent).await?.0)
  }

  /// Send the output holding `nft_id` whole. Fails if other attachments
  /// share the output.
  pub async fn send_nft(
    &self,
    to: Address<NetworkUnchecked>,
    nft_id: InscriptionId,
    fee_rate: FeeRate,
    enable_rbf: bool,
  ) -> Result<SignedTransaction> {
    let intent = TransactionIntent::new(Operation::SendNft { to, nft_id }, fee_rate, enable_rbf);
    Ok(self.execute(intent).await?.0)
  }

  /// Returns the transaction and the number of outputs the inscriptions
  /// were split into.
  pub async fn split_inscription(
    &self,
    inscription_id: InscriptionId,
    output_value: Amount,
    fee_rate: FeeRate,
    enable_rbf: bool,
  ) -> Result<(SignedTransaction, usize)> {
    let intent = TransactionIntent::new(
      Operation::SplitInscription {
        inscription_id,
        output_value,
      },
      fee_rate,
      enable_rbf,
    );
    let (signed, split_count) = self.execute(intent).await?;
    Ok((signed, split_count.unwrap_or_default()))
  }

  pub async fn send_fungible(
    &self,
    to: Address<NetworkUnchecked>,
    ticker: String,
    amount: u64,
    fee_rate: FeeRate,
    enable_rbf: bool,
  ) -> Result<SignedTransaction> {
    let intent = TransactionIntent::new(
      Operation::SendFungible { to, ticker, amount },
      fee_rate,
      enable_rbf,
    );
    Ok(self.execute(intent).await?.0)
  }

  pub async fn push_transaction(&self, transaction: &SignedTransaction) -> Result<Txid> {
    let txid = self
      .broadcast
      .push_transaction(&transaction.raw_hex())
      .await
      .map_err(|err| Error::Broadcast { err })?;

    log::info!("broadcast transaction {txid}");

    Ok(txid)
  }

  pub async fn fee_rate_tiers(&self) -> Result<FeeRateTiers> {
    self
      .fees
      .fee_rate_tiers()
      .await
      .map_err(Self::source_error)
  }
}
