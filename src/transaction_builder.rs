//! Asset-aware transaction construction.
//!
//! Besides the usual concerns of paying recipients and a fee, transactions
//! built here must never destroy or misdirect an attached asset. Outputs
//! carrying inscriptions or fungible allocations are only spent by operations
//! that name them, are always placed first so their sats map onto the outputs
//! meant for them, and are never used to fund fees.
//!
//! `TransactionBuilder::build` takes a `TransactionIntent` and returns a
//! settled `Skeleton`. Each operation lays down its fixed inputs and outputs,
//! then hands the skeleton to the fee estimator, which pulls plain funding
//! inputs and adds change until the fee matches the projected size.
//!
//! Every returned skeleton is checked by `Skeleton::assert_invariants`.

use super::*;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Built {
  pub skeleton: Skeleton,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub split_count: Option<usize>,
}

impl Built {
  fn new(skeleton: Skeleton) -> Self {
    Self {
      skeleton,
      split_count: None,
    }
  }
}

/// Builds transactions for `account` from a point-in-time snapshot. `utxos`
/// is the account's UTXO list, `assets` any asset-bearing outputs fetched
/// separately for the operation. Building never mutates either.
#[derive(Debug, Clone)]
pub struct TransactionBuilder<'a> {
  account: &'a Account,
  utxos: &'a [Utxo],
  assets: &'a [Utxo],
}

impl<'a> TransactionBuilder<'a> {
  pub fn new(account: &'a Account, utxos: &'a [Utxo]) -> Self {
    Self {
      account,
      utxos,
      assets: &[],
    }
  }

  pub fn assets(mut self, assets: &'a [Utxo]) -> Self {
    self.assets = assets;
    self
  }

  pub fn build(&self, intent: &TransactionIntent) -> Result<Built> {
    let estimator = FeeEstimator::new(
      intent.fee_rate,
      self.account.script_pubkey()?,
      intent.sequence(),
    );

    let built = match &intent.operation {
      Operation::Send { to, amount } => {
        Built::new(self.send(intent, &estimator, to.clone(), *amount)?)
      }
      Operation::SendAll { to } => Built::new(self.send_all(intent, &estimator, to.clone())?),
      Operation::SendInscription {
        to,
        inscription_id,
        output_value,
      } => Built::new(self.send_inscription(
        intent,
        &estimator,
        to.clone(),
        *inscription_id,
        *output_value,
      )?),
      Operation::SendInscriptions {
        to,
        inscription_ids,
      } => Built::new(self.send_inscriptions(intent, &estimator, to.clone(), inscription_ids)?),
      Operation::SendNft { to, nft_id } => {
        Built::new(self.send_inscriptions(intent, &estimator, to.clone(), &[*nft_id])?)
      }
      Operation::SplitInscription {
        inscription_id,
        output_value,
      } => self.split_inscription(intent, &estimator, *inscription_id, *output_value)?,
      Operation::SendFungible { to, ticker, amount } => {
        Built::new(self.send_fungible(intent, &estimator, to.clone(), ticker, *amount)?)
      }
    };

    built.skeleton.assert_invariants(intent.fee_rate);

    log::info!(
      "built transaction with {} inputs and {} outputs paying {} sats fee",
      built.skeleton.inputs.len(),
      built.skeleton.outputs.len(),
      built.skeleton.fee()?.to_sat(),
    );

    Ok(built)
  }

  pub fn estimate_fee(&self, intent: &TransactionIntent) -> Result<Amount> {
    self.build(intent)?.skeleton.fee()
  }

  fn recipient(&self, to: Address<NetworkUnchecked>) -> Result<ScriptBuf> {
    Ok(self.account.chain.require_network(to)?.script_pubkey())
  }

  fn check_dust(value: Amount) -> Result {
    if value < DUST_THRESHOLD {
      return Err(Error::Dust {
        value,
        dust: DUST_THRESHOLD,
      });
    }

    Ok(())
  }

  /// Every known output, asset lists first, without duplicates.
  fn snapshot(&self) -> Vec<&'a Utxo> {
    let mut seen = BTreeSet::new();

    self
      .assets
      .iter()
      .chain(self.utxos)
      .filter(|utxo| seen.insert(utxo.outpoint))
      .collect()
  }

  fn find_inscription(&self, inscription_id: InscriptionId) -> Result<&'a Utxo> {
    self
      .snapshot()
      .into_iter()
      .find(|utxo| utxo.holds_inscription(inscription_id))
      .ok_or(Error::InscriptionNotFound { inscription_id })
  }

  fn inscription_assets(utxo: &Utxo) -> Vec<OutputAsset> {
    utxo
      .inscriptions
      .iter()
      .map(|attachment| OutputAsset::Inscription {
        inscription_id: attachment.inscription_id,
        offset: attachment.offset,
      })
      .collect()
  }

  fn send(
    &self,
    intent: &TransactionIntent,
    estimator: &FeeEstimator,
    to: Address<NetworkUnchecked>,
    amount: Amount,
  ) -> Result<Skeleton> {
    let recipient = self.recipient(to)?;

    Self::check_dust(amount)?;

    let mut selector = CoinSelector::new(self.utxos);

    let selection = selector.select_for_amount(amount)?;

    let mut skeleton = Skeleton::new(self.account.chain);

    for utxo in selection.selected {
      skeleton.push_input(utxo, intent.sequence());
    }

    skeleton
      .outputs
      .push(SkeletonOutput::new(recipient, amount));

    estimator.settle(skeleton, &mut selector)
  }

  fn send_all(
    &self,
    intent: &TransactionIntent,
    estimator: &FeeEstimator,
    to: Address<NetworkUnchecked>,
  ) -> Result<Skeleton> {
    let recipient = self.recipient(to)?;

    let mut selector = CoinSelector::new(self.utxos);

    let first = selector.select_for_amount(DUST_THRESHOLD)?;
    let rest = selector.select_all()?;

    let mut skeleton = Skeleton::new(self.account.chain);

    for utxo in first.selected.into_iter().chain(rest.selected) {
      skeleton.push_input(utxo, intent.sequence());
    }

    skeleton
      .outputs
      .push(SkeletonOutput::new(recipient, Amount::ZERO));

    estimator.drain(skeleton, 0)
  }

  fn send_inscription(
    &self,
    intent: &TransactionIntent,
    estimator: &FeeEstimator,
    to: Address<NetworkUnchecked>,
    inscription_id: InscriptionId,
    output_value: Amount,
  ) -> Result<Skeleton> {
    let recipient = self.recipient(to)?;

    let utxo = self.find_inscription(inscription_id)?;

    Self::check_dust(output_value)?;

    if utxo
      .inscriptions
      .iter()
      .any(|attachment| attachment.offset >= output_value.to_sat())
    {
      return Err(Error::MultipleAttachments {
        outpoint: utxo.outpoint,
        inscriptions: utxo.inscription_ids(),
      });
    }

    let mut skeleton = Skeleton::new(self.account.chain);

    skeleton.push_input(utxo.clone(), intent.sequence());

    skeleton.outputs.push(SkeletonOutput {
      script_pubkey: recipient,
      value: output_value,
      assets: Self::inscription_assets(utxo),
    });

    let mut selector = CoinSelector::new(self.utxos);
    selector.mark_used([utxo.outpoint]);

    estimator.settle(skeleton, &mut selector)
  }

  fn send_inscriptions(
    &self,
    intent: &TransactionIntent,
    estimator: &FeeEstimator,
    to: Address<NetworkUnchecked>,
    inscription_ids: &[InscriptionId],
  ) -> Result<Skeleton> {
    let recipient = self.recipient(to)?;

    if inscription_ids.is_empty() {
      return Err(Error::NoInscriptions);
    }

    let mut utxos = Vec::<&Utxo>::new();

    for inscription_id in inscription_ids {
      let utxo = self.find_inscription(*inscription_id)?;
      if !utxos.iter().any(|seen| seen.outpoint == utxo.outpoint) {
        utxos.push(utxo);
      }
    }

    if let Some(utxo) = utxos.iter().find(|utxo| utxo.inscriptions.len() > 1) {
      return Err(Error::MultipleAttachments {
        outpoint: utxo.outpoint,
        inscriptions: utxo.inscription_ids(),
      });
    }

    let mut skeleton = Skeleton::new(self.account.chain);
    let mut selector = CoinSelector::new(self.utxos);

    for utxo in utxos {
      Self::check_dust(utxo.value)?;

      skeleton.push_input(utxo.clone(), intent.sequence());
      skeleton.outputs.push(SkeletonOutput {
        script_pubkey: recipient.clone(),
        value: utxo.value,
        assets: Self::inscription_assets(utxo),
      });
      selector.mark_used([utxo.outpoint]);
    }

    estimator.settle(skeleton, &mut selector)
  }

  /// Carve the inscription's output into one output per inscription, each
  /// at least `output_value` and ending before the next inscription's sat.
  fn split_inscription(
    &self,
    intent: &TransactionIntent,
    estimator: &FeeEstimator,
    inscription_id: InscriptionId,
    output_value: Amount,
  ) -> Result<Built> {
    let utxo = self.find_inscription(inscription_id)?;

    Self::check_dust(output_value)?;

    let change_script = self.account.script_pubkey()?;

    let mut attachments = utxo.inscriptions.clone();
    attachments.sort_by_key(|attachment| attachment.offset);

    let mut skeleton = Skeleton::new(self.account.chain);
    skeleton.push_input(utxo.clone(), intent.sequence());

    let mut start = 0;

    for (i, attachment) in attachments.iter().enumerate() {
      let mut value = output_value.to_sat().max(attachment.offset - start + 1);

      if let Some(next) = attachments.get(i + 1) {
        value = value.min(next.offset - start);

        if value < DUST_THRESHOLD.to_sat() {
          return Err(Error::InscriptionsTooClose {
            outpoint: utxo.outpoint,
            first: attachment.inscription_id,
            second: next.inscription_id,
            dust: DUST_THRESHOLD,
          });
        }
      }

      skeleton.outputs.push(SkeletonOutput {
        script_pubkey: change_script.clone(),
        value: Amount::from_sat(value),
        assets: vec![OutputAsset::Inscription {
          inscription_id: attachment.inscription_id,
          offset: attachment.offset - start,
        }],
      });

      tprintln!(
        "split {} into output of {value} sats",
        attachment.inscription_id
      );

      start += value;
    }

    let split_count = skeleton.outputs.len();

    let mut selector = CoinSelector::new(self.utxos);
    selector.mark_used([utxo.outpoint]);

    Ok(Built {
      skeleton: estimator.settle(skeleton, &mut selector)?,
      split_count: Some(split_count),
    })
  }

  fn send_fungible(
    &self,
    intent: &TransactionIntent,
    estimator: &FeeEstimator,
    to: Address<NetworkUnchecked>,
    ticker: &str,
    amount: u64,
  ) -> Result<Skeleton> {
    let recipient = self.recipient(to)?;

    Self::check_dust(Amount::from_sat(amount))?;

    let candidates = self.snapshot().into_iter().cloned().collect::<Vec<Utxo>>();

    let selection = coin_selector::select_fungible(&candidates, ticker, amount)?;

    let mut skeleton = Skeleton::new(self.account.chain);
    let mut selector = CoinSelector::new(self.utxos);

    for utxo in selection.selected {
      selector.mark_used([utxo.outpoint]);
      skeleton.push_input(utxo, intent.sequence());
    }

    skeleton.outputs.push(SkeletonOutput {
      script_pubkey: recipient,
      value: Amount::from_sat(amount),
      assets: vec![OutputAsset::Fungible {
        ticker: ticker.into(),
        amount,
      }],
    });

    if selection.change > 0 {
      skeleton.outputs.push(SkeletonOutput {
        script_pubkey: self.account.script_pubkey()?,
        value: Amount::from_sat(selection.change),
        assets: vec![OutputAsset::Fungible {
          ticker: ticker.into(),
          amount: selection.change,
        }],
      });
    }

    estimator.settle(skeleton, &mut selector)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn input_outpoints(skeleton: &Skeleton) -> Vec<OutPoint> {
    skeleton
      .inputs
      .iter()
      .map(|input| input.utxo.outpoint)
      .collect()
  }

  fn output_values(skeleton: &Skeleton) -> Vec<u64> {
    skeleton
      .outputs
      .iter()
      .map(|output| output.value.to_sat())
      .collect()
  }

  fn build(utxos: &[Utxo], assets: &[Utxo], operation: Operation) -> Result<Built> {
    let account = account(AddressType::P2tr);
    TransactionBuilder::new(&account, utxos)
      .assets(assets)
      .build(&intent(operation))
  }

  fn send(amount: u64) -> Operation {
    Operation::Send {
      to: recipient_unchecked(),
      amount: Amount::from_sat(amount),
    }
  }

  #[test]
  fn send_selects_first_two_and_pays_change() {
    let utxos = [utxo(1, 10_000), utxo(2, 5_000), utxo(3, 1_000)];

    let skeleton = build(&utxos, &[], send(12_000)).unwrap().skeleton;

    assert_eq!(input_outpoints(&skeleton), [outpoint(1), outpoint(2)]);

    let fee = skeleton.fee().unwrap();
    assert!(fee < Amount::from_sat(3_000));
    assert_eq!(
      output_values(&skeleton),
      [12_000, 15_000 - 12_000 - fee.to_sat()]
    );
    assert_eq!(skeleton.outputs[0].script_pubkey, recipient().script_pubkey());
    assert_eq!(
      skeleton.outputs[1].script_pubkey,
      account(AddressType::P2tr).script_pubkey().unwrap()
    );
    assert_eq!(skeleton.change, Some(1));
  }

  #[test]
  fn send_never_spends_assets() {
    let utxos = [
      inscribed_utxo(1, 100_000, &[(1, 0)]),
      utxo(2, 5_000),
      fungible_utxo(3, 100_000, "atom", 100_000),
      utxo(4, 10_000),
    ];

    let skeleton = build(&utxos, &[], send(12_000)).unwrap().skeleton;

    assert_eq!(input_outpoints(&skeleton), [outpoint(2), outpoint(4)]);
    assert!(skeleton.inputs.iter().all(|input| !input.utxo.is_protected()));
  }

  #[test]
  fn send_fails_rather_than_spending_assets() {
    let utxos = [inscribed_utxo(1, 100_000, &[(1, 0)]), utxo(2, 5_000)];

    assert_matches!(
      build(&utxos, &[], send(12_000)),
      Err(Error::InsufficientFunds { protected, .. }) if protected == [outpoint(1)],
    );
  }

  #[test]
  fn send_with_empty_plain_list_is_insufficient() {
    assert_matches!(
      build(&[], &[], send(1_000)),
      Err(Error::InsufficientFunds { .. })
    );
  }

  #[test]
  fn send_dust_is_rejected() {
    assert_matches!(
      build(&[utxo(1, 10_000)], &[], send(545)),
      Err(Error::Dust { value, .. }) if value == Amount::from_sat(545),
    );
  }

  #[test]
  fn send_to_wrong_network_is_rejected() {
    let to = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4"
      .parse::<Address<NetworkUnchecked>>()
      .unwrap();

    assert_matches!(
      build(
        &[utxo(1, 10_000)],
        &[],
        Operation::Send {
          to,
          amount: Amount::from_sat(1_000)
        }
      ),
      Err(Error::AddressNetwork { .. }),
    );
  }

  #[test]
  fn send_drops_dust_change() {
    let skeleton = build(&[utxo(1, 10_000)], &[], send(9_500))
      .unwrap()
      .skeleton;

    assert_eq!(output_values(&skeleton), [9_500]);
    assert_eq!(skeleton.change, None);
    assert_eq!(skeleton.fee().unwrap(), Amount::from_sat(500));
  }

  #[test]
  fn send_pulls_more_inputs_for_fee() {
    let utxos = [utxo(1, 10_000), utxo(2, 1_000)];

    let skeleton = build(&utxos, &[], send(10_000)).unwrap().skeleton;

    assert_eq!(input_outpoints(&skeleton), [outpoint(1), outpoint(2)]);
  }

  #[test]
  fn rbf_sequence() {
    let account = account(AddressType::P2tr);
    let utxos = [utxo(1, 10_000)];

    let rbf = TransactionBuilder::new(&account, &utxos)
      .build(&intent(send(1_000)))
      .unwrap();
    assert_eq!(rbf.skeleton.inputs[0].sequence, Sequence(0xfffffffd));

    let final_ = TransactionBuilder::new(&account, &utxos)
      .build(&TransactionIntent::new(send(1_000), fee_rate(1.0), false))
      .unwrap();
    assert_eq!(final_.skeleton.inputs[0].sequence, Sequence(0xffffffff));
  }

  #[test]
  fn build_is_deterministic() {
    let utxos = [utxo(1, 10_000), utxo(2, 5_000), utxo(3, 1_000)];

    let a = build(&utxos, &[], send(12_000)).unwrap();
    let b = build(&utxos, &[], send(12_000)).unwrap();

    assert_eq!(a, b);
    assert_eq!(
      consensus::serialize(&a.skeleton.unsigned_transaction()),
      consensus::serialize(&b.skeleton.unsigned_transaction()),
    );
  }

  #[test]
  fn estimate_fee_matches_build() {
    let account = account(AddressType::P2wpkh);
    let utxos = [
      utxo_for(&account, 1, 10_000),
      utxo_for(&account, 2, 5_000),
    ];
    let intent = TransactionIntent::new(send(12_000), fee_rate(3.0), true);

    let builder = TransactionBuilder::new(&account, &utxos);

    assert_eq!(
      builder.estimate_fee(&intent).unwrap(),
      builder.build(&intent).unwrap().skeleton.fee().unwrap()
    );
  }

  #[test]
  fn send_all_sweeps_plain_utxos() {
    let utxos = [
      utxo(1, 10_000),
      inscribed_utxo(2, 10_000, &[(1, 0)]),
      utxo(3, 5_000),
    ];

    let skeleton = build(
      &utxos,
      &[],
      Operation::SendAll {
        to: recipient_unchecked(),
      },
    )
    .unwrap()
    .skeleton;

    assert_eq!(input_outpoints(&skeleton), [outpoint(1), outpoint(3)]);
    assert_eq!(skeleton.outputs.len(), 1);
    assert_eq!(skeleton.change, None);
    assert_eq!(
      skeleton.outputs[0].value + skeleton.fee().unwrap(),
      Amount::from_sat(15_000)
    );
  }

  #[test]
  fn send_all_with_empty_plain_list_is_insufficient() {
    assert_matches!(
      build(
        &[inscribed_utxo(1, 10_000, &[(1, 0)])],
        &[],
        Operation::SendAll {
          to: recipient_unchecked(),
        },
      ),
      Err(Error::InsufficientFunds { .. }),
    );
  }

  #[test]
  fn send_inscription() {
    let assets = [inscribed_utxo(1, 10_000, &[(1, 0)])];
    let utxos = [utxo(2, 5_000)];

    let skeleton = build(
      &utxos,
      &assets,
      Operation::SendInscription {
        to: recipient_unchecked(),
        inscription_id: inscription_id(1),
        output_value: Amount::from_sat(546),
      },
    )
    .unwrap()
    .skeleton;

    assert_eq!(input_outpoints(&skeleton), [outpoint(1)]);
    assert_eq!(skeleton.outputs[0].value, Amount::from_sat(546));
    assert_eq!(skeleton.outputs[0].script_pubkey, recipient().script_pubkey());
    assert_eq!(
      skeleton.outputs[0].assets,
      [OutputAsset::Inscription {
        inscription_id: inscription_id(1),
        offset: 0,
      }]
    );
    assert_eq!(skeleton.change, Some(1));
  }

  #[test]
  fn send_inscription_funds_fee_from_plain_utxos() {
    let utxos = [inscribed_utxo(1, 546, &[(1, 0)]), utxo(2, 5_000)];

    let skeleton = build(
      &utxos,
      &[],
      Operation::SendInscription {
        to: recipient_unchecked(),
        inscription_id: inscription_id(1),
        output_value: Amount::from_sat(546),
      },
    )
    .unwrap()
    .skeleton;

    assert_eq!(input_outpoints(&skeleton), [outpoint(1), outpoint(2)]);
    assert_eq!(skeleton.outputs[0].value, Amount::from_sat(546));
  }

  #[test]
  fn send_inscription_not_found() {
    assert_matches!(
      build(
        &[utxo(1, 10_000)],
        &[],
        Operation::SendInscription {
          to: recipient_unchecked(),
          inscription_id: inscription_id(1),
          output_value: Amount::from_sat(546),
        },
      ),
      Err(Error::InscriptionNotFound { inscription_id: id }) if id == inscription_id(1),
    );
  }

  #[test]
  fn send_inscription_with_stranded_neighbour_is_rejected() {
    let assets = [inscribed_utxo(1, 10_000, &[(1, 0), (2, 5_000)])];

    assert_matches!(
      build(
        &[utxo(2, 5_000)],
        &assets,
        Operation::SendInscription {
          to: recipient_unchecked(),
          inscription_id: inscription_id(1),
          output_value: Amount::from_sat(546),
        },
      ),
      Err(Error::MultipleAttachments { outpoint: o, inscriptions })
        if o == outpoint(1) && inscriptions == [inscription_id(1), inscription_id(2)],
    );
  }

  #[test]
  fn send_inscription_moves_colocated_inscriptions_together() {
    let assets = [inscribed_utxo(1, 10_000, &[(1, 0), (2, 100)])];

    let skeleton = build(
      &[utxo(2, 5_000)],
      &assets,
      Operation::SendInscription {
        to: recipient_unchecked(),
        inscription_id: inscription_id(1),
        output_value: Amount::from_sat(546),
      },
    )
    .unwrap()
    .skeleton;

    assert_eq!(skeleton.outputs[0].assets.len(), 2);
  }

  #[test]
  fn send_inscriptions() {
    let assets = [
      inscribed_utxo(1, 546, &[(1, 0)]),
      inscribed_utxo(2, 1_000, &[(2, 0)]),
    ];
    let utxos = [utxo(3, 5_000)];

    let skeleton = build(
      &utxos,
      &assets,
      Operation::SendInscriptions {
        to: recipient_unchecked(),
        inscription_ids: vec![inscription_id(1), inscription_id(2)],
      },
    )
    .unwrap()
    .skeleton;

    assert_eq!(
      input_outpoints(&skeleton),
      [outpoint(1), outpoint(2), outpoint(3)]
    );
    assert_eq!(output_values(&skeleton)[..2], [546, 1_000]);
    assert_eq!(skeleton.change, Some(2));
  }

  #[test]
  fn send_inscriptions_rejects_shared_outputs() {
    let assets = [
      inscribed_utxo(1, 10_000, &[(1, 0), (2, 5_000)]),
      inscribed_utxo(3, 546, &[(3, 0)]),
    ];

    assert_matches!(
      build(
        &[utxo(4, 5_000)],
        &assets,
        Operation::SendInscriptions {
          to: recipient_unchecked(),
          inscription_ids: vec![inscription_id(3), inscription_id(1)],
        },
      ),
      Err(Error::MultipleAttachments { outpoint: o, .. }) if o == outpoint(1),
    );
  }

  #[test]
  fn send_inscriptions_requires_inscriptions() {
    for value in [600, 10_000] {
      assert_matches!(
        build(
          &[utxo(1, value)],
          &[],
          Operation::SendInscriptions {
            to: recipient_unchecked(),
            inscription_ids: Vec::new(),
          },
        ),
        Err(Error::NoInscriptions),
      );
    }
  }

  #[test]
  fn send_nft_moves_whole_output() {
    let assets = [inscribed_utxo(1, 1_000, &[(1, 0)])];
    let utxos = [utxo(2, 5_000)];

    let skeleton = build(
      &utxos,
      &assets,
      Operation::SendNft {
        to: recipient_unchecked(),
        nft_id: inscription_id(1),
      },
    )
    .unwrap()
    .skeleton;

    assert_eq!(input_outpoints(&skeleton), [outpoint(1), outpoint(2)]);
    assert_eq!(skeleton.outputs[0].value, Amount::from_sat(1_000));
    assert_eq!(skeleton.outputs[0].script_pubkey, recipient().script_pubkey());
    assert_eq!(
      skeleton.outputs[0].assets,
      [OutputAsset::Inscription {
        inscription_id: inscription_id(1),
        offset: 0,
      }]
    );
    assert_eq!(skeleton.change, Some(1));
  }

  #[test]
  fn send_nft_rejects_mixed_output() {
    let assets = [inscribed_utxo(1, 1_000, &[(1, 0), (2, 600)])];

    assert_matches!(
      build(
        &[utxo(2, 5_000)],
        &assets,
        Operation::SendNft {
          to: recipient_unchecked(),
          nft_id: inscription_id(1),
        },
      ),
      Err(Error::MultipleAttachments { outpoint: o, .. }) if o == outpoint(1),
    );
  }

  #[test]
  fn split_inscription() {
    let assets = [inscribed_utxo(
      1,
      10_000,
      &[(3, 5_000), (1, 0), (2, 1_000)],
    )];

    let built = build(
      &[utxo(2, 5_000)],
      &assets,
      Operation::SplitInscription {
        inscription_id: inscription_id(1),
        output_value: Amount::from_sat(546),
      },
    )
    .unwrap();

    assert_eq!(built.split_count, Some(3));

    let skeleton = built.skeleton;
    assert_eq!(output_values(&skeleton)[..3], [546, 546, 3_909]);
    assert_eq!(skeleton.change, Some(3));

    let owner = account(AddressType::P2tr).script_pubkey().unwrap();
    assert!(skeleton
      .outputs
      .iter()
      .all(|output| output.script_pubkey == owner));

    let mut start = 0;
    for (output, (id, offset)) in skeleton.outputs.iter().zip([(1, 0), (2, 1_000), (3, 5_000)]) {
      assert!(start <= offset && offset < start + output.value.to_sat());
      assert_matches!(
        &output.assets[..],
        [OutputAsset::Inscription { inscription_id: asset, .. }] if *asset == inscription_id(id),
      );
      start += output.value.to_sat();
    }
  }

  #[test]
  fn split_inscriptions_too_close() {
    let assets = [inscribed_utxo(1, 10_000, &[(1, 0), (2, 100)])];

    assert_matches!(
      build(
        &[utxo(2, 5_000)],
        &assets,
        Operation::SplitInscription {
          inscription_id: inscription_id(1),
          output_value: Amount::from_sat(546),
        },
      ),
      Err(Error::InscriptionsTooClose { first, second, .. })
        if first == inscription_id(1) && second == inscription_id(2),
    );
  }

  #[test]
  fn send_fungible_exact_amount_has_no_token_change() {
    let assets = [
      fungible_utxo(1, 600, "atom", 600),
      fungible_utxo(2, 400, "atom", 400),
    ];
    let utxos = [utxo(3, 5_000)];

    let skeleton = build(
      &utxos,
      &assets,
      Operation::SendFungible {
        to: recipient_unchecked(),
        ticker: "atom".into(),
        amount: 1_000,
      },
    )
    .unwrap()
    .skeleton;

    assert_eq!(
      input_outpoints(&skeleton),
      [outpoint(1), outpoint(2), outpoint(3)]
    );
    assert_eq!(skeleton.outputs[0].value, Amount::from_sat(1_000));
    assert_eq!(skeleton.change, Some(1));
    assert!(skeleton.outputs[1].assets.is_empty());
  }

  #[test]
  fn send_fungible_with_token_change() {
    let assets = [fungible_utxo(1, 2_000, "atom", 2_000)];
    let utxos = [utxo(3, 5_000)];

    let skeleton = build(
      &utxos,
      &assets,
      Operation::SendFungible {
        to: recipient_unchecked(),
        ticker: "atom".into(),
        amount: 1_000,
      },
    )
    .unwrap()
    .skeleton;

    assert_eq!(output_values(&skeleton)[..2], [1_000, 1_000]);
    assert_eq!(
      skeleton.outputs[1].assets,
      [OutputAsset::Fungible {
        ticker: "atom".into(),
        amount: 1_000,
      }]
    );
    assert_eq!(skeleton.change, Some(2));
  }

  #[test]
  fn send_fungible_unsplittable_change() {
    let assets = [fungible_utxo(1, 1_000, "atom", 1_000)];

    assert_matches!(
      build(
        &[utxo(3, 5_000)],
        &assets,
        Operation::SendFungible {
          to: recipient_unchecked(),
          ticker: "atom".into(),
          amount: 800,
        },
      ),
      Err(Error::UnsplittableChange { .. }),
    );
  }
}
