use super::*;

/// Settles a skeleton's fee against its projected virtual size, adding
/// funding inputs and a change output as needed.
#[derive(Debug, Clone)]
pub(crate) struct FeeEstimator {
  fee_rate: FeeRate,
  change_script: ScriptBuf,
  sequence: Sequence,
}

impl FeeEstimator {
  /// Upper bound on the virtual size of one more input of any address type.
  const ADDITIONAL_INPUT_VBYTES: usize = 148;
  pub(crate) const MAX_ROUNDS: usize = 8;

  pub(crate) fn new(fee_rate: FeeRate, change_script: ScriptBuf, sequence: Sequence) -> Self {
    Self {
      fee_rate,
      change_script,
      sequence,
    }
  }

  fn fee_with_change(&self, skeleton: &mut Skeleton) -> Amount {
    skeleton
      .outputs
      .push(SkeletonOutput::new(self.change_script.clone(), Amount::ZERO));
    let fee = self.fee_rate.fee(skeleton.estimate_vsize());
    skeleton.outputs.pop();
    fee
  }

  /// Make inputs pay for fixed outputs plus fee. Change goes to the account
  /// when it would be at least dust, otherwise the leftover joins the fee.
  /// Shortfalls are covered from `selector`.
  pub(crate) fn settle(
    &self,
    mut skeleton: Skeleton,
    selector: &mut CoinSelector,
  ) -> Result<Skeleton> {
    if let Some(change) = skeleton.change.take() {
      skeleton.outputs.remove(change);
    }

    for round in 0..Self::MAX_ROUNDS {
      let input_value = skeleton.input_value()?;
      let fixed = skeleton.output_value()?;
      let fee_with_change = self.fee_with_change(&mut skeleton);
      let fee_without_change = self.fee_rate.fee(skeleton.estimate_vsize());

      log::debug!(
        "settlement round {round}: {} inputs worth {} sats, outputs {} sats, fee {} sats with change, {} sats without",
        skeleton.inputs.len(),
        input_value.to_sat(),
        fixed.to_sat(),
        fee_with_change.to_sat(),
        fee_without_change.to_sat(),
      );

      let with_change = fixed
        .checked_add(fee_with_change)
        .and_then(|value| value.checked_add(DUST_THRESHOLD))
        .ok_or(Error::ValueOverflow)?;

      if input_value >= with_change {
        let change = input_value - fixed - fee_with_change;

        skeleton.change = Some(skeleton.outputs.len());
        skeleton
          .outputs
          .push(SkeletonOutput::new(self.change_script.clone(), change));

        tprintln!("settled with {} sats change", change.to_sat());

        return Ok(skeleton);
      }

      let without_change = fixed
        .checked_add(fee_without_change)
        .ok_or(Error::ValueOverflow)?;

      if input_value >= without_change {
        tprintln!(
          "settled without change, {} sats to fee",
          (input_value - without_change).to_sat()
        );

        return Ok(skeleton);
      }

      let deficit = without_change - input_value;

      let target = deficit
        .checked_add(self.fee_rate.fee(Self::ADDITIONAL_INPUT_VBYTES))
        .ok_or(Error::ValueOverflow)?;

      let selection = match selector.select_for_amount(target) {
        Ok(selection) => selection,
        Err(Error::InsufficientFunds {
          available,
          protected,
          ..
        }) => {
          return Err(Error::InsufficientFunds {
            needed: without_change,
            available: input_value
              .checked_add(available)
              .ok_or(Error::ValueOverflow)?,
            protected,
          })
        }
        Err(err) => return Err(err),
      };

      for utxo in selection.selected {
        skeleton.push_input(utxo, self.sequence);
      }
    }

    Err(Error::NoSettlement {
      rounds: Self::MAX_ROUNDS,
    })
  }

  /// Set `output` to everything the inputs hold minus the fee, for
  /// transactions that sweep their inputs.
  pub(crate) fn drain(&self, mut skeleton: Skeleton, output: usize) -> Result<Skeleton> {
    skeleton.outputs[output].value = Amount::ZERO;

    let fee = self.fee_rate.fee(skeleton.estimate_vsize());
    let available = skeleton.input_value()?;
    let fixed = skeleton.output_value()?;

    let value = available
      .checked_sub(fixed)
      .and_then(|value| value.checked_sub(fee))
      .ok_or(Error::InsufficientFunds {
        needed: fixed + fee,
        available,
        protected: Vec::new(),
      })?;

    if value < DUST_THRESHOLD {
      return Err(Error::Dust {
        value,
        dust: DUST_THRESHOLD,
      });
    }

    skeleton.outputs[output].value = value;

    Ok(skeleton)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn estimator() -> FeeEstimator {
    FeeEstimator::new(
      fee_rate(1.0),
      account(AddressType::P2tr).script_pubkey().unwrap(),
      Sequence::ENABLE_RBF_NO_LOCKTIME,
    )
  }

  fn payment(inputs: &[Utxo], value: u64) -> Skeleton {
    let mut skeleton = Skeleton::new(Chain::Testnet);
    for utxo in inputs {
      skeleton.push_input(utxo.clone(), Sequence::ENABLE_RBF_NO_LOCKTIME);
    }
    skeleton.outputs.push(SkeletonOutput::new(
      recipient().script_pubkey(),
      Amount::from_sat(value),
    ));
    skeleton
  }

  #[test]
  fn change_is_added() {
    let inputs = [utxo(1, 10_000), utxo(2, 5_000)];
    let mut selector = CoinSelector::new(&[]);

    let skeleton = estimator()
      .settle(payment(&inputs, 12_000), &mut selector)
      .unwrap();

    assert_eq!(skeleton.change, Some(1));
    assert_eq!(skeleton.outputs[0].value, Amount::from_sat(12_000));

    let fee = skeleton.fee().unwrap();
    assert_eq!(fee, fee_rate(1.0).fee(skeleton.estimate_vsize()));
    assert_eq!(
      skeleton.outputs[1].value,
      Amount::from_sat(15_000 - 12_000) - fee
    );

    skeleton.assert_invariants(fee_rate(1.0));
  }

  #[test]
  fn dust_change_goes_to_fee() {
    let inputs = [utxo(1, 10_000)];
    let mut selector = CoinSelector::new(&[]);

    let skeleton = estimator()
      .settle(payment(&inputs, 9_500), &mut selector)
      .unwrap();

    assert_eq!(skeleton.change, None);
    assert_eq!(skeleton.outputs.len(), 1);
    assert_eq!(skeleton.fee().unwrap(), Amount::from_sat(500));

    skeleton.assert_invariants(fee_rate(1.0));
  }

  #[test]
  fn shortfall_pulls_more_inputs() {
    let inputs = [utxo(1, 10_000)];
    let available = [utxo(2, 1_000), utxo(3, 5_000)];
    let mut selector = CoinSelector::new(&available);

    let skeleton = estimator()
      .settle(payment(&inputs, 10_000), &mut selector)
      .unwrap();

    assert_eq!(
      skeleton
        .inputs
        .iter()
        .map(|input| input.utxo.outpoint)
        .collect::<Vec<OutPoint>>(),
      [outpoint(1), outpoint(2)],
    );

    skeleton.assert_invariants(fee_rate(1.0));
  }

  #[test]
  fn shortfall_without_funds_is_insufficient() {
    let inputs = [utxo(1, 10_000)];
    let available = [inscribed_utxo(2, 50_000, &[(1, 0)])];
    let mut selector = CoinSelector::new(&available);

    assert_matches!(
      estimator().settle(payment(&inputs, 10_000), &mut selector),
      Err(Error::InsufficientFunds { available, protected, .. })
        if available == Amount::from_sat(10_000) && protected == [outpoint(2)],
    );
  }

  #[test]
  fn existing_change_is_recomputed() {
    let inputs = [utxo(1, 10_000)];
    let mut skeleton = payment(&inputs, 5_000);
    skeleton.outputs.push(SkeletonOutput::new(
      account(AddressType::P2tr).script_pubkey().unwrap(),
      Amount::from_sat(1),
    ));
    skeleton.change = Some(1);

    let skeleton = estimator()
      .settle(skeleton, &mut CoinSelector::new(&[]))
      .unwrap();

    assert_eq!(skeleton.outputs.len(), 2);
    assert!(skeleton.outputs[1].value > Amount::from_sat(4_000));
  }

  #[test]
  fn settlement_is_deterministic() {
    let inputs = [utxo(1, 10_000), utxo(2, 5_000)];

    let settle = || {
      estimator()
        .settle(payment(&inputs, 12_000), &mut CoinSelector::new(&[]))
        .unwrap()
    };

    assert_eq!(settle(), settle());
  }

  #[test]
  fn drain_sweeps_inputs() {
    let inputs = [utxo(1, 10_000), utxo(2, 5_000)];

    let skeleton = estimator().drain(payment(&inputs, 0), 0).unwrap();

    assert_eq!(
      skeleton.outputs[0].value + skeleton.fee().unwrap(),
      Amount::from_sat(15_000)
    );
    assert_eq!(
      skeleton.fee().unwrap(),
      fee_rate(1.0).fee(skeleton.estimate_vsize())
    );
  }

  #[test]
  fn drain_below_dust_fails() {
    let inputs = [utxo(1, 600)];

    assert_matches!(
      estimator().drain(payment(&inputs, 0), 0),
      Err(Error::Dust { .. }),
    );
  }
}
