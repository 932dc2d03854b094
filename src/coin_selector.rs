use super::*;

/// Inputs added by one selection call.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
  pub selected: Vec<Utxo>,
  pub total_value: Amount,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FungibleSelection {
  pub selected: Vec<Utxo>,
  pub total: u64,
  pub change: u64,
}

/// Greedy, order-preserving funding selection over a read-only UTXO
/// snapshot. Remembers what it has already handed out, so the fee estimator
/// can ask for more inputs across settlement rounds without double spending.
#[derive(Debug, Clone)]
pub struct CoinSelector<'a> {
  utxos: &'a [Utxo],
  pinned: Vec<Utxo>,
  used: BTreeSet<OutPoint>,
  exclude_protected: bool,
}

impl<'a> CoinSelector<'a> {
  pub fn new(utxos: &'a [Utxo]) -> Self {
    Self {
      utxos,
      pinned: Vec::new(),
      used: BTreeSet::new(),
      exclude_protected: true,
    }
  }

  /// Allow asset-bearing outputs as funding. Only for operations that
  /// explicitly target those assets.
  pub fn exclude_protected(mut self, exclude_protected: bool) -> Self {
    self.exclude_protected = exclude_protected;
    self
  }

  /// Inputs that must be spent, selected before anything from the snapshot
  /// regardless of protection.
  pub fn pin(mut self, utxos: impl IntoIterator<Item = Utxo>) -> Self {
    self.pinned.extend(utxos);
    self
  }

  /// Mark `outpoints` as already spent by the caller.
  pub fn mark_used(&mut self, outpoints: impl IntoIterator<Item = OutPoint>) {
    self.used.extend(outpoints);
  }

  fn eligible(&self, utxo: &Utxo) -> bool {
    !self.used.contains(&utxo.outpoint) && !(self.exclude_protected && utxo.is_protected())
  }

  fn protected(&self) -> Vec<OutPoint> {
    if !self.exclude_protected {
      return Vec::new();
    }

    self
      .utxos
      .iter()
      .filter(|utxo| utxo.is_protected() && !self.used.contains(&utxo.outpoint))
      .map(|utxo| utxo.outpoint)
      .collect()
  }

  /// Unused plain value still available to this selector.
  pub fn remaining(&self) -> Amount {
    let mut seen = BTreeSet::new();

    self
      .pinned
      .iter()
      .filter(|utxo| !self.used.contains(&utxo.outpoint))
      .chain(self.utxos.iter().filter(|utxo| self.eligible(utxo)))
      .filter(|utxo| seen.insert(utxo.outpoint))
      .map(|utxo| utxo.value)
      .sum()
  }

  /// Select unused inputs worth at least `target`. Pinned inputs come first,
  /// then plain outputs in snapshot order. On failure nothing is marked as
  /// used.
  pub fn select_for_amount(&mut self, target: Amount) -> Result<Selection> {
    let mut selected = Vec::new();
    let mut seen = BTreeSet::new();
    let mut total_value = Amount::ZERO;

    for utxo in &self.pinned {
      if self.used.contains(&utxo.outpoint) || !seen.insert(utxo.outpoint) {
        continue;
      }

      total_value = total_value
        .checked_add(utxo.value)
        .ok_or(Error::ValueOverflow)?;
      selected.push(utxo.clone());
    }

    for utxo in self.utxos.iter().filter(|utxo| self.eligible(utxo)) {
      if total_value >= target {
        break;
      }

      if !seen.insert(utxo.outpoint) {
        continue;
      }

      total_value = total_value
        .checked_add(utxo.value)
        .ok_or(Error::ValueOverflow)?;
      selected.push(utxo.clone());
    }

    if total_value < target {
      return Err(Error::InsufficientFunds {
        needed: target,
        available: total_value,
        protected: self.protected(),
      });
    }

    self.used.extend(seen);

    log::debug!(
      "selected {} inputs worth {} sats for target of {} sats",
      selected.len(),
      total_value.to_sat(),
      target.to_sat(),
    );

    Ok(Selection {
      selected,
      total_value,
    })
  }

  /// Spend every remaining eligible input.
  pub fn select_all(&mut self) -> Result<Selection> {
    let remaining = self.remaining();
    self.select_for_amount(remaining)
  }
}

/// One-shot selection from `utxos`.
pub fn select_for_amount(
  utxos: &[Utxo],
  target: Amount,
  exclude_protected: bool,
) -> Result<Selection> {
  CoinSelector::new(utxos)
    .exclude_protected(exclude_protected)
    .select_for_amount(target)
}

/// Walk allocation outputs of `ticker` in order until `amount` is covered.
/// Stops on an exact match or once the remainder can stand as its own
/// output, and fails if the remainder would be below dust. Outputs that also
/// hold inscriptions or other tickers are skipped.
pub fn select_fungible(utxos: &[Utxo], ticker: &str, amount: u64) -> Result<FungibleSelection> {
  let dust = DUST_THRESHOLD.to_sat();

  let mut selected = Vec::new();
  let mut total = 0u64;
  let mut change = 0;

  let candidates = utxos.iter().filter(|utxo| {
    utxo.inscriptions.is_empty()
      && !utxo.fungible.is_empty()
      && utxo
        .fungible
        .iter()
        .all(|allocation| allocation.ticker == ticker)
  });

  for utxo in candidates {
    let Some(allocated) = utxo.fungible_amount(ticker)? else {
      continue;
    };

    total = total.checked_add(allocated).ok_or(Error::ValueOverflow)?;
    selected.push(utxo.clone());

    if total >= amount {
      change = total - amount;
      if change == 0 || change > dust {
        break;
      }
    }
  }

  if total < amount {
    return Err(Error::InsufficientFunds {
      needed: Amount::from_sat(amount),
      available: Amount::from_sat(total),
      protected: Vec::new(),
    });
  }

  if change != 0 && change < dust {
    return Err(Error::UnsplittableChange {
      ticker: ticker.into(),
      remainder: Amount::from_sat(change),
      dust: DUST_THRESHOLD,
    });
  }

  log::debug!(
    "selected {} {ticker} allocations totalling {total} with {change} change",
    selected.len(),
  );

  Ok(FungibleSelection {
    selected,
    total,
    change,
  })
}
