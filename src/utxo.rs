use super::*;

/// An inscription bound to the sat at `offset` within an output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InscriptionAttachment {
  pub inscription_id: InscriptionId,
  pub offset: u64,
}

/// A fungible token balance anchored to an output. Amounts are denominated
/// in the satoshis of the carrying output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FungibleAllocation {
  pub asset_id: String,
  pub ticker: String,
  pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Utxo {
  pub outpoint: OutPoint,
  #[serde(with = "bitcoin::amount::serde::as_sat")]
  pub value: Amount,
  pub script_pubkey: ScriptBuf,
  pub address_type: AddressType,
  pub public_key: PublicKey,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub inscriptions: Vec<InscriptionAttachment>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub fungible: Vec<FungibleAllocation>,
}

impl Utxo {
  /// Asset-bearing outputs are never spent as plain funding.
  pub fn is_protected(&self) -> bool {
    !self.inscriptions.is_empty() || !self.fungible.is_empty()
  }

  pub fn tx_out(&self) -> TxOut {
    TxOut {
      value: self.value,
      script_pubkey: self.script_pubkey.clone(),
    }
  }

  pub fn inscription_ids(&self) -> Vec<InscriptionId> {
    self
      .inscriptions
      .iter()
      .map(|attachment| attachment.inscription_id)
      .collect()
  }

  pub fn holds_inscription(&self, inscription_id: InscriptionId) -> bool {
    self
      .inscriptions
      .iter()
      .any(|attachment| attachment.inscription_id == inscription_id)
  }

  pub fn holds_fungible(&self, ticker: &str) -> bool {
    self
      .fungible
      .iter()
      .any(|allocation| allocation.ticker == ticker)
  }

  /// Amount of `ticker` anchored here, if any.
  pub fn fungible_amount(&self, ticker: &str) -> Result<Option<u64>> {
    let mut total = None;

    for allocation in &self.fungible {
      if allocation.ticker == ticker {
        total = Some(
          total
            .unwrap_or(0u64)
            .checked_add(allocation.amount)
            .ok_or(Error::ValueOverflow)?,
        );
      }
    }

    Ok(total)
  }
}
