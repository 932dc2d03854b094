use super::*;

/// Indexer-backed view of an address's outputs. Responses are treated as a
/// point-in-time snapshot.
#[async_trait]
pub trait UtxoSource: Send + Sync {
  async fn plain_utxos(&self, address: &Address) -> anyhow::Result<Vec<Utxo>>;

  async fn inscription_utxo(&self, inscription_id: InscriptionId) -> anyhow::Result<Option<Utxo>>;

  async fn inscription_utxos(&self, inscription_ids: &[InscriptionId]) -> anyhow::Result<Vec<Utxo>>;

  async fn fungible_utxos(&self, address: &Address, ticker: &str) -> anyhow::Result<Vec<Utxo>>;
}

/// Advisory fee rates, slowest to fastest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeRateTiers {
  pub slow: FeeRate,
  pub average: FeeRate,
  pub fast: FeeRate,
}

#[async_trait]
pub trait FeeSource: Send + Sync {
  async fn fee_rate_tiers(&self) -> anyhow::Result<FeeRateTiers>;
}

#[async_trait]
pub trait BroadcastSink: Send + Sync {
  async fn push_transaction(&self, raw_hex: &str) -> anyhow::Result<Txid>;
}
