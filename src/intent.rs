use super::*;

/// What to build. Recipients are parsed without a network and checked
/// against the account's chain when the intent is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "type", deny_unknown_fields)]
pub enum Operation {
  Send {
    to: Address<NetworkUnchecked>,
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    amount: Amount,
  },
  SendAll {
    to: Address<NetworkUnchecked>,
  },
  SendInscription {
    to: Address<NetworkUnchecked>,
    inscription_id: InscriptionId,
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    output_value: Amount,
  },
  SendInscriptions {
    to: Address<NetworkUnchecked>,
    inscription_ids: Vec<InscriptionId>,
  },
  SendNft {
    to: Address<NetworkUnchecked>,
    nft_id: InscriptionId,
  },
  SplitInscription {
    inscription_id: InscriptionId,
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    output_value: Amount,
  },
  SendFungible {
    to: Address<NetworkUnchecked>,
    ticker: String,
    amount: u64,
  },
}

impl Operation {
  pub fn recipient(&self) -> Option<&Address<NetworkUnchecked>> {
    match self {
      Self::Send { to, .. }
      | Self::SendAll { to }
      | Self::SendInscription { to, .. }
      | Self::SendInscriptions { to, .. }
      | Self::SendNft { to, .. }
      | Self::SendFungible { to, .. } => Some(to),
      Self::SplitInscription { .. } => None,
    }
  }

  /// Inscriptions the operation moves.
  pub fn inscription_ids(&self) -> Vec<InscriptionId> {
    match self {
      Self::SendInscription { inscription_id, .. }
      | Self::SplitInscription { inscription_id, .. }
      | Self::SendNft {
        nft_id: inscription_id,
        ..
      } => vec![*inscription_id],
      Self::SendInscriptions {
        inscription_ids, ..
      } => inscription_ids.clone(),
      Self::Send { .. } | Self::SendAll { .. } | Self::SendFungible { .. } => Vec::new(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransactionIntent {
  pub operation: Operation,
  #[serde(default)]
  pub fee_rate: FeeRate,
  #[serde(default = "TransactionIntent::default_rbf")]
  pub enable_rbf: bool,
}

impl TransactionIntent {
  fn default_rbf() -> bool {
    true
  }

  pub fn new(operation: Operation, fee_rate: FeeRate, enable_rbf: bool) -> Self {
    Self {
      operation,
      fee_rate,
      enable_rbf,
    }
  }

  pub fn sequence(&self) -> Sequence {
    if self.enable_rbf {
      Sequence::ENABLE_RBF_NO_LOCKTIME
    } else {
      Sequence::MAX
    }
  }

  /// Load an intent from a JSON file, taking the fee rate and RBF flag from
  /// `settings` when the file omits them.
  pub(crate) fn load(path: &std::path::Path, settings: &Settings) -> anyhow::Result<Self> {
    use anyhow::Context;

    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    struct IntentFile {
      operation: Operation,
      fee_rate: Option<FeeRate>,
      enable_rbf: Option<bool>,
    }

    let file: IntentFile = serde_json::from_reader(
      File::open(path)
        .with_context(|| format!("failed to open intent file `{}`", path.display()))?,
    )
    .with_context(|| format!("failed to deserialize intent file `{}`", path.display()))?;

    Ok(Self {
      operation: file.operation,
      fee_rate: file.fee_rate.unwrap_or(settings.fee_rate()),
      enable_rbf: file.enable_rbf.unwrap_or(settings.enable_rbf()),
    })
  }
}
