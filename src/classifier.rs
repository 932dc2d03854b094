use super::*;

/// Indexer metadata binding an asset to an output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum AttachmentRecord {
  Inscription {
    outpoint: OutPoint,
    attachment: InscriptionAttachment,
  },
  Fungible {
    outpoint: OutPoint,
    allocation: FungibleAllocation,
  },
}

impl AttachmentRecord {
  pub fn outpoint(&self) -> OutPoint {
    match self {
      Self::Inscription { outpoint, .. } | Self::Fungible { outpoint, .. } => *outpoint,
    }
  }
}

/// A UTXO snapshot partitioned by attached assets. Each partition keeps the
/// snapshot's order. Outputs carrying both kinds of asset are listed as
/// inscription-bearing.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Classification {
  pub plain: Vec<Utxo>,
  pub inscription_bearing: Vec<Utxo>,
  pub fungible_bearing: Vec<Utxo>,
}

impl Classification {
  /// Merge indexer `records` into `utxos` and partition the result. Fails if
  /// a record names an output missing from the snapshot.
  pub fn classify(utxos: &[Utxo], records: &[AttachmentRecord]) -> Result<Self> {
    let mut utxos = utxos.to_vec();

    let positions = utxos
      .iter()
      .enumerate()
      .map(|(i, utxo)| (utxo.outpoint, i))
      .collect::<BTreeMap<OutPoint, usize>>();

    for record in records {
      let outpoint = record.outpoint();

      let Some(&i) = positions.get(&outpoint) else {
        log::warn!("attachment metadata for {outpoint} not found in UTXO snapshot");
        return Err(Error::Classification { outpoint });
      };

      let utxo = &mut utxos[i];

      match record {
        AttachmentRecord::Inscription { attachment, .. } => {
          if !utxo.holds_inscription(attachment.inscription_id) {
            utxo.inscriptions.push(attachment.clone());
          }
        }
        AttachmentRecord::Fungible { allocation, .. } => {
          if !utxo.fungible.contains(allocation) {
            utxo.fungible.push(allocation.clone());
          }
        }
      }
    }

    let mut classification = Self::default();

    for utxo in utxos {
      if !utxo.inscriptions.is_empty() {
        classification.inscription_bearing.push(utxo);
      } else if !utxo.fungible.is_empty() {
        classification.fungible_bearing.push(utxo);
      } else {
        classification.plain.push(utxo);
      }
    }

    log::debug!(
      "classified {} plain, {} inscription-bearing, {} fungible-bearing UTXOs",
      classification.plain.len(),
      classification.inscription_bearing.len(),
      classification.fungible_bearing.len(),
    );

    Ok(classification)
  }

  pub fn protected_outpoints(&self) -> Vec<OutPoint> {
    self
      .inscription_bearing
      .iter()
      .chain(&self.fungible_bearing)
      .map(|utxo| utxo.outpoint)
      .collect()
  }
}
