use super::*;

fn list<T: Display>(items: &[T]) -> String {
  items
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<String>>()
    .join(", ")
}

#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)), visibility(pub(crate)))]
pub enum Error {
  #[snafu(display("invalid address: {source}"))]
  AddressNetwork {
    source: bitcoin::address::ParseError,
  },
  #[snafu(display("broadcast failed: {err}"))]
  Broadcast { err: anyhow::Error },
  #[snafu(display(
    "attachment metadata references output {outpoint} which is not in the UTXO snapshot, please re-fetch"
  ))]
  Classification { outpoint: OutPoint },
  #[snafu(display(
    "output value is below dust value: {} < {} sats",
    value.to_sat(),
    dust.to_sat()
  ))]
  Dust { value: Amount, dust: Amount },
  #[snafu(display("inscription {inscription_id} not found in UTXO snapshot"))]
  InscriptionNotFound { inscription_id: InscriptionId },
  #[snafu(display(
    "cannot split inscriptions in {outpoint}: {first} and {second} are less than {} sats apart",
    dust.to_sat()
  ))]
  InscriptionsTooClose {
    outpoint: OutPoint,
    first: InscriptionId,
    second: InscriptionId,
    dust: Amount,
  },
  #[snafu(display("input index {index} out of range for transaction with {inputs} inputs"))]
  InputOutOfRange { index: usize, inputs: usize },
  #[snafu(display(
    "insufficient funds: need {} sats, have {} sats in plain UTXOs{}",
    needed.to_sat(),
    available.to_sat(),
    if protected.is_empty() {
      String::new()
    } else {
      format!(" ({} excluded because they carry assets: {})", protected.len(), list(protected))
    }
  ))]
  InsufficientFunds {
    needed: Amount,
    available: Amount,
    protected: Vec<OutPoint>,
  },
  #[snafu(display("input {index} signature from oracle does not verify"))]
  InvalidSignature { index: usize },
  #[snafu(display("input {index}: signer {signer} is not the current account"))]
  InvalidSigner { index: usize, signer: Signer },
  #[snafu(display("input {index} has no previous output information"))]
  MissingPrevout { index: usize },
  #[snafu(display(
    "output {outpoint} holds multiple inscriptions ({}), split them first",
    list(inscriptions)
  ))]
  MultipleAttachments {
    outpoint: OutPoint,
    inscriptions: Vec<InscriptionId>,
  },
  #[snafu(display("no inscriptions given to send"))]
  NoInscriptions,
  #[snafu(display("fee settlement did not converge after {rounds} rounds"))]
  NoSettlement { rounds: usize },
  #[snafu(display("signing oracle failed on input {index}: {message}"))]
  Oracle { index: usize, message: String },
  #[snafu(display("invalid PSBT: {source}"))]
  Psbt { source: psbt::Error },
  #[snafu(display("script push too large: {source}"))]
  PushBytes {
    source: bitcoin::script::PushBytesError,
  },
  #[snafu(display("input {index}: sighash computation failed: {message}"))]
  Sighash { index: usize, message: String },
  #[snafu(display("input {index}: sighash type {sighash_type} not allowed"))]
  SighashNotAllowed {
    index: usize,
    sighash_type: PsbtSighashType,
  },
  #[snafu(display("UTXO source failed: {err}"))]
  Source { err: anyhow::Error },
  #[snafu(display("inputs not finalized: {}", list(indices)))]
  Unresolved { indices: Vec<usize> },
  #[snafu(display(
    "cannot leave {ticker} change of {} sats, must be 0 or at least {} sats",
    remainder.to_sat(),
    dust.to_sat()
  ))]
  UnsplittableChange {
    ticker: String,
    remainder: Amount,
    dust: Amount,
  },
  #[snafu(display("segwit and taproot addresses require a compressed public key"))]
  UncompressedPublicKey {
    source: bitcoin::key::UncompressedPublicKeyError,
  },
  #[snafu(display("signing oracle rejected input {index}"))]
  UserRejected { index: usize },
  #[snafu(display("arithmetic overflow calculating value"))]
  ValueOverflow,
}
