#![allow(
  clippy::large_enum_variant,
  clippy::result_large_err,
  clippy::too_many_arguments,
  clippy::type_complexity
)]
#![deny(
  clippy::cast_lossless,
  clippy::cast_possible_truncation,
  clippy::cast_possible_wrap,
  clippy::cast_sign_loss
)]

use {
  self::{
    arguments::Arguments,
    config::Config,
    fee_estimator::FeeEstimator,
    options::Options,
    settings::Settings,
    subcommand::{Subcommand, SubcommandResult},
  },
  async_trait::async_trait,
  bitcoin::{
    absolute::LockTime,
    address::{Address, NetworkUnchecked},
    consensus,
    ecdsa,
    hashes::Hash,
    key::{CompressedPublicKey, PublicKey, TapTweak, XOnlyPublicKey},
    psbt::{self, Psbt, PsbtSighashType},
    script::{self, PushBytes},
    sighash::{EcdsaSighashType, Prevouts, SighashCache, TapSighashType},
    taproot,
    transaction::Version,
    Amount, Network, OutPoint, Script, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid,
    Witness,
  },
  clap::{ArgGroup, Parser},
  lazy_static::lazy_static,
  regex::Regex,
  secp256k1::{Message, SECP256K1},
  serde::{Deserialize, Serialize},
  serde_with::{DeserializeFromStr, SerializeDisplay},
  snafu::Snafu,
  std::{
    collections::{BTreeMap, BTreeSet},
    env,
    fmt::{self, Display, Formatter},
    fs::File,
    path::PathBuf,
    process,
    str::FromStr,
  },
  tokio::runtime::Runtime,
};

pub use self::{
  account::Account,
  address_type::AddressType,
  chain::Chain,
  classifier::{AttachmentRecord, Classification},
  coin_selector::{CoinSelector, FungibleSelection, Selection},
  coordinator::{InputState, SignOutcome, SigningCoordinator, SigningInput},
  error::Error,
  fee_rate::FeeRate,
  inscription_id::InscriptionId,
  intent::{Operation, TransactionIntent},
  oracle::{LocalKeyOracle, OracleError, OracleSignature, SignRequest, SigningOracle},
  signed_transaction::SignedTransaction,
  signer::{Signer, SignerRequest},
  skeleton::{OutputAsset, Skeleton, SkeletonInput, SkeletonOutput},
  source::{BroadcastSink, FeeRateTiers, FeeSource, UtxoSource},
  transaction_builder::{Built, TransactionBuilder},
  utxo::{FungibleAllocation, InscriptionAttachment, Utxo},
  wallet::Wallet,
};


#[cfg(test)]
use self::test::*;

#[macro_use]
mod macros;

pub mod account;
pub mod address_type;
mod arguments;
pub mod chain;
pub mod classifier;
pub mod coin_selector;
mod config;
pub mod coordinator;
pub mod error;
mod fee_estimator;
mod fee_rate;
pub mod inscription_id;
pub mod intent;
pub mod oracle;
mod options;
mod re;
mod settings;
pub mod signed_transaction;
pub mod signer;
pub mod skeleton;
pub mod source;
pub mod subcommand;
pub mod transaction_builder;
pub mod utxo;
pub mod wallet;

pub type Result<T = (), E = Error> = std::result::Result<T, E>;

/// Smallest output value this crate will ever create, in satoshis. Applied to
/// every output type, and to fungible token change remainders.
pub const DUST_THRESHOLD: Amount = Amount::from_sat(546);

fn default<T: Default>() -> T {
  Default::default()
}

pub fn base64_encode(data: &[u8]) -> String {
  use base64::Engine;
  base64::engine::general_purpose::STANDARD.encode(data)
}

pub fn base64_decode(s: &str) -> anyhow::Result<Vec<u8>> {
  use base64::Engine;
  Ok(base64::engine::general_purpose::STANDARD.decode(s)?)
}

pub fn main() {
  env_logger::init();

  let args = Arguments::parse();

  match args.run() {
    Err(err) => {
      eprintln!("error: {err}");

      for (i, err) in err.chain().skip(1).enumerate() {
        if i == 0 {
          eprintln!();
          eprintln!("because:");
        }

        eprintln!("- {err}");
      }

      if env::var_os("RUST_BACKTRACE")
        .map(|val| val == "1")
        .unwrap_or_default()
      {
        eprintln!("{}", err.backtrace());
      }

      process::exit(1);
    }
    Ok(output) => {
      if let Some(output) = output {
        output.print_json();
      }
    }
  }
}
