use {
  super::*,
  bitcoin::key::{Keypair, PrivateKey},
  secp256k1::{schnorr, SecretKey},
};

/// One digest to sign. `tweak` is set for taproot key-path spends whose
/// on-chain key is the tweak of `public_key` by `merkle_root`, or by no
/// script tree at all.
#[derive(Debug, Clone, PartialEq)]
pub struct SignRequest {
  pub index: usize,
  pub public_key: PublicKey,
  pub message: Message,
  pub sighash_type: PsbtSighashType,
  pub address_type: AddressType,
  pub tweak: bool,
  pub merkle_root: Option<taproot::TapNodeHash>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OracleSignature {
  Ecdsa(secp256k1::ecdsa::Signature),
  Schnorr(schnorr::Signature),
}

#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)), visibility(pub(crate)))]
pub enum OracleError {
  #[snafu(display("signature request rejected"))]
  Rejected,
  #[snafu(display("{message}"))]
  Failed { message: String },
}

/// Holder of the account's keys. Signing may involve the user and may be
/// refused.
#[async_trait]
pub trait SigningOracle: Send + Sync {
  async fn sign(&self, request: SignRequest) -> Result<OracleSignature, OracleError>;
}

/// Software oracle signing with a single secret key.
pub struct LocalKeyOracle {
  secret_key: SecretKey,
}

impl LocalKeyOracle {
  pub fn new(secret_key: SecretKey) -> Self {
    Self { secret_key }
  }

  pub fn from_wif(wif: &str) -> anyhow::Result<Self> {
    Ok(Self::new(PrivateKey::from_wif(wif)?.inner))
  }

  pub fn public_key(&self) -> PublicKey {
    PublicKey::new(self.secret_key.public_key(SECP256K1))
  }
}

#[async_trait]
impl SigningOracle for LocalKeyOracle {
  async fn sign(&self, request: SignRequest) -> Result<OracleSignature, OracleError> {
    if request.public_key.inner != self.public_key().inner {
      return Err(OracleError::Failed {
        message: format!("no key for {}", request.public_key),
      });
    }

    if request.address_type.is_taproot() {
      let keypair = Keypair::from_secret_key(SECP256K1, &self.secret_key);

      let keypair = if request.tweak {
        keypair
          .tap_tweak(SECP256K1, request.merkle_root)
          .to_keypair()
      } else {
        keypair
      };

      Ok(OracleSignature::Schnorr(
        SECP256K1.sign_schnorr_no_aux_rand(&request.message, &keypair),
      ))
    } else {
      Ok(OracleSignature::Ecdsa(
        SECP256K1.sign_ecdsa(&request.message, &self.secret_key),
      ))
    }
  }
}
