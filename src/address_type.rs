use {super::*, clap::ValueEnum, snafu::ResultExt};

/// Locking script template of a wallet address. The `M44` variants derive
/// their keys along BIP44 paths but spend exactly like their base types.
#[derive(
  Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum AddressType {
  P2pkh,
  P2wpkh,
  P2tr,
  P2shP2wpkh,
  M44P2wpkh,
  M44P2tr,
}

impl AddressType {
  const ECDSA_SIGNATURE_SIZE: usize = 72;
  const SCHNORR_SIGNATURE_SIZE: usize = 64;
  const P2SH_P2WPKH_SCRIPT_SIG_SIZE: usize = 23;
  const P2PKH_SCRIPT_SIG_SIZE: usize = 107;

  pub fn is_taproot(self) -> bool {
    matches!(self, Self::P2tr | Self::M44P2tr)
  }

  pub fn is_segwit_v0(self) -> bool {
    matches!(self, Self::P2wpkh | Self::M44P2wpkh | Self::P2shP2wpkh)
  }

  pub fn address(self, public_key: &PublicKey, chain: Chain) -> Result<Address> {
    let network = chain.network();

    let compressed =
      || CompressedPublicKey::try_from(*public_key).context(error::UncompressedPublicKey);

    Ok(match self {
      Self::P2pkh => Address::p2pkh(public_key.pubkey_hash(), network),
      Self::P2wpkh | Self::M44P2wpkh => Address::p2wpkh(&compressed()?, network),
      Self::P2shP2wpkh => Address::p2shwpkh(&compressed()?, network),
      Self::P2tr | Self::M44P2tr => Address::p2tr(
        SECP256K1,
        XOnlyPublicKey::from(compressed()?.0),
        None,
        network,
      ),
    })
  }

  /// Inner witness program script for P2SH-wrapped segwit spends.
  pub fn redeem_script(self, public_key: &PublicKey) -> Result<Option<ScriptBuf>> {
    if self != Self::P2shP2wpkh {
      return Ok(None);
    }

    let compressed =
      CompressedPublicKey::try_from(*public_key).context(error::UncompressedPublicKey)?;

    Ok(Some(ScriptBuf::new_p2wpkh(&compressed.wpubkey_hash())))
  }

  /// Script sig and witness of the same size as a real spend, used to
  /// estimate virtual size before anything is signed.
  pub(crate) fn placeholder_spend(self) -> (ScriptBuf, Witness) {
    let ecdsa_witness = || {
      Witness::from_slice(&[
        vec![0; Self::ECDSA_SIGNATURE_SIZE],
        vec![0; secp256k1::constants::PUBLIC_KEY_SIZE],
      ])
    };

    match self {
      Self::P2pkh => (
        ScriptBuf::from_bytes(vec![0; Self::P2PKH_SCRIPT_SIG_SIZE]),
        Witness::new(),
      ),
      Self::P2wpkh | Self::M44P2wpkh => (ScriptBuf::new(), ecdsa_witness()),
      Self::P2shP2wpkh => (
        ScriptBuf::from_bytes(vec![0; Self::P2SH_P2WPKH_SCRIPT_SIG_SIZE]),
        ecdsa_witness(),
      ),
      Self::P2tr | Self::M44P2tr => (
        ScriptBuf::new(),
        Witness::from_slice(&[[0; Self::SCHNORR_SIGNATURE_SIZE]]),
      ),
    }
  }
}

impl Display for AddressType {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    write!(
      f,
      "{}",
      match self {
        Self::P2pkh => "p2pkh",
        Self::P2wpkh => "p2wpkh",
        Self::P2tr => "p2tr",
        Self::P2shP2wpkh => "p2sh-p2wpkh",
        Self::M44P2wpkh => "m44-p2wpkh",
        Self::M44P2tr => "m44-p2tr",
      }
    )
  }
}
