use {super::*, snafu::ResultExt};

/// Identity a caller expects to sign an input with, by address or public
/// key.
#[derive(Debug, PartialEq, Clone, DeserializeFromStr, SerializeDisplay)]
pub enum Signer {
  Address(Address<NetworkUnchecked>),
  PublicKey(PublicKey),
}

#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
pub enum ParseError {
  #[snafu(display("invalid signer address `{input}`: {source}"))]
  AddressParse {
    input: String,
    source: bitcoin::address::ParseError,
  },
  #[snafu(display("invalid signer public key `{input}`: {source}"))]
  PublicKeyParse {
    input: String,
    source: bitcoin::key::ParsePublicKeyError,
  },
  #[snafu(display("`{input}` is neither an address nor a public key"))]
  Unrecognized { input: String },
}

impl FromStr for Signer {
  type Err = ParseError;

  fn from_str(input: &str) -> Result<Self, Self::Err> {
    if re::ADDRESS.is_match(input) {
      Ok(Self::Address(
        input.parse().context(AddressParse { input })?,
      ))
    } else if re::PUBLIC_KEY.is_match(input) {
      Ok(Self::PublicKey(
        input.parse().context(PublicKeyParse { input })?,
      ))
    } else {
      Err(ParseError::Unrecognized {
        input: input.to_string(),
      })
    }
  }
}

impl Display for Signer {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    match self {
      Self::Address(address) => write!(f, "{}", address.assume_checked_ref()),
      Self::PublicKey(public_key) => write!(f, "{public_key}"),
    }
  }
}

impl Signer {
  /// Whether this identity is `account` under the account's chain.
  pub fn is(&self, account: &Account) -> Result<bool> {
    match self {
      Self::Address(address) => Ok(
        address.is_valid_for_network(account.chain.network())
          && *address.assume_checked_ref() == account.address()?,
      ),
      Self::PublicKey(public_key) => Ok(*public_key == account.public_key),
    }
  }
}

/// An explicit request to sign input `index` as `signer`.
#[derive(Debug, PartialEq, Clone)]
pub struct SignerRequest {
  pub index: usize,
  pub signer: Signer,
  pub sighash_types: Option<Vec<PsbtSighashType>>,
  pub disable_tweak_signer: bool,
}

impl SignerRequest {
  pub fn new(index: usize, signer: Signer) -> Self {
    Self {
      index,
      signer,
      sighash_types: None,
      disable_tweak_signer: false,
    }
  }
}
