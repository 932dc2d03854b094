use super::*;

/// The wallet account transactions are built for and signed by. Passed
/// explicitly to every operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
  pub public_key: PublicKey,
  pub address_type: AddressType,
  pub chain: Chain,
}

impl Account {
  pub fn new(public_key: PublicKey, address_type: AddressType, chain: Chain) -> Self {
    Self {
      public_key,
      address_type,
      chain,
    }
  }

  pub fn address(&self) -> Result<Address> {
    self.address_type.address(&self.public_key, self.chain)
  }

  pub fn script_pubkey(&self) -> Result<ScriptBuf> {
    Ok(self.address()?.script_pubkey())
  }

  pub fn x_only_public_key(&self) -> XOnlyPublicKey {
    XOnlyPublicKey::from(self.public_key.inner)
  }

  /// Whether `script` is this account's own locking script under the
  /// account's chain.
  pub fn owns(&self, script: &Script) -> Result<bool> {
    Ok(self.chain.address_from_script(script) == Some(self.address()?))
  }
}
