use {super::*, snafu::ResultExt};

/// Signing progress of one PSBT input. Inputs only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputState {
  Unsigned,
  PartiallySigned,
  Finalized,
}

impl InputState {
  pub fn of(input: &psbt::Input) -> Self {
    if input.final_script_witness.is_some() || input.final_script_sig.is_some() {
      Self::Finalized
    } else if input.tap_key_sig.is_some() || !input.partial_sigs.is_empty() {
      Self::PartiallySigned
    } else {
      Self::Unsigned
    }
  }
}

/// An input the current account will sign.
#[derive(Debug, Clone, PartialEq)]
pub struct SigningInput {
  pub index: usize,
  pub public_key: PublicKey,
  pub sighash_types: Option<Vec<PsbtSighashType>>,
  pub disable_tweak_signer: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignOutcome {
  /// Inputs that received a signature in this pass.
  pub signed: Vec<usize>,
  /// Inputs still without a signature after the pass.
  pub unresolved: Vec<usize>,
}

impl SignOutcome {
  pub fn is_complete(&self) -> bool {
    self.unresolved.is_empty()
  }
}

enum Spend {
  KeyPath,
  P2wpkh(ScriptBuf),
  P2pkh,
}

struct Digest {
  message: Message,
  sighash_type: PsbtSighashType,
}

/// Signs a PSBT's inputs for one account through a signing oracle.
pub struct SigningCoordinator<'a, O: ?Sized> {
  account: &'a Account,
  oracle: &'a O,
}

impl<'a, O: SigningOracle + ?Sized> SigningCoordinator<'a, O> {
  pub fn new(account: &'a Account, oracle: &'a O) -> Self {
    Self { account, oracle }
  }

  /// Whether `script` pays to the account. With `disable_tweak` a taproot
  /// script must commit to the account's key directly rather than to its
  /// BIP86 tweak. With a `merkle_root` it must be the account's key tweaked
  /// by that script tree.
  fn owns(
    &self,
    script: &Script,
    disable_tweak: bool,
    merkle_root: Option<taproot::TapNodeHash>,
  ) -> Result<bool> {
    if self.account.address_type.is_taproot() {
      if disable_tweak {
        return Ok(
          *script
            == ScriptBuf::new_p2tr_tweaked(
              self.account.x_only_public_key().dangerous_assume_tweaked(),
            ),
        );
      }

      if merkle_root.is_some() {
        return Ok(
          *script
            == ScriptBuf::new_p2tr(SECP256K1, self.account.x_only_public_key(), merkle_root),
        );
      }
    }

    self.account.owns(script)
  }

  /// Resolve signing inputs from caller-named signers. Every signer must be
  /// the current account and own the input it names.
  pub fn explicit(&self, psbt: &Psbt, requests: &[SignerRequest]) -> Result<Vec<SigningInput>> {
    requests
      .iter()
      .map(|request| {
        let prevout = prevout(psbt, request.index)?;

        if !request.signer.is(self.account)?
          || !self.owns(
            &prevout.script_pubkey,
            request.disable_tweak_signer,
            psbt.inputs[request.index].tap_merkle_root,
          )?
        {
          return Err(Error::InvalidSigner {
            index: request.index,
            signer: request.signer.clone(),
          });
        }

        Ok(SigningInput {
          index: request.index,
          public_key: self.account.public_key,
          sighash_types: request.sighash_types.clone(),
          disable_tweak_signer: request.disable_tweak_signer,
        })
      })
      .collect()
  }

  /// Every input not yet finalized whose prevout pays to the account.
  pub fn implicit(&self, psbt: &Psbt) -> Result<Vec<SigningInput>> {
    let mut inputs = Vec::new();

    for (index, input) in psbt.inputs.iter().enumerate() {
      if InputState::of(input) == InputState::Finalized {
        continue;
      }

      let prevout = match prevout(psbt, index) {
        Ok(prevout) => prevout,
        Err(Error::MissingPrevout { .. }) => {
          log::debug!("skipping input {index} without prevout information");
          continue;
        }
        Err(err) => return Err(err),
      };

      if self.owns(&prevout.script_pubkey, false, input.tap_merkle_root)? {
        inputs.push(SigningInput {
          index,
          public_key: self.account.public_key,
          sighash_types: None,
          disable_tweak_signer: false,
        });
      }
    }

    Ok(inputs)
  }

  /// Explicit resolution when `requests` are given, implicit otherwise.
  pub fn signing_inputs(
    &self,
    psbt: &Psbt,
    requests: Option<&[SignerRequest]>,
  ) -> Result<Vec<SigningInput>> {
    match requests {
      Some(requests) => self.explicit(psbt, requests),
      None => self.implicit(psbt),
    }
  }

  fn spend(&self, psbt: &Psbt, index: usize, prevout: &TxOut) -> Result<Option<Spend>> {
    let script = &prevout.script_pubkey;

    Ok(if script.is_p2tr() {
      Some(Spend::KeyPath)
    } else if script.is_p2wpkh() {
      Some(Spend::P2wpkh(script.clone()))
    } else if script.is_p2sh() {
      match &psbt.inputs[index].redeem_script {
        Some(redeem_script) => Some(Spend::P2wpkh(redeem_script.clone())),
        None => self
          .account
          .address_type
          .redeem_script(&self.account.public_key)?
          .map(Spend::P2wpkh),
      }
    } else if script.is_p2pkh() {
      Some(Spend::P2pkh)
    } else {
      None
    })
  }

  fn digest(
    psbt: &Psbt,
    input: &SigningInput,
    spend: &Spend,
    spent: &TxOut,
  ) -> Result<Digest> {
    let index = input.index;

    let sighash_type = psbt.inputs[index].sighash_type.unwrap_or(match spend {
      Spend::KeyPath => TapSighashType::Default.into(),
      Spend::P2wpkh(_) | Spend::P2pkh => EcdsaSighashType::All.into(),
    });

    if let Some(allowed) = &input.sighash_types {
      if !allowed.contains(&sighash_type) {
        return Err(Error::SighashNotAllowed {
          index,
          sighash_type,
        });
      }
    }

    let sighash_error = |err: &dyn Display| Error::Sighash {
      index,
      message: err.to_string(),
    };

    let mut cache = SighashCache::new(&psbt.unsigned_tx);

    let digest = match spend {
      Spend::KeyPath => {
        let prevouts = (0..psbt.inputs.len())
          .map(|i| prevout(psbt, i))
          .collect::<Result<Vec<TxOut>>>()?;

        let hash_ty = sighash_type
          .taproot_hash_ty()
          .map_err(|err| sighash_error(&err))?;

        cache
          .taproot_key_spend_signature_hash(index, &Prevouts::All(&prevouts), hash_ty)
          .map_err(|err| sighash_error(&err))?
          .to_byte_array()
      }
      Spend::P2wpkh(script_code) => {
        let hash_ty = sighash_type
          .ecdsa_hash_ty()
          .map_err(|err| sighash_error(&err))?;

        cache
          .p2wpkh_signature_hash(index, script_code, spent.value, hash_ty)
          .map_err(|err| sighash_error(&err))?
          .to_byte_array()
      }
      Spend::P2pkh => {
        let hash_ty = sighash_type
          .ecdsa_hash_ty()
          .map_err(|err| sighash_error(&err))?;

        cache
          .legacy_signature_hash(index, &spent.script_pubkey, hash_ty.to_u32())
          .map_err(|err| sighash_error(&err))?
          .to_byte_array()
      }
    };

    Ok(Digest {
      message: Message::from_digest(digest),
      sighash_type,
    })
  }

  /// Sign `inputs` one at a time, in order. Stops at the first failure,
  /// leaving inputs signed so far in place. Inputs already finalized are
  /// skipped. Every other input must name the account's key and spend an
  /// output paying to the account.
  pub async fn sign(
    &self,
    psbt: &mut Psbt,
    inputs: &[SigningInput],
    auto_finalize: bool,
  ) -> Result<SignOutcome> {
    let mut signed = Vec::new();

    for input in inputs {
      let index = input.index;

      let prevout = prevout(psbt, index)?;

      if InputState::of(&psbt.inputs[index]) == InputState::Finalized {
        log::debug!("input {index} already finalized");
        continue;
      }

      if input.public_key != self.account.public_key
        || !self.owns(
          &prevout.script_pubkey,
          input.disable_tweak_signer,
          psbt.inputs[index].tap_merkle_root,
        )?
      {
        return Err(Error::InvalidSigner {
          index,
          signer: Signer::PublicKey(input.public_key),
        });
      }

      let Some(spend) = self.spend(psbt, index, &prevout)? else {
        log::warn!(
          "input {index} spends unsupported script {}",
          prevout.script_pubkey
        );
        continue;
      };

      let tweak = !input.disable_tweak_signer;

      if let Spend::KeyPath = spend {
        if tweak && psbt.inputs[index].tap_internal_key.is_none() {
          psbt.inputs[index].tap_internal_key = Some(self.account.x_only_public_key());
        }
      }

      let digest = Self::digest(psbt, input, &spend, &prevout)?;

      let signature = self
        .oracle
        .sign(SignRequest {
          index,
          public_key: input.public_key,
          message: digest.message,
          sighash_type: digest.sighash_type,
          address_type: self.account.address_type,
          tweak,
          merkle_root: psbt.inputs[index].tap_merkle_root,
        })
        .await
        .map_err(|err| match err {
          OracleError::Rejected => Error::UserRejected { index },
          OracleError::Failed { message } => Error::Oracle { index, message },
        })?;

      let psbt_input = &mut psbt.inputs[index];

      match (spend, signature) {
        (Spend::KeyPath, OracleSignature::Schnorr(signature)) => {
          let x_only = XOnlyPublicKey::from(input.public_key.inner);

          let key = if tweak {
            x_only
              .tap_tweak(SECP256K1, psbt_input.tap_merkle_root)
              .0
              .to_x_only_public_key()
          } else {
            x_only
          };

          SECP256K1
            .verify_schnorr(&signature, &digest.message, &key)
            .map_err(|_| Error::InvalidSignature { index })?;

          psbt_input.tap_key_sig = Some(taproot::Signature {
            signature,
            sighash_type: digest
              .sighash_type
              .taproot_hash_ty()
              .map_err(|err| Error::Sighash {
                index,
                message: err.to_string(),
              })?,
          });
        }
        (Spend::P2wpkh(_) | Spend::P2pkh, OracleSignature::Ecdsa(signature)) => {
          SECP256K1
            .verify_ecdsa(&digest.message, &signature, &input.public_key.inner)
            .map_err(|_| Error::InvalidSignature { index })?;

          psbt_input.partial_sigs.insert(
            input.public_key,
            ecdsa::Signature {
              signature,
              sighash_type: digest
                .sighash_type
                .ecdsa_hash_ty()
                .map_err(|err| Error::Sighash {
                  index,
                  message: err.to_string(),
                })?,
            },
          );
        }
        _ => return Err(Error::InvalidSignature { index }),
      }

      signed.push(index);

      if auto_finalize {
        finalize(psbt, index)?;
      }
    }

    let unresolved = psbt
      .inputs
      .iter()
      .enumerate()
      .filter(|(_, input)| InputState::of(input) == InputState::Unsigned)
      .map(|(index, _)| index)
      .collect::<Vec<usize>>();

    if !unresolved.is_empty() {
      log::warn!(
        "{} inputs remain unsigned: {:?}",
        unresolved.len(),
        unresolved
      );
    }

    log::info!("signed {} inputs", signed.len());

    Ok(SignOutcome { signed, unresolved })
  }
}

/// Assemble the final script sig and witness of input `index` from its
/// signature and clear the signing fields. Returns false if the input has
/// no signature yet. Finalized inputs are left untouched.
pub fn finalize(psbt: &mut Psbt, index: usize) -> Result<bool> {
  let prevout = prevout(psbt, index)?;

  let input = &mut psbt.inputs[index];

  match InputState::of(input) {
    InputState::Finalized => return Ok(true),
    InputState::Unsigned => return Ok(false),
    InputState::PartiallySigned => {}
  }

  let script_pubkey = &prevout.script_pubkey;

  if let Some(signature) = input.tap_key_sig {
    input.final_script_witness = Some(Witness::p2tr_key_spend(&signature));
  } else {
    let Some((public_key, signature)) = input
      .partial_sigs
      .iter()
      .next()
      .map(|(public_key, signature)| (*public_key, *signature))
    else {
      return Ok(false);
    };

    if script_pubkey.is_p2pkh() {
      input.final_script_sig = Some(
        script::Builder::new()
          .push_slice(<&PushBytes>::try_from(signature.to_vec().as_slice()).context(error::PushBytes)?)
          .push_key(&public_key)
          .into_script(),
      );
    } else {
      if script_pubkey.is_p2sh() {
        let Some(redeem_script) = &input.redeem_script else {
          return Ok(false);
        };

        input.final_script_sig = Some(
          script::Builder::new()
            .push_slice(<&PushBytes>::try_from(redeem_script.as_bytes()).context(error::PushBytes)?)
            .into_script(),
        );
      }

      input.final_script_witness = Some(Witness::p2wpkh(&signature, &public_key.inner));
    }
  }

  input.partial_sigs.clear();
  input.sighash_type = None;
  input.redeem_script = None;
  input.witness_script = None;
  input.bip32_derivation.clear();
  input.tap_key_sig = None;
  input.tap_script_sigs.clear();
  input.tap_scripts.clear();
  input.tap_key_origins.clear();
  input.tap_internal_key = None;
  input.tap_merkle_root = None;

  Ok(true)
}

/// Finalize every signed input. Returns the indices left unfinalized.
pub fn finalize_all(psbt: &mut Psbt) -> Result<Vec<usize>> {
  let mut unfinalized = Vec::new();

  for index in 0..psbt.inputs.len() {
    if !finalize(psbt, index)? {
      unfinalized.push(index);
    }
  }

  Ok(unfinalized)
}

/// Output spent by input `index`, from its PSBT fields.
pub fn prevout(psbt: &Psbt, index: usize) -> Result<TxOut> {
  let input = psbt.inputs.get(index).ok_or(Error::InputOutOfRange {
    index,
    inputs: psbt.inputs.len(),
  })?;

  if let Some(tx_out) = &input.witness_utxo {
    return Ok(tx_out.clone());
  }

  let vout = psbt.unsigned_tx.input[index].previous_output.vout;

  input
    .non_witness_utxo
    .as_ref()
    .and_then(|transaction| {
      usize::try_from(vout)
        .ok()
        .and_then(|vout| transaction.output.get(vout))
    })
    .cloned()
    .ok_or(Error::MissingPrevout { index })
}
