use {super::*, snafu::ResultExt};

/// Identifier of an ordinal inscription: the reveal transaction id and the
/// inscription's index within it, written `<txid>i<index>`.
#[derive(
  Debug, PartialEq, Copy, Clone, Hash, Eq, PartialOrd, Ord, DeserializeFromStr, SerializeDisplay,
)]
pub struct InscriptionId {
  pub txid: Txid,
  pub index: u32,
}

impl Display for InscriptionId {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    write!(f, "{}i{}", self.txid, self.index)
  }
}

#[derive(Debug, Snafu)]
pub enum ParseError {
  #[snafu(display("invalid character: '{character}'"))]
  Character { character: char },
  #[snafu(display("invalid length: {length}"))]
  Length { length: usize },
  #[snafu(display("invalid separator: `{separator}`"))]
  Separator { separator: char },
  #[snafu(display("invalid txid: {source}"))]
  Txid {
    source: bitcoin::hex::HexToArrayError,
  },
  #[snafu(display("invalid index: {source}"))]
  Index { source: std::num::ParseIntError },
}

impl FromStr for InscriptionId {
  type Err = ParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    const TXID_LEN: usize = 64;
    const MIN_LEN: usize = TXID_LEN + 2;

    if let Some(character) = s.chars().find(|c| !c.is_ascii()) {
      return Err(ParseError::Character { character });
    }

    if s.len() < MIN_LEN {
      return Err(ParseError::Length { length: s.len() });
    }

    let (txid, rest) = s.split_at(TXID_LEN);

    let mut rest = rest.chars();

    match rest.next() {
      Some('i') => {}
      Some(separator) => return Err(ParseError::Separator { separator }),
      None => return Err(ParseError::Length { length: s.len() }),
    }

    Ok(Self {
      txid: txid.parse().context(TxidSnafu)?,
      index: rest.as_str().parse().context(IndexSnafu)?,
    })
  }
}
