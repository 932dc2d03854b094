use super::*;

fn re(s: &'static str) -> Regex {
  Regex::new(&format!("^{s}$")).unwrap()
}

lazy_static! {
  pub(crate) static ref ADDRESS: Regex = re(
    r"((bc1|tb1|bcrt1)[qpzry9x8gf2tvdw0s3jn54khce6mua7l]{39,60}|[123mn2][a-km-zA-HJ-NP-Z1-9]{25,34})"
  );
  pub(crate) static ref PUBLIC_KEY: Regex = re(r"(0[23][[:xdigit:]]{64}|04[[:xdigit:]]{128})");
}
