//! Local stand-in handlers for the stock intrinsic functions.
//!
//! Deployed functions are opaque to the chain; these handlers exist only so
//! `chainline run` can exercise a chain end to end without a deployment.
//! Dispatch is by the function name's trailing segment, matching the stock
//! `IntrinsicFn-*` naming.

use anyhow::{bail, Result};
use chrono::Utc;
use rand::Rng;
use serde_json::{json, Value};
use ulid::Ulid;

use chainline_engine::FunctionRunner;

/// Alphabet and length of the nanoid-style identifiers.
const NANOID_ALPHABET: &[u8] = b"_-0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const NANOID_LEN: usize = 21;

/// Invokes builtin payload producers in place of deployed functions.
#[derive(Debug, Default)]
pub struct LocalFunctionRunner;

impl FunctionRunner for LocalFunctionRunner {
    fn invoke(&self, function_name: &str, _input: &Value) -> Result<Value> {
        let handler = function_name.rsplit('-').next().unwrap_or(function_name).to_lowercase();
        match handler.as_str() {
            "date" => Ok(json!(Utc::now().to_rfc3339())),
            "nanoid" => Ok(json!(nanoid())),
            "ulid" => Ok(json!(Ulid::new().to_string())),
            "hello" => Ok(json!("Hello, world!")),
            other => bail!("no local handler for function '{function_name}' (handler '{other}')"),
        }
    }
}

fn nanoid() -> String {
    let mut rng = rand::thread_rng();
    (0..NANOID_LEN)
        .map(|_| NANOID_ALPHABET[rng.gen_range(0..NANOID_ALPHABET.len())] as char)
        .collect()
}
