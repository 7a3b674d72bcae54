//! Identifier helpers: random strings, UUIDs, digests.
//!
//! Random values come from `rand`'s thread-local generator and are not
//! suitable for secrets.

use md5::Md5;
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::{arity, int_arg, text, HelperRegistry, MAX_GENERATED};
use crate::error::{HelperError, HelperResult};
use crate::value::Value;

pub(super) fn register(registry: &mut HelperRegistry) {
    registry.insert("random_string", random_string);
    registry.insert("uuid", |args: &[Value]| {
        arity(args, 0, 0)?;
        Ok(Value::String(Uuid::new_v4().to_string()))
    });
    registry.insert("md5", |args: &[Value]| {
        arity(args, 1, 1)?;
        Ok(Value::String(hex::encode(Md5::digest(text(args, 0).as_bytes()))))
    });
    registry.insert("sha1", |args: &[Value]| {
        arity(args, 1, 1)?;
        Ok(Value::String(hex::encode(Sha1::digest(text(args, 0).as_bytes()))))
    });
    registry.insert("sha256", |args: &[Value]| {
        arity(args, 1, 1)?;
        Ok(Value::String(hex::encode(Sha256::digest(text(args, 0).as_bytes()))))
    });
}

/// `random_string(length = 10)` of ASCII letters and digits.
fn random_string(args: &[Value]) -> HelperResult {
    arity(args, 0, 1)?;
    let length = int_arg(args, 0, 10)?;
    if !(0..=MAX_GENERATED as i64).contains(&length) {
        return Err(HelperError::invalid(format!("length {} out of range", length)));
    }
    let out = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length as usize)
        .map(char::from)
        .collect();
    Ok(Value::String(out))
}
