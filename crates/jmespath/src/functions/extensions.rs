//! Payload-decoding extension functions.
//!
//! These unwrap JSON that arrives serialized inside another document (for
//! example a message body carried as a string). Undecodable input is a hard
//! error rather than a `null`.

use crate::error::EvalError;
use crate::eval_ctx::EvalCtx;
use crate::types::{Arity, FunctionDefinition};
use crate::value::JpValue;
use base64::Engine;
use flate2::read::GzDecoder;
use serde_json::Value;
use std::io::Read;
use std::sync::Arc;

fn parse_json(text: &str) -> Result<Value, EvalError> {
    serde_json::from_str(text).map_err(|e| EvalError::InvalidJson(e.to_string()))
}

fn decode_base64(text: &str) -> Result<Vec<u8>, EvalError> {
    base64::engine::general_purpose::STANDARD
        .decode(text.trim())
        .map_err(|e| EvalError::InvalidBase64(e.to_string()))
}

/// Strings are parsed as JSON; any other value passes through unchanged.
fn json_eval(args: &[JpValue<'_>], _ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    match args[0].as_json()? {
        Value::String(s) => parse_json(s),
        other => Ok(other.clone()),
    }
}

fn base64_eval(args: &[JpValue<'_>], _ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    let bytes = decode_base64(args[0].as_str()?)?;
    let text = String::from_utf8(bytes).map_err(|e| EvalError::InvalidJson(e.to_string()))?;
    parse_json(&text)
}

fn base64_gzip_eval(args: &[JpValue<'_>], _ctx: &EvalCtx<'_>) -> Result<Value, EvalError> {
    let bytes = decode_base64(args[0].as_str()?)?;
    let mut decoder = GzDecoder::new(std::io::Cursor::new(bytes));
    let mut text = String::new();
    decoder
        .read_to_string(&mut text)
        .map_err(|e| EvalError::Decompress(e.to_string()))?;
    parse_json(&text)
}

pub fn functions() -> Vec<Arc<FunctionDefinition>> {
    vec![
        Arc::new(FunctionDefinition {
            name: "json",
            aliases: &["powertools_json"],
            arity: Arity::Fixed(1),
            eval_fn: json_eval,
        }),
        Arc::new(FunctionDefinition {
            name: "base64",
            aliases: &["powertools_base64"],
            arity: Arity::Fixed(1),
            eval_fn: base64_eval,
        }),
        Arc::new(FunctionDefinition {
            name: "base64_gzip",
            aliases: &["powertools_base64_gzip"],
            arity: Arity::Fixed(1),
            eval_fn: base64_gzip_eval,
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use serde_json::json;
    use std::collections::HashMap;
    use std::io::Write;

    fn call(f: crate::types::EvalFn, arg: Value) -> Result<Value, EvalError> {
        let functions = HashMap::new();
        let ctx = EvalCtx::new(&functions);
        f(&[JpValue::Json(arg)], &ctx)
    }

    #[test]
    fn json_parses_strings_and_passes_others() {
        assert_eq!(call(json_eval, json!("{\"a\":[1,2]}")).unwrap(), json!({"a": [1, 2]}));
        assert_eq!(call(json_eval, json!({"a": 1})).unwrap(), json!({"a": 1}));
        assert!(matches!(call(json_eval, json!("{nope")), Err(EvalError::InvalidJson(_))));
    }

    #[test]
    fn base64_decodes_json() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(r#"{"user":"xyz"}"#);
        assert_eq!(call(base64_eval, json!(encoded)).unwrap(), json!({"user": "xyz"}));
        assert!(matches!(call(base64_eval, json!("!!!")), Err(EvalError::InvalidBase64(_))));
        assert!(matches!(call(base64_eval, json!(1)), Err(EvalError::Type(_))));
    }

    #[test]
    fn base64_gzip_decodes_json() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(br#"[1,"two",{"three":3}]"#).unwrap();
        let compressed = encoder.finish().unwrap();
        let encoded = base64::engine::general_purpose::STANDARD.encode(compressed);
        assert_eq!(
            call(base64_gzip_eval, json!(encoded)).unwrap(),
            json!([1, "two", {"three": 3}])
        );

        let not_gzip = base64::engine::general_purpose::STANDARD.encode("plain");
        assert!(matches!(call(base64_gzip_eval, json!(not_gzip)), Err(EvalError::Decompress(_))));
    }
}
