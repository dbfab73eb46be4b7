//! Built-in function registry.

pub mod array;
pub mod extensions;
pub mod math;
pub mod object;
pub mod string;

use crate::types::{functions_to_map, FunctionDefinition, FunctionMap};
use std::sync::Arc;

/// The standard JMESPath function library.
pub fn builtin_functions() -> Vec<Arc<FunctionDefinition>> {
    let mut funcs = Vec::new();
    funcs.extend(math::functions());
    funcs.extend(string::functions());
    funcs.extend(array::functions());
    funcs.extend(object::functions());
    funcs
}

/// Builds the function map, optionally including the payload-decoding
/// extensions (`json`, `base64`, `base64_gzip`).
pub fn functions_map(extensions: bool) -> FunctionMap {
    let mut funcs = builtin_functions();
    if extensions {
        funcs.extend(extensions::functions());
    }
    functions_to_map(funcs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_contents() {
        let map = functions_map(true);
        for name in [
            "abs", "avg", "ceil", "contains", "ends_with", "floor", "join", "keys", "length",
            "map", "max", "max_by", "merge", "min", "min_by", "not_null", "reverse", "sort",
            "sort_by", "starts_with", "sum", "to_array", "to_number", "to_string", "type",
            "values", "json", "base64", "base64_gzip", "powertools_json",
        ] {
            assert!(map.contains_key(name), "missing function {name}");
        }
        assert!(!functions_map(false).contains_key("base64"));
    }
}
