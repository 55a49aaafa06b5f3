//! Declared defaults, the lowest-precedence source.

use serde_json::Value;

use super::{ExtractContext, Extraction, Source, SourceAdapter, coerce};
use crate::Result;
use crate::types::ValueKind;

/// Supplies every option's default, `null` when none is declared.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSource;

impl SourceAdapter for DefaultSource {
    fn extract(&self, ctx: &ExtractContext<'_>) -> Result<Extraction> {
        let mut extraction = Extraction::new();
        for (index, option) in ctx.options.iter().enumerate() {
            let identity = option.identity();
            let value = match option.default() {
                // String defaults go through the coercion like any raw value
                Some(Value::String(raw))
                    if !matches!(option.coercion().kind(), ValueKind::String | ValueKind::Any) =>
                {
                    coerce(option, &raw, &Source::Default)?
                }
                Some(value) => value,
                None => Value::Null,
            };

            // An alias without a default must not erase its sibling's default
            if value.is_null() && extraction.get(&identity).is_some_and(|v| !v.is_null()) {
                continue;
            }
            extraction.insert(identity, index, value, Source::Default);
        }
        Ok(extraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::option::{ArgKind, ConfigOption};
    use crate::types;
    use serde_json::json;

    fn extract(options: &[ConfigOption]) -> Extraction {
        DefaultSource
            .extract(&ExtractContext {
                options,
                program: "app",
            })
            .unwrap()
    }

    #[test]
    fn missing_defaults_are_null() {
        let extraction = extract(&[ConfigOption::new(["--foo"])]);
        assert_eq!(extraction.get("foo"), Some(&Value::Null));
    }

    #[test]
    fn string_defaults_are_coerced() {
        let extraction = extract(&[ConfigOption::new(["--xarg"])
            .coerce(types::integer())
            .default_value("1")]);
        assert_eq!(extraction.get("xarg"), Some(&json!(1)));
    }

    #[test]
    fn typed_defaults_pass_through() {
        let extraction = extract(&[ConfigOption::new(["--xarg"])
            .coerce(types::integer())
            .default_value(7)]);
        assert_eq!(extraction.get("xarg"), Some(&json!(7)));
    }

    #[test]
    fn alias_without_default_keeps_sibling_default() {
        let extraction = extract(&[
            ConfigOption::new(["--key"]).default_value("abc"),
            ConfigOption::new(["--key-file"]).dest("key"),
        ]);
        assert_eq!(extraction.get("key"), Some(&json!("abc")));
    }

    #[test]
    fn flags_default_from_their_action() {
        let extraction = extract(&[ConfigOption::new(["--verbose"]).action(ArgKind::SetTrue)]);
        assert_eq!(extraction.get("verbose"), Some(&json!(false)));
    }
}
