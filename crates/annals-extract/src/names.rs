//! Display-name rendering.
//!
//! Saves store names in two shapes. Older ones use a bare string. Newer
//! ones use a template: a `key` holding the format string, a `variables`
//! list whose entries substitute `$token$` placeholders inside it, and an
//! optional `literal=yes` marker meaning the key is already the final
//! text. Variable values are themselves names and render recursively.

use annals_save::Value;

/// Render a name value, falling back to `default` when the value is
/// missing or has an unusable shape.
pub fn render_name(value: Option<&Value>, default: &str) -> String {
    match value {
        Some(Value::Str(text)) => text.clone(),
        Some(template @ Value::Map(_)) => render_template(template, default),
        _ => default.to_string(),
    }
}

fn render_template(template: &Value, default: &str) -> String {
    let Some(key) = template.get("key").and_then(Value::as_str) else {
        return default.to_string();
    };
    if template.get("literal").and_then(Value::as_yes_no) == Some(true) {
        return key.to_string();
    }
    let mut rendered = key.to_string();
    if let Some(variables) = template.get("variables") {
        for variable in variables.iter_coerced() {
            let Some(token) = variable.get("key").and_then(Value::as_str) else {
                continue;
            };
            let substitution = render_name(variable.get("value"), "");
            rendered = rendered.replace(&format!("${token}$"), &substitution);
        }
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_strings_render_verbatim() {
        let value = Value::from("United Nations of Earth");
        assert_eq!(render_name(Some(&value), "fallback"), "United Nations of Earth");
    }

    #[test]
    fn missing_values_use_the_default() {
        assert_eq!(render_name(None, "no name"), "no name");
        let number = Value::from(3);
        assert_eq!(render_name(Some(&number), "no name"), "no name");
    }

    #[test]
    fn templates_substitute_variables() {
        let value = Value::map([
            ("key", Value::from("$ADJ$ Empire")),
            (
                "variables",
                Value::list([Value::map([
                    ("key", Value::from("ADJ")),
                    ("value", Value::map([("key", Value::from("Glorious"))])),
                ])]),
            ),
        ]);
        assert_eq!(render_name(Some(&value), "fallback"), "Glorious Empire");
    }

    #[test]
    fn literal_templates_skip_substitution() {
        let value = Value::map([
            ("key", Value::from("$notavar$ Harmony")),
            ("literal", Value::from("yes")),
        ]);
        assert_eq!(render_name(Some(&value), "fallback"), "$notavar$ Harmony");
    }

    #[test]
    fn templates_without_a_key_fall_back() {
        let value = Value::map([("variables", Value::list(Vec::<Value>::new()))]);
        assert_eq!(render_name(Some(&value), "Unnamed system"), "Unnamed system");
    }
}
