/// Substitute `{name}` style placeholders in one pass.
///
/// Text inserted for one placeholder is never scanned again, so a retrieved
/// chunk that happens to contain `{question}` stays verbatim. Unknown
/// placeholders are left as written.
pub fn fill_placeholders(template: &str, values: &[(&str, &str)]) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        output.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let replaced = after.find('}').and_then(|end| {
            let name = &after[..end];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (end, *value))
        });

        match replaced {
            Some((end, value)) => {
                output.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                output.push('{');
                rest = after;
            }
        }
    }

    output.push_str(rest);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_known_placeholders() {
        let out = fill_placeholders(
            "Context: {context}\nQ: {question}\nA:",
            &[("context", "beacons"), ("question", "why?")],
        );
        assert_eq!(out, "Context: beacons\nQ: why?\nA:");
    }

    #[test]
    fn inserted_text_is_not_rescanned() {
        let out = fill_placeholders(
            "{context} / {question}",
            &[("context", "literal {question}"), ("question", "q")],
        );
        assert_eq!(out, "literal {question} / q");
    }

    #[test]
    fn unknown_and_unbalanced_braces_pass_through() {
        let out = fill_placeholders("{json: 1} {question} {", &[("question", "q")]);
        assert_eq!(out, "{json: 1} q {");
    }
}
