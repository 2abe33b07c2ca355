//! Interactive confirmation.

use std::io::{self, BufRead, Write};

use datasample_core::{Connection, EntityType};

/// `name (description)` of a connection.
pub fn format_connection<C: Connection + ?Sized>(conn: &C) -> String {
    format!("{} ({})", conn.name(), conn.describe())
}

/// The question asked before importing `models` from `source` to `destination`.
pub fn confirmation_prompt<S, D>(source: &S, destination: &D, models: &[EntityType]) -> String
where
    S: Connection + ?Sized,
    D: Connection + ?Sized,
{
    let model_lines: String = models.iter().map(|model| format!("\t {model}\n")).collect();
    format!(
        "You have requested to import data\n\n    from {}\n    to {}\n\n\
         Data will be imported for the following models:\n{model_lines}\n\
         Do you want to continue?\n\n    Type 'yes' to continue, or 'no' to cancel: ",
        format_connection(source),
        format_connection(destination),
    )
}

/// Write `prompt` to `output` and read one answer line from `input`.
///
/// Only the exact answer `yes` confirms. End of input declines.
pub fn confirm<R, W>(input: &mut R, output: &mut W, prompt: &str) -> io::Result<bool>
where
    R: BufRead + ?Sized,
    W: Write + ?Sized,
{
    output.write_all(prompt.as_bytes())?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim_end_matches(['\r', '\n']) == "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use datasample_memory::MemoryConnection;

    fn ask(answer: &str) -> (bool, String) {
        let mut input = answer.as_bytes();
        let mut output = Vec::new();
        let confirmed = confirm(&mut input, &mut output, "go? ").unwrap();
        (confirmed, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_only_yes_confirms() {
        assert_eq!(ask("yes\n"), (true, "go? ".to_string()));
        assert!(ask("yes\r\n").0);
        assert!(ask("yes").0);
        assert!(!ask("no\n").0);
        assert!(!ask("y\n").0);
        assert!(!ask("YES\n").0);
        assert!(!ask(" yes\n").0);
        assert!(!ask("").0);
    }

    #[test]
    fn test_prompt_lists_connections_and_models() {
        let source = MemoryConnection::new("default").with_description("prod replica");
        let destination = MemoryConnection::new("local");
        let models = vec![EntityType::new("shop.Order"), EntityType::new("auth.User")];

        let prompt = confirmation_prompt(&source, &destination, &models);

        assert!(prompt.contains("    from default (prod replica)\n"));
        assert!(prompt.contains("    to local (in-memory store)\n"));
        assert!(prompt.contains("\t shop.Order\n\t auth.User\n"));
        assert!(prompt.ends_with("Type 'yes' to continue, or 'no' to cancel: "));
    }

    #[test]
    fn test_prompt_text_is_exact() {
        let source = MemoryConnection::new("default");
        let destination = MemoryConnection::new("local");

        let prompt = confirmation_prompt(&source, &destination, &[EntityType::new("auth.User")]);

        assert_eq!(
            prompt,
            "You have requested to import data\n\n\
             \x20   from default (in-memory store)\n\
             \x20   to local (in-memory store)\n\n\
             Data will be imported for the following models:\n\
             \t auth.User\n\n\
             Do you want to continue?\n\n\
             \x20   Type 'yes' to continue, or 'no' to cancel: "
        );
    }

    #[test]
    fn test_prompt_without_models() {
        let prompt = confirmation_prompt(
            &MemoryConnection::new("a"),
            &MemoryConnection::new("b"),
            &[],
        );

        assert!(prompt.contains("following models:\n\nDo you want to continue?"));
    }
}
