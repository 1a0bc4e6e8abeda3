//! Interactive county picker.
//!
//! This is kept separate from clap parsing:
//! - clap handles structured flags/subcommands
//! - the picker provides the "run `evdash forecast` and choose a county" UX
//!
//! Input is read line by line; a number selects from the list, anything else
//! is matched against county names (case-insensitive).

use std::io::{BufRead, Write};

use crate::error::AppError;

/// Prompt for one of `counties`, reading stdin. The prompt goes to stderr so
/// the forecast report on stdout stays pipeable.
pub fn prompt_for_county(counties: &[&str]) -> Result<String, AppError> {
    let stdin = std::io::stdin();
    let stderr = std::io::stderr();
    pick_county(counties, stdin.lock(), stderr.lock())
}

/// Picker loop over arbitrary streams.
///
/// Behavior:
/// - list the counties
/// - accept either a number (from the list) or a county name
/// - `q` or end of input cancels
pub fn pick_county<R: BufRead, W: Write>(counties: &[&str], mut input: R, mut output: W) -> Result<String, AppError> {
    if counties.is_empty() {
        return Err(AppError::new(2, "The dataset has no counties to choose from."));
    }

    let io_err = |e: std::io::Error| AppError::new(2, format!("Failed to write prompt: {e}"));

    writeln!(output, "Found {} count{}:", counties.len(), if counties.len() == 1 { "y" } else { "ies" })
        .map_err(io_err)?;
    for (idx, name) in counties.iter().enumerate() {
        writeln!(output, "{:>3}) {name}", idx + 1).map_err(io_err)?;
    }

    loop {
        write!(output, "Select a county by number (1-{}) or name (q to quit): ", counties.len()).map_err(io_err)?;
        output.flush().map_err(io_err)?;

        let mut line = String::new();
        let bytes = input
            .read_line(&mut line)
            .map_err(|e| AppError::new(2, format!("Failed to read input: {e}")))?;
        if bytes == 0 {
            return Err(AppError::new(
                2,
                "No input received. Pass a county with `evdash forecast --county <NAME>`.",
            ));
        }

        let line = line.trim();
        if line.eq_ignore_ascii_case("q") {
            return Err(AppError::new(2, "Canceled."));
        }

        match resolve_choice(line, counties) {
            Some(name) => return Ok(name.to_string()),
            None => writeln!(output, "No county matches '{line}'.").map_err(io_err)?,
        }
    }
}

/// Map a typed answer to a county name.
pub fn resolve_choice<'a>(answer: &str, counties: &[&'a str]) -> Option<&'a str> {
    if let Ok(n) = answer.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| counties.get(i)).copied();
    }
    counties
        .iter()
        .find(|c| **c == answer)
        .or_else(|| counties.iter().find(|c| c.eq_ignore_ascii_case(answer)))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNTIES: &[&str] = &["King", "Pierce", "Snohomish"];

    #[test]
    fn resolves_numbers_and_names() {
        assert_eq!(resolve_choice("1", COUNTIES), Some("King"));
        assert_eq!(resolve_choice("3", COUNTIES), Some("Snohomish"));
        assert_eq!(resolve_choice("0", COUNTIES), None);
        assert_eq!(resolve_choice("4", COUNTIES), None);
        assert_eq!(resolve_choice("pierce", COUNTIES), Some("Pierce"));
        assert_eq!(resolve_choice("Spokane", COUNTIES), None);
    }

    #[test]
    fn retries_until_a_valid_answer() {
        let input = b"Spokane\n9\nsnohomish\n" as &[u8];
        let mut out = Vec::new();
        let chosen = pick_county(COUNTIES, input, &mut out).unwrap();
        assert_eq!(chosen, "Snohomish");

        let transcript = String::from_utf8(out).unwrap();
        assert!(transcript.contains("  2) Pierce"));
        assert!(transcript.contains("No county matches 'Spokane'."));
    }

    #[test]
    fn quit_and_eof_cancel() {
        let err = pick_county(COUNTIES, b"q\n" as &[u8], Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "Canceled.");

        let err = pick_county(COUNTIES, b"" as &[u8], Vec::new()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
