//! List helpers
//!
//! Split values on spaces or commas, leaving quoted strings and function
//! arguments intact.

/// Split `text` on any of `separators` outside quotes and parentheses.
/// With `last`, a trailing empty item is kept.
pub fn split(text: &str, separators: &[char], last: bool) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut func = 0usize;
    let mut quote: Option<char> = None;
    let mut escape = false;

    for letter in text.chars() {
        let mut split = false;
        if let Some(open) = quote {
            if escape {
                escape = false;
            } else if letter == '\\' {
                escape = true;
            } else if letter == open {
                quote = None;
            }
        } else if letter == '"' || letter == '\'' {
            quote = Some(letter);
        } else if letter == '(' {
            func += 1;
        } else if letter == ')' {
            func = func.saturating_sub(1);
        } else if func == 0 && separators.contains(&letter) {
            split = true;
        }

        if split {
            if !current.is_empty() {
                items.push(current.trim().to_owned());
            }
            current.clear();
        } else {
            current.push(letter);
        }
    }

    if last || !current.is_empty() {
        items.push(current.trim().to_owned());
    }
    items
}

/// Space separated values, e.g. the parts of `margin: 0 auto`
pub fn space(text: &str) -> Vec<String> {
    split(text, &[' ', '\n', '\t'], false)
}

/// Comma separated values, e.g. selectors or transition lists
pub fn comma(text: &str) -> Vec<String> {
    split(text, &[','], true)
}
