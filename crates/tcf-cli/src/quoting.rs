//! Quoting for command lines embedded in generated makefile recipes.
//!
//! A recipe line goes through two interpreters: make expands `$` references,
//! then `/bin/sh` splits words. Each argument is single-quoted for the shell,
//! embedded single quotes are closed, escaped and reopened (`'\''`), and `$`
//! is doubled so make hands a literal `$` to the shell.

/// Quotes `args` into one string suitable for a make recipe line.
#[must_use]
pub fn quote_for_recipe<I, S>(args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut quoted = String::new();
    for (index, arg) in args.into_iter().enumerate() {
        if index > 0 {
            quoted.push(' ');
        }
        push_quoted(&mut quoted, arg.as_ref());
    }
    quoted
}

fn push_quoted(buffer: &mut String, arg: &str) {
    buffer.push('\'');
    for character in arg.chars() {
        match character {
            '\'' => buffer.push_str("'\\''"),
            '$' => buffer.push_str("$$"),
            other => buffer.push(other),
        }
    }
    buffer.push('\'');
}
