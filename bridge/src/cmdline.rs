//! Shell-like command line splitting and the argv QEMU is launched with.

use std::path::Path;

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    NoToken,
    Normal,
    SingleQuote,
    DoubleQuote,
}

/// Split `text` into arguments the way a POSIX-ish shell would, minus expansion.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut cur = String::new();
    let mut state = State::NoToken;
    let mut escaped = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if escaped {
            escaped = false;
            cur.push(c);
            continue;
        }
        match state {
            State::SingleQuote => {
                if c == '\'' { state = State::Normal } else { cur.push(c) }
            }
            State::DoubleQuote => match c {
                '"' => state = State::Normal,
                // only \" and \\ are escapes inside double quotes
                '\\' => match chars.next() {
                    Some(next @ ('"' | '\\')) => cur.push(next),
                    Some(next) => {
                        cur.push('\\');
                        cur.push(next);
                    }
                    None => cur.push('\\'),
                },
                _ => cur.push(c),
            },
            State::NoToken | State::Normal => match c {
                '\\' => {
                    escaped = true;
                    state = State::Normal;
                }
                '\'' => state = State::SingleQuote,
                '"' => state = State::DoubleQuote,
                c if c.is_whitespace() => {
                    if state == State::Normal {
                        args.push(std::mem::take(&mut cur));
                        state = State::NoToken;
                    }
                }
                c => {
                    cur.push(c);
                    state = State::Normal;
                }
            },
        }
    }

    if escaped {
        cur.push('\\');
        args.push(cur);
    } else if state != State::NoToken {
        args.push(cur);
    }
    args
}

/// Replace `${name}` references left to right. Unknown names expand to nothing,
/// and substituted text is not scanned again.
pub fn expand_vars(text: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut s = text.to_string();
    let mut from = 0;
    while let Some(start) = s[from..].find("${").map(|i| i + from) {
        let Some(end) = s[start..].find('}').map(|i| i + start) else { break };
        let value = lookup(&s[start + 2..end]).unwrap_or_default();
        s.replace_range(start..=end, &value);
        from = start + value.len();
    }
    s
}

/// Quote each argument for [`tokenize`]. Arguments round-trip when their only
/// special characters are `"` and `\`; control characters come back as escape text.
pub fn stringify(args: &[String]) -> Vec<String> {
    args.iter().map(|a| quote(a)).collect()
}

fn quote(arg: &str) -> String {
    let mut out = String::with_capacity(arg.len() + 2);
    out.push('"');
    for c in arg.chars() {
        match c {
            '\\' | '"' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{8}' => out.push_str("\\b"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Fixed QEMU options (firmware search dir, headless VNC, QMP on stdio) followed by the user's own.
pub fn qemu_argv(resource_dir: &Path, user_args: &[String]) -> Vec<String> {
    let mut argv = vec![
        "-L".to_string(),
        resource_dir.display().to_string(),
        "-display".into(),
        "none".into(),
        "-vnc".into(),
        ":5900".into(),
        "-qmp".into(),
        "stdio".into(),
    ];
    argv.extend(user_args.iter().cloned());
    argv
}
