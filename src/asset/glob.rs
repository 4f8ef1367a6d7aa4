//! Glob patterns compiled to anchored regexes.
//!
//! | Syntax    | Matches                                   |
//! |-----------|-------------------------------------------|
//! | `*`       | any run of characters except `/`          |
//! | `**/`     | zero or more whole directories            |
//! | `**`      | anything, including `/`                   |
//! | `?`       | one character except `/`                  |
//! | `[abc]`   | one of the listed characters (`[!a]` negates) |
//! | `{a,b}`   | either alternative                        |
//!
//! Paths are matched in `/`-separated, root-relative form.

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GlobError {
    #[error("unclosed character class")]
    UnclosedClass,

    #[error("unclosed alternation")]
    UnclosedBrace,

    #[error("nested alternation is not supported")]
    NestedBrace,

    #[error(transparent)]
    Regex(#[from] regex::Error),
}

/// A compiled glob.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    pattern: String,
    regex: Regex,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Result<Self, GlobError> {
        let regex = Regex::new(&translate(pattern.trim_start_matches('/'))?)?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Match a `/`-separated relative path.
    pub fn is_match(&self, relative: &str) -> bool {
        self.regex.is_match(relative)
    }

    /// Leading directories without wildcards; walking can start there.
    ///
    /// `app/js/**/*.js` → `app/js`, `*.css` → ``
    pub fn literal_prefix(&self) -> &str {
        let pattern = self.pattern.trim_start_matches('/');
        let wildcard = pattern
            .find(['*', '?', '[', '{'])
            .unwrap_or(pattern.len());
        match pattern[..wildcard].rfind('/') {
            Some(slash) => &pattern[..slash],
            None => "",
        }
    }
}

fn translate(pattern: &str) -> Result<String, GlobError> {
    let mut out = String::from("^");
    let chars: Vec<char> = pattern.chars().collect();
    let mut in_brace = false;
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                if chars.get(i + 2) == Some(&'/') {
                    out.push_str("(?:.*/)?");
                    i += 3;
                } else {
                    out.push_str(".*");
                    i += 2;
                }
                continue;
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '[' => {
                let close = chars[i + 1..]
                    .iter()
                    .skip(1)
                    .position(|&c| c == ']')
                    .map(|p| i + 2 + p)
                    .ok_or(GlobError::UnclosedClass)?;
                let mut class = String::from("[");
                let mut body = &chars[i + 1..close];
                if let Some(('!' | '^', rest)) = body.split_first() {
                    class.push('^');
                    body = rest;
                }
                for &c in body {
                    if matches!(c, '\\' | '[' | ']' | '&' | '~') {
                        class.push('\\');
                    }
                    class.push(c);
                }
                class.push(']');
                out.push_str(&class);
                i = close;
            }
            '{' if in_brace => return Err(GlobError::NestedBrace),
            '{' => {
                in_brace = true;
                out.push_str("(?:");
            }
            ',' if in_brace => out.push('|'),
            '}' if in_brace => {
                in_brace = false;
                out.push(')');
            }
            c => {
                let mut buf = [0u8; 4];
                out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
            }
        }
        i += 1;
    }

    if in_brace {
        return Err(GlobError::UnclosedBrace);
    }
    out.push('$');
    Ok(out)
}
