//! Pattern match keys and capture substitution
//!
//! A keymap key of the form `/source/flags` matches input keys by regular
//! expression. The paired destination is then used as a replacement template
//! for the matched key, so `"/[a-z]+?(c[0-9]a)/": "$1"` maps `abc1a` to `c1a`.
//!
//! Copyright (c) 2025 Remap Team
//! Licensed under the Apache-2.0 license

use crate::{Error, Result};
use regex::{Captures, Regex, RegexBuilder, Replacer};
use std::fmt;

/// A compiled `/source/flags` match key
#[derive(Debug, Clone)]
pub struct KeyPattern {
    regex: Regex,
    /// Replace every occurrence during substitution (`g` flag)
    global: bool,
    literal: String,
}

impl KeyPattern {
    /// Whether a keymap key uses pattern syntax
    pub fn is_pattern(key: &str) -> bool {
        key.starts_with('/')
    }

    /// Compile a `/source/flags` keymap key
    ///
    /// `path` is the keymap location used in error messages.
    pub fn parse(key: &str, path: &str) -> Result<Self> {
        let close = match key.rfind('/') {
            Some(index) if index > 0 => index,
            _ => {
                return Err(Error::configuration(
                    format!("unterminated pattern key `{}`", key),
                    path,
                ))
            }
        };

        let source = &key[1..close];
        let flags = &key[close + 1..];

        let mut builder = RegexBuilder::new(source);
        let mut global = false;
        for flag in flags.chars() {
            match flag {
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                'x' => {
                    builder.ignore_whitespace(true);
                }
                'u' => {
                    builder.unicode(true);
                }
                'g' => global = true,
                other => {
                    return Err(Error::configuration(
                        format!("unsupported flag `{}` in pattern key `{}`", other, key),
                        path,
                    ))
                }
            }
        }

        let regex = builder.build().map_err(|e| {
            Error::configuration(format!("invalid pattern key `{}`: {}", key, e), path)
        })?;

        Ok(Self {
            regex,
            global,
            literal: key.to_string(),
        })
    }

    /// Whether the pattern matches anywhere in the candidate key
    pub fn is_match(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }

    /// Replace the match(es) in `matched_key` using `template`
    ///
    /// Text outside the match is kept. The template understands `$$`, `$&`,
    /// `` $` ``, `$'`, `$n`, `$nn` and `$<name>`.
    pub fn substitute(&self, matched_key: &str, template: &str) -> String {
        let replacer = TemplateReplacer {
            template,
            haystack: matched_key,
        };
        if self.global {
            self.regex.replace_all(matched_key, replacer).into_owned()
        } else {
            self.regex.replace(matched_key, replacer).into_owned()
        }
    }

    /// The key as written in the keymap
    pub fn as_str(&self) -> &str {
        &self.literal
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.literal)
    }
}

/// Expands a `$`-style replacement template for one match
struct TemplateReplacer<'t, 'h> {
    template: &'t str,
    haystack: &'h str,
}

impl TemplateReplacer<'_, '_> {
    /// Resolve `$n` / `$nn`, returning the group and the digits consumed
    fn group_reference(digits: &[u8], group_count: usize) -> Option<(usize, usize)> {
        let first = (*digits.first()? as char).to_digit(10)? as usize;
        if let Some(second) = digits.get(1).and_then(|b| (*b as char).to_digit(10)) {
            let two = first * 10 + second as usize;
            if two >= 1 && two <= group_count {
                return Some((two, 2));
            }
        }
        if first >= 1 && first <= group_count {
            return Some((first, 1));
        }
        None
    }
}

impl Replacer for TemplateReplacer<'_, '_> {
    fn replace_append(&mut self, caps: &Captures<'_>, dst: &mut String) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => return,
        };
        let group_count = caps.len().saturating_sub(1);
        let bytes = self.template.as_bytes();
        let mut i = 0;
        let mut literal_start = 0;

        while i < bytes.len() {
            if bytes[i] != b'$' || i + 1 >= bytes.len() {
                i += 1;
                continue;
            }

            let (expansion, consumed): (Option<&str>, usize) = match bytes[i + 1] {
                b'$' => (Some("$"), 2),
                b'&' => (Some(whole.as_str()), 2),
                b'`' => (Some(&self.haystack[..whole.start()]), 2),
                b'\'' => (Some(&self.haystack[whole.end()..]), 2),
                b'<' => match self.template[i + 2..].find('>') {
                    Some(close) => {
                        let name = &self.template[i + 2..i + 2 + close];
                        (Some(caps.name(name).map_or("", |m| m.as_str())), close + 3)
                    }
                    None => (None, 0),
                },
                b'0'..=b'9' => match Self::group_reference(&bytes[i + 1..], group_count) {
                    Some((group, digits)) => {
                        (Some(caps.get(group).map_or("", |m| m.as_str())), digits + 1)
                    }
                    None => (None, 0),
                },
                _ => (None, 0),
            };

            match expansion {
                Some(text) => {
                    dst.push_str(&self.template[literal_start..i]);
                    dst.push_str(text);
                    i += consumed;
                    literal_start = i;
                }
                None => i += 1,
            }
        }

        dst.push_str(&self.template[literal_start..]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(key: &str) -> KeyPattern {
        KeyPattern::parse(key, "$").unwrap()
    }

    #[test]
    fn test_parse_and_match() {
        let p = pattern("/a+bc/");
        assert!(p.is_match("aaabc"));
        assert!(!p.is_match("aaadc"));
        assert_eq!(p.as_str(), "/a+bc/");
    }

    #[test]
    fn test_case_insensitive_flag() {
        let p = pattern("/^abc$/i");
        assert!(p.is_match("ABC"));
        assert!(!pattern("/^abc$/").is_match("ABC"));
    }

    #[test]
    fn test_rejects_bad_patterns() {
        let err = KeyPattern::parse("/abc", "$.x").unwrap_err();
        assert_eq!(err.kind(), "configuration");
        assert!(err.to_string().contains("$.x"));

        assert_eq!(KeyPattern::parse("/abc/q", "$").unwrap_err().kind(), "configuration");
        assert_eq!(KeyPattern::parse("/(abc/", "$").unwrap_err().kind(), "configuration");
    }

    #[test]
    fn test_capture_substitution() {
        let p = pattern("/[a-z]+?(c[0-9]a)/");
        assert_eq!(p.substitute("abc1a", "$1"), "c1a");
        assert_eq!(p.substitute("abc1a", "$1b"), "c1ab");

        let p = pattern("/aa(b2)c3/");
        assert_eq!(p.substitute("aab2c3", "a$1"), "ab2");
    }

    #[test]
    fn test_unmatched_text_is_kept() {
        let p = pattern("/b/");
        assert_eq!(p.substitute("abc", "X"), "aXc");
    }

    #[test]
    fn test_global_flag() {
        assert_eq!(pattern("/o/").substitute("foo", "0"), "f0o");
        assert_eq!(pattern("/o/g").substitute("foo", "0"), "f00");
    }

    #[test]
    fn test_special_references() {
        let p = pattern("/b+/");
        assert_eq!(p.substitute("abbc", "[$&]"), "a[bb]c");
        assert_eq!(p.substitute("abbc", "$`"), "aac");
        assert_eq!(p.substitute("abbc", "$'"), "acc");
        assert_eq!(p.substitute("abbc", "$$"), "a$c");
    }

    #[test]
    fn test_named_and_multi_digit_groups() {
        let p = pattern("/(?<word>[a-z]+)(\\d)/");
        assert_eq!(p.substitute("key7", "$<word>_$2"), "key_7");

        // Only two groups exist, so `$12` is group 1 followed by a literal `2`
        let p = pattern("/(a)(b)/");
        assert_eq!(p.substitute("ab", "$12"), "a2");
        // `$0` and references past the group count stay literal
        assert_eq!(p.substitute("ab", "$0$3"), "$0$3");
    }

    #[test]
    fn test_dangling_dollar() {
        let p = pattern("/a/");
        assert_eq!(p.substitute("a", "x$"), "x$");
        assert_eq!(p.substitute("a", "$<open"), "$<open");
    }
}
