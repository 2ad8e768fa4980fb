use crate::errors::CliError;
use miette::Result;
use regex::Regex;

pub mod config;
pub mod prompt;

#[macro_export]
macro_rules! println_pad {
    ($($arg:tt)*) => {{
        let __s = format!($($arg)*);
        for __line in __s.lines() {
            println!("    {}", __line);
        }
    }};
}

pub fn is_valid_slug(name: impl AsRef<str>) -> bool {
    Regex::new(r"^[[:word:]-]+$")
        .unwrap()
        .is_match(name.as_ref())
}

pub fn validate_scope_name(name: impl AsRef<str>) -> Result<()> {
    let name_str = name.as_ref();
    if !is_valid_slug(name_str) {
        return Err(CliError::InvalidScopeName {
            name: name_str.to_string(),
        }
        .into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_slug_valid() {
        assert!(is_valid_slug("global"));
        assert!(is_valid_slug("chapter-2"));
        assert!(is_valid_slug("chapter_2"));
        assert!(!is_valid_slug("chapter 2"));
        assert!(!is_valid_slug("chapter!2"));
        assert!(!is_valid_slug(""));
    }
}
