//! Container image references (`name:tag`).
//!
//! Validation follows the Docker reference grammar closely enough to reject
//! anything the engine would refuse, before a build is started:
//!
//! - name: `/`-separated components of lowercase alphanumerics, where `.`,
//!   `_`, `__` and runs of `-` may only appear between alphanumerics;
//!   at most 255 characters
//! - tag: 1-128 characters of `[A-Za-z0-9_.-]`, not starting with `.` or `-`

use std::fmt;

use serde::Serialize;

const MAX_NAME_LEN: usize = 255;
const MAX_TAG_LEN: usize = 128;

/// A validated image reference.
///
/// # Examples
///
/// ```
/// use tarship_core::ImageRef;
///
/// let image = ImageRef::new("myapp", "latest").unwrap();
/// assert_eq!(image.to_string(), "myapp:latest");
///
/// assert!(ImageRef::new("MyApp", "latest").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRef {
    name: String,
    tag: String,
}

impl ImageRef {
    pub fn new(name: &str, tag: &str) -> crate::Result<Self> {
        validate_name(name)?;
        validate_tag(tag)?;
        Ok(Self {
            name: name.to_owned(),
            tag: tag.to_owned(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// File-name-safe form of the repository name, used for the default archive name.
    pub fn file_stem(&self) -> String {
        self.name.replace('/', "_")
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.tag)
    }
}

fn validate_name(name: &str) -> crate::Result<()> {
    let invalid = |reason| crate::Error::InvalidImageName {
        name: name.to_owned(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(invalid("longer than 255 characters"));
    }
    for component in name.split('/') {
        validate_component(component).map_err(invalid)?;
    }
    Ok(())
}

fn validate_component(component: &str) -> Result<(), &'static str> {
    let bytes = component.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return Err("empty path component");
    };
    if bytes.iter().any(u8::is_ascii_uppercase) {
        return Err("uppercase letters are not allowed");
    }
    if !is_lower_alnum(*first) || !is_lower_alnum(*last) {
        return Err("path components must start and end with a lowercase letter or digit");
    }

    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if is_lower_alnum(b) {
            i += 1;
            continue;
        }
        match b {
            b'.' => i += 1,
            b'_' if bytes.get(i + 1) == Some(&b'_') => i += 2,
            b'_' => i += 1,
            b'-' => {
                while bytes.get(i) == Some(&b'-') {
                    i += 1;
                }
            }
            _ => return Err("only lowercase letters, digits, '.', '_', '-' and '/' are allowed"),
        }
        // a separator must be followed by an alphanumeric
        if !bytes.get(i).copied().is_some_and(is_lower_alnum) {
            return Err("separators must be surrounded by letters or digits");
        }
    }
    Ok(())
}

fn validate_tag(tag: &str) -> crate::Result<()> {
    let invalid = |reason| crate::Error::InvalidImageTag {
        tag: tag.to_owned(),
        reason,
    };

    if tag.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if tag.len() > MAX_TAG_LEN {
        return Err(invalid("longer than 128 characters"));
    }
    if tag.starts_with(['.', '-']) {
        return Err(invalid("must not start with '.' or '-'"));
    }
    if !tag
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-'))
    {
        return Err(invalid("only letters, digits, '_', '.' and '-' are allowed"));
    }
    Ok(())
}

fn is_lower_alnum(b: u8) -> bool {
    b.is_ascii_lowercase() || b.is_ascii_digit()
}
