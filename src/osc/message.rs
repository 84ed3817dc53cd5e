//! OSC messages and single-level address pattern matching

use super::{OscError, TypedValue};

/// Characters OSC reserves for address patterns; never legal in a sent address
pub const RESERVED_ADDRESS_CHARS: &[char] = &[' ', '#', '*', ',', '?', '[', ']', '{', '}'];

/// An address paired with an ordered argument list
///
/// Immutable after construction; the `with_*` helpers return new messages.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    address: String,
    args: Vec<TypedValue>,
}

impl Message {
    /// Create a message; fails if the address is empty or does not start with `/`
    pub fn new(address: impl Into<String>, args: Vec<TypedValue>) -> Result<Self, OscError> {
        let address = address.into();
        check_leading_slash(&address)?;
        Ok(Self { address, args })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn args(&self) -> &[TypedValue] {
        &self.args
    }

    /// Consume the message, returning its address and arguments
    pub fn into_parts(self) -> (String, Vec<TypedValue>) {
        (self.address, self.args)
    }

    /// New message with the same arguments and a different address
    pub fn with_address(&self, address: impl Into<String>) -> Result<Self, OscError> {
        Self::new(address, self.args.clone())
    }

    /// New message with one more argument appended
    pub fn with_arg(&self, value: impl Into<TypedValue>) -> Self {
        let mut args = self.args.clone();
        args.push(value.into());
        Self {
            address: self.address.clone(),
            args,
        }
    }

    /// Whether the address contains OSC pattern characters
    pub fn is_pattern(&self) -> bool {
        self.address.contains(RESERVED_ADDRESS_CHARS)
    }

    /// Check that this message may be sent (no reserved characters in the address)
    pub fn validate_outbound(&self) -> Result<(), OscError> {
        match self.address.chars().find(|c| RESERVED_ADDRESS_CHARS.contains(c)) {
            Some(c) => Err(OscError::invalid_address(
                &self.address,
                format!("reserved character '{}' not allowed in a sent address", c),
            )),
            None => Ok(()),
        }
    }

    /// Match against a handler pattern
    ///
    /// Both strings are split on `/`. The match holds iff the segment counts
    /// are equal and every pattern segment is `*` or equal to the address
    /// segment. `*` never spans more than one segment.
    pub fn matches(&self, pattern: &str) -> bool {
        let mut address = self.address.split('/');
        let mut pattern = pattern.split('/');
        loop {
            match (address.next(), pattern.next()) {
                (None, None) => return true,
                (Some(seg), Some(pat)) if pat == "*" || pat == seg => continue,
                _ => return false,
            }
        }
    }

    /// Stable one-line form: address followed by described arguments
    pub fn describe(&self) -> String {
        let mut out = self.address.clone();
        for arg in &self.args {
            out.push(' ');
            out.push_str(&arg.describe());
        }
        out
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Check that a handler pattern is well formed (leading `/`, non-empty)
pub fn validate_pattern(pattern: &str) -> Result<(), OscError> {
    check_leading_slash(pattern)
}

fn check_leading_slash(address: &str) -> Result<(), OscError> {
    if address.is_empty() {
        return Err(OscError::invalid_address(address, "address is empty"));
    }
    if !address.starts_with('/') {
        return Err(OscError::invalid_address(address, "address must start with '/'"));
    }
    Ok(())
}
