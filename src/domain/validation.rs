//! Field predicates for account and transaction input.
//!
//! Pure pattern checks with no store or network access.

use regex::Regex;
use std::sync::LazyLock;

static ID_CARD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{16}$").expect("Invalid id card regex pattern"));

/// Whitespace is the ASCII set only: tab, newline, form feed, carriage return, space.
static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z\t\n\x0C\r ]{3,100}$").expect("Invalid name regex pattern")
});

/// Mailbox grammar: permissive local part, then dot-separated host labels of
/// 1-63 alphanumerics with interior hyphens only.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!\#$%\&'*+/=?^_`{|}\~\-]+@[a-zA-Z0-9](?:[a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("Invalid email regex pattern")
});

/// Exactly 16 decimal digits.
#[must_use]
pub fn is_valid_id_card(value: &str) -> bool {
    ID_CARD_PATTERN.is_match(value)
}

/// 3 to 100 characters, letters and whitespace only.
#[must_use]
pub fn is_valid_name(value: &str) -> bool {
    NAME_PATTERN.is_match(value)
}

#[must_use]
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}
