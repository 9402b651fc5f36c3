//! # Invoice Numbers
//!
//! `INV-` followed by a sequence zero-padded to 5 digits. The sequence is the
//! owner's invoice count + 1 at creation time, so deleting invoices makes
//! numbers repeat. Numbers are for people to read; the UUID `id` is the key.

/// Prefix of every invoice number.
pub const INVOICE_PREFIX: &str = "INV-";

/// Formats the number for an owner who currently has `existing` invoices.
///
/// ## Example
/// ```rust
/// use stockly_core::numbering::next_invoice_number;
///
/// assert_eq!(next_invoice_number(0), "INV-00001");
/// assert_eq!(next_invoice_number(41), "INV-00042");
/// ```
pub fn next_invoice_number(existing: i64) -> String {
    format_invoice_number(existing.max(0) + 1)
}

/// Formats a sequence number. Sequences past 99999 just get wider.
pub fn format_invoice_number(sequence: i64) -> String {
    format!("{INVOICE_PREFIX}{sequence:05}")
}
