//! Vendor prefixes

/// Vendor prefix of a name, e.g. `-moz-` for `-moz-color`
pub fn prefix(prop: &str) -> &str {
    match vendor_split(prop) {
        Some(sep) => &prop[..=sep],
        None => "",
    }
}

/// Name without its vendor prefix
pub fn unprefixed(prop: &str) -> &str {
    match vendor_split(prop) {
        Some(sep) => &prop[sep + 1..],
        None => prop,
    }
}

fn vendor_split(prop: &str) -> Option<usize> {
    if prop.len() < 2 || !prop.starts_with('-') {
        return None;
    }
    prop[1..].find('-').map(|i| i + 1)
}
