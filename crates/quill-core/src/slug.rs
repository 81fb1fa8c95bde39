//! URL slug derivation.

/// Derive a URL-safe slug: trim, lowercase, transliterate the Turkish
/// characters the original content uses, collapse whitespace and hyphen
/// runs into single hyphens, and drop anything outside `[a-z0-9_-]`.
///
/// Collision handling is the caller's concern: the post path appends a
/// millisecond timestamp suffix, the category path rejects the operation.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());

    for ch in text.trim().chars() {
        let ch = match ch {
            'ü' | 'Ü' => 'u',
            'ö' | 'Ö' => 'o',
            'ş' | 'Ş' => 's',
            'ç' | 'Ç' => 'c',
            'ğ' | 'Ğ' => 'g',
            'ı' | 'İ' => 'i',
            c => c,
        };
        for ch in ch.to_lowercase() {
            if ch.is_whitespace() || ch == '-' {
                if !slug.is_empty() && !slug.ends_with('-') {
                    slug.push('-');
                }
            } else if ch.is_ascii_alphanumeric() || ch == '_' {
                slug.push(ch);
            }
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
