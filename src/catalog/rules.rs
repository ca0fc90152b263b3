//! Storefront business rules that do not touch storage

use rand::seq::IndexedRandom;
use rand::Rng;
use store_object::StoreError;

/// Characters order codes are drawn from
pub const ORDER_CODE_ALPHABET: &str = "0123456789QWERTYUIOPASDFGHJKLZXCVBNM";
pub const ORDER_CODE_LEN: usize = 6;
pub const PASSWORD_MIN_LEN: usize = 8;

/// Lowercase slug: alphanumeric runs joined by single hyphens
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(c.to_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_hyphen = true;
        }
    }
    slug
}

/// Six distinct characters from [`ORDER_CODE_ALPHABET`]
pub fn generate_order_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    ORDER_CODE_ALPHABET
        .as_bytes()
        .choose_multiple(rng, ORDER_CODE_LEN)
        .map(|&b| char::from(b))
        .collect()
}

pub fn is_order_code(code: &str) -> bool {
    let mut seen = Vec::with_capacity(ORDER_CODE_LEN);
    code.len() == ORDER_CODE_LEN
        && code.chars().all(|c| {
            let fresh = ORDER_CODE_ALPHABET.contains(c) && !seen.contains(&c);
            seen.push(c);
            fresh
        })
}

pub fn validate_prices(price_cents: i64, promo_price_cents: Option<i64>) -> Result<(), StoreError> {
    if price_cents < 0 {
        return Err(StoreError::validation("products", "price_cents", "price cannot be negative"));
    }
    match promo_price_cents {
        Some(promo) if promo < 0 => Err(StoreError::validation(
            "products",
            "promo_price_cents",
            "promotional price cannot be negative",
        )),
        Some(promo) if promo > price_cents => Err(StoreError::validation(
            "products",
            "promo_price_cents",
            "promotional price cannot exceed the list price",
        )),
        _ => Ok(()),
    }
}

pub fn validate_title(table: &str, title: &str) -> Result<(), StoreError> {
    if slugify(title).is_empty() {
        return Err(StoreError::validation(table, "title", "title needs at least one letter or digit"));
    }
    Ok(())
}

/// Emails are compared and stored trimmed and lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> Result<(), StoreError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        }
        _ => Err(StoreError::validation("users", "email", "not a valid email address")),
    }
}

pub fn validate_password(password: &str) -> Result<(), StoreError> {
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(StoreError::validation(
            "users",
            "password",
            format!("password needs at least {} characters", PASSWORD_MIN_LEN),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Running Shoes"), "running-shoes");
        assert_eq!(slugify("  Boots & Sandals -- 2024 "), "boots-sandals-2024");
        assert_eq!(slugify("Tênis"), "tênis");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_order_codes_have_distinct_characters() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let code = generate_order_code(&mut rng);
            assert!(is_order_code(&code), "bad code {}", code);
        }
        assert!(!is_order_code("AAB123"));
        assert!(!is_order_code("ab1234"));
        assert!(!is_order_code("ABC12"));
    }

    #[test]
    fn test_price_rules() {
        assert!(validate_prices(1000, None).is_ok());
        assert!(validate_prices(1000, Some(1000)).is_ok());
        assert!(validate_prices(1000, Some(800)).is_ok());

        let error = validate_prices(1000, Some(1200)).unwrap_err();
        assert!(matches!(
            error,
            StoreError::Validation { ref field, .. } if field == "promo_price_cents"
        ));
        assert!(validate_prices(-1, None).is_err());
    }

    #[test]
    fn test_account_rules() {
        assert_eq!(normalize_email("  Ana@Example.COM "), "ana@example.com");
        assert!(validate_email("ana@example.com").is_ok());
        assert!(validate_email("ana.example.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ana@a@b").is_err());

        assert!(validate_password("s3cret-pass").is_ok());
        assert!(validate_password("short").is_err());
    }
}
