/// Normalizes a Chilean RUT to its stored form: digits and verifier only,
/// no dots or dashes, verifier uppercased. "12.345.678-k" -> "12345678K".
pub fn normalize_rut(rut: &str) -> String {
    rut.trim()
        .chars()
        .filter(|c| *c != '.' && *c != '-')
        .collect::<String>()
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_dots_and_dashes() {
        assert_eq!(normalize_rut("12.345.678-9"), "123456789");
    }

    #[test]
    fn uppercases_verifier() {
        assert_eq!(normalize_rut("7.654.321-k"), "7654321K");
    }

    #[test]
    fn already_normalized_is_untouched() {
        assert_eq!(normalize_rut("123456789"), "123456789");
    }

    #[test]
    fn trims_whitespace() {
        assert_eq!(normalize_rut(" 12.345.678-9 "), "123456789");
    }
}
