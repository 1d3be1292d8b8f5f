/// IBM i object, library, and device names: 1-10 chars from the system
/// name charset, uppercased before they reach a command string. Caught
/// here so a bad name never makes it into a remote call.
pub fn object_name(label: &str, raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        anyhow::bail!("{label} cannot be empty");
    }
    if trimmed.len() > 10 {
        anyhow::bail!("{label} exceeds 10 characters: {trimmed}");
    }
    if !trimmed
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'#' | b'_' | b'$' | b'@'))
    {
        anyhow::bail!("{label} contains invalid characters: {trimmed}");
    }
    Ok(trimmed.to_uppercase())
}

/// Special values like `*SAVF` or `*ALL` pass through as-is; anything
/// else is validated as an object name.
pub fn object_name_or_special(label: &str, raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix('*') {
        if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_alphanumeric()) {
            anyhow::bail!("{label} is not a valid special value: {trimmed}");
        }
        return Ok(trimmed.to_uppercase());
    }
    object_name(label, trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_name_uppercases() {
        assert_eq!(object_name("library", "archlib").unwrap(), "ARCHLIB");
    }

    #[test]
    fn object_name_rejects_long_values() {
        assert!(object_name("device", "VRTOPTDEV01").is_err());
    }

    #[test]
    fn object_name_rejects_embedded_quotes() {
        assert!(object_name("library", "QG'PL").is_err());
    }

    #[test]
    fn object_name_rejects_empty() {
        assert!(object_name("savefile", "  ").is_err());
    }

    #[test]
    fn special_values_pass_through() {
        assert_eq!(
            object_name_or_special("device", "*SAVF").unwrap(),
            "*SAVF"
        );
        assert!(object_name_or_special("device", "*").is_err());
    }
}
