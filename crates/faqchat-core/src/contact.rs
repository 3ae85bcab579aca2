/// Support contact details shown on request.
pub const CONTACT_TEXT: &str = "For additional support, please:\n\n\
    • Visit Jupiter Help Centre\n\
    • Email: support@jupiter.money\n\
    • Call: 1800-XXX-XXXX\n\
    • Chat: Available in the Jupiter app";

/// Static support contact text. Pure display, no side effects.
pub fn show_contact() -> &'static str {
    CONTACT_TEXT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_lists_every_channel() {
        let text = show_contact();
        assert!(text.starts_with("For additional support, please:\n\n"));
        assert_eq!(text.lines().filter(|l| l.starts_with('•')).count(), 4);
        assert!(text.contains("support@jupiter.money"));
    }
}
