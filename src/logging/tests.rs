#[cfg(test)]
mod tests {
    use crate::logging::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false), "info");
        assert_eq!(default_directive(true), "debug");
    }

    #[test]
    fn test_init_is_idempotent() {
        init(false);
        init(true);
        tracing::info!("logging initialised");
    }
}
