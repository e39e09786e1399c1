pub mod error;
pub mod models;
pub mod prelude;

/// Version of the catalog models, logged by front-ends on start
pub static LIB_VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lib_version_is_numeric() {
        let parts: Vec<&str> = LIB_VERSION.split('.').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.parse::<u64>().is_ok()));
    }
}
