pub mod extractor;
pub mod jwt;
pub mod rate_limit;
pub mod test_utils;
