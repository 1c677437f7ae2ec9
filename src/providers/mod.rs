pub mod anthropic;
pub(crate) mod http_errors;
#[cfg(test)]
pub(crate) mod stub_server;
