//! HTTP handlers. `object_handlers` serves the two read endpoints,
//! `shell_handlers` everything the API routes do not claim, and `auth`
//! pulls the caller's credential out of a request.

pub mod auth;
pub mod object_handlers;
pub mod shell_handlers;

/// First value of query parameter `name`, if any.
pub(crate) fn query_param<'a>(query: &'a [(String, String)], name: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}
