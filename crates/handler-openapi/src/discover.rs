//! Eligibility scan over a handler catalog.
//!
//! Walks every group and yields the handlers that can produce operations:
//! entry points with a request-carrying parameter, minus anything marked
//! ignored at the group or handler level.

use handler_openapi_core::{GroupDescriptor, HandlerDescriptor};

/// One eligible handler together with its owning group.
#[derive(Debug, Clone, Copy)]
pub struct Eligible<'a> {
    /// Group the handler belongs to.
    pub group: &'a GroupDescriptor,
    /// The handler itself.
    pub handler: &'a HandlerDescriptor,
}

/// Scan a catalog for eligible handlers, in declaration order.
///
/// A handler qualifies when it is an entry point, is not ignored, its group
/// is not ignored, and at least one parameter carries the request trigger.
/// `allow` restricts the result to handlers whose ident matches one of the
/// given names case-insensitively; `None` admits everything.
#[must_use]
pub fn scan<'a>(catalog: &'a [GroupDescriptor], allow: Option<&[String]>) -> Vec<Eligible<'a>> {
    let mut eligible = Vec::new();
    for group in catalog {
        if group.is_ignored() {
            continue;
        }
        for handler in &group.handlers {
            if !handler.is_entry_point() || handler.is_ignored() || !handler.has_request_param() {
                continue;
            }
            if let Some(names) = allow {
                let wanted = names
                    .iter()
                    .any(|name| name.eq_ignore_ascii_case(&handler.ident));
                if !wanted {
                    continue;
                }
            }
            eligible.push(Eligible { group, handler });
        }
    }
    eligible
}
