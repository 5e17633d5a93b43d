//! Route template resolution.
//!
//! Turns one handler's trigger into the list of concrete `(path, method)`
//! candidates: the declared route (or the handler's registered name when no
//! route is given) is expanded over its optional segments, normalized, and
//! prefixed.

use handler_openapi_core::{HandlerDescriptor, HttpMethod};

/// Concrete path templates for a handler, in expansion order, deduplicated.
///
/// The trigger route wins when present and non-blank; otherwise the
/// handler's registered name is the route. `prefix` is prepended unless the
/// route already starts with it.
#[must_use]
pub fn resolve_routes(handler: &HandlerDescriptor, prefix: &str) -> Vec<String> {
    let template = handler
        .trigger()
        .and_then(|trigger| trigger.route.as_deref())
        .map(str::trim)
        .filter(|route| !route.is_empty())
        .map_or_else(|| handler.registered_name().to_string(), str::to_string);

    let mut routes = Vec::new();
    for expanded in expand_optional_segments(&template, handler) {
        let normalized = normalize_route(&expanded, prefix);
        if !routes.contains(&normalized) {
            routes.push(normalized);
        }
    }
    routes
}

/// HTTP methods for a handler, in declaration order, deduplicated.
///
/// A trigger with no methods defaults to `GET`.
#[must_use]
pub fn resolve_methods(handler: &HandlerDescriptor) -> Vec<HttpMethod> {
    let mut methods = Vec::new();
    if let Some(trigger) = handler.trigger() {
        for method in &trigger.methods {
            if !methods.contains(method) {
                methods.push(*method);
            }
        }
    }
    if methods.is_empty() {
        methods.push(HttpMethod::Get);
    }
    methods
}

/// Expand every `{name?}` segment into its present/absent variants.
///
/// The present variant (optional marker stripped) is emitted only when the
/// handler declares a parameter matching the segment name; the absent
/// variant is always emitted. With `n` optional segments the result has at
/// most `2^n` entries.
fn expand_optional_segments(template: &str, handler: &HandlerDescriptor) -> Vec<String> {
    let segments: Vec<String> = template
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect();
    expand(&segments, handler)
}

fn expand(segments: &[String], handler: &HandlerDescriptor) -> Vec<String> {
    let Some(index) = segments.iter().position(|segment| segment.ends_with("?}")) else {
        return vec![segments.join("/")];
    };

    let mut variants = Vec::new();
    let segment = &segments[index];
    if declares_route_parameter(handler, segment) {
        let mut present = segments.to_vec();
        present[index] = format!("{}}}", &segment[..segment.len() - 2]);
        variants.extend(expand(&present, handler));
    }
    let mut absent = segments.to_vec();
    absent.remove(index);
    variants.extend(expand(&absent, handler));
    variants
}

/// Name match between an optional segment and a signature parameter.
/// Case-sensitive: `{id?}` or `{id:int?}` match a parameter named `id`.
fn declares_route_parameter(handler: &HandlerDescriptor, segment: &str) -> bool {
    handler.params.iter().any(|param| {
        segment.starts_with(&format!("{{{}:", param.name))
            || segment.starts_with(&format!("{{{}?", param.name))
    })
}

fn normalize_route(route: &str, prefix: &str) -> String {
    let route = route
        .replace('[', "{")
        .replace(']', "}")
        .replace("{*", "{");
    let route = route.trim_matches('/');

    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        return route.to_string();
    }
    if route == prefix || route.starts_with(&format!("{prefix}/")) {
        route.to_string()
    } else if route.is_empty() {
        prefix.to_string()
    } else {
        format!("{prefix}/{route}")
    }
}

#[cfg(test)]
mod tests {
    use handler_openapi_core::{HandlerAnnotation, ParamAnnotation, ParamDescriptor, TypeInfo};
    use pretty_assertions::assert_eq;

    use super::*;

    fn handler_with_route(route: Option<&str>, params: &[&str]) -> HandlerDescriptor {
        let mut handler = HandlerDescriptor::new("Run")
            .annotation(HandlerAnnotation::entry_point("Basics"))
            .param(
                ParamDescriptor::new("req", TypeInfo::Request)
                    .annotation(ParamAnnotation::trigger(vec![HttpMethod::Get], route)),
            );
        for name in params {
            handler = handler.param(ParamDescriptor::new(*name, TypeInfo::String));
        }
        handler
    }

    #[test]
    fn blank_route_falls_back_to_registered_name() {
        let handler = handler_with_route(None, &[]);
        assert_eq!(resolve_routes(&handler, "api"), ["api/Basics"]);

        let blank = handler_with_route(Some("   "), &[]);
        assert_eq!(resolve_routes(&blank, "api"), ["api/Basics"]);
    }

    #[test]
    fn declared_route_wins_over_registered_name() {
        let handler = handler_with_route(Some("pets/all"), &[]);
        assert_eq!(resolve_routes(&handler, "api"), ["api/pets/all"]);
    }

    #[test]
    fn prefix_is_not_doubled() {
        let handler = handler_with_route(Some("api/pets"), &[]);
        assert_eq!(resolve_routes(&handler, "api"), ["api/pets"]);
    }

    #[test]
    fn prefix_alone_for_empty_route() {
        let handler = handler_with_route(Some("/"), &[]);
        assert_eq!(resolve_routes(&handler, "api"), ["api"]);
    }

    #[test]
    fn empty_prefix_leaves_route_untouched() {
        let handler = handler_with_route(Some("pets"), &[]);
        assert_eq!(resolve_routes(&handler, ""), ["pets"]);
    }

    #[test]
    fn optional_segment_with_declared_parameter_expands_both_ways() {
        let handler = handler_with_route(Some("pets/{id?}"), &["id"]);
        assert_eq!(resolve_routes(&handler, "api"), ["api/pets/{id}", "api/pets"]);
    }

    #[test]
    fn optional_segment_without_declared_parameter_only_collapses() {
        let handler = handler_with_route(Some("pets/{id?}"), &[]);
        assert_eq!(resolve_routes(&handler, "api"), ["api/pets"]);
    }

    #[test]
    fn constrained_optional_segment_matches_by_name() {
        let handler = handler_with_route(Some("pets/{id:int?}"), &["id"]);
        assert_eq!(
            resolve_routes(&handler, "api"),
            ["api/pets/{id:int}", "api/pets"]
        );
    }

    #[test]
    fn parameter_match_is_case_sensitive() {
        let handler = handler_with_route(Some("pets/{Id?}"), &["id"]);
        assert_eq!(resolve_routes(&handler, "api"), ["api/pets"]);
    }

    #[test]
    fn two_optional_segments_expand_to_four_variants() {
        let handler = handler_with_route(Some("pets/{kind?}/{id?}"), &["kind", "id"]);
        assert_eq!(
            resolve_routes(&handler, "api"),
            [
                "api/pets/{kind}/{id}",
                "api/pets/{kind}",
                "api/pets/{id}",
                "api/pets",
            ]
        );
    }

    #[test]
    fn wildcard_and_bracket_markers_are_normalized() {
        let handler = handler_with_route(Some("files/{*path}"), &[]);
        assert_eq!(resolve_routes(&handler, "api"), ["api/files/{path}"]);

        let brackets = handler_with_route(Some("items/[id]"), &[]);
        assert_eq!(resolve_routes(&brackets, "api"), ["api/items/{id}"]);
    }

    #[test]
    fn methods_default_to_get() {
        let handler = HandlerDescriptor::new("Run").param(
            ParamDescriptor::new("req", TypeInfo::Request)
                .annotation(ParamAnnotation::trigger(Vec::new(), None)),
        );
        assert_eq!(resolve_methods(&handler), [HttpMethod::Get]);
    }

    #[test]
    fn methods_preserve_order_and_dedup() {
        let handler = HandlerDescriptor::new("Run").param(
            ParamDescriptor::new("req", TypeInfo::Request).annotation(ParamAnnotation::trigger(
                vec![HttpMethod::Post, HttpMethod::Get, HttpMethod::Post],
                None,
            )),
        );
        assert_eq!(resolve_methods(&handler), [HttpMethod::Post, HttpMethod::Get]);
    }
}
