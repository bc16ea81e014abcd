//! Path-parameter extraction.

use std::collections::HashMap;

use crate::context::HttpContext;
use crate::handler::Handler;

/// Named path segments captured by [`path_parser`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(HashMap<String, String>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A route template such as `/store/:id`.
///
/// Both `:id` and `{id}` mark a parameter segment. Empty segments (leading,
/// trailing or doubled slashes) are ignored on both sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    segments: Vec<Segment>,
}

impl PathTemplate {
    pub fn parse(template: &str) -> Self {
        let segments = split(template)
            .map(|seg| match param_name(seg) {
                Some(name) => Segment::Param(name.to_owned()),
                None => Segment::Literal(seg.to_owned()),
            })
            .collect();
        Self { segments }
    }

    /// Matches `path` segment by segment; `None` on any mismatch.
    pub fn extract(&self, path: &str) -> Option<PathParams> {
        let parts: Vec<&str> = split(path).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(lit) if lit == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_owned());
                }
            }
        }
        Some(PathParams(params))
    }

    /// The same template in `matchit`'s `{name}` syntax.
    pub(crate) fn to_matchit(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_owned();
        }
        self.segments.iter()
            .map(|seg| match seg {
                Segment::Literal(lit) => format!("/{lit}"),
                Segment::Param(name) => format!("/{{{name}}}"),
            })
            .collect()
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn param_name(segment: &str) -> Option<&str> {
    segment.strip_prefix(':')
        .or_else(|| segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
        .filter(|name| !name.is_empty())
}

/// Middleware that fills [`PathParams`] from `template`.
///
/// On a mismatch nothing is stored and the chain continues; handlers that
/// need parameters answer `400` themselves.
///
/// ```rust
/// use quill::{Chain, HttpContext, Method, Request, middleware};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let chain = Chain::new().then(middleware::path_parser("/store/:id"));
/// let ctx = HttpContext::new(Request::new(Method::Get, "/store/42"));
/// let ctx = chain.run(ctx).await.into_context().unwrap();
/// assert_eq!(ctx.param("id"), Some("42"));
/// # }
/// ```
pub fn path_parser(template: &str) -> impl Handler<HttpContext> + use<> {
    let template = PathTemplate::parse(template);
    move |mut ctx: HttpContext| {
        if let Some(params) = template.extract(ctx.request.path()) {
            ctx.extras.insert(params);
        }
        std::future::ready(ctx.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_named_segments() {
        let template = PathTemplate::parse("/history/:id");
        let params = template.extract("/history/abc-123").unwrap();
        assert_eq!(params.get("id"), Some("abc-123"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn brace_syntax_is_accepted() {
        let template = PathTemplate::parse("/file/{name}");
        assert_eq!(template.extract("/file/a.txt").unwrap().get("name"), Some("a.txt"));
    }

    #[test]
    fn mismatches_yield_nothing() {
        let template = PathTemplate::parse("/store/:id");
        assert!(template.extract("/store").is_none());
        assert!(template.extract("/store/1/extra").is_none());
        assert!(template.extract("/history/1").is_none());
    }

    #[test]
    fn trailing_slashes_are_ignored() {
        let template = PathTemplate::parse("/store/:id/");
        assert_eq!(template.extract("/store/7/").unwrap().get("id"), Some("7"));
    }

    #[test]
    fn converts_to_matchit_syntax() {
        assert_eq!(PathTemplate::parse("/store/:id").to_matchit(), "/store/{id}");
        assert_eq!(PathTemplate::parse("/history/").to_matchit(), "/history");
        assert_eq!(PathTemplate::parse("/").to_matchit(), "/");
    }
}
