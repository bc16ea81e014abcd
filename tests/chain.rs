use quill::{Chain, HttpContext, Method, Outcome, Request, Signal, Status};

const MARK: &str = "x-trail";

fn mark(ctx: &mut HttpContext, step: &str) {
    let trail = match ctx.response.header(MARK) {
        Some(prev) => format!("{prev},{step}"),
        None => step.to_owned(),
    };
    ctx.response.set_header(MARK, trail);
}

fn ctx() -> HttpContext {
    HttpContext::new(Request::new(Method::Get, "/trail"))
}

#[tokio::test]
async fn halting_handler_stops_the_chain() {
    let chain = Chain::new()
        .then(|mut ctx: HttpContext| async move {
            mark(&mut ctx, "h1");
            Signal::Continue(ctx)
        })
        .then(|mut ctx: HttpContext| async move {
            mark(&mut ctx, "h2");
            ctx.halt()
        })
        .then(|mut ctx: HttpContext| async move {
            mark(&mut ctx, "h3");
            ctx.next()
        });

    match chain.run(ctx()).await {
        Outcome::Halted { ctx, at } => {
            assert_eq!(at, 1);
            assert_eq!(ctx.response.header(MARK), Some("h1,h2"));
        }
        other => panic!("expected halt, got {}", other.label()),
    }
}

#[tokio::test]
async fn continuing_handlers_apply_in_order() {
    let chain = Chain::new()
        .then(|mut ctx: HttpContext| async move {
            mark(&mut ctx, "h1");
            ctx.next()
        })
        .then(|mut ctx: HttpContext| async move {
            mark(&mut ctx, "h2");
            ctx.next()
        })
        .then(|mut ctx: HttpContext| async move {
            mark(&mut ctx, "h3");
            ctx.next()
        });

    let outcome = chain.run(ctx()).await;
    assert!(outcome.is_completed());
    let ctx = outcome.into_context().unwrap();
    assert_eq!(ctx.response.header(MARK), Some("h1,h2,h3"));
}

#[tokio::test]
async fn error_response_halts_even_when_continuing() {
    let chain = Chain::new()
        .then(|ctx: HttpContext| async move { ctx.respond(Status::NotFound, "error retrieving document 1") })
        .then(|mut ctx: HttpContext| async move {
            mark(&mut ctx, "after");
            ctx.next()
        });

    match chain.run(ctx()).await {
        Outcome::Halted { ctx, at } => {
            assert_eq!(at, 0);
            assert_eq!(ctx.response.status(), Status::NotFound);
            assert_eq!(ctx.response.header(MARK), None);
        }
        other => panic!("expected halt, got {}", other.label()),
    }
}

#[tokio::test]
async fn chains_are_reusable_across_invocations() {
    let chain = Chain::new().then(|mut ctx: HttpContext| async move {
        let path = ctx.request.path().to_owned();
        ctx.response.set_text(Status::Ok, path);
        ctx.next()
    });
    let copy = chain.clone();

    let a = chain.run(HttpContext::new(Request::new(Method::Get, "/a"))).await;
    let b = copy.run(HttpContext::new(Request::new(Method::Get, "/b"))).await;
    assert_eq!(a.into_context().unwrap().response.body(), b"/a");
    assert_eq!(b.into_context().unwrap().response.body(), b"/b");
}
