//! Ordered middleware chain
//!
//! Security gates implement a uniform `handle(request, next)` contract and
//! are composed into a [`SecurityPipeline`] once at startup. The pipeline
//! bridges into an axum router through a single
//! [`from_fn_with_state`](axum::middleware::from_fn_with_state) layer.

use axum::extract::{Request, State};
use axum::response::Response;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed response future returned by middleware
pub type NextFuture<'a> = Pin<Box<dyn Future<Output = Response> + Send + 'a>>;

/// The rest of the chain after the current middleware
pub struct Next {
    handler: Box<dyn FnOnce(Request) -> NextFuture<'static> + Send>,
}

impl Next {
    pub fn new<F>(handler: F) -> Self
    where
        F: FnOnce(Request) -> NextFuture<'static> + Send + 'static,
    {
        Self {
            handler: Box::new(handler),
        }
    }

    /// Run the remainder of the chain with the given request
    pub async fn run(self, request: Request) -> Response {
        (self.handler)(request).await
    }
}

/// Uniform middleware contract: inspect or rewrite the request, decide
/// whether to call `next`, and optionally post-process the response.
pub trait Middleware: Send + Sync + std::fmt::Debug {
    fn handle(&self, request: Request, next: Next) -> NextFuture<'static>;

    /// Middleware name for logs and debugging
    fn name(&self) -> &'static str {
        "Middleware"
    }
}

/// Ordered chain of security middleware
#[derive(Debug, Default)]
pub struct SecurityPipeline {
    middleware: Vec<Arc<dyn Middleware>>,
}

impl SecurityPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append middleware; chain order is registration order
    pub fn add<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Execute the chain, terminating in `handler`
    pub async fn execute<F, Fut>(&self, request: Request, handler: F) -> Response
    where
        F: FnOnce(Request) -> Fut + Send + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        let mut chain = Box::new(move |req: Request| Box::pin(handler(req)) as NextFuture<'static>)
            as Box<dyn FnOnce(Request) -> NextFuture<'static> + Send>;

        for middleware in self.middleware.iter().rev() {
            let middleware = middleware.clone();
            let next_handler = chain;
            chain = Box::new(move |req: Request| {
                let next = Next::new(next_handler);
                middleware.handle(req, next)
            });
        }

        chain(request).await
    }

    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    /// Middleware names in execution order
    pub fn names(&self) -> Vec<&'static str> {
        self.middleware.iter().map(|m| m.name()).collect()
    }
}

impl Clone for SecurityPipeline {
    fn clone(&self) -> Self {
        Self {
            middleware: self.middleware.clone(),
        }
    }
}

/// Axum bridge: install with
/// `router.layer(axum::middleware::from_fn_with_state(pipeline, pipeline_middleware))`.
pub async fn pipeline_middleware(
    State(pipeline): State<SecurityPipeline>,
    request: Request,
    next: axum::middleware::Next,
) -> Response {
    pipeline
        .execute(request, move |req| next.run(req))
        .await
}
