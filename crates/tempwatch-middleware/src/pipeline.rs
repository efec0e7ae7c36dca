//! Fixed-order middleware pipeline.
//!
//! Every route is wrapped the same way:
//!
//! 1. **Logging** - record method, URI, route name and remote address
//! 2. **Validation** - resolve the request against the contract and check it
//!
//! Logging is outermost so rejected requests are still logged.

use std::sync::Arc;

use tempwatch_contract::ContractValidator;

use crate::context::MiddlewareContext;
use crate::middleware::{Endpoint, Middleware, Next};
use crate::stages::{ContractValidationMiddleware, RequestLoggingMiddleware};
use crate::types::{Request, Response};

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The middleware pipeline.
///
/// # Example
///
/// ```
/// use tempwatch_contract::ContractLoader;
/// use tempwatch_middleware::Pipeline;
/// use std::sync::Arc;
///
/// let contract = Arc::new(ContractLoader::builtin().unwrap());
/// let pipeline = Pipeline::new(contract);
///
/// assert_eq!(pipeline.stage_names(), vec!["logging", "validation"]);
/// ```
#[derive(Clone)]
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates the standard pipeline: logging, then contract validation.
    pub fn new(validator: Arc<dyn ContractValidator>) -> Self {
        Self {
            stages: Stage::all()
                .into_iter()
                .map(|stage| stage.middleware(&validator))
                .collect(),
        }
    }

    /// Creates a pipeline builder with no stages.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Runs a request through every stage and then the endpoint.
    pub async fn process(
        &self,
        mut ctx: MiddlewareContext,
        request: Request,
        endpoint: &dyn Endpoint,
    ) -> Response {
        let next = self.build_chain(endpoint);
        next.run(&mut ctx, request).await
    }

    fn build_chain<'a>(&'a self, endpoint: &'a dyn Endpoint) -> Next<'a> {
        let mut next = Next::endpoint(endpoint);
        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Returns the names of all stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|mw| mw.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder for a [`Pipeline`] with custom stages.
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage. Stages run in the order they were added.
    #[must_use]
    pub fn add_stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}

/// The standard stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Stage {
    /// Stage 1: request logging
    Logging = 1,
    /// Stage 2: contract validation
    Validation = 2,
}

impl Stage {
    /// Returns every stage in order.
    #[must_use]
    pub const fn all() -> [Stage; 2] {
        [Stage::Logging, Stage::Validation]
    }

    /// Returns the stage name, matching [`Middleware::name`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Stage::Logging => "logging",
            Stage::Validation => "validation",
        }
    }

    /// Returns the 1-based position of the stage.
    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8
    }

    /// Creates the middleware that implements this stage.
    #[must_use]
    pub fn middleware(self, validator: &Arc<dyn ContractValidator>) -> BoxedMiddleware {
        let middleware: BoxedMiddleware = match self {
            Stage::Logging => Arc::new(RequestLoggingMiddleware::new()),
            Stage::Validation => Arc::new(ContractValidationMiddleware::new(Arc::clone(validator))),
        };
        middleware
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::BoxFuture;
    use crate::types::ResponseExt;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<&'static str>>>);

    impl Recorder {
        fn push(&self, name: &'static str) {
            self.0.lock().unwrap().push(name);
        }

        fn take(&self) -> Vec<&'static str> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    struct Recording {
        name: &'static str,
        recorder: Recorder,
    }

    impl Middleware for Recording {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut MiddlewareContext,
            request: Request,
            next: crate::middleware::Next<'a>,
        ) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                self.recorder.push(self.name);
                next.run(ctx, request).await
            })
        }
    }

    fn ok_endpoint(_ctx: &MiddlewareContext, _request: Request) -> BoxFuture<'static, Response> {
        Box::pin(async { Response::empty(StatusCode::OK) })
    }

    #[test]
    fn test_stage_order() {
        let stages = Stage::all();
        assert_eq!(stages[0].number(), 1);
        assert_eq!(stages[1].number(), 2);
        assert!(Stage::Logging < Stage::Validation);
    }

    #[tokio::test]
    async fn test_stages_run_in_insertion_order() {
        let recorder = Recorder::default();
        let pipeline = Pipeline::builder()
            .add_stage(Recording { name: "first", recorder: recorder.clone() })
            .add_stage(Recording { name: "second", recorder: recorder.clone() })
            .build();

        let request = http::Request::builder()
            .uri("/x")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = pipeline
            .process(MiddlewareContext::new("x"), request, &ok_endpoint)
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(recorder.take(), vec!["first", "second"]);
        assert_eq!(pipeline.stage_count(), 2);
    }

    #[test]
    fn test_stage_builds_matching_middleware() {
        let contract: Arc<dyn ContractValidator> =
            Arc::new(tempwatch_contract::ContractLoader::builtin().unwrap());
        for stage in Stage::all() {
            assert_eq!(stage.middleware(&contract).name(), stage.name());
        }
    }

    #[test]
    fn test_standard_pipeline_names_match_stages() {
        let contract = Arc::new(tempwatch_contract::ContractLoader::builtin().unwrap());
        let pipeline = Pipeline::new(contract);
        let expected: Vec<_> = Stage::all().iter().map(|s| s.name()).collect();
        assert_eq!(pipeline.stage_names(), expected);
    }
}
