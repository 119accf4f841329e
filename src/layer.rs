use std::task::{Context, Poll};

use http::Request;
use tower_cookies::{CookieManager, Cookies};
use tower_layer::Layer;
use tower_service::Service;

use crate::{config::CookieStateConfig, reconstruct::StateReconstructor};

/// Layer that reconstructs [`RequestState`](crate::RequestState) from inbound cookies.
#[derive(Debug, Clone)]
pub struct CookieStateLayer {
    reconstructor: StateReconstructor,
}

impl CookieStateLayer {
    #[must_use]
    pub fn new(config: CookieStateConfig) -> Self {
        Self {
            reconstructor: StateReconstructor::new(config),
        }
    }

    pub fn config(&self) -> &CookieStateConfig {
        self.reconstructor.config()
    }
}

#[derive(Debug, Clone)]
pub struct CookieStateService<S> {
    inner: S,
    reconstructor: StateReconstructor,
}

impl<S> Layer<S> for CookieStateLayer {
    type Service = CookieManager<CookieStateService<S>>;

    fn layer(&self, inner: S) -> Self::Service {
        CookieManager::new(CookieStateService {
            inner,
            reconstructor: self.reconstructor.clone(),
        })
    }
}

impl<ReqBody, S> Service<Request<ReqBody>> for CookieStateService<S>
where
    S: Service<Request<ReqBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let state = self
            .reconstructor
            .reconstruct(req.extensions().get::<Cookies>());
        req.extensions_mut().insert(state);

        self.inner.call(req)
    }
}
