use crate::middleware::authentication::method;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse},
    Error,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

pub struct BearerAuthMiddleware<S> {
    pub(super) service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for BearerAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            if let Err(err) = method::try_oauth(&mut req).await {
                tracing::info!(path = %req.path(), kind = err.kind(), "Admin request rejected");
                return Err(err.into());
            }
            service.call(req).await
        })
    }
}
