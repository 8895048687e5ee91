use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{
    domain::{OrderId, StatusId, UserId},
    error::GatewayError,
    protocol::{
        CreateOrderRequest, CreatedOrder, OrderPage, OrdersResponse, PageRequest, Status,
        UserPage, Vehicle,
    },
};
use tracing::{debug, warn};

use crate::session::Session;

/// Remote operations the order list depends on.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn fetch_orders(&self, page: u32, page_size: u32) -> Result<OrderPage, GatewayError>;
    async fn fetch_statuses(&self) -> Result<Vec<Status>, GatewayError>;
    /// The backend does not echo the updated order; callers refetch.
    async fn update_order_status(
        &self,
        order_id: OrderId,
        status_id: StatusId,
    ) -> Result<(), GatewayError>;
}

pub struct HttpGateway {
    http: Client,
    session: Arc<Session>,
}

impl HttpGateway {
    pub fn new(session: Arc<Session>) -> Self {
        Self::with_client(Client::new(), session)
    }

    pub fn with_client(http: Client, session: Arc<Session>) -> Self {
        Self { http, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn list_users(&self, page: u32, page_size: u32) -> Result<UserPage, GatewayError> {
        let request = self
            .http
            .post(self.session.endpoint("/api/dictionary/filter"))
            .json(&PageRequest {
                page,
                size: page_size,
            });
        let response = self.send(request).await?;
        read_json(response).await
    }

    pub async fn confirm_user(&self, user_id: UserId) -> Result<(), GatewayError> {
        let request = self
            .http
            .post(self.session.endpoint(&format!("/api/v1/auth/confirm/{user_id}")));
        self.send(request).await?;
        Ok(())
    }

    pub async fn list_vehicles(&self) -> Result<Vec<Vehicle>, GatewayError> {
        let request = self.http.get(self.session.endpoint("/api/auto/get/list"));
        let response = self.send(request).await?;
        read_json(response).await
    }

    pub async fn create_order(
        &self,
        order: &CreateOrderRequest,
    ) -> Result<CreatedOrder, GatewayError> {
        let request = self
            .http
            .post(self.session.endpoint("/api/orders"))
            .json(order);
        let response = self.send(request).await?;
        let body: Value = read_json(response).await?;
        CreatedOrder::from_pair(body)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, GatewayError> {
        let request = request
            .header(AUTHORIZATION, self.session.authorization()?)
            .build()
            .map_err(transport_error)?;
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending backend request");

        let response = self.http.execute(request).await.map_err(|err| {
            warn!(%method, %url, error = %err, "backend request did not complete");
            transport_error(err)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%method, %url, status = status.as_u16(), "backend rejected request");
            return Err(GatewayError::request(status.as_u16()));
        }
        Ok(response)
    }
}

#[async_trait]
impl OrderGateway for HttpGateway {
    async fn fetch_orders(&self, page: u32, page_size: u32) -> Result<OrderPage, GatewayError> {
        let request = self
            .http
            .post(self.session.endpoint("/api/orders/filtered"))
            .json(&PageRequest {
                page,
                size: page_size,
            });
        let response = self.send(request).await?;
        let body: OrdersResponse = read_json(response).await?;
        Ok(body.into())
    }

    async fn fetch_statuses(&self) -> Result<Vec<Status>, GatewayError> {
        let request = self
            .http
            .get(self.session.endpoint("/api/dictionary/statuses"));
        let response = self.send(request).await?;
        read_json(response).await
    }

    async fn update_order_status(
        &self,
        order_id: OrderId,
        status_id: StatusId,
    ) -> Result<(), GatewayError> {
        let request = self.http.put(
            self.session
                .endpoint(&format!("/api/orders/{order_id}/status/{status_id}")),
        );
        self.send(request).await?;
        Ok(())
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    let body = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&body).map_err(GatewayError::from)
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_decode() {
        GatewayError::shape(err.to_string())
    } else if let Some(status) = err.status() {
        GatewayError::request(status.as_u16())
    } else {
        GatewayError::network(err.to_string())
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
