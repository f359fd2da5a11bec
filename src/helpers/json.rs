use crate::models::{Page, PageMeta};
use actix_web::{web, HttpResponse};
use serde::Serialize;

/// Envelope for admin API success responses.
#[derive(Serialize)]
pub struct JsonResponse<T> {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<Vec<T>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

pub struct JsonResponseBuilder<T> {
    id: Option<i32>,
    item: Option<T>,
    list: Option<Vec<T>>,
    meta: Option<PageMeta>,
}

impl<T> Default for JsonResponseBuilder<T> {
    fn default() -> Self {
        Self {
            id: None,
            item: None,
            list: None,
            meta: None,
        }
    }
}

impl<T: Serialize> JsonResponse<T> {
    pub fn build() -> JsonResponseBuilder<T> {
        JsonResponseBuilder::default()
    }
}

impl<T: Serialize> JsonResponseBuilder<T> {
    pub fn set_id(mut self, id: i32) -> Self {
        self.id = Some(id);
        self
    }

    pub fn set_item(mut self, item: T) -> Self {
        self.item = Some(item);
        self
    }

    pub fn set_list(mut self, list: Vec<T>) -> Self {
        self.list = Some(list);
        self
    }

    pub fn set_page(mut self, page: Page<T>) -> Self {
        self.meta = Some(page.meta);
        self.list = Some(page.items);
        self
    }

    fn finish(self, message: &str) -> JsonResponse<T> {
        let message = if message.trim().is_empty() {
            String::from("Success")
        } else {
            message.to_string()
        };

        JsonResponse {
            message,
            id: self.id,
            item: self.item,
            list: self.list,
            meta: self.meta,
        }
    }

    pub fn ok(self, message: &str) -> web::Json<JsonResponse<T>> {
        web::Json(self.finish(message))
    }

    pub fn created(self, message: &str) -> HttpResponse {
        HttpResponse::Created().json(self.finish(message))
    }
}
